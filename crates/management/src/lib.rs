//! Campaign management backend: campaign and recipient CRUD, launch
//! orchestration on a background worker pool, metrics and activity timelines.
//!
//! Data lives behind the `CampaignStore` trait; the in-memory store backs
//! development and tests.

pub mod auth;
pub mod executor;
pub mod handlers;
pub mod models;
pub mod orchestrator;
pub mod router;

pub use auth::RequestingUser;
pub use executor::{BatchExecutor, BatchReport, RecipientFailure};
pub use handlers::ManagementState;
pub use orchestrator::{BatchJob, CampaignOrchestrator, LaunchAccepted};
pub use router::management_router;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use campaign_channels::{ChannelDispatcher, InMemoryProviderSettings, ProviderChainResolver, SocialPublisher};
    use campaign_core::config::{EmailConfig, ExecutionConfig, SocialConfig};
    use campaign_core::types::Contact;
    use campaign_store::{CampaignStore, InMemoryStore};
    use tower::ServiceExt;
    use uuid::Uuid;

    fn app() -> (Router, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        let dyn_store: Arc<dyn CampaignStore> = store.clone();
        let executor = Arc::new(BatchExecutor::new(
            dyn_store.clone(),
            Arc::new(ChannelDispatcher::new(
                Duration::from_secs(5),
                SocialPublisher::new(SocialConfig::default()),
            )),
            Arc::new(ProviderChainResolver::new(
                EmailConfig::default(),
                Arc::new(InMemoryProviderSettings::new()),
            )),
            ExecutionConfig {
                send_delay_ms: 0,
                ..Default::default()
            },
            "Campaign Update".into(),
        ));
        let orchestrator = Arc::new(CampaignOrchestrator::start(dyn_store.clone(), executor, 1));
        let router = management_router(ManagementState::new(dyn_store, orchestrator));
        (router, store)
    }

    fn request(method: &str, uri: &str, user: Option<&str>, body: serde_json::Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");
        if let Some(user) = user {
            builder = builder.header(auth::USER_HEADER, user);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    fn seed_contact(store: &InMemoryStore, email: &str) -> Uuid {
        store
            .upsert_contact(Contact {
                id: Uuid::new_v4(),
                first_name: Some("Ann".into()),
                last_name: None,
                email: Some(email.into()),
            })
            .unwrap()
            .id
    }

    async fn create(app: &Router, user: &str, body: serde_json::Value) -> Uuid {
        let (status, json) = send(app, request("POST", "/campaigns", Some(user), body)).await;
        assert_eq!(status, StatusCode::CREATED);
        json["id"].as_str().unwrap().parse().unwrap()
    }

    #[tokio::test]
    async fn test_requests_without_user_are_unauthorized() {
        let (app, _) = app();
        let (status, json) = send(&app, request("GET", "/campaigns", None, serde_json::json!({}))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["error"], "missing_auth");
    }

    #[tokio::test]
    async fn test_create_and_fetch_campaign() {
        let (app, _) = app();
        let id = create(
            &app,
            "u1",
            serde_json::json!({"name": "Launch week", "type": "EMAIL", "emailSubject": "Hi"}),
        )
        .await;

        let (status, json) = send(&app, request("GET", &format!("/campaigns/{id}"), Some("u1"), serde_json::json!({}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "DRAFT");
        assert_eq!(json["type"], "EMAIL");

        let (status, _) = send(&app, request("GET", &format!("/campaigns/{id}"), Some("u2"), serde_json::json!({}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_adding_contacts_is_idempotent() {
        let (app, store) = app();
        let contact = seed_contact(&store, "ann@example.com");
        let id = create(&app, "u1", serde_json::json!({"name": "c", "type": "EMAIL"})).await;

        let uri = format!("/campaigns/{id}/contacts");
        let body = serde_json::json!({"contactIds": [contact]});
        let (_, first) = send(&app, request("POST", &uri, Some("u1"), body.clone())).await;
        let (_, second) = send(&app, request("POST", &uri, Some("u1"), body)).await;
        assert_eq!(first["added"], 1);
        assert_eq!(second["added"], 0);

        let (_, links) = send(&app, request("GET", &uri, Some("u1"), serde_json::json!({}))).await;
        assert_eq!(links.as_array().unwrap().len(), 1);
        assert_eq!(links[0]["status"], "PENDING");
    }

    #[tokio::test]
    async fn test_execute_errors() {
        let (app, _) = app();
        let (status, _) = send(
            &app,
            request("POST", &format!("/campaigns/{}/execute", Uuid::new_v4()), Some("u1"), serde_json::json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let id = create(&app, "u1", serde_json::json!({"name": "empty", "type": "EMAIL"})).await;
        let (status, json) = send(
            &app,
            request("POST", &format!("/campaigns/{id}/execute"), Some("u1"), serde_json::json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "no_recipients");
    }

    #[tokio::test]
    async fn test_execute_accepts_and_reports_recipients() {
        let (app, store) = app();
        let a = seed_contact(&store, "a@example.com");
        let b = seed_contact(&store, "b@example.com");
        let id = create(
            &app,
            "u1",
            serde_json::json!({"name": "c", "type": "EMAIL", "contactIds": [a, b]}),
        )
        .await;

        let uri = format!("/campaigns/{id}/execute");
        let (status, json) = send(&app, request("POST", &uri, Some("u1"), serde_json::json!({}))).await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(json["recipientCount"], 2);
        assert_eq!(
            json["message"],
            "Campaign launched successfully! Sending to 2 contacts."
        );

        let (status, json) = send(&app, request("POST", &uri, Some("u1"), serde_json::json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["message"], "Campaign is already active");
    }

    #[tokio::test]
    async fn test_create_with_unknown_contact_stores_nothing() {
        let (app, store) = app();
        let known = seed_contact(&store, "ann@example.com");
        let (status, json) = send(
            &app,
            request(
                "POST",
                "/campaigns",
                Some("u1"),
                serde_json::json!({"name": "c", "type": "EMAIL", "contactIds": [known, Uuid::new_v4()]}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "validation_failed");
        assert!(store.list_campaigns_for_owner("u1").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_paused_campaign_can_be_relaunched() {
        let (app, store) = app();
        let a = seed_contact(&store, "a@example.com");
        let id = create(
            &app,
            "u1",
            serde_json::json!({"name": "c", "type": "EMAIL", "contactIds": [a]}),
        )
        .await;
        let campaign_uri = format!("/campaigns/{id}");
        let execute_uri = format!("/campaigns/{id}/execute");

        let (status, _) = send(&app, request("POST", &execute_uri, Some("u1"), serde_json::json!({}))).await;
        assert_eq!(status, StatusCode::ACCEPTED);

        let (status, json) = send(
            &app,
            request("PUT", &campaign_uri, Some("u1"), serde_json::json!({"status": "PAUSED", "name": "Renamed"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "PAUSED");
        assert_eq!(json["name"], "Renamed");
        assert_eq!(json["type"], "EMAIL");

        let (status, json) = send(
            &app,
            request("PUT", &campaign_uri, Some("u1"), serde_json::json!({"status": "ACTIVE"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["message"], "Campaigns become active by launching them");

        let (status, _) = send(
            &app,
            request("PUT", &campaign_uri, Some("u2"), serde_json::json!({"status": "COMPLETED"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let b = seed_contact(&store, "b@example.com");
        store.attach_contacts(id, &[b], chrono::Utc::now()).unwrap();
        let (status, _) = send(&app, request("POST", &execute_uri, Some("u1"), serde_json::json!({}))).await;
        assert_eq!(status, StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn test_recipient_status_follows_engagement_rules() {
        let (app, store) = app();
        let a = seed_contact(&store, "a@example.com");
        let id = create(
            &app,
            "u1",
            serde_json::json!({"name": "c", "type": "EMAIL", "contactIds": [a]}),
        )
        .await;
        let uri = format!("/campaigns/{id}/contacts/{a}");

        let (status, json) = send(&app, request("PATCH", &uri, Some("u1"), serde_json::json!({"status": "SENT"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["changed"], true);

        let (status, json) = send(&app, request("PATCH", &uri, Some("u1"), serde_json::json!({"status": "OPENED"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "OPENED");

        let (status, _) = send(&app, request("PATCH", &uri, Some("u1"), serde_json::json!({"status": "SENT"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = send(&app, request("PATCH", &uri, Some("u1"), serde_json::json!({"status": "PENDING"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &app,
            request("PATCH", &format!("/campaigns/{id}/contacts/{}", Uuid::new_v4()), Some("u1"), serde_json::json!({"status": "SENT"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let link = store.get_link(id, a).unwrap().unwrap();
        assert_eq!(link.status, campaign_core::types::RecipientStatus::Opened);
        assert!(link.sent_at.is_some());
    }

    #[tokio::test]
    async fn test_manual_activity_and_metrics() {
        let (app, _) = app();
        let id = create(&app, "u1", serde_json::json!({"name": "c", "type": "EVENT"})).await;

        let (status, json) = send(
            &app,
            request(
                "POST",
                &format!("/campaigns/{id}/activities"),
                Some("u1"),
                serde_json::json!({"description": "Booth confirmed"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["activityType"], "NOTE");

        let (status, json) = send(
            &app,
            request(
                "POST",
                &format!("/campaigns/{id}/metrics"),
                Some("u1"),
                serde_json::json!({"totalSent": 10, "totalOpened": 4}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["revenue"], 0.0);

        let (_, json) = send(&app, request("GET", &format!("/campaigns/{id}/metrics"), Some("u1"), serde_json::json!({}))).await;
        assert_eq!(json["allSnapshots"].as_array().unwrap().len(), 1);
        assert_eq!(json["realtimeMetrics"]["totalSent"], 0);
        assert_eq!(json["calculatedRates"]["openRate"], 0.0);
    }
}
