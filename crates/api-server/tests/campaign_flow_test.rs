//! End-to-end flow through the assembled router: create, launch, track and
//! read back metrics. Uses the in-memory store and the log-only provider.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use campaign_api::ApiServer;
use campaign_channels::InMemoryProviderSettings;
use campaign_core::config::{AppConfig, ExecutionConfig};
use campaign_personalization::TrackingUrls;
use campaign_store::InMemoryStore;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

const USER: &str = "owner-1";

fn app() -> Router {
    let config = AppConfig {
        execution: ExecutionConfig {
            send_delay_ms: 0,
            worker_count: 2,
            ..Default::default()
        },
        ..Default::default()
    };
    ApiServer::new(
        config,
        Arc::new(InMemoryStore::new()),
        Arc::new(InMemoryProviderSettings::new()),
    )
    .router()
}

async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut req = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-user-id", USER);
    let body = match body {
        Some(v) => {
            req = req.header(header::CONTENT_TYPE, "application/json");
            Body::from(v.to_string())
        }
        None => Body::empty(),
    };
    let resp = app.clone().oneshot(req.body(body).unwrap()).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

/// Strip scheme and host so a generated tracking URL can be replayed
/// against the in-process router.
fn local_path(url: &str) -> String {
    let after_scheme = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
    after_scheme
        .find('/')
        .map(|i| after_scheme[i..].to_string())
        .unwrap_or_default()
}

async fn create_contact(app: &Router, email: &str) -> Uuid {
    let (status, body) = call(
        app,
        "POST",
        "/contacts",
        Some(json!({"firstName": "Test", "email": email})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().parse().unwrap()
}

async fn wait_for_summary(app: &Router, campaign_id: Uuid) -> Value {
    for _ in 0..200 {
        let (_, activities) = call(app, "GET", &format!("/campaigns/{campaign_id}/activities"), None).await;
        if let Some(summary) = activities
            .as_array()
            .unwrap()
            .iter()
            .find(|a| a["activityType"] == "SENT")
        {
            return summary.clone();
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("batch did not finish");
}

#[tokio::test]
async fn test_probes() {
    let app = app();
    let (status, body) = call(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, _) = call(&app, "GET", "/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = call(&app, "GET", "/live", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_launch_track_and_measure() {
    let app = app();
    let first = create_contact(&app, "first@example.com").await;
    let second = create_contact(&app, "second@example.com").await;

    let (status, campaign) = call(
        &app,
        "POST",
        "/campaigns",
        Some(json!({
            "name": "Autumn launch",
            "type": "EMAIL",
            "emailSubject": "Hello {{firstName}}",
            "emailContent": "<a href=\"https://shop.test/autumn\">Shop</a>",
            "contactIds": [first, second],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let campaign_id: Uuid = campaign["id"].as_str().unwrap().parse().unwrap();

    let (status, launch) = call(&app, "POST", &format!("/campaigns/{campaign_id}/execute"), None).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(launch["recipientCount"], 2);

    let summary = wait_for_summary(&app, campaign_id).await;
    assert_eq!(summary["metadata"]["sent"], 2);
    assert_eq!(summary["metadata"]["failed"], 0);

    let urls = TrackingUrls::new(&ExecutionConfig::default().tracking_base_url, campaign_id, first);
    let (status, _) = call(&app, "GET", &local_path(&urls.open()), None).await;
    assert_eq!(status, StatusCode::OK);

    let click = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(local_path(&urls.click("https://shop.test/autumn")))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(click.status(), StatusCode::FOUND);
    assert_eq!(click.headers()[header::LOCATION], "https://shop.test/autumn");

    let (_, metrics) = call(&app, "GET", &format!("/campaigns/{campaign_id}/metrics"), None).await;
    let live = &metrics["realtimeMetrics"];
    assert_eq!(live["totalSent"], 2);
    assert_eq!(live["totalOpened"], 1);
    assert_eq!(live["totalClicked"], 1);
    assert_eq!(metrics["calculatedRates"]["clickRate"], 100.0);
    // launch-time snapshot plus the batch snapshot
    assert_eq!(metrics["allSnapshots"].as_array().unwrap().len(), 2);
    assert_eq!(metrics["latestSnapshot"]["totalSent"], 2);

    let (status, body) = call(
        &app,
        "POST",
        &format!("/track/convert/{campaign_id}/{second}"),
        Some(json!({"value": 120.0})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (_, dashboard) = call(&app, "GET", "/analytics/dashboard", None).await;
    assert_eq!(dashboard["overallMetrics"]["totalCampaigns"], 1);
    assert_eq!(dashboard["overallMetrics"]["activeCampaigns"], 1);
    assert_eq!(dashboard["overallMetrics"]["totalConverted"], 1);
    assert_eq!(dashboard["topCampaigns"][0]["conversionRate"], 50.0);
}
