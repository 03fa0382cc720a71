//! Axum REST handlers for the campaign API.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use campaign_core::types::{Activity, Campaign, CampaignStatus, Contact, MetricSnapshot, RecipientLink};
use campaign_core::{CampaignError, EngagementEvent};
use campaign_reporting::{CampaignMetricsView, DashboardView, ManualSnapshotRequest, MetricsAggregator};
use campaign_store::{apply_event, ActivityLog, CampaignStore};
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::auth::RequestingUser;
use crate::models::*;
use crate::orchestrator::CampaignOrchestrator;

const CAMPAIGN_ACTIVITY_LIMIT: usize = 100;

/// Shared management state.
#[derive(Clone)]
pub struct ManagementState {
    pub store: Arc<dyn CampaignStore>,
    pub activities: ActivityLog,
    pub aggregator: MetricsAggregator,
    pub orchestrator: Arc<CampaignOrchestrator>,
}

impl ManagementState {
    pub fn new(store: Arc<dyn CampaignStore>, orchestrator: Arc<CampaignOrchestrator>) -> Self {
        Self {
            activities: ActivityLog::new(store.clone()),
            aggregator: MetricsAggregator::new(store.clone()),
            store,
            orchestrator,
        }
    }

    /// Load a campaign the requesting user owns. Campaigns owned by someone
    /// else are reported as missing.
    fn owned_campaign(&self, id: Uuid, user: &RequestingUser) -> Result<Campaign, ApiError> {
        self.store
            .get_campaign(id)
            .map_err(api_error)?
            .filter(|c| c.owner_id == user.id())
            .ok_or_else(|| api_error(CampaignError::NotFound("Campaign not found".into())))
    }
}

// ─── Campaigns ─────────────────────────────────────────────────────────────

#[utoipa::path(
    post,
    path = "/campaigns",
    tag = "Campaigns",
    request_body = CreateCampaignRequest,
    responses(
        (status = 201, description = "Campaign created", body = Campaign),
        (status = 400, description = "Invalid campaign", body = ErrorResponse),
    )
)]
pub async fn create_campaign(
    State(state): State<ManagementState>,
    user: RequestingUser,
    Json(req): Json<CreateCampaignRequest>,
) -> Result<(StatusCode, Json<Campaign>), ApiError> {
    if req.name.trim().is_empty() {
        return Err(api_error(CampaignError::Validation(
            "Campaign name is required".into(),
        )));
    }
    let status = req.status.unwrap_or(CampaignStatus::Draft);
    if status == CampaignStatus::Active {
        return Err(api_error(CampaignError::Validation(
            "Campaigns become active by launching them".into(),
        )));
    }

    for contact_id in &req.contact_ids {
        if state.store.get_contact(*contact_id).map_err(api_error)?.is_none() {
            return Err(api_error(CampaignError::Validation(format!(
                "unknown contact {contact_id}"
            ))));
        }
    }

    let now = Utc::now();
    let campaign = Campaign {
        id: Uuid::new_v4(),
        name: req.name.trim().to_string(),
        owner_id: user.id().to_string(),
        campaign_type: req.campaign_type,
        status,
        start_date: req.start_date,
        end_date: req.end_date,
        budget: req.budget,
        email_subject: req.email_subject,
        email_content: req.email_content,
        social_platform: req.social_platform,
        social_content: req.social_content,
        created_at: now,
        updated_at: now,
    };
    state.store.insert_campaign(campaign.clone()).map_err(api_error)?;

    if !req.contact_ids.is_empty() {
        state
            .store
            .attach_contacts(campaign.id, &req.contact_ids, now)
            .map_err(api_error)?;
    }

    metrics::counter!("management.campaigns.created").increment(1);
    info!(campaign_id = %campaign.id, owner_id = %user.id(), "Campaign created");
    Ok((StatusCode::CREATED, Json(campaign)))
}

#[utoipa::path(
    get,
    path = "/campaigns",
    tag = "Campaigns",
    responses((status = 200, description = "Campaigns owned by the caller, newest first", body = [Campaign]))
)]
pub async fn list_campaigns(
    State(state): State<ManagementState>,
    user: RequestingUser,
) -> Result<Json<Vec<Campaign>>, ApiError> {
    state
        .store
        .list_campaigns_for_owner(user.id())
        .map(Json)
        .map_err(api_error)
}

#[utoipa::path(
    get,
    path = "/campaigns/{id}",
    tag = "Campaigns",
    params(("id" = Uuid, Path, description = "Campaign id")),
    responses(
        (status = 200, description = "Campaign", body = Campaign),
        (status = 404, description = "Campaign not found", body = ErrorResponse),
    )
)]
pub async fn get_campaign(
    State(state): State<ManagementState>,
    user: RequestingUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Campaign>, ApiError> {
    state.owned_campaign(id, &user).map(Json)
}

#[utoipa::path(
    put,
    path = "/campaigns/{id}",
    tag = "Campaigns",
    params(("id" = Uuid, Path, description = "Campaign id")),
    request_body = UpdateCampaignRequest,
    responses(
        (status = 200, description = "Campaign updated", body = Campaign),
        (status = 400, description = "Invalid update", body = ErrorResponse),
        (status = 404, description = "Campaign not found", body = ErrorResponse),
    )
)]
pub async fn update_campaign(
    State(state): State<ManagementState>,
    user: RequestingUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateCampaignRequest>,
) -> Result<Json<Campaign>, ApiError> {
    let current = state.owned_campaign(id, &user)?;

    if req.status == Some(CampaignStatus::Active) && current.status != CampaignStatus::Active {
        return Err(api_error(CampaignError::Validation(
            "Campaigns become active by launching them".into(),
        )));
    }
    let name = match req.name {
        Some(name) if name.trim().is_empty() => {
            return Err(api_error(CampaignError::Validation(
                "Campaign name is required".into(),
            )));
        }
        Some(name) => name.trim().to_string(),
        None => current.name.clone(),
    };

    let updated = Campaign {
        name,
        campaign_type: req.campaign_type.unwrap_or(current.campaign_type),
        status: req.status.unwrap_or(current.status),
        start_date: req.start_date.or(current.start_date),
        end_date: req.end_date.or(current.end_date),
        budget: req.budget.or(current.budget),
        email_subject: req.email_subject.or(current.email_subject.clone()),
        email_content: req.email_content.or(current.email_content.clone()),
        social_platform: req.social_platform.or(current.social_platform.clone()),
        social_content: req.social_content.or(current.social_content.clone()),
        updated_at: Utc::now(),
        ..current.clone()
    };

    if !state
        .store
        .update_campaign(updated.clone(), current.status)
        .map_err(api_error)?
    {
        return Err(api_error(CampaignError::InvalidState(
            "Campaign status changed concurrently, retry the update".into(),
        )));
    }

    info!(
        campaign_id = %id,
        from = ?current.status,
        to = ?updated.status,
        "Campaign updated"
    );
    Ok(Json(updated))
}

#[utoipa::path(
    post,
    path = "/campaigns/{id}/execute",
    tag = "Campaigns",
    params(("id" = Uuid, Path, description = "Campaign id")),
    responses(
        (status = 202, description = "Campaign launched", body = LaunchResponse),
        (status = 400, description = "Campaign cannot be launched", body = ErrorResponse),
        (status = 404, description = "Campaign not found", body = ErrorResponse),
    )
)]
pub async fn execute_campaign(
    State(state): State<ManagementState>,
    user: RequestingUser,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<LaunchResponse>), ApiError> {
    let accepted = state.orchestrator.launch(id, user.id()).map_err(api_error)?;
    Ok((
        StatusCode::ACCEPTED,
        Json(LaunchResponse {
            success: true,
            message: format!(
                "Campaign launched successfully! Sending to {} contacts.",
                accepted.recipient_count
            ),
            recipient_count: accepted.recipient_count,
        }),
    ))
}

// ─── Recipients ────────────────────────────────────────────────────────────

#[utoipa::path(
    post,
    path = "/campaigns/{id}/contacts",
    tag = "Recipients",
    params(("id" = Uuid, Path, description = "Campaign id")),
    request_body = AddContactsRequest,
    responses(
        (status = 200, description = "Contacts linked", body = AddContactsResponse),
        (status = 400, description = "Unknown contact", body = ErrorResponse),
        (status = 404, description = "Campaign not found", body = ErrorResponse),
    )
)]
pub async fn add_contacts(
    State(state): State<ManagementState>,
    user: RequestingUser,
    Path(id): Path<Uuid>,
    Json(req): Json<AddContactsRequest>,
) -> Result<Json<AddContactsResponse>, ApiError> {
    state.owned_campaign(id, &user)?;
    let added = state
        .store
        .attach_contacts(id, &req.contact_ids, Utc::now())
        .map_err(api_error)?;
    Ok(Json(AddContactsResponse {
        message: format!("{added} contacts added to campaign"),
        added,
    }))
}

#[utoipa::path(
    get,
    path = "/campaigns/{id}/contacts",
    tag = "Recipients",
    params(("id" = Uuid, Path, description = "Campaign id")),
    responses(
        (status = 200, description = "Recipient links in insertion order", body = [RecipientLink]),
        (status = 404, description = "Campaign not found", body = ErrorResponse),
    )
)]
pub async fn list_contacts(
    State(state): State<ManagementState>,
    user: RequestingUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<RecipientLink>>, ApiError> {
    state.owned_campaign(id, &user)?;
    state.store.list_links(id).map(Json).map_err(api_error)
}

#[utoipa::path(
    delete,
    path = "/campaigns/{id}/contacts/{contact_id}",
    tag = "Recipients",
    params(
        ("id" = Uuid, Path, description = "Campaign id"),
        ("contact_id" = Uuid, Path, description = "Contact id"),
    ),
    responses(
        (status = 200, description = "Contact removed", body = MessageResponse),
        (status = 404, description = "Campaign or recipient not found", body = ErrorResponse),
    )
)]
pub async fn remove_contact(
    State(state): State<ManagementState>,
    user: RequestingUser,
    Path((id, contact_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.owned_campaign(id, &user)?;
    if !state.store.detach_contact(id, contact_id).map_err(api_error)? {
        return Err(api_error(CampaignError::NotFound(
            "Contact is not part of this campaign".into(),
        )));
    }
    Ok(Json(MessageResponse {
        message: "Contact removed from campaign".to_string(),
    }))
}

#[utoipa::path(
    patch,
    path = "/campaigns/{id}/contacts/{contact_id}",
    tag = "Recipients",
    params(
        ("id" = Uuid, Path, description = "Campaign id"),
        ("contact_id" = Uuid, Path, description = "Contact id"),
    ),
    request_body = UpdateRecipientStatusRequest,
    responses(
        (status = 200, description = "Recipient status applied", body = RecipientStatusResponse),
        (status = 400, description = "Transition not allowed", body = ErrorResponse),
        (status = 404, description = "Campaign or recipient not found", body = ErrorResponse),
    )
)]
pub async fn update_recipient_status(
    State(state): State<ManagementState>,
    user: RequestingUser,
    Path((id, contact_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<UpdateRecipientStatusRequest>,
) -> Result<Json<RecipientStatusResponse>, ApiError> {
    state.owned_campaign(id, &user)?;
    let event = EngagementEvent::for_target(req.status).ok_or_else(|| {
        api_error(CampaignError::Validation(
            "Recipients cannot be reset to PENDING".into(),
        ))
    })?;

    let applied = apply_event(state.store.as_ref(), id, contact_id, event, Utc::now())
        .map_err(api_error)?;
    if applied.current != req.status {
        return Err(api_error(CampaignError::InvalidState(format!(
            "Cannot move recipient from {} to {}",
            applied.current.as_str(),
            req.status.as_str()
        ))));
    }

    if applied.changed {
        state
            .activities
            .append(
                id,
                event.activity_type(),
                format!("Recipient status set to {}", req.status.as_str()),
                serde_json::json!({
                    "contactId": contact_id,
                    "previousStatus": applied.previous,
                    "updatedBy": user.id(),
                }),
            )
            .map_err(api_error)?;
    }

    Ok(Json(RecipientStatusResponse {
        message: "Campaign contact status updated".to_string(),
        status: applied.current,
        changed: applied.changed,
    }))
}

#[utoipa::path(
    post,
    path = "/contacts",
    tag = "Recipients",
    request_body = UpsertContactRequest,
    responses(
        (status = 201, description = "Contact stored", body = Contact),
        (status = 400, description = "Invalid contact", body = ErrorResponse),
    )
)]
pub async fn upsert_contact(
    State(state): State<ManagementState>,
    _user: RequestingUser,
    Json(req): Json<UpsertContactRequest>,
) -> Result<(StatusCode, Json<Contact>), ApiError> {
    let email = req.email.map(|e| e.trim().to_string()).filter(|e| !e.is_empty());
    if email.as_deref().is_some_and(|e| !e.contains('@')) {
        return Err(api_error(CampaignError::Validation(
            "Invalid email address".into(),
        )));
    }

    let contact = state
        .store
        .upsert_contact(Contact {
            id: req.id.unwrap_or_else(Uuid::new_v4),
            first_name: req.first_name,
            last_name: req.last_name,
            email,
        })
        .map_err(api_error)?;
    Ok((StatusCode::CREATED, Json(contact)))
}

// ─── Metrics ───────────────────────────────────────────────────────────────

#[utoipa::path(
    get,
    path = "/campaigns/{id}/metrics",
    tag = "Metrics",
    params(("id" = Uuid, Path, description = "Campaign id")),
    responses(
        (status = 200, description = "Live metrics, rates and snapshot history", body = CampaignMetricsView),
        (status = 404, description = "Campaign not found", body = ErrorResponse),
    )
)]
pub async fn campaign_metrics(
    State(state): State<ManagementState>,
    user: RequestingUser,
    Path(id): Path<Uuid>,
) -> Result<Json<CampaignMetricsView>, ApiError> {
    let campaign = state.owned_campaign(id, &user)?;
    state
        .aggregator
        .campaign_metrics(campaign)
        .map(Json)
        .map_err(api_error)
}

#[utoipa::path(
    post,
    path = "/campaigns/{id}/metrics",
    tag = "Metrics",
    params(("id" = Uuid, Path, description = "Campaign id")),
    request_body = ManualSnapshotRequest,
    responses(
        (status = 201, description = "Snapshot recorded", body = MetricSnapshot),
        (status = 404, description = "Campaign not found", body = ErrorResponse),
    )
)]
pub async fn record_snapshot(
    State(state): State<ManagementState>,
    user: RequestingUser,
    Path(id): Path<Uuid>,
    Json(req): Json<ManualSnapshotRequest>,
) -> Result<(StatusCode, Json<MetricSnapshot>), ApiError> {
    state.owned_campaign(id, &user)?;
    let snapshot = state
        .aggregator
        .record_manual_snapshot(id, req)
        .map_err(api_error)?;
    Ok((StatusCode::CREATED, Json(snapshot)))
}

#[utoipa::path(
    get,
    path = "/analytics/dashboard",
    tag = "Metrics",
    responses((status = 200, description = "Owner-wide dashboard", body = DashboardView))
)]
pub async fn dashboard(
    State(state): State<ManagementState>,
    user: RequestingUser,
) -> Result<Json<DashboardView>, ApiError> {
    state.aggregator.dashboard(user.id()).map(Json).map_err(api_error)
}

// ─── Activities ────────────────────────────────────────────────────────────

#[utoipa::path(
    get,
    path = "/campaigns/{id}/activities",
    tag = "Activities",
    params(("id" = Uuid, Path, description = "Campaign id")),
    responses(
        (status = 200, description = "Most recent activities, newest first", body = [Activity]),
        (status = 404, description = "Campaign not found", body = ErrorResponse),
    )
)]
pub async fn list_activities(
    State(state): State<ManagementState>,
    user: RequestingUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Activity>>, ApiError> {
    state.owned_campaign(id, &user)?;
    state
        .activities
        .recent(id, CAMPAIGN_ACTIVITY_LIMIT)
        .map(Json)
        .map_err(api_error)
}

#[utoipa::path(
    post,
    path = "/campaigns/{id}/activities",
    tag = "Activities",
    params(("id" = Uuid, Path, description = "Campaign id")),
    request_body = CreateActivityRequest,
    responses(
        (status = 201, description = "Activity appended", body = Activity),
        (status = 404, description = "Campaign not found", body = ErrorResponse),
    )
)]
pub async fn create_activity(
    State(state): State<ManagementState>,
    user: RequestingUser,
    Path(id): Path<Uuid>,
    Json(req): Json<CreateActivityRequest>,
) -> Result<(StatusCode, Json<Activity>), ApiError> {
    state.owned_campaign(id, &user)?;
    if req.description.trim().is_empty() {
        return Err(api_error(CampaignError::Validation(
            "Activity description is required".into(),
        )));
    }
    let activity = state
        .activities
        .append(
            id,
            req.activity_type,
            req.description,
            req.metadata.unwrap_or_else(|| serde_json::json!({})),
        )
        .map_err(api_error)?;
    Ok((StatusCode::CREATED, Json(activity)))
}
