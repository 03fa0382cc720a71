//! Request and response bodies for the campaign REST API.

use axum::http::StatusCode;
use axum::Json;
use campaign_core::types::{ActivityType, CampaignStatus, CampaignType, RecipientStatus};
use campaign_core::CampaignError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::ToSchema;
use uuid::Uuid;

// ─── Errors ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

/// Map a domain error onto an HTTP response. Server-side failures are
/// logged and replaced by a generic message.
pub fn api_error(err: CampaignError) -> ApiError {
    let status = match &err {
        CampaignError::NotFound(_) => StatusCode::NOT_FOUND,
        CampaignError::Validation(_)
        | CampaignError::InvalidState(_)
        | CampaignError::NoRecipients(_)
        | CampaignError::UnsupportedChannel(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let message = if err.is_client_error() {
        match &err {
            CampaignError::Validation(m)
            | CampaignError::NotFound(m)
            | CampaignError::InvalidState(m)
            | CampaignError::NoRecipients(m)
            | CampaignError::UnsupportedChannel(m) => m.clone(),
            other => other.to_string(),
        }
    } else {
        error!(error = %err, "Request failed");
        "Internal server error".to_string()
    };

    (
        status,
        Json(ErrorResponse {
            error: err.code().to_string(),
            message,
        }),
    )
}

// ─── Campaigns ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCampaignRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub campaign_type: CampaignType,
    #[serde(default)]
    pub status: Option<CampaignStatus>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub budget: Option<f64>,
    pub email_subject: Option<String>,
    pub email_content: Option<String>,
    pub social_platform: Option<String>,
    pub social_content: Option<String>,
    /// Contacts to link as PENDING recipients right away.
    #[serde(default)]
    pub contact_ids: Vec<Uuid>,
}

/// Partial update. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCampaignRequest {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub campaign_type: Option<CampaignType>,
    pub status: Option<CampaignStatus>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub budget: Option<f64>,
    pub email_subject: Option<String>,
    pub email_content: Option<String>,
    pub social_platform: Option<String>,
    pub social_content: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LaunchResponse {
    pub success: bool,
    pub message: String,
    pub recipient_count: usize,
}

// ─── Recipients ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddContactsRequest {
    pub contact_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AddContactsResponse {
    pub message: String,
    pub added: usize,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateRecipientStatusRequest {
    pub status: RecipientStatus,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecipientStatusResponse {
    pub message: String,
    pub status: RecipientStatus,
    pub changed: bool,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpsertContactRequest {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

// ─── Activities ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateActivityRequest {
    #[serde(default = "default_activity_type")]
    pub activity_type: ActivityType,
    pub description: String,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub metadata: Option<serde_json::Value>,
}

fn default_activity_type() -> ActivityType {
    ActivityType::Note
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_keep_their_message() {
        let (status, Json(body)) =
            api_error(CampaignError::InvalidState("Campaign is already active".into()));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "invalid_state");
        assert_eq!(body.message, "Campaign is already active");
    }

    #[test]
    fn test_server_errors_are_masked() {
        let (status, Json(body)) = api_error(CampaignError::Storage("disk on fire".into()));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.message, "Internal server error");
    }

    #[test]
    fn test_not_found_maps_to_404() {
        let (status, _) = api_error(CampaignError::NotFound("Campaign not found".into()));
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
