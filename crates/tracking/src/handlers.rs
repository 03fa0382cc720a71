//! Public tracking endpoints hit from recipients' mail clients, plus the
//! authenticated conversion endpoint and the provider webhook.

use std::sync::OnceLock;

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use base64::Engine;
use campaign_management::models::{api_error, ApiError};
use campaign_management::RequestingUser;
use serde::{Deserialize, Serialize};
use tracing::warn;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::gateway::{ProviderEvent, TrackingGateway, TrackingStats};

const PIXEL_GIF_BASE64: &str = "R0lGODlhAQABAIAAAAAAAP///yH5BAEAAAAALAAAAAABAAEAAAIBRAA7";

fn pixel() -> &'static [u8] {
    static PIXEL: OnceLock<Vec<u8>> = OnceLock::new();
    PIXEL.get_or_init(|| {
        base64::engine::general_purpose::STANDARD
            .decode(PIXEL_GIF_BASE64)
            .expect("valid pixel")
    })
}

fn parse_ids(campaign_id: &str, contact_id: &str) -> Option<(Uuid, Uuid)> {
    Some((campaign_id.parse().ok()?, contact_id.parse().ok()?))
}

fn header_str<'a>(headers: &'a HeaderMap, name: header::HeaderName) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

#[derive(Debug, Deserialize)]
pub struct ClickQuery {
    pub url: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ConversionRequest {
    pub value: Option<f64>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ConversionResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WebhookResponse {
    pub accepted: usize,
}

#[utoipa::path(
    get,
    path = "/track/open/{campaign_id}/{contact_id}",
    tag = "Tracking",
    params(
        ("campaign_id" = String, Path, description = "Campaign id"),
        ("contact_id" = String, Path, description = "Contact id"),
    ),
    responses((status = 200, description = "1x1 transparent GIF", content_type = "image/gif"))
)]
pub async fn track_open(
    State(gateway): State<TrackingGateway>,
    Path((campaign_id, contact_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    match parse_ids(&campaign_id, &contact_id) {
        Some((c, k)) => {
            gateway.record_open(c, k, header_str(&headers, header::USER_AGENT));
        }
        None => warn!(campaign_id = %campaign_id, contact_id = %contact_id, "Open beacon with malformed ids"),
    }

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "image/gif"),
            (header::CACHE_CONTROL, "no-store, no-cache, must-revalidate, private"),
            (header::PRAGMA, "no-cache"),
        ],
        pixel(),
    )
        .into_response()
}

#[utoipa::path(
    get,
    path = "/track/click/{campaign_id}/{contact_id}",
    tag = "Tracking",
    params(
        ("campaign_id" = String, Path, description = "Campaign id"),
        ("contact_id" = String, Path, description = "Contact id"),
        ("url" = String, Query, description = "Percent-encoded destination"),
    ),
    responses(
        (status = 302, description = "Redirect to the destination"),
        (status = 400, description = "Missing URL parameter"),
    )
)]
pub async fn track_click(
    State(gateway): State<TrackingGateway>,
    Path((campaign_id, contact_id)): Path<(String, String)>,
    Query(query): Query<ClickQuery>,
    headers: HeaderMap,
) -> Response {
    let Some(url) = query.url.filter(|u| !u.is_empty()) else {
        return (StatusCode::BAD_REQUEST, "Missing URL parameter").into_response();
    };

    match parse_ids(&campaign_id, &contact_id) {
        Some((c, k)) => {
            gateway.record_click(
                c,
                k,
                &url,
                header_str(&headers, header::USER_AGENT),
                header_str(&headers, header::REFERER),
            );
        }
        None => warn!(campaign_id = %campaign_id, contact_id = %contact_id, "Click with malformed ids"),
    }

    (StatusCode::FOUND, [(header::LOCATION, url)]).into_response()
}

#[utoipa::path(
    post,
    path = "/track/convert/{campaign_id}/{contact_id}",
    tag = "Tracking",
    params(
        ("campaign_id" = String, Path, description = "Campaign id"),
        ("contact_id" = String, Path, description = "Contact id"),
    ),
    request_body = ConversionRequest,
    responses(
        (status = 200, description = "Conversion outcome", body = ConversionResponse),
        (status = 401, description = "Missing requesting user"),
    )
)]
pub async fn track_conversion(
    State(gateway): State<TrackingGateway>,
    _user: RequestingUser,
    Path((campaign_id, contact_id)): Path<(String, String)>,
    body: Option<Json<ConversionRequest>>,
) -> Json<ConversionResponse> {
    let req = body.map(|Json(r)| r).unwrap_or_default();
    let success = parse_ids(&campaign_id, &contact_id)
        .map(|(c, k)| gateway.record_conversion(c, k, req.value, req.notes))
        .unwrap_or(false);

    Json(ConversionResponse {
        success,
        message: if success {
            "Conversion tracked".to_string()
        } else {
            "Failed to track conversion".to_string()
        },
    })
}

#[utoipa::path(
    get,
    path = "/track/unsubscribe/{campaign_id}/{contact_id}",
    tag = "Tracking",
    params(
        ("campaign_id" = String, Path, description = "Campaign id"),
        ("contact_id" = String, Path, description = "Contact id"),
    ),
    responses((status = 200, description = "Confirmation page", content_type = "text/html"))
)]
pub async fn track_unsubscribe(
    State(gateway): State<TrackingGateway>,
    Path((campaign_id, contact_id)): Path<(String, String)>,
) -> Html<&'static str> {
    match parse_ids(&campaign_id, &contact_id) {
        Some((c, k)) => {
            gateway.record_unsubscribe(c, k);
        }
        None => warn!(campaign_id = %campaign_id, contact_id = %contact_id, "Unsubscribe with malformed ids"),
    }
    Html(UNSUBSCRIBED_PAGE)
}

const UNSUBSCRIBED_PAGE: &str = "<!DOCTYPE html>\
<html><head><meta charset=\"utf-8\"><title>Unsubscribed</title></head>\
<body><h1>You have been unsubscribed</h1>\
<p>You will no longer receive emails from this campaign.</p></body></html>";

#[utoipa::path(
    get,
    path = "/track/stats/{campaign_id}",
    tag = "Tracking",
    params(("campaign_id" = Uuid, Path, description = "Campaign id")),
    responses((status = 200, description = "Status counts and recent activities", body = TrackingStats))
)]
pub async fn tracking_stats(
    State(gateway): State<TrackingGateway>,
    Path(campaign_id): Path<Uuid>,
) -> Result<Json<TrackingStats>, ApiError> {
    gateway.stats(campaign_id).map(Json).map_err(api_error)
}

#[utoipa::path(
    post,
    path = "/webhooks/email-events",
    tag = "Tracking",
    request_body = [ProviderEvent],
    responses((status = 200, description = "Events applied", body = WebhookResponse))
)]
pub async fn email_events_webhook(
    State(gateway): State<TrackingGateway>,
    Json(events): Json<Vec<ProviderEvent>>,
) -> Json<WebhookResponse> {
    Json(WebhookResponse {
        accepted: gateway.apply_provider_events(&events),
    })
}
