use axum::routing::{get, post};
use axum::Router;

use crate::gateway::TrackingGateway;
use crate::handlers;

/// Tracking routes. Only the conversion endpoint requires a requesting user.
pub fn tracking_router(gateway: TrackingGateway) -> Router {
    Router::new()
        .route("/track/open/:campaign_id/:contact_id", get(handlers::track_open))
        .route("/track/click/:campaign_id/:contact_id", get(handlers::track_click))
        .route("/track/convert/:campaign_id/:contact_id", post(handlers::track_conversion))
        .route("/track/unsubscribe/:campaign_id/:contact_id", get(handlers::track_unsubscribe))
        .route("/track/stats/:campaign_id", get(handlers::tracking_stats))
        .route("/webhooks/email-events", post(handlers::email_events_webhook))
        .with_state(gateway)
}
