//! Campaign API router: campaigns, recipients, metrics and activities.

use axum::routing::{get, patch, post};
use axum::Router;

use crate::handlers::{self, ManagementState};

/// Build the management router. Every route requires the `x-user-id` header.
pub fn management_router(state: ManagementState) -> Router {
    Router::new()
        // Campaigns
        .route("/campaigns", get(handlers::list_campaigns).post(handlers::create_campaign))
        .route("/campaigns/:id", get(handlers::get_campaign).put(handlers::update_campaign))
        .route("/campaigns/:id/execute", post(handlers::execute_campaign))
        // Recipients
        .route("/campaigns/:id/contacts", get(handlers::list_contacts).post(handlers::add_contacts))
        .route(
            "/campaigns/:id/contacts/:contact_id",
            patch(handlers::update_recipient_status).delete(handlers::remove_contact),
        )
        .route("/contacts", post(handlers::upsert_contact))
        // Metrics
        .route("/campaigns/:id/metrics", get(handlers::campaign_metrics).post(handlers::record_snapshot))
        .route("/analytics/dashboard", get(handlers::dashboard))
        // Activities
        .route("/campaigns/:id/activities", get(handlers::list_activities).post(handlers::create_activity))
        .with_state(state)
}
