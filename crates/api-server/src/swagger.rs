//! OpenAPI specification and Swagger UI configuration.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Campaign CRM API",
        version = "0.1.0",
        description = "Campaign execution and engagement tracking.\n\nLaunches email and social campaigns, tracks opens, clicks and conversions, and reports funnel metrics.",
        license(name = "MIT"),
    ),
    tags(
        (name = "Campaigns", description = "Campaign CRUD and launch"),
        (name = "Recipients", description = "Contact directory and campaign recipients"),
        (name = "Metrics", description = "Live funnel metrics, snapshots and dashboard"),
        (name = "Activities", description = "Campaign activity timeline"),
        (name = "Tracking", description = "Open beacons, click redirects, conversions and provider webhooks"),
        (name = "Operations", description = "Health, readiness, and liveness probes"),
    ),
    paths(
        // Campaigns
        campaign_management::handlers::create_campaign,
        campaign_management::handlers::list_campaigns,
        campaign_management::handlers::get_campaign,
        campaign_management::handlers::update_campaign,
        campaign_management::handlers::execute_campaign,
        // Recipients
        campaign_management::handlers::add_contacts,
        campaign_management::handlers::list_contacts,
        campaign_management::handlers::update_recipient_status,
        campaign_management::handlers::remove_contact,
        campaign_management::handlers::upsert_contact,
        // Metrics
        campaign_management::handlers::campaign_metrics,
        campaign_management::handlers::record_snapshot,
        campaign_management::handlers::dashboard,
        // Activities
        campaign_management::handlers::list_activities,
        campaign_management::handlers::create_activity,
        // Tracking
        campaign_tracking::handlers::track_open,
        campaign_tracking::handlers::track_click,
        campaign_tracking::handlers::track_conversion,
        campaign_tracking::handlers::track_unsubscribe,
        campaign_tracking::handlers::tracking_stats,
        campaign_tracking::handlers::email_events_webhook,
        // Operations
        crate::rest::health_check,
        crate::rest::readiness,
        crate::rest::liveness,
    ),
    components(schemas(
        // Domain types
        campaign_core::types::Campaign,
        campaign_core::types::CampaignType,
        campaign_core::types::CampaignStatus,
        campaign_core::types::Contact,
        campaign_core::types::RecipientStatus,
        campaign_core::types::RecipientLink,
        campaign_core::types::ActivityType,
        campaign_core::types::Activity,
        campaign_core::types::FunnelCounts,
        campaign_core::types::FunnelRates,
        campaign_core::types::MetricSnapshot,
        // Management bodies
        campaign_management::models::ErrorResponse,
        campaign_management::models::CreateCampaignRequest,
        campaign_management::models::UpdateCampaignRequest,
        campaign_management::models::LaunchResponse,
        campaign_management::models::AddContactsRequest,
        campaign_management::models::AddContactsResponse,
        campaign_management::models::MessageResponse,
        campaign_management::models::UpdateRecipientStatusRequest,
        campaign_management::models::RecipientStatusResponse,
        campaign_management::models::UpsertContactRequest,
        campaign_management::models::CreateActivityRequest,
        // Reporting
        campaign_reporting::CampaignMetricsView,
        campaign_reporting::ManualSnapshotRequest,
        campaign_reporting::DashboardView,
        campaign_reporting::OverallMetrics,
        campaign_reporting::StatusCount,
        campaign_reporting::ActivityWithCampaign,
        campaign_reporting::CampaignPerformance,
        // Tracking
        campaign_tracking::ProviderEvent,
        campaign_tracking::ProviderEventKind,
        campaign_tracking::TrackingStats,
        campaign_tracking::gateway::RecipientStatusCount,
        campaign_tracking::handlers::ConversionRequest,
        campaign_tracking::handlers::ConversionResponse,
        campaign_tracking::handlers::WebhookResponse,
        // Operations
        crate::rest::HealthResponse,
    ))
)]
pub struct ApiDoc;
