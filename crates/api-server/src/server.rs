//! API server: wires the store, dispatcher, orchestrator and tracking
//! gateway into one HTTP router.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::routing::get;
use axum::Router;
use campaign_channels::{ChannelDispatcher, ProviderChainResolver, ProviderSettingsSource, SocialPublisher};
use campaign_core::config::AppConfig;
use campaign_management::{management_router, BatchExecutor, CampaignOrchestrator, ManagementState};
use campaign_store::CampaignStore;
use campaign_tracking::{tracking_router, TrackingGateway};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::rest::{self, AppState};
use crate::swagger::ApiDoc;

pub struct ApiServer {
    config: AppConfig,
    store: Arc<dyn CampaignStore>,
    provider_settings: Arc<dyn ProviderSettingsSource>,
}

impl ApiServer {
    pub fn new(
        config: AppConfig,
        store: Arc<dyn CampaignStore>,
        provider_settings: Arc<dyn ProviderSettingsSource>,
    ) -> Self {
        Self {
            config,
            store,
            provider_settings,
        }
    }

    /// Build the full application router and start the launch worker pool.
    /// Must be called from within a tokio runtime.
    pub fn router(&self) -> Router {
        let execution = self.config.execution.clone();

        let dispatcher = Arc::new(ChannelDispatcher::new(
            Duration::from_millis(execution.send_timeout_ms),
            SocialPublisher::new(self.config.social.clone()),
        ));
        let resolver = Arc::new(ProviderChainResolver::new(
            self.config.email.clone(),
            self.provider_settings.clone(),
        ));
        let executor = Arc::new(BatchExecutor::new(
            self.store.clone(),
            dispatcher,
            resolver,
            execution.clone(),
            self.config.email.default_subject.clone(),
        ));
        let orchestrator = Arc::new(CampaignOrchestrator::start(
            self.store.clone(),
            executor,
            execution.worker_count,
        ));

        let probes = Router::new()
            .route("/health", get(rest::health_check))
            .route("/ready", get(rest::readiness))
            .route("/live", get(rest::liveness))
            .with_state(AppState {
                store: self.store.clone(),
                start_time: Instant::now(),
            });

        Router::new()
            .merge(probes)
            .merge(management_router(ManagementState::new(
                self.store.clone(),
                orchestrator,
            )))
            .merge(tracking_router(TrackingGateway::new(self.store.clone())))
            .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
            .layer(CompressionLayer::new())
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
    }

    /// Start the HTTP REST server.
    pub async fn start_http(&self) -> anyhow::Result<()> {
        let app = self.router();

        let addr = SocketAddr::new(self.config.api.host.parse()?, self.config.api.http_port);
        info!(
            addr = %addr,
            workers = self.config.execution.worker_count,
            tracking_base_url = %self.config.execution.tracking_base_url,
            "Starting HTTP server"
        );

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;
        Ok(())
    }

    /// Start the Prometheus exporter on the metrics port.
    pub async fn start_metrics(&self) -> anyhow::Result<()> {
        metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(SocketAddr::new(
                self.config.api.host.parse()?,
                self.config.metrics.port,
            ))
            .install()?;

        info!(port = self.config.metrics.port, "Metrics exporter started");
        Ok(())
    }
}
