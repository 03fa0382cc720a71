//! Campaign CRM: campaign execution and engagement tracking service.
//!
//! Main entry point that loads configuration, wires the store and provider
//! settings, and starts the HTTP and metrics servers.

use std::sync::Arc;

use campaign_api::ApiServer;
use campaign_channels::InMemoryProviderSettings;
use campaign_core::config::AppConfig;
use campaign_store::InMemoryStore;
use clap::Parser;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "campaign-crm")]
#[command(about = "Campaign execution and engagement tracking service")]
#[command(version)]
struct Cli {
    /// Configuration file (TOML). Defaults to config/campaign-crm.toml if present.
    #[arg(long, short)]
    config: Option<String>,

    /// Bind address (overrides config)
    #[arg(long, env = "CAMPAIGN_CRM__API__HOST")]
    host: Option<String>,

    /// HTTP port (overrides config)
    #[arg(long, env = "CAMPAIGN_CRM__API__HTTP_PORT")]
    http_port: Option<u16>,

    /// Number of launch workers (overrides config)
    #[arg(long, env = "CAMPAIGN_CRM__EXECUTION__WORKER_COUNT")]
    workers: Option<usize>,

    /// Public base URL embedded in tracking links (overrides config)
    #[arg(long, env = "CAMPAIGN_CRM__EXECUTION__TRACKING_BASE_URL")]
    tracking_base_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "campaign_crm=info,campaign_management=info,campaign_tracking=info,tower_http=info"
                    .into()
            }),
        )
        .json()
        .init();

    let cli = Cli::parse();

    info!("Campaign CRM starting up");

    let mut config = match AppConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) if cli.config.is_some() => return Err(e.into()),
        Err(e) => {
            warn!(error = %e, "Failed to load config, using defaults");
            AppConfig::default()
        }
    };

    if let Some(host) = cli.host {
        config.api.host = host;
    }
    if let Some(port) = cli.http_port {
        config.api.http_port = port;
    }
    if let Some(workers) = cli.workers {
        config.execution.worker_count = workers;
    }
    if let Some(url) = cli.tracking_base_url {
        config.execution.tracking_base_url = url;
    }

    info!(
        host = %config.api.host,
        http_port = config.api.http_port,
        metrics_port = config.metrics.port,
        workers = config.execution.worker_count,
        send_delay_ms = config.execution.send_delay_ms,
        sendgrid = config.email.sendgrid.is_some(),
        smtp = config.email.smtp.is_some(),
        "Configuration loaded"
    );

    let api_server = ApiServer::new(
        config,
        Arc::new(InMemoryStore::new()),
        Arc::new(InMemoryProviderSettings::new()),
    );

    if let Err(e) = api_server.start_metrics().await {
        error!(error = %e, "Failed to start metrics exporter");
    }

    info!("Campaign CRM is ready to serve traffic");
    api_server.start_http().await?;

    Ok(())
}
