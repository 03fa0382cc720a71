use serde::Deserialize;

/// Root application configuration. Loaded from an optional TOML file and
/// environment variables with the prefix `CAMPAIGN_CRM__`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub execution: ExecutionConfig,
    #[serde(default)]
    pub email: EmailConfig,
    #[serde(default)]
    pub social: SocialConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

/// Launch worker pool and batch pacing.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionConfig {
    #[serde(default = "default_send_delay_ms")]
    pub send_delay_ms: u64,
    #[serde(default = "default_send_timeout_ms")]
    pub send_timeout_ms: u64,
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,
    /// Public origin that tracking links and beacons point back to.
    #[serde(default = "default_tracking_base_url")]
    pub tracking_base_url: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_http_port() -> u16 {
    8080
}
fn default_metrics_port() -> u16 {
    9091
}
fn default_send_delay_ms() -> u64 {
    100
}
fn default_send_timeout_ms() -> u64 {
    10_000
}
fn default_worker_count() -> usize {
    4
}
fn default_tracking_base_url() -> String {
    "http://localhost:8080".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            http_port: default_http_port(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            port: default_metrics_port(),
        }
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            send_delay_ms: default_send_delay_ms(),
            send_timeout_ms: default_send_timeout_ms(),
            worker_count: default_worker_count(),
            tracking_base_url: default_tracking_base_url(),
        }
    }
}

// ─── Email Config ───────────────────────────────────────────────────────────

/// Global email defaults. Per-user provider settings take precedence over
/// the `sendgrid` and `smtp` blocks here.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    #[serde(default = "default_from_email")]
    pub from_email: String,
    #[serde(default = "default_from_name")]
    pub from_name: String,
    #[serde(default = "default_subject")]
    pub default_subject: String,
    #[serde(default = "default_sendgrid_base_url")]
    pub sendgrid_base_url: String,
    #[serde(default)]
    pub sendgrid: Option<SendGridConfig>,
    #[serde(default)]
    pub smtp: Option<SmtpConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SendGridConfig {
    pub api_key: String,
    #[serde(default)]
    pub from_email: Option<String>,
    #[serde(default)]
    pub from_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub from_email: Option<String>,
}

fn default_from_email() -> String {
    "noreply@crm.local".to_string()
}
fn default_from_name() -> String {
    "CRM".to_string()
}
fn default_subject() -> String {
    "Campaign Update".to_string()
}
fn default_sendgrid_base_url() -> String {
    "https://api.sendgrid.com".to_string()
}
fn default_smtp_port() -> u16 {
    587
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            from_email: default_from_email(),
            from_name: default_from_name(),
            default_subject: default_subject(),
            sendgrid_base_url: default_sendgrid_base_url(),
            sendgrid: None,
            smtp: None,
        }
    }
}

// ─── Social Config ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct SocialConfig {
    #[serde(default)]
    pub facebook_page_id: Option<String>,
    #[serde(default)]
    pub facebook_access_token: Option<String>,
    #[serde(default)]
    pub linkedin_access_token: Option<String>,
    /// Author URN posts are published as, e.g. `urn:li:organization:123`.
    #[serde(default)]
    pub linkedin_author_urn: Option<String>,
    #[serde(default = "default_graph_base_url")]
    pub graph_base_url: String,
    #[serde(default = "default_linkedin_base_url")]
    pub linkedin_base_url: String,
}

fn default_graph_base_url() -> String {
    "https://graph.facebook.com/v18.0".to_string()
}
fn default_linkedin_base_url() -> String {
    "https://api.linkedin.com/v2".to_string()
}

impl Default for SocialConfig {
    fn default() -> Self {
        Self {
            facebook_page_id: None,
            facebook_access_token: None,
            linkedin_access_token: None,
            linkedin_author_urn: None,
            graph_base_url: default_graph_base_url(),
            linkedin_base_url: default_linkedin_base_url(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            metrics: MetricsConfig::default(),
            execution: ExecutionConfig::default(),
            email: EmailConfig::default(),
            social: SocialConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and an optional config
    /// file. A missing file is not an error.
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let file = path.unwrap_or("config/campaign-crm");
        let builder = config::Config::builder()
            .add_source(config::File::with_name(file).required(path.is_some()))
            .add_source(
                config::Environment::with_prefix("CAMPAIGN_CRM")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.execution.send_delay_ms, 100);
        assert_eq!(config.execution.send_timeout_ms, 10_000);
        assert_eq!(config.execution.worker_count, 4);
        assert_eq!(config.execution.tracking_base_url, "http://localhost:8080");
        assert!(config.email.sendgrid.is_none());
    }

    #[test]
    fn test_partial_document_fills_defaults() {
        let config: AppConfig = serde_json::from_str(
            r#"{"execution": {"worker_count": 2}, "email": {"smtp": {"host": "mail.local"}}}"#,
        )
        .unwrap();
        assert_eq!(config.execution.worker_count, 2);
        assert_eq!(config.execution.send_delay_ms, 100);
        let smtp = config.email.smtp.unwrap();
        assert_eq!(smtp.port, 587);
        assert_eq!(config.api.http_port, 8080);
    }
}
