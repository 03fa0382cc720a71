//! Email provider seam and per-owner chain resolution.

use std::sync::Arc;

use async_trait::async_trait;
use campaign_core::config::{EmailConfig, SendGridConfig, SmtpConfig};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::email::{LogOnlyProvider, SendGridProvider, SmtpProvider};

/// A fully rendered email for one recipient.
#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub campaign_id: Uuid,
    pub contact_id: Uuid,
}

/// Why a provider did not accept a message.
#[derive(Debug, Error)]
pub enum SendError {
    /// Provider could not be reached or is not usable; the next provider in
    /// the chain gets a chance.
    #[error("provider unavailable: {0}")]
    Unavailable(String),

    /// Provider answered and refused the message. Terminal for the recipient.
    #[error("provider rejected message: {0}")]
    Rejected(String),
}

#[async_trait]
pub trait EmailProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Send one message, returning the provider message id when known.
    async fn send(&self, message: &EmailMessage) -> Result<Option<String>, SendError>;

    /// True for the development fallback that only logs.
    fn is_fallback(&self) -> bool {
        false
    }
}

/// Ordered providers tried for one owner. Always ends with the log-only
/// fallback.
pub type ProviderChain = Vec<Arc<dyn EmailProvider>>;

// ─── Per-user settings ──────────────────────────────────────────────────────

/// Integration credentials a user saved for their own campaigns.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSettings {
    pub sendgrid_api_key: Option<String>,
    pub sendgrid_from_email: Option<String>,
    pub sendgrid_from_name: Option<String>,
    pub smtp_host: Option<String>,
    pub smtp_port: Option<u16>,
    pub smtp_user: Option<String>,
    pub smtp_pass: Option<String>,
}

/// Source of per-user provider settings. Storage and encryption of these
/// credentials live outside this crate.
pub trait ProviderSettingsSource: Send + Sync {
    fn settings_for(&self, user_id: &str) -> Option<ProviderSettings>;
}

#[derive(Default)]
pub struct InMemoryProviderSettings {
    settings: DashMap<String, ProviderSettings>,
}

impl InMemoryProviderSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, user_id: impl Into<String>, settings: ProviderSettings) {
        self.settings.insert(user_id.into(), settings);
    }
}

impl ProviderSettingsSource for InMemoryProviderSettings {
    fn settings_for(&self, user_id: &str) -> Option<ProviderSettings> {
        self.settings.get(user_id).map(|r| r.value().clone())
    }
}

// ─── Chain resolution ───────────────────────────────────────────────────────

const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
const DEFAULT_SMTP_PORT: u16 = 587;

/// Builds the provider chain for a campaign owner: the owner's SendGrid,
/// the owner's SMTP, the globally configured providers, then log-only.
pub struct ProviderChainResolver {
    config: EmailConfig,
    settings: Arc<dyn ProviderSettingsSource>,
    http: reqwest::Client,
}

impl ProviderChainResolver {
    pub fn new(config: EmailConfig, settings: Arc<dyn ProviderSettingsSource>) -> Self {
        Self {
            config,
            settings,
            http: reqwest::Client::new(),
        }
    }

    pub fn resolve(&self, owner_id: &str) -> ProviderChain {
        let mut chain: ProviderChain = Vec::new();

        if let Some(user) = self.settings.settings_for(owner_id) {
            if let Some(api_key) = user.sendgrid_api_key.clone().filter(|k| !k.is_empty()) {
                chain.push(Arc::new(SendGridProvider::new(
                    self.http.clone(),
                    &self.config.sendgrid_base_url,
                    SendGridConfig {
                        api_key,
                        from_email: user.sendgrid_from_email.clone(),
                        from_name: user.sendgrid_from_name.clone(),
                    },
                    &self.config,
                )));
            }
            if let (Some(username), Some(password)) = (user.smtp_user.clone(), user.smtp_pass.clone())
            {
                chain.push(Arc::new(SmtpProvider::new(
                    SmtpConfig {
                        host: user
                            .smtp_host
                            .clone()
                            .unwrap_or_else(|| DEFAULT_SMTP_HOST.to_string()),
                        port: user.smtp_port.unwrap_or(DEFAULT_SMTP_PORT),
                        from_email: Some(username.clone()),
                        username: Some(username),
                        password: Some(password),
                    },
                    user.sendgrid_from_name.as_deref().unwrap_or(&self.config.from_name),
                    &self.config.from_email,
                )));
            }
        }

        if let Some(sendgrid) = &self.config.sendgrid {
            chain.push(Arc::new(SendGridProvider::new(
                self.http.clone(),
                &self.config.sendgrid_base_url,
                sendgrid.clone(),
                &self.config,
            )));
        }
        if let Some(smtp) = &self.config.smtp {
            chain.push(Arc::new(SmtpProvider::new(
                smtp.clone(),
                &self.config.from_name,
                &self.config.from_email,
            )));
        }

        chain.push(Arc::new(LogOnlyProvider));

        debug!(
            owner_id = %owner_id,
            providers = ?chain.iter().map(|p| p.name()).collect::<Vec<_>>(),
            "Provider chain resolved"
        );
        chain
    }
}
