//! Channel dispatch: walks an email provider chain under a per-attempt
//! timeout and routes social posts to the matching publisher.

use std::time::Duration;

use campaign_core::types::CampaignType;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::providers::{EmailMessage, ProviderChain, SendError};
use crate::social::{SocialPlatform, SocialPublisher};

/// Result of one delivery attempt. Failures are reported here rather than
/// returned as errors so a batch can keep going.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DispatchOutcome {
    pub ok: bool,
    pub provider_used: Option<String>,
    /// Some provider was skipped as unconfigured or unreachable, or the
    /// message only went to the development log.
    pub provider_unavailable: bool,
    pub message_id: Option<String>,
    pub error: Option<String>,
}

impl DispatchOutcome {
    pub fn delivered(provider: &str, message_id: Option<String>) -> Self {
        Self {
            ok: true,
            provider_used: Some(provider.to_string()),
            message_id,
            ..Default::default()
        }
    }

    pub fn fallback(provider: &str) -> Self {
        Self {
            ok: true,
            provider_used: Some(provider.to_string()),
            provider_unavailable: true,
            ..Default::default()
        }
    }

    pub fn failed(provider: Option<&str>, provider_unavailable: bool, error: impl Into<String>) -> Self {
        Self {
            ok: false,
            provider_used: provider.map(str::to_string),
            provider_unavailable,
            message_id: None,
            error: Some(error.into()),
        }
    }
}

/// Routes a payload to its channel. Email walks the provider chain, social
/// posts go to a single platform.
pub struct ChannelDispatcher {
    send_timeout: Duration,
    social: SocialPublisher,
}

impl ChannelDispatcher {
    pub fn new(send_timeout: Duration, social: SocialPublisher) -> Self {
        Self {
            send_timeout,
            social,
        }
    }

    /// Channels the dispatcher can deliver a campaign of this type on.
    pub fn supports(campaign_type: CampaignType) -> bool {
        matches!(campaign_type, CampaignType::Email | CampaignType::SocialMedia)
    }

    pub async fn send_email(&self, message: &EmailMessage, chain: &ProviderChain) -> DispatchOutcome {
        let mut skipped = false;

        for provider in chain {
            let name = provider.name();
            let attempt = tokio::time::timeout(self.send_timeout, provider.send(message)).await;

            match attempt {
                Err(_) => {
                    metrics::counter!("dispatch.failed", "provider" => name).increment(1);
                    warn!(provider = name, to = %message.to, "Email send timed out");
                    return DispatchOutcome::failed(
                        Some(name),
                        skipped,
                        format!("{name} timed out after {}ms", self.send_timeout.as_millis()),
                    );
                }
                Ok(Ok(message_id)) => {
                    metrics::counter!("dispatch.sent", "provider" => name).increment(1);
                    debug!(provider = name, to = %message.to, "Email sent");
                    let mut outcome = DispatchOutcome::delivered(name, message_id);
                    outcome.provider_unavailable = skipped || provider.is_fallback();
                    return outcome;
                }
                Ok(Err(SendError::Unavailable(reason))) => {
                    warn!(provider = name, reason = %reason, "Email provider unavailable, trying next");
                    skipped = true;
                }
                Ok(Err(SendError::Rejected(reason))) => {
                    metrics::counter!("dispatch.failed", "provider" => name).increment(1);
                    warn!(provider = name, to = %message.to, reason = %reason, "Email rejected");
                    return DispatchOutcome::failed(Some(name), skipped, reason);
                }
            }
        }

        DispatchOutcome::failed(None, true, "no email provider available")
    }

    /// Publish `content` to `platform`. An unknown platform is reported as a
    /// failed outcome carrying the unsupported-channel message.
    pub async fn send_social(&self, platform: &str, content: &str) -> DispatchOutcome {
        let platform = match platform.parse::<SocialPlatform>() {
            Ok(p) => p,
            Err(e) => return DispatchOutcome::failed(None, false, e.to_string()),
        };

        let outcome = tokio::time::timeout(self.send_timeout, self.social.publish(platform, content))
            .await
            .unwrap_or_else(|_| {
                DispatchOutcome::failed(Some(platform.name()), false, "social post timed out")
            });
        let counter = if outcome.ok { "dispatch.sent" } else { "dispatch.failed" };
        metrics::counter!(counter, "provider" => platform.name()).increment(1);
        outcome
    }
}
