//! Social platform publishers.
//!
//! Facebook (Graph API page feed) and LinkedIn (UGC posts) are published
//! over HTTP when credentials are configured. Twitter/X and Instagram are
//! development-mode only and log the post.

use std::str::FromStr;

use campaign_core::config::SocialConfig;
use campaign_core::CampaignError;
use serde::Serialize;
use tracing::{info, warn};

use crate::dispatcher::DispatchOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SocialPlatform {
    Facebook,
    Linkedin,
    Twitter,
    Instagram,
}

impl SocialPlatform {
    pub fn name(&self) -> &'static str {
        match self {
            SocialPlatform::Facebook => "facebook",
            SocialPlatform::Linkedin => "linkedin",
            SocialPlatform::Twitter => "twitter",
            SocialPlatform::Instagram => "instagram",
        }
    }
}

impl FromStr for SocialPlatform {
    type Err = CampaignError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "FACEBOOK" => Ok(SocialPlatform::Facebook),
            "LINKEDIN" => Ok(SocialPlatform::Linkedin),
            "TWITTER" | "X" => Ok(SocialPlatform::Twitter),
            "INSTAGRAM" => Ok(SocialPlatform::Instagram),
            _ => Err(CampaignError::UnsupportedChannel(format!(
                "Unsupported platform: {s}"
            ))),
        }
    }
}

pub struct SocialPublisher {
    config: SocialConfig,
    http: reqwest::Client,
}

impl SocialPublisher {
    pub fn new(config: SocialConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    pub async fn publish(&self, platform: SocialPlatform, content: &str) -> DispatchOutcome {
        let provider = platform.name();
        let result = match platform {
            SocialPlatform::Facebook => {
                match (&self.config.facebook_page_id, &self.config.facebook_access_token) {
                    (Some(page_id), Some(token)) => {
                        Some(self.post_to_facebook(page_id, token, content).await)
                    }
                    _ => None,
                }
            }
            SocialPlatform::Linkedin => match &self.config.linkedin_access_token {
                Some(token) => Some(self.post_to_linkedin(token, content).await),
                None => None,
            },
            SocialPlatform::Twitter | SocialPlatform::Instagram => None,
        };

        match result {
            None => {
                info!(platform = provider, content = %content, "Social post (dev mode)");
                DispatchOutcome::fallback(provider)
            }
            Some(Ok(post_id)) => {
                info!(platform = provider, post_id = ?post_id, "Social post published");
                DispatchOutcome::delivered(provider, post_id)
            }
            Some(Err(error)) => {
                warn!(platform = provider, error = %error, "Social post failed");
                DispatchOutcome::failed(Some(provider), false, error)
            }
        }
    }

    async fn post_to_facebook(
        &self,
        page_id: &str,
        token: &str,
        content: &str,
    ) -> Result<Option<String>, String> {
        let url = format!(
            "{}/{}/feed",
            self.config.graph_base_url.trim_end_matches('/'),
            page_id
        );
        let resp = self
            .http
            .post(&url)
            .query(&[("message", content), ("access_token", token)])
            .send()
            .await
            .map_err(|e| format!("Facebook posting failed: {e}"))?;
        read_post_id(resp, "Facebook").await
    }

    async fn post_to_linkedin(&self, token: &str, content: &str) -> Result<Option<String>, String> {
        let author = self
            .config
            .linkedin_author_urn
            .clone()
            .ok_or_else(|| "LinkedIn posting failed: author URN not configured".to_string())?;
        let body = serde_json::json!({
            "author": author,
            "lifecycleState": "PUBLISHED",
            "specificContent": {
                "com.linkedin.ugc.ShareContent": {
                    "shareCommentary": {"text": content},
                    "shareMediaCategory": "NONE"
                }
            },
            "visibility": {
                "com.linkedin.ugc.MemberNetworkVisibility": "PUBLIC"
            }
        });
        let url = format!("{}/ugcPosts", self.config.linkedin_base_url.trim_end_matches('/'));
        let resp = self
            .http
            .post(&url)
            .bearer_auth(token)
            .header("X-Restli-Protocol-Version", "2.0.0")
            .json(&body)
            .send()
            .await
            .map_err(|e| format!("LinkedIn posting failed: {e}"))?;
        read_post_id(resp, "LinkedIn").await
    }
}

async fn read_post_id(resp: reqwest::Response, platform: &str) -> Result<Option<String>, String> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(format!("{platform} posting failed: {status} {body}"));
    }
    let json: serde_json::Value = resp.json().await.unwrap_or_default();
    Ok(json.get("id").and_then(|v| v.as_str()).map(str::to_string))
}
