//! Email providers: SendGrid over HTTP, SMTP via lettre, and a log-only
//! development fallback.

use async_trait::async_trait;
use campaign_core::config::{EmailConfig, SendGridConfig, SmtpConfig};
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::response::Response as SmtpResponse;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, info};

use crate::providers::{EmailMessage, EmailProvider, SendError};

// ─── SendGrid ───────────────────────────────────────────────────────────────

/// SendGrid v3 mail-send provider. Click and open tracking are disabled on
/// the SendGrid side since bodies already carry our own tracking.
pub struct SendGridProvider {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    from_email: String,
    from_name: String,
}

impl SendGridProvider {
    pub fn new(
        http: reqwest::Client,
        base_url: &str,
        config: SendGridConfig,
        defaults: &EmailConfig,
    ) -> Self {
        Self {
            http,
            endpoint: format!("{}/v3/mail/send", base_url.trim_end_matches('/')),
            api_key: config.api_key,
            from_email: config.from_email.unwrap_or_else(|| defaults.from_email.clone()),
            from_name: config.from_name.unwrap_or_else(|| defaults.from_name.clone()),
        }
    }

    fn payload(&self, message: &EmailMessage) -> serde_json::Value {
        serde_json::json!({
            "personalizations": [{
                "to": [{"email": message.to}],
                "custom_args": {
                    "campaign_id": message.campaign_id.to_string(),
                    "contact_id": message.contact_id.to_string()
                }
            }],
            "from": {
                "email": self.from_email,
                "name": self.from_name
            },
            "subject": message.subject,
            "content": [{
                "type": "text/html",
                "value": message.html
            }],
            "tracking_settings": {
                "click_tracking": {"enable": false},
                "open_tracking": {"enable": false}
            }
        })
    }
}

#[async_trait]
impl EmailProvider for SendGridProvider {
    fn name(&self) -> &'static str {
        "sendgrid"
    }

    async fn send(&self, message: &EmailMessage) -> Result<Option<String>, SendError> {
        debug!(to = %message.to, subject = %message.subject, "Sending email via SendGrid");

        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&self.payload(message))
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    SendError::Unavailable(e.to_string())
                } else {
                    SendError::Rejected(e.to_string())
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SendError::Rejected(format!("SendGrid returned {status}: {body}")));
        }

        Ok(resp
            .headers()
            .get("x-message-id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string))
    }
}

// ─── SMTP ───────────────────────────────────────────────────────────────────

pub struct SmtpProvider {
    config: SmtpConfig,
    from_name: String,
    from_email: String,
}

impl SmtpProvider {
    pub fn new(config: SmtpConfig, from_name: &str, default_from_email: &str) -> Self {
        let from_email = config
            .from_email
            .clone()
            .unwrap_or_else(|| default_from_email.to_string());
        Self {
            config,
            from_name: from_name.to_string(),
            from_email,
        }
    }

    fn build_message(&self, message: &EmailMessage) -> Result<Message, SendError> {
        let from = Mailbox::new(
            Some(self.from_name.clone()),
            self.from_email
                .parse()
                .map_err(|e| SendError::Rejected(format!("invalid from address: {e}")))?,
        );
        let to: Mailbox = message
            .to
            .parse()
            .map_err(|e| SendError::Rejected(format!("invalid recipient address: {e}")))?;

        Message::builder()
            .from(from)
            .to(to)
            .subject(message.subject.clone())
            .header(ContentType::TEXT_HTML)
            .body(message.html.clone())
            .map_err(|e| SendError::Rejected(format!("failed to build email: {e}")))
    }
}

/// First line of the server's final reply, which usually carries the queue id.
fn smtp_message_id(response: &SmtpResponse) -> Option<String> {
    response.message().next().map(str::to_string)
}

#[async_trait]
impl EmailProvider for SmtpProvider {
    fn name(&self) -> &'static str {
        "smtp"
    }

    async fn send(&self, message: &EmailMessage) -> Result<Option<String>, SendError> {
        let email = self.build_message(message)?;

        // 465 is implicit TLS; everything else upgrades with STARTTLS.
        let builder = if self.config.port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.host)
        };
        let mut builder = builder
            .map_err(|e| SendError::Unavailable(format!("failed to create SMTP transport: {e}")))?
            .port(self.config.port);

        if let (Some(username), Some(password)) = (&self.config.username, &self.config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }
        let mailer = builder.build();

        debug!(to = %message.to, host = %self.config.host, "Sending email via SMTP");
        match mailer.send(email).await {
            Ok(response) => Ok(smtp_message_id(&response)),
            Err(e) if e.is_permanent() || e.is_transient() => Err(SendError::Rejected(e.to_string())),
            Err(e) => Err(SendError::Unavailable(e.to_string())),
        }
    }
}

// ─── Log-only fallback ──────────────────────────────────────────────────────

/// Development-mode provider: logs the message and reports success.
pub struct LogOnlyProvider;

#[async_trait]
impl EmailProvider for LogOnlyProvider {
    fn name(&self) -> &'static str {
        "development"
    }

    async fn send(&self, message: &EmailMessage) -> Result<Option<String>, SendError> {
        info!(
            to = %message.to,
            subject = %message.subject,
            campaign_id = %message.campaign_id,
            contact_id = %message.contact_id,
            "Email (dev mode, no provider configured)"
        );
        Ok(None)
    }

    fn is_fallback(&self) -> bool {
        true
    }
}
