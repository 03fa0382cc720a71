//! Outbound channel delivery.
//!
//! Email goes through an ordered provider chain resolved per campaign owner
//! (SendGrid, SMTP, then a log-only development fallback). Social posts go
//! to exactly one platform publisher.

pub mod dispatcher;
pub mod email;
pub mod providers;
pub mod social;

pub use dispatcher::{ChannelDispatcher, DispatchOutcome};
pub use email::{LogOnlyProvider, SendGridProvider, SmtpProvider};
pub use providers::{
    EmailMessage, EmailProvider, InMemoryProviderSettings, ProviderChain, ProviderChainResolver,
    ProviderSettings, ProviderSettingsSource, SendError,
};
pub use social::{SocialPlatform, SocialPublisher};
