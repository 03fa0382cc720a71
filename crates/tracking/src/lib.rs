//! Engagement tracking gateway: open beacons, click redirects, conversions,
//! unsubscribes and provider webhooks.

pub mod gateway;
pub mod handlers;
pub mod router;

pub use gateway::{ProviderEvent, ProviderEventKind, TrackingGateway, TrackingStats};
pub use router::tracking_router;
