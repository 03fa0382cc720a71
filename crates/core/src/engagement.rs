//! Recipient engagement state machine.
//!
//! Engagement only moves forward along the funnel. Tracking hits that arrive
//! late or out of order (an open after a click, a second conversion) resolve
//! to `None` and leave the stored status alone.

use serde::{Deserialize, Serialize};

use crate::types::{ActivityType, RecipientStatus};

/// Inputs that can move a recipient between statuses.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EngagementEvent {
    SendSucceeded,
    DeliveryReport,
    OpenHit,
    ClickHit,
    Convert,
    BounceReport,
    UnsubscribeRequest,
}

impl EngagementEvent {
    /// Statuses this event may leave. An empty slice means "any status".
    fn allowed_from(&self) -> &'static [RecipientStatus] {
        use RecipientStatus::*;
        match self {
            EngagementEvent::SendSucceeded => &[Pending],
            EngagementEvent::DeliveryReport => &[Sent],
            EngagementEvent::OpenHit => &[Sent, Delivered],
            EngagementEvent::ClickHit => &[Sent, Delivered, Opened],
            // Manual conversions may skip the funnel entirely.
            EngagementEvent::Convert => &[Pending, Sent, Delivered, Opened, Clicked, Bounced],
            EngagementEvent::BounceReport => &[Sent, Delivered],
            EngagementEvent::UnsubscribeRequest => &[],
        }
    }

    pub fn target(&self) -> RecipientStatus {
        match self {
            EngagementEvent::SendSucceeded => RecipientStatus::Sent,
            EngagementEvent::DeliveryReport => RecipientStatus::Delivered,
            EngagementEvent::OpenHit => RecipientStatus::Opened,
            EngagementEvent::ClickHit => RecipientStatus::Clicked,
            EngagementEvent::Convert => RecipientStatus::Converted,
            EngagementEvent::BounceReport => RecipientStatus::Bounced,
            EngagementEvent::UnsubscribeRequest => RecipientStatus::Unsubscribed,
        }
    }

    /// The event that moves a recipient into `status`. `PENDING` is only
    /// ever the initial status, so it has none.
    pub fn for_target(status: RecipientStatus) -> Option<Self> {
        match status {
            RecipientStatus::Pending => None,
            RecipientStatus::Sent => Some(EngagementEvent::SendSucceeded),
            RecipientStatus::Delivered => Some(EngagementEvent::DeliveryReport),
            RecipientStatus::Opened => Some(EngagementEvent::OpenHit),
            RecipientStatus::Clicked => Some(EngagementEvent::ClickHit),
            RecipientStatus::Converted => Some(EngagementEvent::Convert),
            RecipientStatus::Bounced => Some(EngagementEvent::BounceReport),
            RecipientStatus::Unsubscribed => Some(EngagementEvent::UnsubscribeRequest),
        }
    }

    /// Activity type recorded on the timeline when this event is observed.
    pub fn activity_type(&self) -> ActivityType {
        match self {
            EngagementEvent::SendSucceeded => ActivityType::Sent,
            EngagementEvent::DeliveryReport => ActivityType::Delivered,
            EngagementEvent::OpenHit => ActivityType::Opened,
            EngagementEvent::ClickHit => ActivityType::Clicked,
            EngagementEvent::Convert => ActivityType::Converted,
            EngagementEvent::BounceReport => ActivityType::Bounced,
            EngagementEvent::UnsubscribeRequest => ActivityType::Unsubscribed,
        }
    }
}

/// Resolve the status a recipient moves to when `event` is observed in
/// `current`. `None` means the event is a no-op, including re-entering the
/// status the recipient is already in.
pub fn transition(current: RecipientStatus, event: EngagementEvent) -> Option<RecipientStatus> {
    let next = event.target();
    if current == next {
        return None;
    }
    let allowed = event.allowed_from();
    if allowed.is_empty() || allowed.contains(&current) {
        Some(next)
    } else {
        None
    }
}
