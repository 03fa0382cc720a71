//! Personalization engine: per-recipient placeholder rendering and
//! click/open tracking injection for outbound HTML.

pub mod templating;
pub mod tracking;

pub use templating::render;
pub use tracking::{inject_tracking, TrackingUrls};
