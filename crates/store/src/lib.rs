pub mod activity;
pub mod memory;
pub mod store;
pub mod transitions;

pub use activity::ActivityLog;
pub use memory::InMemoryStore;
pub use store::CampaignStore;
pub use transitions::{apply_event, AppliedTransition};
