pub mod config;
pub mod engagement;
pub mod error;
pub mod types;

pub use config::AppConfig;
pub use engagement::{transition, EngagementEvent};
pub use error::{CampaignError, CampaignResult};
