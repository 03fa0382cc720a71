use thiserror::Error;

pub type CampaignResult<T> = Result<T, CampaignError>;

#[derive(Error, Debug)]
pub enum CampaignError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("No recipients: {0}")]
    NoRecipients(String),

    #[error("Unsupported channel: {0}")]
    UnsupportedChannel(String),

    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Dispatch error: {0}")]
    Dispatch(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl CampaignError {
    /// Errors the triggering caller is allowed to see verbatim.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            CampaignError::Validation(_)
                | CampaignError::NotFound(_)
                | CampaignError::InvalidState(_)
                | CampaignError::NoRecipients(_)
                | CampaignError::UnsupportedChannel(_)
        )
    }

    /// Stable machine-readable code used in JSON error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            CampaignError::Validation(_) => "validation_failed",
            CampaignError::NotFound(_) => "not_found",
            CampaignError::InvalidState(_) => "invalid_state",
            CampaignError::NoRecipients(_) => "no_recipients",
            CampaignError::UnsupportedChannel(_) => "unsupported_channel",
            CampaignError::ProviderUnavailable(_) => "provider_unavailable",
            CampaignError::Dispatch(_) => "dispatch_failed",
            CampaignError::Storage(_) => "storage_error",
            CampaignError::Config(_) => "config_error",
            CampaignError::Serialization(_) => "serialization_error",
            CampaignError::Internal(_) => "internal_error",
        }
    }
}
