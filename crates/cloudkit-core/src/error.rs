//! Cloud provider error types

use thiserror::Error;

/// Cloud provider errors
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("Missing credential key: {0}")]
    MissingCredentialKey(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Page fetch failed: {0}")]
    PageFetch(String),

    #[error("Provider not supported: {0}")]
    UnsupportedProvider(String),

    #[error("{provider} does not support {action}")]
    UnsupportedAction { provider: String, action: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Credential cache error: {0}")]
    CacheError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CloudError {
    pub fn unsupported(provider: impl Into<String>, action: impl Into<String>) -> Self {
        Self::UnsupportedAction {
            provider: provider.into(),
            action: action.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CloudError>;
