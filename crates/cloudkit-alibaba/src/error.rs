//! Alibaba Cloud provider error types

use cloudkit_core::CloudError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AlibabaError {
    #[error("{code}: {message} (RequestId: {request_id})")]
    Api {
        code: String,
        message: String,
        request_id: String,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("XML parse error: {0}")]
    XmlError(#[from] quick_xml::DeError),

    #[error("Base64 decode error: {0}")]
    DecodeError(#[from] base64::DecodeError),

    #[error("Unexpected response: {0}")]
    InvalidResponse(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Cloud error: {0}")]
    CloudError(#[from] CloudError),
}

impl AlibabaError {
    /// Whether the API rejected the call for lack of permission
    pub fn is_permission_denied(&self) -> bool {
        match self {
            AlibabaError::Api { code, .. } => {
                code.starts_with("Forbidden")
                    || code.starts_with("NoPermission")
                    || code == "AccessDenied"
                    || code.contains("NotAuthorized")
            }
            _ => false,
        }
    }

    /// Whether the API reported that the entity does not exist
    pub fn is_not_found(&self) -> bool {
        match self {
            AlibabaError::Api { code, .. } => {
                code.starts_with("EntityNotExist") || code.contains("NotFound")
            }
            _ => false,
        }
    }
}

impl From<AlibabaError> for CloudError {
    fn from(e: AlibabaError) -> Self {
        match e {
            AlibabaError::CloudError(inner) => inner,
            e if e.is_permission_denied() => CloudError::PermissionDenied(e.to_string()),
            AlibabaError::Api { code, .. } if code.starts_with("InvalidAccessKey") => {
                CloudError::AuthenticationFailed(code)
            }
            e => CloudError::ApiError(e.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, AlibabaError>;
