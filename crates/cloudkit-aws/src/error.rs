//! AWS provider error types

use aws_sdk_sts::error::{DisplayErrorContext, ProvideErrorMetadata};
use cloudkit_core::CloudError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AwsError {
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("AWS API error: {0}")]
    Sdk(String),

    #[error("Cloud error: {0}")]
    CloudError(#[from] CloudError),
}

fn is_permission_code(code: &str) -> bool {
    matches!(
        code,
        "AccessDenied" | "AccessDeniedException" | "UnauthorizedOperation" | "AuthFailure"
    )
}

impl AwsError {
    /// Classify an SDK error by its service error code
    pub fn from_sdk<E>(action: &str, e: E) -> Self
    where
        E: std::error::Error + ProvideErrorMetadata,
    {
        let message = format!("{}: {}", action, DisplayErrorContext(&e));
        match e.code() {
            Some(code) if is_permission_code(code) => AwsError::PermissionDenied(message),
            Some("NoSuchEntity") | Some("NoSuchBucket") => AwsError::NotFound(message),
            _ => AwsError::Sdk(message),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AwsError::NotFound(_))
    }
}

impl From<AwsError> for CloudError {
    fn from(e: AwsError) -> Self {
        match e {
            AwsError::CloudError(inner) => inner,
            AwsError::PermissionDenied(msg) => CloudError::PermissionDenied(msg),
            e => CloudError::ApiError(e.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, AwsError>;
