//! DNS provider error types

use thiserror::Error;

/// DNS provider errors
#[derive(Error, Debug)]
pub enum DnsError {
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// Fault reported by Route53 itself, e.g. `InvalidChangeBatch` when a
    /// CREATE collides with an existing record set.
    #[error("Route53 error ({code}): {message}")]
    Service { code: String, message: String },

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl DnsError {
    /// Provider error code, when the fault came from Route53
    pub fn code(&self) -> Option<&str> {
        match self {
            DnsError::Service { code, .. } => Some(code),
            _ => None,
        }
    }
}
