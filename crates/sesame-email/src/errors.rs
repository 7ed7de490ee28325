//! Error types for the email provisioning workflow

use sesame_dns::DnsError;
use thiserror::Error;

/// SES fault code for a rule set or rule that already exists
pub const ALREADY_EXISTS_CODE: &str = "AlreadyExists";
/// SES fault code for a rule set name that is unknown
pub const RULE_SET_DOES_NOT_EXIST_CODE: &str = "RuleSetDoesNotExist";

#[derive(Error, Debug)]
pub enum EmailError {
    /// Fault returned by the SES service, with its error code
    #[error("AWS SES error during {operation} ({code}): {message}")]
    Service {
        operation: String,
        code: String,
        message: String,
    },

    /// Transport-level SES failure (timeouts, dispatch, malformed responses)
    #[error("AWS SES error: {0}")]
    AwsSes(String),

    #[error("Receipt rule set already exists: {0}")]
    RuleSetAlreadyExists(String),

    #[error("Receipt rule set does not exist: {0}")]
    RuleSetDoesNotExist(String),

    #[error("Receipt rule already exists: {0}")]
    RuleAlreadyExists(String),

    #[error("Region does not support receiving email: {0}")]
    UnsupportedRegion(String),

    #[error("Missing AWS credentials: {0}")]
    MissingCredentials(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("DNS error: {0}")]
    Dns(#[from] DnsError),
}

impl EmailError {
    /// Provider error code, for faults raised by SES or Route53
    pub fn code(&self) -> Option<&str> {
        match self {
            EmailError::Service { code, .. } => Some(code),
            EmailError::Dns(err) => err.code(),
            _ => None,
        }
    }

    /// Short human-readable text for the end-of-run report
    pub fn summary(&self) -> String {
        match self {
            EmailError::Service { message, .. } if !message.is_empty() => message.clone(),
            other => other.to_string(),
        }
    }
}
