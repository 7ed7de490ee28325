//! Regions where SES can receive email, and the regional endpoints records point at

use crate::errors::EmailError;

/// Regions with SES inbound email support
pub const SUPPORTED_REGIONS: [&str; 3] = ["us-east-1", "us-west-2", "eu-west-1"];

pub fn is_supported_region(region: &str) -> bool {
    SUPPORTED_REGIONS.contains(&region)
}

/// Fails with [`EmailError::UnsupportedRegion`] outside [`SUPPORTED_REGIONS`]
pub fn validate_region(region: &str) -> Result<(), EmailError> {
    if is_supported_region(region) {
        Ok(())
    } else {
        Err(EmailError::UnsupportedRegion(format!(
            "{} (supported: {})",
            region,
            SUPPORTED_REGIONS.join(", ")
        )))
    }
}

/// Host the domain's MX record routes inbound mail to
pub fn inbound_smtp_endpoint(region: &str) -> String {
    format!("inbound-smtp.{}.amazonaws.com", region)
}

/// Host the MAIL FROM domain's MX record routes bounces to
pub fn feedback_smtp_endpoint(region: &str) -> String {
    format!("feedback-smtp.{}.amazonses.com", region)
}
