//! Provisioning settings

use serde::{Deserialize, Serialize};

use crate::errors::EmailError;
use crate::models::TlsPolicy;
use crate::region::validate_region;

pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_ARCHIVE_BUCKET: &str = "sesame-inbound-mail";
pub const DEFAULT_ARCHIVE_PREFIX: &str = "staged";
pub const DEFAULT_RULE_SET_PREFIX: &str = "sesame";
pub const DEFAULT_MAIL_FROM_SUBDOMAIN: &str = "bounce";

/// Knobs for one provisioning run. The CLI builds this from flags and
/// `SESAME_*` environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisioningSettings {
    /// AWS region the SES endpoints are built for
    pub region: String,
    /// S3 bucket inbound mail is archived to
    pub archive_bucket: String,
    /// Object key prefix inside `archive_bucket`
    pub archive_prefix: String,
    /// Rule sets are named `rule-set-for-{rule_set_prefix}-{workspace}`
    pub rule_set_prefix: String,
    /// MAIL FROM domain is `{mail_from_subdomain}.{domain}`
    pub mail_from_subdomain: String,
    pub tls_policy: TlsPolicy,
}

impl Default for ProvisioningSettings {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            archive_bucket: DEFAULT_ARCHIVE_BUCKET.to_string(),
            archive_prefix: DEFAULT_ARCHIVE_PREFIX.to_string(),
            rule_set_prefix: DEFAULT_RULE_SET_PREFIX.to_string(),
            mail_from_subdomain: DEFAULT_MAIL_FROM_SUBDOMAIN.to_string(),
            tls_policy: TlsPolicy::default(),
        }
    }
}

impl ProvisioningSettings {
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn validate(&self) -> Result<(), EmailError> {
        validate_region(&self.region)?;

        if self.archive_bucket.trim().is_empty() {
            return Err(EmailError::Configuration(
                "archive bucket must not be empty".to_string(),
            ));
        }
        if self.mail_from_subdomain.trim().is_empty() || self.mail_from_subdomain.contains('.') {
            return Err(EmailError::Configuration(format!(
                "invalid MAIL FROM subdomain: '{}'",
                self.mail_from_subdomain
            )));
        }

        Ok(())
    }

    /// Deterministic rule set name for a workspace
    pub fn rule_set_name(&self, workspace: &str) -> String {
        if self.rule_set_prefix.is_empty() {
            format!("rule-set-for-{}", workspace)
        } else {
            format!("rule-set-for-{}-{}", self.rule_set_prefix, workspace)
        }
    }

    pub fn mail_from_domain(&self, domain: &str) -> String {
        format!("{}.{}", self.mail_from_subdomain, domain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = ProvisioningSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.tls_policy, TlsPolicy::Optional);
    }

    #[test]
    fn test_validate_rejects_unsupported_region() {
        let settings = ProvisioningSettings::default().with_region("sa-east-1");
        assert!(matches!(
            settings.validate(),
            Err(EmailError::UnsupportedRegion(_))
        ));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut settings = ProvisioningSettings::default();
        settings.archive_bucket = " ".to_string();
        assert!(matches!(settings.validate(), Err(EmailError::Configuration(_))));

        let mut settings = ProvisioningSettings::default();
        settings.mail_from_subdomain = "mail.bounce".to_string();
        assert!(matches!(settings.validate(), Err(EmailError::Configuration(_))));
    }

    #[test]
    fn test_derived_names() {
        let settings = ProvisioningSettings::default();
        assert_eq!(settings.rule_set_name("acme"), "rule-set-for-sesame-acme");
        assert_eq!(settings.mail_from_domain("example.com"), "bounce.example.com");

        let mut settings = ProvisioningSettings::default();
        settings.rule_set_prefix = String::new();
        assert_eq!(settings.rule_set_name("acme"), "rule-set-for-acme");
    }

    #[test]
    fn test_settings_deserialize() {
        let json = r#"{
            "region": "eu-west-1",
            "archive_bucket": "mail-archive",
            "archive_prefix": "incoming",
            "rule_set_prefix": "acme",
            "mail_from_subdomain": "mail",
            "tls_policy": "Require"
        }"#;
        let settings: ProvisioningSettings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.region, "eu-west-1");
        assert_eq!(settings.tls_policy, TlsPolicy::Require);
        assert!(settings.validate().is_ok());
    }
}
