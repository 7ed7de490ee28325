//! Snapshots of SES identity state and the receipt rule payload

use serde::{Deserialize, Serialize};
use sesame_dns::{HostedZoneRecord, RecordType};

/// DKIM CNAME targets live under this provider domain
pub const DKIM_PROVIDER_DOMAIN: &str = "dkim.amazonses.com";
pub const DKIM_RECORD_TTL: u32 = 300;
/// TTL for the inbound MX and the MAIL FROM MX/TXT records
pub const MAIL_RECORD_TTL: u32 = 600;
/// SPF value published on the MAIL FROM domain (quoted, as Route53 stores TXT data)
pub const SPF_RECORD_VALUE: &str = "\"v=spf1 include:amazonses.com ~all\"";

/// DKIM verification status as reported by SES
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerificationStatus {
    Pending,
    Success,
    Failed,
    TemporaryFailure,
    NotStarted,
    Unknown(String),
}

impl VerificationStatus {
    pub fn from_str(s: &str) -> Self {
        match s {
            "Pending" => VerificationStatus::Pending,
            "Success" => VerificationStatus::Success,
            "Failed" => VerificationStatus::Failed,
            "TemporaryFailure" => VerificationStatus::TemporaryFailure,
            "NotStarted" => VerificationStatus::NotStarted,
            other => VerificationStatus::Unknown(other.to_string()),
        }
    }
}

impl std::fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VerificationStatus::Pending => write!(f, "Pending"),
            VerificationStatus::Success => write!(f, "Success"),
            VerificationStatus::Failed => write!(f, "Failed"),
            VerificationStatus::TemporaryFailure => write!(f, "TemporaryFailure"),
            VerificationStatus::NotStarted => write!(f, "NotStarted"),
            VerificationStatus::Unknown(s) => write!(f, "{}", s),
        }
    }
}

/// DKIM state of a sending identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DkimAttributes {
    pub name: String,
    pub verification_status: VerificationStatus,
    /// Empty until verification has been requested
    pub dkim_tokens: Vec<String>,
}

impl DkimAttributes {
    /// Attributes for an identity SES has not seen yet
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            verification_status: VerificationStatus::NotStarted,
            dkim_tokens: Vec::new(),
        }
    }

    /// One CNAME per token: `{token}._domainkey.{domain}` -> `{token}.dkim.amazonses.com`
    pub fn dkim_records(&self) -> Vec<HostedZoneRecord> {
        self.dkim_tokens
            .iter()
            .map(|token| {
                HostedZoneRecord::new(
                    format!("{}._domainkey.{}", token, self.name),
                    RecordType::CNAME,
                    DKIM_RECORD_TTL,
                    vec![format!("{}.{}", token, DKIM_PROVIDER_DOMAIN)],
                )
            })
            .collect()
    }
}

/// What SES does with mail when the MAIL FROM domain's MX lookup fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BehaviorOnMxFailure {
    #[default]
    UseDefaultValue,
    RejectMessage,
}

impl BehaviorOnMxFailure {
    pub fn as_str(&self) -> &'static str {
        match self {
            BehaviorOnMxFailure::UseDefaultValue => "UseDefaultValue",
            BehaviorOnMxFailure::RejectMessage => "RejectMessage",
        }
    }

    /// Anything SES reports besides `RejectMessage` behaves as the default
    pub fn from_str(s: &str) -> Self {
        match s {
            "RejectMessage" => BehaviorOnMxFailure::RejectMessage,
            _ => BehaviorOnMxFailure::UseDefaultValue,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MailFromDomainStatus {
    Pending,
    Success,
    Failed,
    TemporaryFailure,
    Unknown(String),
}

impl MailFromDomainStatus {
    pub fn from_str(s: &str) -> Self {
        match s {
            "Pending" => MailFromDomainStatus::Pending,
            "Success" => MailFromDomainStatus::Success,
            "Failed" => MailFromDomainStatus::Failed,
            "TemporaryFailure" => MailFromDomainStatus::TemporaryFailure,
            other => MailFromDomainStatus::Unknown(other.to_string()),
        }
    }
}

impl std::fmt::Display for MailFromDomainStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MailFromDomainStatus::Pending => write!(f, "Pending"),
            MailFromDomainStatus::Success => write!(f, "Success"),
            MailFromDomainStatus::Failed => write!(f, "Failed"),
            MailFromDomainStatus::TemporaryFailure => write!(f, "TemporaryFailure"),
            MailFromDomainStatus::Unknown(s) => write!(f, "{}", s),
        }
    }
}

/// Custom MAIL FROM configuration of an identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailFromDomainAttributes {
    /// The parent identity
    pub name: String,
    pub mail_from_domain: String,
    pub behavior_on_mx_failure: BehaviorOnMxFailure,
    pub mail_from_domain_status: Option<MailFromDomainStatus>,
}

impl MailFromDomainAttributes {
    pub fn new(name: impl Into<String>, mail_from_domain: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mail_from_domain: mail_from_domain.into(),
            behavior_on_mx_failure: BehaviorOnMxFailure::default(),
            mail_from_domain_status: None,
        }
    }

    /// Alignment records may only be placed once SES reports Pending or Success
    pub fn is_ready(&self) -> bool {
        matches!(
            self.mail_from_domain_status,
            Some(MailFromDomainStatus::Pending) | Some(MailFromDomainStatus::Success)
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TlsPolicy {
    #[default]
    Optional,
    Require,
}

impl TlsPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            TlsPolicy::Optional => "Optional",
            TlsPolicy::Require => "Require",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopScope {
    RuleSet,
}

impl StopScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            StopScope::RuleSet => "RuleSet",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReceiptAction {
    /// Store the raw message in S3
    S3 {
        bucket_name: String,
        object_key_prefix: String,
    },
    /// Stop evaluating further rules
    Stop { scope: StopScope },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleDefinition {
    pub enabled: bool,
    /// Applied in order
    pub actions: Vec<ReceiptAction>,
    pub scan_enabled: bool,
    pub tls_policy: TlsPolicy,
}

/// An inbound receipt rule inside a named rule set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptRule {
    pub name: String,
    pub rule_set_name: String,
    pub rule: RuleDefinition,
}

impl ReceiptRule {
    /// Archive every message to `s3://{bucket_name}/{prefix}` and stop
    /// evaluating the rule set. Spam/virus scanning is on.
    pub fn proxy(
        name: impl Into<String>,
        rule_set_name: impl Into<String>,
        bucket_name: impl Into<String>,
        prefix: impl Into<String>,
        tls_policy: TlsPolicy,
    ) -> Self {
        Self {
            name: name.into(),
            rule_set_name: rule_set_name.into(),
            rule: RuleDefinition {
                enabled: true,
                actions: vec![
                    ReceiptAction::S3 {
                        bucket_name: bucket_name.into(),
                        object_key_prefix: prefix.into(),
                    },
                    ReceiptAction::Stop {
                        scope: StopScope::RuleSet,
                    },
                ],
                scan_enabled: true,
                tls_policy,
            },
        }
    }

    /// Same relaxed policy as [`HostedZoneRecord::covers`]: `other.name` is
    /// contained in `self.name` and both live in the same rule set.
    pub fn covers(&self, other: &ReceiptRule) -> bool {
        self.rule_set_name == other.rule_set_name && self.name.contains(other.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dkim_records() {
        let identity = DkimAttributes {
            name: "my-identity.com".to_string(),
            verification_status: VerificationStatus::Pending,
            dkim_tokens: vec!["token-a".to_string(), "token-b".to_string()],
        };

        let expected = vec![
            HostedZoneRecord::new(
                "token-a._domainkey.my-identity.com",
                RecordType::CNAME,
                300,
                vec!["token-a.dkim.amazonses.com".to_string()],
            ),
            HostedZoneRecord::new(
                "token-b._domainkey.my-identity.com",
                RecordType::CNAME,
                300,
                vec!["token-b.dkim.amazonses.com".to_string()],
            ),
        ];

        assert_eq!(identity.dkim_records(), expected);
    }

    #[test]
    fn test_new_identity_has_no_records() {
        let identity = DkimAttributes::new("example.com");
        assert_eq!(identity.verification_status, VerificationStatus::NotStarted);
        assert!(identity.dkim_records().is_empty());
    }

    #[test]
    fn test_verification_status_round_trip_strings() {
        assert_eq!(VerificationStatus::from_str("Pending"), VerificationStatus::Pending);
        assert_eq!(VerificationStatus::from_str("Success"), VerificationStatus::Success);
        assert_eq!(
            VerificationStatus::from_str("Weird"),
            VerificationStatus::Unknown("Weird".to_string())
        );
        assert_eq!(VerificationStatus::TemporaryFailure.to_string(), "TemporaryFailure");
    }

    #[test]
    fn test_mail_from_is_ready() {
        let mut attrs = MailFromDomainAttributes::new("example.com", "bounce.example.com");
        assert!(!attrs.is_ready());

        attrs.mail_from_domain_status = Some(MailFromDomainStatus::Pending);
        assert!(attrs.is_ready());

        attrs.mail_from_domain_status = Some(MailFromDomainStatus::Success);
        assert!(attrs.is_ready());

        attrs.mail_from_domain_status = Some(MailFromDomainStatus::Failed);
        assert!(!attrs.is_ready());

        attrs.mail_from_domain_status = Some(MailFromDomainStatus::TemporaryFailure);
        assert!(!attrs.is_ready());
    }

    #[test]
    fn test_behavior_on_mx_failure_default() {
        let attrs = MailFromDomainAttributes::new("example.com", "bounce.example.com");
        assert_eq!(attrs.behavior_on_mx_failure, BehaviorOnMxFailure::UseDefaultValue);
        assert_eq!(
            BehaviorOnMxFailure::from_str("RejectMessage"),
            BehaviorOnMxFailure::RejectMessage
        );
        assert_eq!(
            BehaviorOnMxFailure::from_str("anything"),
            BehaviorOnMxFailure::UseDefaultValue
        );
    }

    #[test]
    fn test_proxy_rule_archives_then_stops() {
        let rule = ReceiptRule::proxy(
            "rule-set-for-sesame-acme",
            "rule-set-for-sesame-acme",
            "inbound-bucket",
            "staged",
            TlsPolicy::Optional,
        );

        assert!(rule.rule.enabled);
        assert!(rule.rule.scan_enabled);
        assert_eq!(rule.rule.tls_policy, TlsPolicy::Optional);
        assert_eq!(
            rule.rule.actions,
            vec![
                ReceiptAction::S3 {
                    bucket_name: "inbound-bucket".to_string(),
                    object_key_prefix: "staged".to_string(),
                },
                ReceiptAction::Stop {
                    scope: StopScope::RuleSet,
                },
            ]
        );
    }

    #[test]
    fn test_receipt_rule_covers() {
        let desired = ReceiptRule::proxy("proxy", "set-a", "bucket", "staged", TlsPolicy::Optional);
        let existing =
            ReceiptRule::proxy("proxy-v2", "set-a", "other", "other", TlsPolicy::Require);
        let elsewhere = ReceiptRule::proxy("proxy", "set-b", "bucket", "staged", TlsPolicy::Optional);

        assert!(existing.covers(&desired));
        assert!(!desired.covers(&existing));
        assert!(!elsewhere.covers(&desired));
    }
}
