use serde::Serialize;
use std::collections::BTreeMap;

use sesame_dns::HostedZoneRecord;

/// What a provisioning run did and what is left for the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvisioningReport {
    pub domain: String,
    /// `None` when no hosted zone in the account manages the domain
    pub hosted_zone_id: Option<String>,
    pub records_created: Vec<HostedZoneRecord>,
    /// Records that must be added to DNS by hand
    pub records_pending_creation: Vec<HostedZoneRecord>,
    /// Rule set name -> error summary
    pub rules_failed_to_create: BTreeMap<String, String>,
}

impl ProvisioningReport {
    /// Nothing left for the operator to do
    pub fn is_complete(&self) -> bool {
        self.records_pending_creation.is_empty() && self.rules_failed_to_create.is_empty()
    }

    /// `<type>, <name>, <values>` per pending record
    pub fn pending_lines(&self) -> Vec<String> {
        self.records_pending_creation
            .iter()
            .map(|record| record.to_string())
            .collect()
    }

    /// `<rule-set-name>: <error summary>` per failed rule set
    pub fn failure_lines(&self) -> Vec<String> {
        self.rules_failed_to_create
            .iter()
            .map(|(name, summary)| format!("{}: {}", name, summary))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sesame_dns::RecordType;

    fn report() -> ProvisioningReport {
        ProvisioningReport {
            domain: "example.com".to_string(),
            hosted_zone_id: None,
            records_created: vec![],
            records_pending_creation: vec![HostedZoneRecord::new(
                "bounce.example.com",
                RecordType::TXT,
                600,
                vec!["\"v=spf1 include:amazonses.com ~all\"".to_string()],
            )],
            rules_failed_to_create: BTreeMap::from([(
                "rule-set-for-sesame-acme".to_string(),
                "User is not authorized to perform this action.".to_string(),
            )]),
        }
    }

    #[test]
    fn test_report_lines() {
        let report = report();

        assert!(!report.is_complete());
        assert_eq!(
            report.pending_lines(),
            vec!["TXT, bounce.example.com, [\"\\\"v=spf1 include:amazonses.com ~all\\\"\"]"]
        );
        assert_eq!(
            report.failure_lines(),
            vec!["rule-set-for-sesame-acme: User is not authorized to perform this action."]
        );
    }

    #[test]
    fn test_report_serializes() {
        let json = serde_json::to_value(report()).unwrap();

        assert_eq!(json["domain"], "example.com");
        assert!(json["hosted_zone_id"].is_null());
        assert_eq!(json["records_pending_creation"][0]["record_type"], "TXT");
        assert_eq!(json["records_pending_creation"][0]["ttl"], 600);
    }

    #[test]
    fn test_empty_report_is_complete() {
        let report = ProvisioningReport {
            records_pending_creation: vec![],
            rules_failed_to_create: BTreeMap::new(),
            ..report()
        };
        assert!(report.is_complete());
        assert!(report.pending_lines().is_empty());
    }
}
