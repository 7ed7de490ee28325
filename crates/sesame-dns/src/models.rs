//! Record model shared by the zone repositories and the provisioning workflow

use serde::{Deserialize, Serialize};

/// Record types this tool reads and writes. Everything else in a zone is ignored.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordType {
    CNAME,
    MX,
    TXT,
}

impl std::fmt::Display for RecordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordType::CNAME => write!(f, "CNAME"),
            RecordType::MX => write!(f, "MX"),
            RecordType::TXT => write!(f, "TXT"),
        }
    }
}

impl RecordType {
    /// Parse a Route53 type string. Returns `None` for types outside CNAME/MX/TXT.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "CNAME" => Some(RecordType::CNAME),
            "MX" => Some(RecordType::MX),
            "TXT" => Some(RecordType::TXT),
            _ => None,
        }
    }
}

/// A hosted zone as returned by Route53 (id without the `/hostedzone/` prefix)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostedZone {
    pub id: String,
    pub name: String,
}

/// Structural identity of a record: name plus type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordKey {
    pub name: String,
    pub record_type: String,
}

/// A DNS record set, either desired by the workflow or fetched from a zone.
///
/// `PartialEq`/`Hash` are structural. Deciding whether a fetched record
/// satisfies a desired one goes through [`HostedZoneRecord::covers`], which is
/// deliberately looser.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HostedZoneRecord {
    pub name: String,
    pub record_type: RecordType,
    pub ttl: u32,
    pub values: Vec<String>,
}

impl HostedZoneRecord {
    pub fn new(
        name: impl Into<String>,
        record_type: RecordType,
        ttl: u32,
        values: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            record_type,
            ttl,
            values,
        }
    }

    pub fn key(&self) -> RecordKey {
        RecordKey {
            name: self.name.clone(),
            record_type: self.record_type.to_string(),
        }
    }

    /// True when `self` (usually a record fetched from the zone) stands in for
    /// `desired`: same type, and `desired.name` occurs inside `self.name`.
    ///
    /// Route53 hands back fully-qualified names with a trailing dot while the
    /// workflow builds bare names, hence containment rather than equality.
    /// Values and TTL are not compared. Containment can match unrelated names
    /// that share a suffix (`a.com` inside `sub-a.com`); that looseness is the
    /// existing behavior and is kept as-is.
    pub fn covers(&self, desired: &HostedZoneRecord) -> bool {
        self.record_type == desired.record_type && self.name.contains(desired.name.as_str())
    }

    /// True when any record in `existing` covers `self`.
    pub fn is_covered_by(&self, existing: &[HostedZoneRecord]) -> bool {
        existing.iter().any(|record| record.covers(self))
    }
}

impl std::fmt::Display for HostedZoneRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}, {:?}", self.record_type, self.name, self.values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dkim(name: &str) -> HostedZoneRecord {
        HostedZoneRecord::new(
            name,
            RecordType::CNAME,
            300,
            vec!["token-a.dkim.amazonses.com".to_string()],
        )
    }

    #[test]
    fn test_covers_same_name_and_type() {
        let desired = dkim("a._domainkey.example.com");
        let fetched = dkim("a._domainkey.example.com");
        assert!(fetched.covers(&desired));
    }

    #[test]
    fn test_covers_fully_qualified_name() {
        let desired = dkim("a._domainkey.example.com");
        let fetched = dkim("a._domainkey.example.com.");
        assert!(fetched.covers(&desired));
        // Direction matters: the bare name does not contain the FQDN
        assert!(!desired.covers(&fetched));
    }

    #[test]
    fn test_covers_rejects_different_type() {
        let desired = dkim("a._domainkey.example.com");
        let fetched = HostedZoneRecord::new(
            "a._domainkey.example.com",
            RecordType::TXT,
            300,
            vec![],
        );
        assert!(!fetched.covers(&desired));
    }

    #[test]
    fn test_covers_ignores_values_and_ttl() {
        let desired = dkim("example.com");
        let fetched = HostedZoneRecord::new(
            "example.com.",
            RecordType::CNAME,
            60,
            vec!["somewhere.else.".to_string()],
        );
        assert!(fetched.covers(&desired));
    }

    #[test]
    fn test_covers_suffix_false_positive_is_kept() {
        let desired = dkim("a.com");
        let fetched = dkim("sub-a.com.");
        assert!(fetched.covers(&desired));
    }

    #[test]
    fn test_is_covered_by() {
        let desired = dkim("token-a._domainkey.my-identity.com");
        let zone = vec![
            dkim("token-b._domainkey.my-identity.com."),
            dkim("token-a._domainkey.my-identity.com."),
        ];
        assert!(desired.is_covered_by(&zone));
        assert!(!desired.is_covered_by(&zone[..1]));
    }

    #[test]
    fn test_structural_equality_and_key() {
        use std::collections::HashSet;

        let a = dkim("a._domainkey.example.com");
        let fqdn = dkim("a._domainkey.example.com.");
        assert_ne!(a, fqdn);

        let set: HashSet<_> = [a.clone(), a.clone(), fqdn.clone()].into_iter().collect();
        assert_eq!(set.len(), 2);

        assert_eq!(
            a.key(),
            RecordKey {
                name: "a._domainkey.example.com".to_string(),
                record_type: "CNAME".to_string(),
            }
        );
    }

    #[test]
    fn test_record_type_parse() {
        assert_eq!(RecordType::parse("cname"), Some(RecordType::CNAME));
        assert_eq!(RecordType::parse("MX"), Some(RecordType::MX));
        assert_eq!(RecordType::parse("TXT"), Some(RecordType::TXT));
        assert_eq!(RecordType::parse("A"), None);
        assert_eq!(RecordType::parse("SOA"), None);
    }

    #[test]
    fn test_display() {
        let record = HostedZoneRecord::new(
            "bounce.example.com",
            RecordType::MX,
            600,
            vec!["10 feedback-smtp.us-east-1.amazonses.com".to_string()],
        );
        assert_eq!(
            record.to_string(),
            "MX, bounce.example.com, [\"10 feedback-smtp.us-east-1.amazonses.com\"]"
        );
    }
}
