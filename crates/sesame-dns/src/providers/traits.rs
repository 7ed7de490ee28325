//! Route53 transport abstraction
//!
//! The repositories only depend on these three operations, so tests can swap
//! the signed HTTP client for an in-memory double.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::DnsError;
use crate::models::HostedZone;

/// A raw Route53 resource record set. `record_type` is kept as the provider
/// string since a zone holds types this tool never models (SOA, NS, A...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRecordSet {
    pub name: String,
    pub record_type: String,
    pub ttl: Option<u32>,
    pub values: Vec<String>,
}

/// Where a truncated `ListResourceRecordSets` listing resumes.
/// `identifier` is only set inside weighted, latency or failover sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSetCursor {
    pub name: String,
    pub record_type: String,
    pub identifier: Option<String>,
}

impl RecordSetCursor {
    pub fn new(name: impl Into<String>, record_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            record_type: record_type.into(),
            identifier: None,
        }
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }
}

/// One page of `ListResourceRecordSets`
#[derive(Debug, Clone, Default)]
pub struct RecordSetPage {
    pub record_sets: Vec<ResourceRecordSet>,
    /// Set when the listing is truncated
    pub next: Option<RecordSetCursor>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeAction {
    Create,
}

impl std::fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangeAction::Create => write!(f, "CREATE"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordChange {
    pub action: ChangeAction,
    pub record_set: ResourceRecordSet,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordChangeBatch {
    pub comment: Option<String>,
    pub changes: Vec<RecordChange>,
}

#[async_trait]
pub trait Route53Api: Send + Sync {
    /// Zones whose name sorts at or after `dns_name`, as Route53 returns them
    async fn list_hosted_zones_by_name(&self, dns_name: &str) -> Result<Vec<HostedZone>, DnsError>;

    /// One page of record sets, resuming at `start` when given
    async fn list_resource_record_sets(
        &self,
        zone_id: &str,
        start: Option<&RecordSetCursor>,
    ) -> Result<RecordSetPage, DnsError>;

    async fn change_resource_record_sets(
        &self,
        zone_id: &str,
        batch: &RecordChangeBatch,
    ) -> Result<(), DnsError>;
}
