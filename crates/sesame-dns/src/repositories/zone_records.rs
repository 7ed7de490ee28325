use std::sync::Arc;
use tracing::{debug, info};

use crate::errors::DnsError;
use crate::models::{HostedZoneRecord, RecordType};
use crate::providers::{
    ChangeAction, RecordChange, RecordChangeBatch, RecordSetCursor, ResourceRecordSet, Route53Api,
};

const CHANGE_COMMENT: &str = "Created by sesame for SES email setup";

/// Reads and creates record sets inside a hosted zone.
#[derive(Clone)]
pub struct ZoneRecordsRepository {
    api: Arc<dyn Route53Api>,
}

impl ZoneRecordsRepository {
    pub fn new(api: Arc<dyn Route53Api>) -> Self {
        Self { api }
    }

    /// All CNAME, MX and TXT records in the zone, across every page.
    /// Other record types are dropped.
    pub async fn list_records(&self, zone_id: &str) -> Result<Vec<HostedZoneRecord>, DnsError> {
        let mut records = Vec::new();
        let mut start: Option<RecordSetCursor> = None;

        loop {
            let page = self
                .api
                .list_resource_record_sets(zone_id, start.as_ref())
                .await?;

            records.extend(page.record_sets.into_iter().filter_map(Self::to_record));

            match page.next {
                Some(next) => start = Some(next),
                None => break,
            }
        }

        debug!("Hosted zone {} has {} relevant records", zone_id, records.len());
        Ok(records)
    }

    /// Issue a single CREATE change. No upsert: if the record set already
    /// exists Route53 rejects the batch and the error is returned as-is.
    pub async fn create_record(
        &self,
        zone_id: &str,
        record: &HostedZoneRecord,
    ) -> Result<(), DnsError> {
        let batch = RecordChangeBatch {
            comment: Some(CHANGE_COMMENT.to_string()),
            changes: vec![RecordChange {
                action: ChangeAction::Create,
                record_set: ResourceRecordSet {
                    name: record.name.clone(),
                    record_type: record.record_type.to_string(),
                    ttl: Some(record.ttl),
                    values: record.values.clone(),
                },
            }],
        };

        self.api.change_resource_record_sets(zone_id, &batch).await?;
        info!(
            "Created {} record {} in hosted zone {}",
            record.record_type, record.name, zone_id
        );
        Ok(())
    }

    fn to_record(record_set: ResourceRecordSet) -> Option<HostedZoneRecord> {
        let record_type = RecordType::parse(&record_set.record_type)?;
        Some(HostedZoneRecord::new(
            record_set.name,
            record_type,
            record_set.ttl.unwrap_or(0),
            record_set.values,
        ))
    }
}
