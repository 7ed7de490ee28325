//! In-memory Route53 double, shared with dependent crates through `test-utils`

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::errors::DnsError;
use crate::models::HostedZone;
use crate::providers::{
    ChangeAction, RecordChangeBatch, RecordSetCursor, RecordSetPage, ResourceRecordSet,
    Route53Api,
};

/// Zones are listed as configured. Record sets live in pages shared between
/// clones; applied CREATE changes land on the last page, so a later listing
/// sees them. A CREATE for a name and type already present is rejected with
/// `InvalidChangeBatch`, as Route53 does.
#[derive(Debug, Clone, Default)]
pub struct MockRoute53 {
    pub zones: Vec<HostedZone>,
    pub pages: Arc<Mutex<Vec<Vec<ResourceRecordSet>>>>,
    pub list_zones_count: Arc<AtomicUsize>,
    pub list_records_count: Arc<AtomicUsize>,
    pub changes: Arc<Mutex<Vec<(String, RecordChangeBatch)>>>,
    pub fail_change_with: Option<String>,
}

impl MockRoute53 {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_zone(mut self, id: &str, name: &str) -> Self {
        self.zones.push(HostedZone {
            id: id.to_string(),
            name: name.to_string(),
        });
        self
    }

    pub fn with_page(self, record_sets: Vec<ResourceRecordSet>) -> Self {
        self.pages.lock().unwrap().push(record_sets);
        self
    }

    pub fn with_change_failure(mut self, code: &str) -> Self {
        self.fail_change_with = Some(code.to_string());
        self
    }

    pub fn change_count(&self) -> usize {
        self.changes.lock().unwrap().len()
    }

    /// Every record set currently in the zone
    pub fn record_sets(&self) -> Vec<ResourceRecordSet> {
        self.pages.lock().unwrap().iter().flatten().cloned().collect()
    }

    fn fqdn(name: &str) -> String {
        if name.ends_with('.') {
            name.to_string()
        } else {
            format!("{}.", name)
        }
    }
}

#[async_trait]
impl Route53Api for MockRoute53 {
    async fn list_hosted_zones_by_name(&self, _dns_name: &str) -> Result<Vec<HostedZone>, DnsError> {
        self.list_zones_count.fetch_add(1, Ordering::SeqCst);
        Ok(self.zones.clone())
    }

    async fn list_resource_record_sets(
        &self,
        _zone_id: &str,
        start: Option<&RecordSetCursor>,
    ) -> Result<RecordSetPage, DnsError> {
        self.list_records_count.fetch_add(1, Ordering::SeqCst);
        // Page index travels in the cursor identifier handed out below
        let index = start
            .and_then(|cursor| cursor.identifier.as_deref())
            .and_then(|id| id.strip_prefix("page-"))
            .and_then(|n| n.parse::<usize>().ok())
            .unwrap_or(0);
        let pages = self.pages.lock().unwrap();
        let record_sets = pages.get(index).cloned().unwrap_or_default();
        let next = (index + 1 < pages.len()).then(|| {
            RecordSetCursor::new("next.", "TXT").with_identifier(format!("page-{}", index + 1))
        });
        Ok(RecordSetPage { record_sets, next })
    }

    async fn change_resource_record_sets(
        &self,
        zone_id: &str,
        batch: &RecordChangeBatch,
    ) -> Result<(), DnsError> {
        if let Some(code) = &self.fail_change_with {
            return Err(DnsError::Service {
                code: code.clone(),
                message: "rejected by mock".to_string(),
            });
        }

        let mut pages = self.pages.lock().unwrap();
        for change in &batch.changes {
            let name = Self::fqdn(&change.record_set.name);
            let exists = pages.iter().flatten().any(|existing| {
                Self::fqdn(&existing.name) == name
                    && existing.record_type == change.record_set.record_type
            });
            if change.action == ChangeAction::Create && exists {
                return Err(DnsError::Service {
                    code: "InvalidChangeBatch".to_string(),
                    message: format!(
                        "Tried to create resource record set [name='{}', type='{}'] but it already exists",
                        name, change.record_set.record_type
                    ),
                });
            }
        }

        if pages.is_empty() {
            pages.push(Vec::new());
        }
        if let Some(last) = pages.last_mut() {
            last.extend(batch.changes.iter().map(|change| ResourceRecordSet {
                name: Self::fqdn(&change.record_set.name),
                ..change.record_set.clone()
            }));
        }
        drop(pages);

        self.changes
            .lock()
            .unwrap()
            .push((zone_id.to_string(), batch.clone()));
        Ok(())
    }
}
