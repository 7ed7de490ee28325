use std::sync::Arc;
use tracing::debug;

use crate::errors::DnsError;
use crate::providers::Route53Api;

/// Maps a domain to the Route53 hosted zone that manages it.
#[derive(Clone)]
pub struct HostedZoneRepository {
    api: Arc<dyn Route53Api>,
}

impl HostedZoneRepository {
    pub fn new(api: Arc<dyn Route53Api>) -> Self {
        Self { api }
    }

    /// Returns the id of the first listed zone whose name contains `domain`,
    /// or `None` when the domain is not hosted in this account.
    ///
    /// Route53 lists zones alphabetically from `domain` onwards, so the first
    /// containing match wins; there is no longest-suffix preference.
    pub async fn resolve(&self, domain: &str) -> Result<Option<String>, DnsError> {
        let zones = self.api.list_hosted_zones_by_name(domain).await?;

        let zone_id = zones
            .into_iter()
            .find(|zone| zone.name.contains(domain))
            .map(|zone| zone.id);

        match &zone_id {
            Some(id) => debug!("Domain {} is managed by hosted zone {}", domain, id),
            None => debug!("No hosted zone manages {}", domain),
        }

        Ok(zone_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::MockRoute53;

    #[tokio::test]
    async fn test_resolve_matching_zone() {
        let api = MockRoute53::new().with_zone("some-long-id", "example.com.");
        let repo = HostedZoneRepository::new(Arc::new(api));

        assert_eq!(
            repo.resolve("example.com").await.unwrap(),
            Some("some-long-id".to_string())
        );
    }

    #[tokio::test]
    async fn test_resolve_first_match_wins() {
        let api = MockRoute53::new()
            .with_zone("Z-first", "mail.example.com.")
            .with_zone("Z-second", "example.com.");
        let repo = HostedZoneRepository::new(Arc::new(api));

        assert_eq!(
            repo.resolve("example.com").await.unwrap(),
            Some("Z-first".to_string())
        );
    }

    #[tokio::test]
    async fn test_resolve_unmanaged_domain() {
        // Route53 returns the zones after the queried name even without a match
        let api = MockRoute53::new().with_zone("Z-other", "other.org.");
        let repo = HostedZoneRepository::new(Arc::new(api));

        assert_eq!(repo.resolve("unknown.com").await.unwrap(), None);
    }
}
