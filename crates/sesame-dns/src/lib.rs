//! Route53 side of sesame
//!
//! - [`models`]: the record value objects compared during reconciliation
//! - [`providers`]: the `Route53Api` seam and a SigV4-signed REST client
//! - [`repositories`]: hosted zone resolution plus record listing/creation
//!
//! A domain without a hosted zone in the account is not an error here:
//! [`HostedZoneRepository::resolve`] returns `None` and callers fall back to
//! reporting the records for manual setup.

pub mod errors;
pub mod models;
pub mod providers;
pub mod repositories;

pub use errors::DnsError;
pub use models::{HostedZone, HostedZoneRecord, RecordKey, RecordType};
pub use providers::{Route53Api, Route53Client, Route53Credentials};
pub use repositories::{HostedZoneRepository, ZoneRecordsRepository};
