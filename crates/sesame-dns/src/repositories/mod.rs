//! Zone lookups and record reads/writes on top of [`crate::providers::Route53Api`]

mod hosted_zone;
mod zone_records;

pub use hosted_zone::HostedZoneRepository;
pub use zone_records::ZoneRecordsRepository;
