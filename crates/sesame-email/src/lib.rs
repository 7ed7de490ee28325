//! SES side of sesame and the provisioning workflow
//!
//! [`ProvisioningService`] drives one domain through DKIM verification,
//! inbound MX routing, MAIL FROM alignment and (optionally) a receipt rule
//! set that archives inbound mail to S3. DNS records go through
//! [`sesame_dns`] when the domain has a hosted zone in the account, and are
//! collected for manual setup otherwise.

pub mod config;
pub mod errors;
pub mod models;
pub mod providers;
pub mod region;
pub mod repositories;
pub mod services;

pub use config::ProvisioningSettings;
pub use errors::EmailError;
pub use models::{
    DkimAttributes, MailFromDomainAttributes, ReceiptRule, TlsPolicy, VerificationStatus,
};
pub use providers::{SesApi, SesClient};
pub use region::{validate_region, SUPPORTED_REGIONS};
pub use repositories::{IdentityRepository, ReceiptRulesRepository};
pub use services::{ProvisioningReport, ProvisioningService};
