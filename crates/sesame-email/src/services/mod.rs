//! The provisioning workflow and its end-of-run report

mod provisioning_service;
mod report;

pub use provisioning_service::ProvisioningService;
pub use report::ProvisioningReport;
