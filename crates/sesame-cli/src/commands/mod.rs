pub mod provision;

pub use provision::ProvisionCommand;
