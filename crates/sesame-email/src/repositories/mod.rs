//! Identity and receipt rule operations on top of [`crate::providers::SesApi`]

mod identity;
mod receipt_rules;

pub use identity::IdentityRepository;
pub use receipt_rules::ReceiptRulesRepository;
