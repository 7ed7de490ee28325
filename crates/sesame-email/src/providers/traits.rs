//! SES transport abstraction

use async_trait::async_trait;

use crate::errors::EmailError;
use crate::models::{DkimAttributes, MailFromDomainAttributes, ReceiptRule};

/// The SES operations the provisioning workflow needs.
///
/// Implementations report service faults as [`EmailError::Service`] carrying
/// the SES error code; the repositories turn the codes they tolerate into
/// typed variants.
#[async_trait]
pub trait SesApi: Send + Sync {
    /// `None` when SES has no DKIM record for the identity
    async fn get_identity_dkim_attributes(
        &self,
        identity: &str,
    ) -> Result<Option<DkimAttributes>, EmailError>;

    /// Starts DKIM verification and returns the tokens to publish
    async fn verify_domain_dkim(&self, domain: &str) -> Result<Vec<String>, EmailError>;

    /// Raw MAIL FROM attributes; `mail_from_domain` is empty when never configured
    async fn get_identity_mail_from_domain_attributes(
        &self,
        identity: &str,
    ) -> Result<Option<MailFromDomainAttributes>, EmailError>;

    async fn set_identity_mail_from_domain(
        &self,
        attributes: &MailFromDomainAttributes,
    ) -> Result<(), EmailError>;

    async fn create_receipt_rule_set(&self, rule_set_name: &str) -> Result<(), EmailError>;

    async fn set_active_receipt_rule_set(&self, rule_set_name: &str) -> Result<(), EmailError>;

    async fn create_receipt_rule(&self, rule: &ReceiptRule) -> Result<(), EmailError>;
}
