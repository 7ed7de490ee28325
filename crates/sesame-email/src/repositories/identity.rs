use std::sync::Arc;
use tracing::{debug, info};

use crate::errors::EmailError;
use crate::models::{
    DkimAttributes, MailFromDomainAttributes, MailFromDomainStatus, VerificationStatus,
};
use crate::providers::SesApi;

/// DKIM verification and MAIL FROM alignment of a sending identity.
#[derive(Clone)]
pub struct IdentityRepository {
    api: Arc<dyn SesApi>,
}

impl IdentityRepository {
    pub fn new(api: Arc<dyn SesApi>) -> Self {
        Self { api }
    }

    /// Returns the identity as SES knows it. An identity SES has never seen
    /// gets one verification request; the returned snapshot carries the new
    /// tokens with status `Pending`. Known identities are never re-verified.
    pub async fn ensure_dkim_verification(
        &self,
        identity: DkimAttributes,
    ) -> Result<DkimAttributes, EmailError> {
        if let Some(existing) = self.fetch_dkim_attributes(&identity.name).await? {
            debug!(
                "Identity {} already exists with DKIM status {}",
                existing.name, existing.verification_status
            );
            return Ok(existing);
        }

        let dkim_tokens = self.api.verify_domain_dkim(&identity.name).await?;
        info!(
            "Requested DKIM verification for {} ({} tokens)",
            identity.name,
            dkim_tokens.len()
        );

        Ok(DkimAttributes {
            dkim_tokens,
            verification_status: VerificationStatus::Pending,
            ..identity
        })
    }

    pub async fn fetch_dkim_attributes(
        &self,
        name: &str,
    ) -> Result<Option<DkimAttributes>, EmailError> {
        self.api.get_identity_dkim_attributes(name).await
    }

    /// Keeps an existing MAIL FROM configuration as-is when a desired domain
    /// is given; otherwise sets it and reports `Pending`.
    pub async fn ensure_mail_from_alignment(
        &self,
        attributes: MailFromDomainAttributes,
    ) -> Result<MailFromDomainAttributes, EmailError> {
        if !attributes.mail_from_domain.is_empty() {
            if let Some(existing) = self.fetch_mail_from_attributes(&attributes.name).await? {
                debug!(
                    "Identity {} already uses MAIL FROM domain {}",
                    existing.name, existing.mail_from_domain
                );
                return Ok(existing);
            }
        }

        self.api.set_identity_mail_from_domain(&attributes).await?;
        info!(
            "Set MAIL FROM domain of {} to {}",
            attributes.name, attributes.mail_from_domain
        );

        Ok(MailFromDomainAttributes {
            mail_from_domain_status: Some(MailFromDomainStatus::Pending),
            ..attributes
        })
    }

    /// `None` when the identity is unknown or has no MAIL FROM domain set
    pub async fn fetch_mail_from_attributes(
        &self,
        name: &str,
    ) -> Result<Option<MailFromDomainAttributes>, EmailError> {
        Ok(self
            .api
            .get_identity_mail_from_domain_attributes(name)
            .await?
            .filter(|attributes| !attributes.mail_from_domain.is_empty()))
    }
}
