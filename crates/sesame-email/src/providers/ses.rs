//! AWS SES (classic API) implementation of [`SesApi`]

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_ses::{
    error::{ProvideErrorMetadata, SdkError},
    types, Client,
};
use tracing::{debug, error};

use super::traits::SesApi;
use crate::errors::EmailError;
use crate::models::{
    BehaviorOnMxFailure, DkimAttributes, MailFromDomainAttributes, MailFromDomainStatus,
    ReceiptAction, ReceiptRule, VerificationStatus,
};

/// Extract detailed error information from transport-level SDK errors
fn extract_ses_error_details<E: std::fmt::Display + std::fmt::Debug>(
    e: &SdkError<E>,
) -> String {
    match e {
        SdkError::ServiceError(service_err) => format!("{}", service_err.err()),
        SdkError::TimeoutError(_) => {
            "Request timed out. Please check your network connection and try again.".to_string()
        }
        SdkError::DispatchFailure(dispatch_err) => {
            if dispatch_err.is_io() {
                "Network error: Unable to connect to AWS SES. Please verify your network connection and credentials.".to_string()
            } else if dispatch_err.is_timeout() {
                "Connection timed out. Please try again.".to_string()
            } else if dispatch_err.is_user() {
                format!("Configuration error: {:?}", dispatch_err)
            } else {
                format!("Connection failed: {:?}", dispatch_err)
            }
        }
        SdkError::ConstructionFailure(_) => {
            "Invalid request configuration. Please check your AWS settings.".to_string()
        }
        SdkError::ResponseError(resp_err) => {
            format!("Unexpected response from AWS: {:?}", resp_err)
        }
        _ => format!("{:?}", e),
    }
}

/// Service faults keep their SES code so the repositories can classify them
fn map_sdk_error<E>(operation: &str, e: SdkError<E>) -> EmailError
where
    E: ProvideErrorMetadata + std::fmt::Display + std::fmt::Debug,
{
    if let Some(service_err) = e.as_service_error() {
        let code = service_err.code().unwrap_or("Unknown").to_string();
        let message = service_err.message().unwrap_or("no message").to_string();
        debug!("SES {} failed with {}: {}", operation, code, message);
        return EmailError::Service {
            operation: operation.to_string(),
            code,
            message,
        };
    }

    let details = extract_ses_error_details(&e);
    error!("SES {} failed: {}", operation, details);
    EmailError::AwsSes(format!("{} failed: {}", operation, details))
}

/// AWS SES provider backed by `aws-sdk-ses`
pub struct SesClient {
    client: Client,
}

impl SesClient {
    /// Build from an already loaded AWS config (region, credentials, endpoint)
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }

    fn to_sdk_rule(rule: &ReceiptRule) -> Result<types::ReceiptRule, EmailError> {
        let mut builder = types::ReceiptRule::builder()
            .name(&rule.name)
            .enabled(rule.rule.enabled)
            .scan_enabled(rule.rule.scan_enabled)
            .tls_policy(types::TlsPolicy::from(rule.rule.tls_policy.as_str()));

        for action in &rule.rule.actions {
            let sdk_action = match action {
                ReceiptAction::S3 {
                    bucket_name,
                    object_key_prefix,
                } => types::ReceiptAction::builder()
                    .s3_action(
                        types::S3Action::builder()
                            .bucket_name(bucket_name)
                            .object_key_prefix(object_key_prefix)
                            .build()
                            .map_err(|e| {
                                EmailError::Configuration(format!("Invalid S3 action: {}", e))
                            })?,
                    )
                    .build(),
                ReceiptAction::Stop { scope } => types::ReceiptAction::builder()
                    .stop_action(
                        types::StopAction::builder()
                            .scope(types::StopScope::from(scope.as_str()))
                            .build()
                            .map_err(|e| {
                                EmailError::Configuration(format!("Invalid stop action: {}", e))
                            })?,
                    )
                    .build(),
            };
            builder = builder.actions(sdk_action);
        }

        builder
            .build()
            .map_err(|e| EmailError::Configuration(format!("Invalid receipt rule: {}", e)))
    }
}

#[async_trait]
impl SesApi for SesClient {
    async fn get_identity_dkim_attributes(
        &self,
        identity: &str,
    ) -> Result<Option<DkimAttributes>, EmailError> {
        debug!("Fetching DKIM attributes for {}", identity);

        let result = self
            .client
            .get_identity_dkim_attributes()
            .identities(identity)
            .send()
            .await
            .map_err(|e| map_sdk_error("GetIdentityDkimAttributes", e))?;

        Ok(result
            .dkim_attributes()
            .get(identity)
            .map(|attributes| DkimAttributes {
                name: identity.to_string(),
                verification_status: VerificationStatus::from_str(
                    attributes.dkim_verification_status().as_str(),
                ),
                dkim_tokens: attributes.dkim_tokens().to_vec(),
            }))
    }

    async fn verify_domain_dkim(&self, domain: &str) -> Result<Vec<String>, EmailError> {
        debug!("Requesting DKIM verification for {}", domain);

        let result = self
            .client
            .verify_domain_dkim()
            .domain(domain)
            .send()
            .await
            .map_err(|e| map_sdk_error("VerifyDomainDkim", e))?;

        Ok(result.dkim_tokens().to_vec())
    }

    async fn get_identity_mail_from_domain_attributes(
        &self,
        identity: &str,
    ) -> Result<Option<MailFromDomainAttributes>, EmailError> {
        debug!("Fetching MAIL FROM attributes for {}", identity);

        let result = self
            .client
            .get_identity_mail_from_domain_attributes()
            .identities(identity)
            .send()
            .await
            .map_err(|e| map_sdk_error("GetIdentityMailFromDomainAttributes", e))?;

        Ok(result
            .mail_from_domain_attributes()
            .get(identity)
            .map(|attributes| {
                let mail_from_domain = attributes.mail_from_domain().to_string();
                // SES reports a status even when no custom domain is set
                let mail_from_domain_status = if mail_from_domain.is_empty() {
                    None
                } else {
                    Some(MailFromDomainStatus::from_str(
                        attributes.mail_from_domain_status().as_str(),
                    ))
                };
                MailFromDomainAttributes {
                    name: identity.to_string(),
                    mail_from_domain,
                    behavior_on_mx_failure: BehaviorOnMxFailure::from_str(
                        attributes.behavior_on_mx_failure().as_str(),
                    ),
                    mail_from_domain_status,
                }
            }))
    }

    async fn set_identity_mail_from_domain(
        &self,
        attributes: &MailFromDomainAttributes,
    ) -> Result<(), EmailError> {
        debug!(
            "Setting MAIL FROM domain {} for {}",
            attributes.mail_from_domain, attributes.name
        );

        self.client
            .set_identity_mail_from_domain()
            .identity(&attributes.name)
            .mail_from_domain(&attributes.mail_from_domain)
            .behavior_on_mx_failure(types::BehaviorOnMxFailure::from(
                attributes.behavior_on_mx_failure.as_str(),
            ))
            .send()
            .await
            .map_err(|e| map_sdk_error("SetIdentityMailFromDomain", e))?;

        Ok(())
    }

    async fn create_receipt_rule_set(&self, rule_set_name: &str) -> Result<(), EmailError> {
        debug!("Creating receipt rule set {}", rule_set_name);

        self.client
            .create_receipt_rule_set()
            .rule_set_name(rule_set_name)
            .send()
            .await
            .map_err(|e| map_sdk_error("CreateReceiptRuleSet", e))?;

        Ok(())
    }

    async fn set_active_receipt_rule_set(&self, rule_set_name: &str) -> Result<(), EmailError> {
        debug!("Activating receipt rule set {}", rule_set_name);

        self.client
            .set_active_receipt_rule_set()
            .rule_set_name(rule_set_name)
            .send()
            .await
            .map_err(|e| map_sdk_error("SetActiveReceiptRuleSet", e))?;

        Ok(())
    }

    async fn create_receipt_rule(&self, rule: &ReceiptRule) -> Result<(), EmailError> {
        debug!(
            "Creating receipt rule {} in rule set {}",
            rule.name, rule.rule_set_name
        );

        let sdk_rule = Self::to_sdk_rule(rule)?;

        self.client
            .create_receipt_rule()
            .rule_set_name(&rule.rule_set_name)
            .rule(sdk_rule)
            .send()
            .await
            .map_err(|e| map_sdk_error("CreateReceiptRule", e))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TlsPolicy;

    #[test]
    fn test_to_sdk_rule_keeps_action_order() {
        let rule = ReceiptRule::proxy(
            "rule-set-for-sesame-acme",
            "rule-set-for-sesame-acme",
            "inbound-bucket",
            "staged",
            TlsPolicy::Require,
        );

        let sdk_rule = SesClient::to_sdk_rule(&rule).unwrap();

        assert_eq!(sdk_rule.name(), "rule-set-for-sesame-acme");
        assert!(sdk_rule.enabled());
        assert!(sdk_rule.scan_enabled());
        assert_eq!(sdk_rule.tls_policy(), Some(&types::TlsPolicy::Require));

        let actions = sdk_rule.actions();
        assert_eq!(actions.len(), 2);
        let s3 = actions[0].s3_action().unwrap();
        assert_eq!(s3.bucket_name(), "inbound-bucket");
        assert_eq!(s3.object_key_prefix(), Some("staged"));
        let stop = actions[1].stop_action().unwrap();
        assert_eq!(stop.scope(), &types::StopScope::RuleSet);
    }

    #[test]
    fn test_extract_details_for_timeout() {
        let err: SdkError<std::io::Error> = SdkError::timeout_error("deadline exceeded");
        assert_eq!(
            extract_ses_error_details(&err),
            "Request timed out. Please check your network connection and try again."
        );
    }

    #[test]
    fn test_optional_tls_policy_maps_to_sdk() {
        let rule = ReceiptRule::proxy("r", "s", "bucket", "staged", TlsPolicy::Optional);
        let sdk_rule = SesClient::to_sdk_rule(&rule).unwrap();
        assert_eq!(sdk_rule.tls_policy(), Some(&types::TlsPolicy::Optional));
    }
}
