use std::sync::Arc;
use tracing::info;

use crate::errors::{EmailError, ALREADY_EXISTS_CODE, RULE_SET_DOES_NOT_EXIST_CODE};
use crate::models::ReceiptRule;
use crate::providers::SesApi;

/// Receipt rule sets and the rules inside them.
///
/// The SES faults the workflow can act on come back as typed variants;
/// anything else is returned untouched.
#[derive(Clone)]
pub struct ReceiptRulesRepository {
    api: Arc<dyn SesApi>,
}

impl ReceiptRulesRepository {
    pub fn new(api: Arc<dyn SesApi>) -> Self {
        Self { api }
    }

    pub async fn create_rule_set(&self, rule_set_name: &str) -> Result<(), EmailError> {
        match self.api.create_receipt_rule_set(rule_set_name).await {
            Ok(()) => {
                info!("Created receipt rule set {}", rule_set_name);
                Ok(())
            }
            Err(e) if e.code() == Some(ALREADY_EXISTS_CODE) => {
                Err(EmailError::RuleSetAlreadyExists(rule_set_name.to_string()))
            }
            Err(e) => Err(e),
        }
    }

    pub async fn activate_rule_set(&self, rule_set_name: &str) -> Result<(), EmailError> {
        match self.api.set_active_receipt_rule_set(rule_set_name).await {
            Ok(()) => {
                info!("Activated receipt rule set {}", rule_set_name);
                Ok(())
            }
            Err(e) if e.code() == Some(RULE_SET_DOES_NOT_EXIST_CODE) => {
                Err(EmailError::RuleSetDoesNotExist(rule_set_name.to_string()))
            }
            Err(e) => Err(e),
        }
    }

    pub async fn create_rule(&self, rule: &ReceiptRule) -> Result<(), EmailError> {
        match self.api.create_receipt_rule(rule).await {
            Ok(()) => {
                info!(
                    "Created receipt rule {} in rule set {}",
                    rule.name, rule.rule_set_name
                );
                Ok(())
            }
            Err(e) if e.code() == Some(ALREADY_EXISTS_CODE) => {
                Err(EmailError::RuleAlreadyExists(rule.name.clone()))
            }
            Err(e) => Err(e),
        }
    }
}
