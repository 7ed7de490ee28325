//! Stateful SES double for testing

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::errors::{EmailError, ALREADY_EXISTS_CODE, RULE_SET_DOES_NOT_EXIST_CODE};
use crate::models::{
    DkimAttributes, MailFromDomainAttributes, MailFromDomainStatus, ReceiptRule,
    VerificationStatus,
};
use crate::providers::SesApi;

/// Tokens handed out by `verify_domain_dkim`
pub const MOCK_DKIM_TOKENS: [&str; 2] = ["token-a", "token-b"];

/// In-memory SES: identities, MAIL FROM settings and rule sets live in maps,
/// so repeated calls see the effect of earlier ones.
#[derive(Debug, Clone, Default)]
pub struct MockSesApi {
    /// Counter for tracking calls
    pub verify_count: Arc<AtomicUsize>,
    pub set_mail_from_count: Arc<AtomicUsize>,
    pub create_rule_set_count: Arc<AtomicUsize>,
    pub create_rule_count: Arc<AtomicUsize>,
    pub activate_count: Arc<AtomicUsize>,

    pub dkim: Arc<Mutex<HashMap<String, DkimAttributes>>>,
    pub mail_from: Arc<Mutex<HashMap<String, MailFromDomainAttributes>>>,
    /// Rule set name -> rules inside it, in creation order
    pub rule_sets: Arc<Mutex<HashMap<String, Vec<ReceiptRule>>>>,
    pub active_rule_set: Arc<Mutex<Option<String>>>,

    /// Scripted faults, by SES error code
    pub fail_create_rule_set_with: Option<String>,
    pub fail_create_rule_with: Option<String>,
    pub fail_activate_with: Option<String>,
}

impl MockSesApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// An identity SES already knows, with its tokens and status
    pub fn with_dkim_identity(self, name: &str, status: VerificationStatus) -> Self {
        self.dkim.lock().unwrap().insert(
            name.to_string(),
            DkimAttributes {
                name: name.to_string(),
                verification_status: status,
                dkim_tokens: MOCK_DKIM_TOKENS.iter().map(|t| t.to_string()).collect(),
            },
        );
        self
    }

    pub fn with_mail_from(self, attributes: MailFromDomainAttributes) -> Self {
        self.mail_from
            .lock()
            .unwrap()
            .insert(attributes.name.clone(), attributes);
        self
    }

    pub fn with_rule_set(self, name: &str) -> Self {
        self.rule_sets
            .lock()
            .unwrap()
            .insert(name.to_string(), Vec::new());
        self
    }

    pub fn with_create_rule_set_failure(mut self, code: &str) -> Self {
        self.fail_create_rule_set_with = Some(code.to_string());
        self
    }

    pub fn with_create_rule_failure(mut self, code: &str) -> Self {
        self.fail_create_rule_with = Some(code.to_string());
        self
    }

    pub fn with_activate_failure(mut self, code: &str) -> Self {
        self.fail_activate_with = Some(code.to_string());
        self
    }

    pub fn verify_call_count(&self) -> usize {
        self.verify_count.load(Ordering::SeqCst)
    }

    pub fn set_mail_from_call_count(&self) -> usize {
        self.set_mail_from_count.load(Ordering::SeqCst)
    }

    pub fn create_rule_set_call_count(&self) -> usize {
        self.create_rule_set_count.load(Ordering::SeqCst)
    }

    pub fn create_rule_call_count(&self) -> usize {
        self.create_rule_count.load(Ordering::SeqCst)
    }

    pub fn activate_call_count(&self) -> usize {
        self.activate_count.load(Ordering::SeqCst)
    }

    pub fn active_rule_set_name(&self) -> Option<String> {
        self.active_rule_set.lock().unwrap().clone()
    }

    fn fault(operation: &str, code: &str) -> EmailError {
        EmailError::Service {
            operation: operation.to_string(),
            code: code.to_string(),
            message: format!("Mock {} fault", code),
        }
    }
}

#[async_trait]
impl SesApi for MockSesApi {
    async fn get_identity_dkim_attributes(
        &self,
        identity: &str,
    ) -> Result<Option<DkimAttributes>, EmailError> {
        Ok(self.dkim.lock().unwrap().get(identity).cloned())
    }

    async fn verify_domain_dkim(&self, domain: &str) -> Result<Vec<String>, EmailError> {
        self.verify_count.fetch_add(1, Ordering::SeqCst);

        let tokens: Vec<String> = MOCK_DKIM_TOKENS.iter().map(|t| t.to_string()).collect();
        self.dkim.lock().unwrap().insert(
            domain.to_string(),
            DkimAttributes {
                name: domain.to_string(),
                verification_status: VerificationStatus::Pending,
                dkim_tokens: tokens.clone(),
            },
        );
        Ok(tokens)
    }

    async fn get_identity_mail_from_domain_attributes(
        &self,
        identity: &str,
    ) -> Result<Option<MailFromDomainAttributes>, EmailError> {
        Ok(self.mail_from.lock().unwrap().get(identity).cloned())
    }

    async fn set_identity_mail_from_domain(
        &self,
        attributes: &MailFromDomainAttributes,
    ) -> Result<(), EmailError> {
        self.set_mail_from_count.fetch_add(1, Ordering::SeqCst);

        let mut stored = attributes.clone();
        stored.mail_from_domain_status = Some(MailFromDomainStatus::Pending);
        self.mail_from
            .lock()
            .unwrap()
            .insert(attributes.name.clone(), stored);
        Ok(())
    }

    async fn create_receipt_rule_set(&self, rule_set_name: &str) -> Result<(), EmailError> {
        self.create_rule_set_count.fetch_add(1, Ordering::SeqCst);

        if let Some(code) = &self.fail_create_rule_set_with {
            return Err(Self::fault("CreateReceiptRuleSet", code));
        }

        let mut rule_sets = self.rule_sets.lock().unwrap();
        if rule_sets.contains_key(rule_set_name) {
            return Err(Self::fault("CreateReceiptRuleSet", ALREADY_EXISTS_CODE));
        }
        rule_sets.insert(rule_set_name.to_string(), Vec::new());
        Ok(())
    }

    async fn set_active_receipt_rule_set(&self, rule_set_name: &str) -> Result<(), EmailError> {
        self.activate_count.fetch_add(1, Ordering::SeqCst);

        if let Some(code) = &self.fail_activate_with {
            return Err(Self::fault("SetActiveReceiptRuleSet", code));
        }

        if !self.rule_sets.lock().unwrap().contains_key(rule_set_name) {
            return Err(Self::fault(
                "SetActiveReceiptRuleSet",
                RULE_SET_DOES_NOT_EXIST_CODE,
            ));
        }
        *self.active_rule_set.lock().unwrap() = Some(rule_set_name.to_string());
        Ok(())
    }

    async fn create_receipt_rule(&self, rule: &ReceiptRule) -> Result<(), EmailError> {
        self.create_rule_count.fetch_add(1, Ordering::SeqCst);

        if let Some(code) = &self.fail_create_rule_with {
            return Err(Self::fault("CreateReceiptRule", code));
        }

        let mut rule_sets = self.rule_sets.lock().unwrap();
        let rules = rule_sets.get_mut(&rule.rule_set_name).ok_or_else(|| {
            Self::fault("CreateReceiptRule", RULE_SET_DOES_NOT_EXIST_CODE)
        })?;
        if rules.iter().any(|existing| existing.name == rule.name) {
            return Err(Self::fault("CreateReceiptRule", ALREADY_EXISTS_CODE));
        }
        rules.push(rule.clone());
        Ok(())
    }
}
