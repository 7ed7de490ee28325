//! Provisioning workflow for one email domain

use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use sesame_dns::{
    HostedZoneRecord, HostedZoneRepository, RecordType, Route53Api, ZoneRecordsRepository,
};

use crate::config::ProvisioningSettings;
use crate::errors::EmailError;
use crate::models::{
    DkimAttributes, MailFromDomainAttributes, ReceiptRule, VerificationStatus, MAIL_RECORD_TTL,
    SPF_RECORD_VALUE,
};
use crate::providers::SesApi;
use crate::region::{feedback_smtp_endpoint, inbound_smtp_endpoint};
use crate::repositories::{IdentityRepository, ReceiptRulesRepository};
use crate::services::ProvisioningReport;

/// Brings SES and Route53 in line with what one domain needs to send and
/// receive mail.
///
/// Each `configure_*` step checks current state and creates only what is
/// missing. Records that cannot be placed (no hosted zone, MAIL FROM not yet
/// accepted) are collected in `records_pending_creation` instead of failing
/// the run. Receipt rule failures are collected per rule set.
///
/// One instance serves one domain; steps run sequentially.
pub struct ProvisioningService {
    domain: String,
    settings: ProvisioningSettings,
    identities: IdentityRepository,
    zone_records: ZoneRecordsRepository,
    receipt_rules: ReceiptRulesRepository,
    hosted_zone_id: Option<String>,
    /// Zone contents, fetched on first use. Records created by this instance
    /// are NOT added back; call `invalidate_zone_records` to force a re-read.
    existing_records: Option<Vec<HostedZoneRecord>>,
    records_created: Vec<HostedZoneRecord>,
    records_pending_creation: Vec<HostedZoneRecord>,
    rules_failed_to_create: BTreeMap<String, String>,
}

impl ProvisioningService {
    /// Validates the settings and resolves the domain's hosted zone.
    pub async fn new(
        domain: impl Into<String>,
        settings: ProvisioningSettings,
        ses: Arc<dyn SesApi>,
        route53: Arc<dyn Route53Api>,
    ) -> Result<Self, EmailError> {
        let domain = domain.into();
        if domain.trim().is_empty() {
            return Err(EmailError::Configuration(
                "domain must not be empty".to_string(),
            ));
        }
        settings.validate()?;

        let hosted_zone_id = HostedZoneRepository::new(route53.clone())
            .resolve(&domain)
            .await?;

        match &hosted_zone_id {
            Some(id) => info!("Using hosted zone {} for {}", id, domain),
            None => warn!(
                "No hosted zone manages {}, DNS records will be listed for manual setup",
                domain
            ),
        }

        Ok(Self {
            domain,
            settings,
            identities: IdentityRepository::new(ses.clone()),
            zone_records: ZoneRecordsRepository::new(route53),
            receipt_rules: ReceiptRulesRepository::new(ses),
            hosted_zone_id,
            existing_records: None,
            records_created: Vec::new(),
            records_pending_creation: Vec::new(),
            rules_failed_to_create: BTreeMap::new(),
        })
    }

    /// Sending, receiving and MAIL FROM, then the receipt rules when a
    /// workspace is given. The first untolerated fault aborts the run; the
    /// accumulated state stays readable through [`Self::report`].
    pub async fn run(&mut self, workspace: Option<&str>) -> Result<ProvisioningReport, EmailError> {
        self.configure_sending_email().await?;
        self.configure_receiving_email().await?;
        self.configure_mail_from_domain().await?;

        if let Some(workspace) = workspace {
            self.configure_email_receiving_rules(workspace).await?;
        }

        Ok(self.report())
    }

    /// Ensure DKIM verification and publish the DKIM CNAMEs while it is pending.
    pub async fn configure_sending_email(&mut self) -> Result<(), EmailError> {
        info!("Configuring SES identity {} for sending", self.domain);

        let identity = self
            .identities
            .ensure_dkim_verification(DkimAttributes::new(self.domain.as_str()))
            .await?;

        if identity.verification_status != VerificationStatus::Pending {
            debug!(
                "DKIM status of {} is {}, no records to publish",
                self.domain, identity.verification_status
            );
            return Ok(());
        }

        self.reconcile(identity.dkim_records()).await
    }

    /// Route inbound mail for the domain to the regional SES endpoint.
    pub async fn configure_receiving_email(&mut self) -> Result<(), EmailError> {
        info!("Configuring {} to receive email", self.domain);

        let mx = HostedZoneRecord::new(
            self.domain.as_str(),
            RecordType::MX,
            MAIL_RECORD_TTL,
            vec![format!("10 {}", inbound_smtp_endpoint(&self.settings.region))],
        );

        self.reconcile(vec![mx]).await
    }

    /// Align MAIL FROM on the bounce subdomain: MX to the feedback endpoint
    /// and an SPF TXT record.
    ///
    /// An identity that already has a MAIL FROM domain keeps it, and the
    /// records are published for that domain rather than the configured one.
    pub async fn configure_mail_from_domain(&mut self) -> Result<(), EmailError> {
        let desired_domain = self.settings.mail_from_domain(&self.domain);
        info!(
            "Configuring MAIL FROM of {} as {}",
            self.domain, desired_domain
        );

        let attributes = self
            .identities
            .ensure_mail_from_alignment(MailFromDomainAttributes::new(
                self.domain.as_str(),
                desired_domain.as_str(),
            ))
            .await?;

        let mail_from_domain = attributes.mail_from_domain.as_str();
        if mail_from_domain != desired_domain {
            warn!(
                "Identity {} keeps its MAIL FROM domain {} instead of {}",
                self.domain, mail_from_domain, desired_domain
            );
        }

        let records = vec![
            HostedZoneRecord::new(
                mail_from_domain,
                RecordType::MX,
                MAIL_RECORD_TTL,
                vec![format!(
                    "10 {}",
                    feedback_smtp_endpoint(&self.settings.region)
                )],
            ),
            HostedZoneRecord::new(
                mail_from_domain,
                RecordType::TXT,
                MAIL_RECORD_TTL,
                vec![SPF_RECORD_VALUE.to_string()],
            ),
        ];

        if !attributes.is_ready() {
            warn!(
                "MAIL FROM domain {} is not accepted yet (status {}), records left for manual setup",
                mail_from_domain,
                attributes
                    .mail_from_domain_status
                    .as_ref()
                    .map(|status| status.to_string())
                    .unwrap_or_else(|| "unset".to_string())
            );
            self.records_pending_creation.extend(records);
            return Ok(());
        }

        self.reconcile(records).await
    }

    /// Create and activate the workspace rule set with a single archive rule.
    ///
    /// An existing rule set or rule is fine. A rule set SES cannot activate is
    /// recorded and the step ends. Any other fault is recorded under the rule
    /// set name and returned.
    pub async fn configure_email_receiving_rules(
        &mut self,
        workspace: &str,
    ) -> Result<(), EmailError> {
        if workspace.trim().is_empty() {
            return Err(EmailError::Configuration(
                "workspace must not be empty".to_string(),
            ));
        }

        let rule_set_name = self.settings.rule_set_name(workspace);
        info!("Configuring receipt rule set {}", rule_set_name);

        match self.receipt_rules.create_rule_set(&rule_set_name).await {
            Ok(()) => {}
            Err(EmailError::RuleSetAlreadyExists(_)) => {
                info!("Rule set '{}' already exists", rule_set_name);
            }
            Err(e) => return Err(self.record_rule_failure(&rule_set_name, e)),
        }

        let rule = ReceiptRule::proxy(
            rule_set_name.as_str(),
            rule_set_name.as_str(),
            self.settings.archive_bucket.as_str(),
            self.settings.archive_prefix.as_str(),
            self.settings.tls_policy,
        );

        match self.receipt_rules.create_rule(&rule).await {
            Ok(()) => {}
            Err(EmailError::RuleAlreadyExists(_)) => {
                info!("Rule '{}' already exists", rule.name);
            }
            Err(e) => return Err(self.record_rule_failure(&rule_set_name, e)),
        }

        match self.receipt_rules.activate_rule_set(&rule_set_name).await {
            Ok(()) => Ok(()),
            Err(e @ EmailError::RuleSetDoesNotExist(_)) => {
                error!(
                    "Unable to activate rule set '{}', it does not exist",
                    rule_set_name
                );
                self.rules_failed_to_create
                    .insert(rule_set_name, e.summary());
                Ok(())
            }
            Err(e) => Err(self.record_rule_failure(&rule_set_name, e)),
        }
    }

    /// Drop the cached zone contents so the next step reads them again.
    pub fn invalidate_zone_records(&mut self) {
        self.existing_records = None;
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn hosted_zone_id(&self) -> Option<&str> {
        self.hosted_zone_id.as_deref()
    }

    pub fn records_created(&self) -> &[HostedZoneRecord] {
        &self.records_created
    }

    pub fn records_pending_creation(&self) -> &[HostedZoneRecord] {
        &self.records_pending_creation
    }

    pub fn rules_failed_to_create(&self) -> &BTreeMap<String, String> {
        &self.rules_failed_to_create
    }

    pub fn report(&self) -> ProvisioningReport {
        ProvisioningReport {
            domain: self.domain.clone(),
            hosted_zone_id: self.hosted_zone_id.clone(),
            records_created: self.records_created.clone(),
            records_pending_creation: self.records_pending_creation.clone(),
            rules_failed_to_create: self.rules_failed_to_create.clone(),
        }
    }

    /// Create the desired records the zone lacks, or collect all of them
    /// when there is no zone to write to.
    async fn reconcile(&mut self, desired: Vec<HostedZoneRecord>) -> Result<(), EmailError> {
        let Some(zone_id) = self.hosted_zone_id.clone() else {
            for record in &desired {
                warn!("Record needs manual setup: {}", record);
            }
            self.records_pending_creation.extend(desired);
            return Ok(());
        };

        let existing = self.existing_records(&zone_id).await?;
        let (present, missing): (Vec<_>, Vec<_>) = desired
            .into_iter()
            .partition(|record| record.is_covered_by(existing));

        for record in present {
            info!(
                "A {} record for {} is already present",
                record.record_type, record.name
            );
        }

        for record in missing {
            self.zone_records.create_record(&zone_id, &record).await?;
            self.records_created.push(record);
        }

        Ok(())
    }

    async fn existing_records(
        &mut self,
        zone_id: &str,
    ) -> Result<&[HostedZoneRecord], EmailError> {
        if self.existing_records.is_none() {
            let records = self.zone_records.list_records(zone_id).await?;
            self.existing_records = Some(records);
        }
        Ok(self.existing_records.as_deref().unwrap_or_default())
    }

    fn record_rule_failure(&mut self, rule_set_name: &str, e: EmailError) -> EmailError {
        error!("Failed to configure rule set '{}': {}", rule_set_name, e);
        self.rules_failed_to_create
            .insert(rule_set_name.to_string(), e.summary());
        e
    }
}
