//! Provision command
//!
//! Loads AWS configuration the usual way (environment, profile, instance
//! metadata), asks for confirmation and runs the provisioning workflow for
//! one domain.

use anyhow::Context;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_credential_types::provider::ProvideCredentials;
use clap::Args;
use colored::Colorize;
use sesame_dns::{Route53Client, Route53Credentials};
use sesame_email::config::{
    DEFAULT_ARCHIVE_BUCKET, DEFAULT_ARCHIVE_PREFIX, DEFAULT_MAIL_FROM_SUBDOMAIN,
    DEFAULT_RULE_SET_PREFIX,
};
use sesame_email::{
    EmailError, ProvisioningReport, ProvisioningService, ProvisioningSettings, SesClient,
    TlsPolicy,
};
use std::io::{self, Write};
use std::sync::Arc;
use tracing::{debug, error};

/// IAM actions the workflow calls, shown when AWS rejects a request
const REQUIRED_PERMISSIONS: [(&str, &[&str]); 2] = [
    (
        "AWS SES",
        &[
            "ses:GetIdentityDkimAttributes",
            "ses:VerifyDomainDkim",
            "ses:GetIdentityMailFromDomainAttributes",
            "ses:SetIdentityMailFromDomain",
            "ses:CreateReceiptRuleSet",
            "ses:CreateReceiptRule",
            "ses:SetActiveReceiptRuleSet",
        ],
    ),
    (
        "AWS Route53",
        &[
            "route53:ListHostedZonesByName",
            "route53:ListResourceRecordSets",
            "route53:ChangeResourceRecordSets",
        ],
    ),
];

/// Output format for the final report
#[derive(Debug, Clone, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output with colors and formatting
    #[default]
    Text,
    /// JSON output for automation and scripting
    Json,
}

impl OutputFormat {
    /// JSON mode keeps stdout for the report alone; banner, plan, prompts
    /// and hints move to stderr.
    fn status_to_stderr(&self) -> bool {
        matches!(self, OutputFormat::Json)
    }

    fn status_writer(&self) -> Box<dyn Write> {
        if self.status_to_stderr() {
            Box::new(io::stderr())
        } else {
            Box::new(io::stdout())
        }
    }
}

#[derive(Args)]
pub struct ProvisionCommand {
    /// Email domain to configure (e.g. example.com)
    pub domain: String,

    /// Workspace identifier; when given, a receipt rule set archiving inbound
    /// mail to S3 is created and activated for it
    pub workspace: Option<String>,

    /// Do not prompt for confirmation
    #[arg(long, short = 'y', env = "SESAME_YES")]
    pub yes: bool,

    /// AWS region (defaults to the region of the active AWS profile)
    #[arg(long, env = "SESAME_REGION")]
    pub region: Option<String>,

    /// S3 bucket inbound mail is archived to
    #[arg(long, env = "SESAME_ARCHIVE_BUCKET", default_value = DEFAULT_ARCHIVE_BUCKET)]
    pub bucket: String,

    /// Object key prefix inside the archive bucket
    #[arg(long, env = "SESAME_ARCHIVE_PREFIX", default_value = DEFAULT_ARCHIVE_PREFIX)]
    pub prefix: String,

    /// Rule sets are named rule-set-for-<prefix>-<workspace>
    #[arg(long, env = "SESAME_RULE_SET_PREFIX", default_value = DEFAULT_RULE_SET_PREFIX)]
    pub rule_set_prefix: String,

    /// Subdomain used as MAIL FROM domain
    #[arg(long, env = "SESAME_MAIL_FROM_SUBDOMAIN", default_value = DEFAULT_MAIL_FROM_SUBDOMAIN)]
    pub mail_from_subdomain: String,

    /// Reject inbound mail that is not sent over TLS
    #[arg(long, env = "SESAME_REQUIRE_TLS")]
    pub require_tls: bool,

    /// Custom AWS endpoint for SES and Route53 (e.g. a local emulator)
    #[arg(long, env = "SESAME_AWS_ENDPOINT_URL")]
    pub endpoint_url: Option<String>,

    /// Report format
    #[arg(long, value_enum, default_value = "text", env = "SESAME_OUTPUT")]
    pub output: OutputFormat,
}

impl ProvisionCommand {
    pub fn execute(self) -> anyhow::Result<()> {
        let mut status = self.output.status_writer();
        print_banner(&mut *status)?;

        let rt = tokio::runtime::Runtime::new()?;
        let result = rt.block_on(self.provision(&mut *status));

        if let Err(e) = &result {
            if let Some(email_error) = e.downcast_ref::<EmailError>() {
                if needs_permissions_hint(email_error) {
                    print_permissions_hint(&mut *status, email_error)?;
                }
            }
        }

        writeln!(status)?;
        writeln!(
            status,
            "{}",
            "Thanks for using sesame, have a nice day!".bright_white()
        )?;
        writeln!(status)?;

        result
    }

    async fn provision(&self, status: &mut dyn Write) -> anyhow::Result<()> {
        let sdk_config = self.load_aws_config().await;

        let region = sdk_config
            .region()
            .map(|region| region.to_string())
            .ok_or_else(|| {
                EmailError::Configuration(
                    "No AWS region configured. Use --region or set AWS_REGION.".to_string(),
                )
            })?;

        let settings = self.settings(region);
        settings.validate()?;

        let route53 = Route53Client::new(self.route53_credentials(&sdk_config).await?)
            .map_err(EmailError::from)?;
        let ses = SesClient::new(&sdk_config);

        let mut service = ProvisioningService::new(
            self.domain.as_str(),
            settings.clone(),
            Arc::new(ses),
            Arc::new(route53),
        )
        .await?;

        self.print_plan(status, &settings, service.hosted_zone_id())?;

        if !self.yes
            && !ask_confirmation(status, "Do you want to continue? [y/n]:")
                .context("Failed to read confirmation")?
        {
            writeln!(status)?;
            writeln!(status, "{}", "Aborted, nothing was changed.".bright_yellow())?;
            return Ok(());
        }

        let result = service.run(self.workspace.as_deref()).await;
        self.print_report(&mut io::stdout(), &service.report())?;

        result
            .map(|_| ())
            .with_context(|| format!("Provisioning of {} did not complete", self.domain))
    }

    async fn load_aws_config(&self) -> SdkConfig {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());

        if let Some(region) = &self.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some(endpoint_url) = &self.endpoint_url {
            loader = loader.endpoint_url(endpoint_url);
        }

        loader.load().await
    }

    /// Route53 is called over signed REST, so it needs the resolved keys
    async fn route53_credentials(
        &self,
        sdk_config: &SdkConfig,
    ) -> Result<Route53Credentials, EmailError> {
        let provider = sdk_config.credentials_provider().ok_or_else(|| {
            EmailError::MissingCredentials("no AWS credentials provider configured".to_string())
        })?;

        let credentials = provider
            .provide_credentials()
            .await
            .map_err(|e| EmailError::MissingCredentials(e.to_string()))?;
        debug!("Resolved AWS credentials for Route53");

        let mut route53_credentials = Route53Credentials::new(
            credentials.access_key_id(),
            credentials.secret_access_key(),
        )
        .with_session_token(credentials.session_token().map(str::to_string));

        if let Some(endpoint_url) = &self.endpoint_url {
            route53_credentials = route53_credentials.with_endpoint_url(endpoint_url.as_str());
        }

        Ok(route53_credentials)
    }

    fn settings(&self, region: String) -> ProvisioningSettings {
        ProvisioningSettings {
            region,
            archive_bucket: self.bucket.clone(),
            archive_prefix: self.prefix.clone(),
            rule_set_prefix: self.rule_set_prefix.clone(),
            mail_from_subdomain: self.mail_from_subdomain.clone(),
            tls_policy: if self.require_tls {
                TlsPolicy::Require
            } else {
                TlsPolicy::Optional
            },
        }
    }

    fn print_plan(
        &self,
        out: &mut dyn Write,
        settings: &ProvisioningSettings,
        hosted_zone_id: Option<&str>,
    ) -> io::Result<()> {
        print_section(out, "Plan")?;
        print_info(out, "Domain", &self.domain)?;
        print_info(out, "Region", &settings.region)?;
        print_info(
            out,
            "Hosted zone",
            hosted_zone_id.unwrap_or("none (records will be listed for manual setup)"),
        )?;
        print_info(
            out,
            "MAIL FROM domain",
            &settings.mail_from_domain(&self.domain),
        )?;

        match &self.workspace {
            Some(workspace) => {
                print_info(out, "Receipt rule set", &settings.rule_set_name(workspace))?;
                print_info(
                    out,
                    "Archive",
                    &format!("s3://{}/{}", settings.archive_bucket, settings.archive_prefix),
                )?;
            }
            None => print_info(out, "Receipt rule set", "skipped (no workspace given)")?,
        }
        writeln!(out)
    }

    fn print_report(&self, out: &mut dyn Write, report: &ProvisioningReport) -> anyhow::Result<()> {
        if let OutputFormat::Json = self.output {
            writeln!(out, "{}", serde_json::to_string_pretty(report)?)?;
            return Ok(());
        }

        print_section(out, "Summary")?;

        for record in &report.records_created {
            print_success(out, &format!("Created {}", record))?;
        }

        if !report.records_pending_creation.is_empty() {
            print_warning(
                out,
                "Unable to create records, please add these to your DNS configuration:",
            )?;
            for line in report.pending_lines() {
                writeln!(out, "       {} {}", "-".bright_cyan(), line)?;
            }
        }

        if !report.rules_failed_to_create.is_empty() {
            print_error(out, "Unable to configure the following receipt rule sets:")?;
            for line in report.failure_lines() {
                writeln!(out, "       {} {}", "-".bright_cyan(), line)?;
            }
        }

        if report.is_complete() {
            print_success(
                out,
                &format!("{} is ready to send and receive email", report.domain),
            )?;
        }

        Ok(())
    }
}

/// Faults AWS raised (or could not be asked) usually mean missing permissions
fn needs_permissions_hint(error: &EmailError) -> bool {
    matches!(
        error,
        EmailError::Service { .. }
            | EmailError::AwsSes(_)
            | EmailError::Dns(_)
            | EmailError::MissingCredentials(_)
    )
}

fn print_permissions_hint(out: &mut dyn Write, error: &EmailError) -> io::Result<()> {
    error!("Provisioning failed: {}", error);

    writeln!(out)?;
    print_error(out, "An error occurred while processing your request.")?;
    writeln!(out)?;
    writeln!(
        out,
        "   {}",
        "Please make sure that you have the following permissions:".bright_white()
    )?;
    for (service, actions) in REQUIRED_PERMISSIONS {
        writeln!(out)?;
        writeln!(out, "   {}", service.bright_white().bold())?;
        for action in actions {
            writeln!(out, "       {}", action.bright_cyan())?;
        }
    }
    writeln!(out)?;
    writeln!(out, "   {}", "Error summary:".bright_white().bold())?;
    writeln!(out, "       {}", error.summary())
}

fn print_banner(out: &mut dyn Write) -> io::Result<()> {
    writeln!(out)?;
    writeln!(
        out,
        "{}",
        "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━".bright_cyan()
    )?;
    writeln!(
        out,
        "{}",
        "     sesame - AWS SES email domain setup".bright_white().bold()
    )?;
    writeln!(
        out,
        "{}",
        "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━".bright_cyan()
    )?;
    writeln!(out)
}

fn print_section(out: &mut dyn Write, title: &str) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", format!("── {} ──", title).bright_yellow().bold())?;
    writeln!(out)
}

fn print_success(out: &mut dyn Write, message: &str) -> io::Result<()> {
    writeln!(out, "{} {}", "✅".bright_green(), message.bright_white())
}

fn print_warning(out: &mut dyn Write, message: &str) -> io::Result<()> {
    writeln!(out, "{} {}", "⚠️ ".bright_yellow(), message.bright_yellow())
}

fn print_error(out: &mut dyn Write, message: &str) -> io::Result<()> {
    writeln!(out, "{} {}", "❌".bright_red(), message.bright_red())
}

fn print_info(out: &mut dyn Write, label: &str, value: &str) -> io::Result<()> {
    writeln!(
        out,
        "   {} {}",
        format!("{}:", label).bright_white().bold(),
        value.bright_cyan()
    )
}

/// `Some(true)` for yes, `Some(false)` for no, `None` for anything else
fn parse_answer(answer: &str) -> Option<bool> {
    match answer.trim().to_lowercase().as_str() {
        "y" | "ye" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

/// Asks until the answer is yes or no. End of input counts as no.
fn ask_confirmation(out: &mut dyn Write, prompt: &str) -> anyhow::Result<bool> {
    loop {
        write!(out, "{} ", prompt.bright_white().bold())?;
        out.flush()?;

        let mut response = String::new();
        if io::stdin().read_line(&mut response)? == 0 {
            return Ok(false);
        }

        if let Some(answer) = parse_answer(&response) {
            return Ok(answer);
        }
    }
}
