//! sesame CLI - provisions AWS SES and Route53 for one email domain
//!
//! Verifies the sending identity, publishes the DKIM, MX and MAIL FROM
//! records (or lists them when the domain is not hosted in Route53) and,
//! given a workspace, sets up a receipt rule set that archives inbound mail
//! to S3.

mod commands;

use clap::Parser;
use commands::ProvisionCommand;
use tracing_subscriber::{layer::SubscriberExt, Layer};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "SESAME_LOG_LEVEL")]
    log_level: String,

    /// Log format: compact, full
    #[arg(long, default_value = "compact", env = "SESAME_LOG_FORMAT")]
    log_format: String,

    #[command(flatten)]
    provision: ProvisionCommand,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // If RUST_LOG is set, use it directly; otherwise use our default filter
    let filter = if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .expect("Invalid RUST_LOG environment variable")
    } else {
        // sesame crates at the requested level, noisy dependencies at warn
        tracing_subscriber::EnvFilter::new(format!(
            "sesame_cli={level},\
             sesame_email={level},\
             sesame_dns={level},\
             aws_config=warn,\
             aws_smithy_runtime=warn,\
             hyper=warn,\
             reqwest=warn,\
             rustls=warn",
            level = cli.log_level
        ))
    };

    // Logs stay off stdout so JSON reports can be piped
    let fmt_layer = match cli.log_format.as_str() {
        "full" => tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .boxed(),
        _ => tracing_subscriber::fmt::layer() // "compact" or any other value
            .with_writer(std::io::stderr)
            .compact()
            .with_target(false)
            .with_thread_ids(false)
            .with_thread_names(false)
            .boxed(),
    };

    let subscriber = tracing_subscriber::registry().with(filter).with(fmt_layer);
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set global default subscriber");

    cli.provision.execute()
}
