//! IAM Remediator
//!
//! Disables the credentials of a suspicious IAM user and notifies operators.
//!
//! # Usage
//! ```bash
//! # Remediate the actor of a single CloudTrail event
//! iam-remediator --topic-arn arn:aws:sns:us-east-1:123456789012:iam-alerts \
//!     remediate --event event.json
//!
//! # Read the event from stdin
//! cat event.json | iam-remediator remediate --event -
//!
//! # Serve the webhook
//! EXEMPT_USERS=svc-deploy,ci-bot iam-remediator serve --port 8080
//! ```

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, Instrument, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use uuid::Uuid;

use iam_remediation::aws::{self, AwsIamProvider, SnsChannel};
use iam_remediation::config::DEFAULT_SUBJECT;
use iam_remediation::{server, ExemptionSet, IdentityEvent, Remediator, RemediatorConfig};

// ============================================================
// CLI Definition
// ============================================================

#[derive(Parser)]
#[command(name = "iam-remediator")]
#[command(about = "IAM auto-remediation agent", long_about = None)]
#[command(version)]
struct Cli {
    /// SNS topic that receives remediation alerts
    #[arg(long, env = "SNS_TOPIC_ARN")]
    topic_arn: String,

    /// Comma-separated IAM users that are never remediated
    #[arg(long, env = "EXEMPT_USERS", default_value = "")]
    exempt_users: String,

    /// Notification subject
    #[arg(long, env = "REMEDIATION_SUBJECT", default_value = DEFAULT_SUBJECT)]
    subject: String,

    /// Log output format
    #[arg(long, value_enum, env = "LOG_FORMAT", default_value = "text")]
    log_format: LogFormat,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Remediate the actor of one event
    Remediate {
        /// Event JSON file, or "-" for stdin
        #[arg(long, default_value = "-")]
        event: String,

        /// Output format
        #[arg(long, value_enum, default_value = "json")]
        output: OutputFormat,
    },

    /// Serve the HTTP webhook
    Serve {
        #[arg(long, env = "PORT", default_value = "8080")]
        port: u16,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output
    Json,
}

// ============================================================
// Main Entry Point
// ============================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.log_format)?;

    let exemptions = ExemptionSet::from_list(&cli.exempt_users);
    info!(
        topic = %cli.topic_arn,
        exemptions = exemptions.len(),
        "🚀 IAM remediator starting"
    );

    let sdk = aws::load_config().await;
    let remediator = Remediator::new(
        Arc::new(AwsIamProvider::new(&sdk)),
        Arc::new(SnsChannel::new(&sdk, &cli.topic_arn)),
        RemediatorConfig::new(exemptions).with_subject(cli.subject),
    );

    match cli.command {
        Commands::Remediate { event, output } => {
            let event = IdentityEvent::load(&event, std::io::stdin().lock())
                .with_context(|| format!("Failed to load event from {}", event))?;

            let span = tracing::info_span!("remediation", invocation_id = %Uuid::new_v4());
            let outcome = remediator.remediate(&event).instrument(span).await;

            match output {
                OutputFormat::Text => println!("{}", outcome.display()),
                OutputFormat::Json => println!(
                    "{}",
                    serde_json::to_string_pretty(&outcome).context("Failed to serialize outcome")?
                ),
            }

            if let Some(reason) = outcome.failure_reason() {
                anyhow::bail!("Remediation failed: {}", reason);
            }
        }

        Commands::Serve { port } => {
            server::serve(Arc::new(remediator), port).await?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool, format: LogFormat) -> Result<()> {
    // RUST_LOG wins over --verbose when set
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));

    let builder = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Text => tracing::subscriber::set_global_default(builder.finish())?,
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish())?,
    }
    Ok(())
}
