//! Command-line interface for the substitution checker.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{error, info};

use crate::analyze::OpenAiAnalyzer;
use crate::check::{check, CheckOutcome, NotificationOutcome};
use crate::config::{load_config, RunMode};
use crate::download::HttpDownloader;
use crate::extract::PdfExtractor;
use crate::notify::MailNotifier;

/// CLI for the substitution checker: fetch, summarise and deliver the
/// daily plan.
#[derive(Parser)]
#[clap(
    name = "substitution-checker",
    version,
    about = "Fetches the school's substitution plan, summarises the changes for the class and mails the result"
)]
pub struct Cli {
    /// Log at debug level
    #[clap(long, global = true)]
    pub verbose: bool,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one complete plan check with the environment configuration
    Check {
        /// Resolve and log the summary without sending the email
        #[clap(long)]
        dry_run: bool,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Check { dry_run } => {
            let mut config = load_config()?;
            if dry_run {
                config.mode = RunMode::DryRun;
            }
            config.trace_loaded();

            let downloader = HttpDownloader::new(&config)?;
            let extractor = PdfExtractor::new();
            let analyzer = OpenAiAnalyzer::new(&config)?;
            let notifier = MailNotifier::new(&config)?;

            println!("Check starting...");
            match check(&config, &downloader, &extractor, &analyzer, &notifier).await {
                Ok(CheckOutcome::Completed(report)) => {
                    println!("Check complete.\nReport:");
                    println!("{:#?}", report);
                    match &report.notification {
                        NotificationOutcome::Delivered => {
                            info!(day = %report.day, "summary delivered");
                        }
                        NotificationOutcome::Skipped => {
                            info!(day = %report.day, "dry run finished, nothing sent");
                        }
                        NotificationOutcome::Failed { reason } => {
                            // A failed delivery never fails the process.
                            error!(
                                day = %report.day,
                                reason = %reason,
                                "run incomplete, summary was not delivered"
                            );
                        }
                    }
                    Ok(())
                }
                Ok(CheckOutcome::SkippedGateClosed { local_hour }) => {
                    println!(
                        "Check skipped: outside the publication window (hour {local_hour})."
                    );
                    Ok(())
                }
                Err(e) => {
                    error!(error = %e, "check aborted");
                    Err(anyhow::Error::from(e))
                }
            }
        }
    }
}
