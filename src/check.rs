//! Orchestration of one full plan check.
//!
//! # Flow
//!
//! A run walks the stages in a fixed order:
//!
//! ```text
//! checking_preconditions → fetching → extracting → analyzing
//!     → resolving_day → notifying → cleaning_up → done
//! ```
//!
//! Exactly two failures abort a run: incomplete configuration and a
//! failed fetch. Everything later degrades instead of aborting: a
//! failed extraction or analysis replaces the summary with a short
//! German notice naming the problem, and a failed delivery is recorded
//! in the report. The recipient is always sent whatever the run could
//! still produce.
//!
//! The fetched document is the run's only transient resource. Once it
//! exists, `cleaning_up` releases it on every path out of the
//! pipeline.

use tracing::{error, info, warn};

use crate::config::{CheckConfig, RunMode};
use crate::contract::{Analyzer, Downloader, Extractor, Notifier};
use crate::day::resolve_day;
use crate::error::{CheckError, ConfigError, NotifyError};

/// Stages of a check run, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    CheckingPreconditions,
    Fetching,
    Extracting,
    Analyzing,
    ResolvingDay,
    Notifying,
    CleaningUp,
    Done,
    Aborted,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::CheckingPreconditions => "checking_preconditions",
            Stage::Fetching => "fetching",
            Stage::Extracting => "extracting",
            Stage::Analyzing => "analyzing",
            Stage::ResolvingDay => "resolving_day",
            Stage::Notifying => "notifying",
            Stage::CleaningUp => "cleaning_up",
            Stage::Done => "done",
            Stage::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// Outcome of the notification stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationOutcome {
    /// The summary reached the mail server.
    Delivered,
    /// Delivery was skipped because the run is a dry run.
    Skipped,
    /// Delivery was attempted and failed.
    Failed { reason: String },
}

impl NotificationOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, NotificationOutcome::Delivered)
    }
}

/// What one completed run produced.
#[derive(Debug)]
pub struct CheckReport {
    /// Weekday label attached to the outgoing subject.
    pub day: String,
    /// The body that was (or would have been) sent.
    pub summary: String,
    /// Cause of a degraded body, when a non-fatal stage failed.
    pub degradation: Option<String>,
    /// Whether the notification went out.
    pub notification: NotificationOutcome,
}

/// Result of one orchestrated run.
#[derive(Debug)]
pub enum CheckOutcome {
    /// The pipeline ran through to `done`.
    Completed(CheckReport),
    /// The scheduling gate was closed; nothing was fetched.
    SkippedGateClosed { local_hour: u32 },
}

/// Scheduled runs only execute in the afternoon window, after the next
/// school day's plan has been published.
const GATE_OPEN_HOUR: u32 = 15;
const GATE_CLOSE_HOUR: u32 = 20;

/// Whether a scheduled run may proceed at `local_hour`.
pub fn gate_allows(local_hour: u32) -> bool {
    (GATE_OPEN_HOUR..GATE_CLOSE_HOUR).contains(&local_hour)
}

/// Applies the scheduling gate during precondition checking.
///
/// A scheduled run outside the window is skipped before anything is
/// fetched. The skip is its own outcome, not `done` and not an abort,
/// and is logged under the preconditions stage. Manual runs are never
/// gated.
fn gate_check(scheduled: bool, local_hour: u32) -> Option<CheckOutcome> {
    if scheduled && !gate_allows(local_hour) {
        info!(
            stage = %Stage::CheckingPreconditions,
            local_hour,
            "[CHECK] outside the publication window, skipping scheduled run"
        );
        return Some(CheckOutcome::SkippedGateClosed { local_hour });
    }
    None
}

/// Runs one complete check: fetch the plan, extract its text, summarise
/// it, resolve the day, notify the recipient and release the fetched
/// artifact.
///
/// Fatal failures (configuration, fetch) return an error and nothing is
/// sent. Every other failure degrades the run and shows up in the
/// returned [`CheckReport`].
pub async fn check<D, X, A, N>(
    config: &CheckConfig,
    downloader: &D,
    extractor: &X,
    analyzer: &A,
    notifier: &N,
) -> Result<CheckOutcome, CheckError>
where
    D: Downloader,
    X: Extractor,
    A: Analyzer,
    N: Notifier,
{
    // --- Stage: checking preconditions ---
    info!(stage = %Stage::CheckingPreconditions, "[CHECK] run started");

    let missing = config.missing_values();
    if !missing.is_empty() {
        error!(
            stage = %Stage::Aborted,
            missing = ?missing,
            "[CHECK][ERROR] configuration incomplete"
        );
        return Err(CheckError::Config(ConfigError { missing }));
    }

    if let Some(outcome) = gate_check(config.scheduled, current_berlin_hour()) {
        return Ok(outcome);
    }

    // --- Stage: fetching ---
    info!(stage = %Stage::Fetching, "[CHECK] fetching plan document");
    let document = match downloader.download().await {
        Ok(document) => document,
        Err(e) => {
            error!(
                stage = %Stage::Aborted,
                error = %e,
                "[CHECK][ERROR] fetch failed, aborting run"
            );
            info!(stage = %Stage::CleaningUp, "[CHECK] nothing fetched, no artifact to release");
            return Err(CheckError::Download(e));
        }
    };

    // --- Stage: extracting ---
    info!(stage = %Stage::Extracting, "[CHECK] extracting plan text");
    let extracted = extractor.extract(&document);
    if let Err(e) = &extracted {
        warn!(
            stage = %Stage::Extracting,
            error = %e,
            "[CHECK] extraction failed, continuing with a degraded summary"
        );
    }

    // --- Stage: analyzing ---
    // The analyzer is only consulted when there is real text to
    // analyse. An extraction failure turns into a notice for the
    // recipient instead of an external call.
    info!(stage = %Stage::Analyzing, "[CHECK] producing summary");
    let mut degradation = None;
    let summary = match &extracted {
        Ok(text) => match analyzer.summarise(text).await {
            Ok(summary) => summary,
            Err(e) => {
                warn!(
                    stage = %Stage::Analyzing,
                    error = %e,
                    "[CHECK] analysis failed, continuing with a degraded summary"
                );
                degradation = Some(e.to_string());
                format!("Die Analyse des Vertretungsplans ist fehlgeschlagen: {e}")
            }
        },
        Err(e) => {
            degradation = Some(e.to_string());
            format!("Der Vertretungsplan konnte nicht ausgelesen werden: {e}")
        }
    };
    info!(
        stage = %Stage::Analyzing,
        degraded = degradation.is_some(),
        summary = %summary,
        "[CHECK] summary ready"
    );

    // --- Stage: resolving day ---
    let plan_text = extracted.as_deref().unwrap_or("");
    let day = resolve_day(&summary, plan_text);
    info!(stage = %Stage::ResolvingDay, day = %day, "[CHECK] day resolved");

    // --- Stage: notifying ---
    let notification = match config.mode {
        RunMode::DryRun => {
            info!(
                stage = %Stage::Notifying,
                day = %day,
                summary = %summary,
                "[CHECK] dry run, delivery skipped"
            );
            NotificationOutcome::Skipped
        }
        RunMode::Email => match notifier.notify(&day, &summary).await {
            Ok(()) => {
                info!(stage = %Stage::Notifying, day = %day, "[CHECK] notification delivered");
                NotificationOutcome::Delivered
            }
            Err(e) => {
                match &e {
                    NotifyError::Authentication(_) => error!(
                        stage = %Stage::Notifying,
                        error = %e,
                        "[CHECK][ERROR] mail credentials were rejected"
                    ),
                    NotifyError::Transport(_) => error!(
                        stage = %Stage::Notifying,
                        error = %e,
                        "[CHECK][ERROR] delivery failed"
                    ),
                }
                NotificationOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        },
    };

    // --- Stage: cleaning up ---
    match document.release() {
        Ok(()) => info!(stage = %Stage::CleaningUp, "[CHECK] plan artifact released"),
        Err(e) => warn!(
            stage = %Stage::CleaningUp,
            error = %e,
            "[CHECK] could not delete the plan artifact"
        ),
    }

    info!(
        stage = %Stage::Done,
        delivered = notification.is_delivered(),
        "[CHECK] run finished"
    );

    Ok(CheckOutcome::Completed(CheckReport {
        day,
        summary,
        degradation,
        notification,
    }))
}

fn current_berlin_hour() -> u32 {
    use chrono::Timelike;

    chrono::Utc::now()
        .with_timezone(&chrono_tz::Europe::Berlin)
        .hour()
}
