//! Typed failures for each stage of a check run.
//!
//! Every stage returns its own error type rather than a catch-all, so
//! the orchestrator can decide per stage whether a failure aborts the
//! run or degrades it.

use std::io;

use thiserror::Error;

/// Characters of a response body kept when embedding it in an error.
const BODY_SNIPPET_CHARS: usize = 200;

/// Truncates a response body for inclusion in an error message.
pub(crate) fn body_snippet(body: &str) -> String {
    body.chars().take(BODY_SNIPPET_CHARS).collect()
}

/// Required configuration values were absent or blank.
#[derive(Debug, Error)]
#[error("missing required configuration: {}", .missing.join(", "))]
pub struct ConfigError {
    /// Names of the environment variables that were missing.
    pub missing: Vec<String>,
}

impl ConfigError {
    /// A `ConfigError` for exactly one missing value.
    pub fn missing(name: &str) -> Self {
        Self {
            missing: vec![name.to_string()],
        }
    }
}

/// Fetching the plan document failed.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The plan server answered with a non-success status code.
    #[error("plan server returned {status}: {body_snippet}")]
    Status { status: u16, body_snippet: String },
    /// The request never produced a response.
    #[error("plan request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// The fetched document could not be written to disk.
    #[error("could not store the fetched plan: {0}")]
    Artifact(#[from] io::Error),
}

/// Reading text out of the plan document failed.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The document could not be parsed or one of its pages could not
    /// be read. No partial text is kept.
    #[error("plan document could not be read: {0}")]
    Malformed(String),
}

/// The summary request failed.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The completion API answered with a non-success status code.
    #[error("completion API returned {status}: {body_snippet}")]
    Api { status: u16, body_snippet: String },
    /// The request never produced a response.
    #[error("completion request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Delivering the notification failed.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The mail server rejected the login credentials.
    #[error("mail server rejected authentication: {0}")]
    Authentication(String),
    /// Any other failure between us and the mail server.
    #[error("mail delivery failed: {0}")]
    Transport(String),
}

/// A failure that aborts the whole run before a summary exists.
///
/// Extraction, analysis and notification failures are deliberately not
/// part of this type: the run degrades and continues on those.
#[derive(Debug, Error)]
pub enum CheckError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Download(#[from] DownloadError),
}
