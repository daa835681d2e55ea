//! Contracts between the pipeline stages.
//!
//! # Overview
//!
//! A check run is assembled from four narrow capabilities, each a trait
//! here so the orchestrator can be exercised against mocks:
//!
//! - [`Downloader`] fetches the published plan document.
//! - [`Extractor`] turns the document into plain text.
//! - [`Analyzer`] summarises the text for the target class.
//! - [`Notifier`] delivers the finished summary.
//!
//! The concrete implementations live in their own modules and are wired
//! together in `cli::run`. None of them knows about the others; only
//! the orchestrator in [`crate::check`] sees the full sequence.

use std::io::Write;
use std::path::Path;

use async_trait::async_trait;
#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;
use tempfile::NamedTempFile;

use crate::error::{AnalysisError, DownloadError, ExtractionError, NotifyError};

/// A fetched plan document.
///
/// The bytes are held in memory and mirrored to a temporary file, so
/// the raw document can be inspected after a failed run. The artifact
/// is deleted through [`RawDocument::release`], which the orchestrator
/// calls on every exit path once a document exists.
pub struct RawDocument {
    bytes: Vec<u8>,
    artifact: NamedTempFile,
}

impl RawDocument {
    /// Stores the fetched bytes and writes the on-disk artifact.
    pub fn from_bytes(bytes: Vec<u8>) -> std::io::Result<Self> {
        let mut artifact = tempfile::Builder::new()
            .prefix("vertretungsplan-")
            .suffix(".pdf")
            .tempfile()?;
        artifact.write_all(&bytes)?;
        artifact.flush()?;
        Ok(Self { bytes, artifact })
    }

    /// The raw document bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Size of the document in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the fetched document was empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Location of the on-disk artifact.
    pub fn path(&self) -> &Path {
        self.artifact.path()
    }

    /// Deletes the on-disk artifact and consumes the document.
    pub fn release(self) -> std::io::Result<()> {
        self.artifact.close()
    }
}

/// Fetches the published substitution plan.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Downloads the current plan document.
    async fn download(&self) -> Result<RawDocument, DownloadError>;
}

/// Extracts plain text from a fetched plan document.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait Extractor: Send + Sync {
    /// Returns the concatenated text of every page, in page order.
    fn extract(&self, document: &RawDocument) -> Result<String, ExtractionError>;
}

/// Summarises the plan text for a single class.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Analyzer: Send + Sync {
    /// Produces the summary that will be mailed out.
    async fn summarise(&self, plan_text: &str) -> Result<String, AnalysisError>;
}

/// Delivers the finished summary.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Sends `body` under a subject built from the resolved `day`.
    async fn notify(&self, day: &str, body: &str) -> Result<(), NotifyError>;
}
