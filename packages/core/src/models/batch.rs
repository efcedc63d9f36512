//! Batch Records
//!
//! Result and bookkeeping types shared by the export and import pipelines.

use crate::models::FrontMatterFields;
use crate::services::error::{ErrorKind, SyncError};
use serde::{Deserialize, Serialize};

/// Lifecycle of one batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchState {
    Pending,
    Running,
    Completed,
}

/// Tracks the state of a single batch
///
/// Only `Pending → Running → Completed` is allowed; a completed batch never
/// runs again.
#[derive(Debug)]
pub struct BatchRun {
    state: BatchState,
    total: usize,
}

impl BatchRun {
    pub fn new(total: usize) -> Self {
        Self {
            state: BatchState::Pending,
            total,
        }
    }

    pub fn state(&self) -> BatchState {
        self.state
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn start(&mut self) -> Result<(), SyncError> {
        self.transition(BatchState::Pending, BatchState::Running)
    }

    pub fn complete(&mut self) -> Result<(), SyncError> {
        self.transition(BatchState::Running, BatchState::Completed)
    }

    fn transition(&mut self, from: BatchState, to: BatchState) -> Result<(), SyncError> {
        if self.state != from {
            return Err(SyncError::invalid_request(format!(
                "Batch cannot move from {:?} to {:?}",
                self.state, to
            )));
        }
        self.state = to;
        Ok(())
    }
}

/// Failure of one batch item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemError {
    /// Page id (export) or file name (import)
    pub item_id: String,
    pub message: String,
    pub kind: ErrorKind,
}

impl ItemError {
    pub fn new(item_id: impl Into<String>, error: &SyncError) -> Self {
        Self {
            item_id: item_id.into(),
            message: error.to_string(),
            kind: error.kind(),
        }
    }
}

/// Aggregated outcome of a batch
///
/// `succeeded + failed == total` always holds, and both `results` and
/// `errors` follow input order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResult<T> {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub results: Vec<T>,
    pub errors: Vec<ItemError>,

    /// Batch-level problems that did not belong to any item
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,

    pub duration_ms: u128,
}

impl<T> BatchResult<T> {
    /// Fold per-item outcomes, in input order, into a result
    pub fn from_outcomes<I>(outcomes: I, duration_ms: u128) -> Self
    where
        I: IntoIterator<Item = (String, Result<T, SyncError>)>,
    {
        let mut results = Vec::new();
        let mut errors = Vec::new();

        for (item_id, outcome) in outcomes {
            match outcome {
                Ok(value) => results.push(value),
                Err(error) => errors.push(ItemError::new(item_id, &error)),
            }
        }

        Self {
            total: results.len() + errors.len(),
            succeeded: results.len(),
            failed: errors.len(),
            results,
            errors,
            warnings: Vec::new(),
            duration_ms,
        }
    }

    pub fn empty() -> Self {
        Self::from_outcomes(std::iter::empty(), 0)
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }
}

/// One exported page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedDocument {
    pub page_id: String,
    pub title: String,
    pub slug: String,
    /// `<slug>.md`, sanitized for the filesystem
    pub file_name: String,
    pub markdown: String,
    /// Character count of the body, front matter excluded
    pub word_count: usize,
}

/// A Markdown file submitted for import
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkdownFile {
    pub file_name: String,
    pub content: String,
}

impl MarkdownFile {
    pub fn new(file_name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            content: content.into(),
        }
    }
}

/// One imported page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportedPage {
    pub file_name: String,
    pub page_id: String,
    pub url: String,
    pub title: String,
    pub blocks_count: usize,
    pub word_count: usize,
}

/// Result of checking one Markdown file before import
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationOutcome {
    pub file_name: String,
    /// True exactly when `issues` is empty
    pub valid: bool,
    pub issues: Vec<String>,
    pub parsed_properties: FrontMatterFields,
    pub parsed_content_length: usize,
    /// True when an issue other than an empty body is present
    pub blocking: bool,
}

/// Summary of validating several files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub total_files: usize,
    pub valid_files: usize,
    pub invalid_files: usize,
    pub results: Vec<ValidationOutcome>,
}
