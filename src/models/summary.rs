//! Per-file outcomes and the run summary written as `summary.json`.

use serde::{Deserialize, Serialize};

use super::ContextMode;

/// Which runner produced a summary.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RunVariant {
    Single,
    Batch,
    Sequential,
}

/// Result of reviewing one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileOutcome {
    pub path: String,
    pub status: String,
    pub mode: ContextMode,
    pub file_lines: usize,
    /// The generation service produced a review.
    pub success: bool,
    /// Model that produced the review.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Hard error that stopped the pipeline for this file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileOutcome {
    /// Outcome for a file whose pipeline aborted before a report was written.
    pub fn errored(path: &str, status: &str, error: impl ToString) -> Self {
        Self {
            path: path.to_string(),
            status: status.to_string(),
            mode: ContextMode::DiffOnly,
            file_lines: 0,
            success: false,
            model: None,
            error: Some(error.to_string()),
        }
    }

    pub fn is_hard_failure(&self) -> bool {
        self.error.is_some()
    }
}

/// Aggregate counts for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: String,
    pub variant: RunVariant,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<String>,
    /// Files handed to the runner.
    pub total: usize,
    /// Files that got a report written.
    pub processed: usize,
    /// Files deliberately not reviewed.
    pub skipped: usize,
    /// Files whose pipeline hit a hard error.
    pub failed: usize,
    /// Processed files whose report records a generation failure.
    pub generation_failures: usize,
    /// RFC 3339 completion time.
    pub timestamp: String,
    pub results: Vec<FileOutcome>,
}

impl RunSummary {
    /// Tally outcomes into a summary.
    pub fn from_outcomes(
        variant: RunVariant,
        batch_id: Option<String>,
        total: usize,
        skipped: usize,
        results: Vec<FileOutcome>,
    ) -> Self {
        let failed = results.iter().filter(|r| r.is_hard_failure()).count();
        let processed = results.len() - failed;
        let generation_failures = results
            .iter()
            .filter(|r| !r.is_hard_failure() && !r.success)
            .count();

        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            variant,
            batch_id,
            total,
            processed,
            skipped,
            failed,
            generation_failures,
            timestamp: chrono::Utc::now().to_rfc3339(),
            results,
        }
    }
}
