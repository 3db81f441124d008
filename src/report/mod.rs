//! Per-file review reports, debug prompts, and the run summary.
//!
//! The orchestrator writes through the [`ReportSink`] trait;
//! [`FsReportSink`] lays the files out on disk.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{OutputConfig, ReportLayout};
use crate::constants;
use crate::models::{ChangedFile, ContextMode, RunSummary};

/// Body written when generation produced nothing.
pub const FAILED_REVIEW_BODY: &str = "Review failed - no response from AI service.";

/// Errors persisting reports.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to serialize summary: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// One finished review, ready to persist.
#[derive(Debug, Clone, Copy)]
pub struct Review<'a> {
    pub file: &'a ChangedFile,
    pub mode: ContextMode,
    pub file_lines: usize,
    /// Generated text, or `None` when generation failed.
    pub body: Option<&'a str>,
}

impl Review<'_> {
    /// Markdown report for this file.
    pub fn render(&self) -> String {
        format!(
            "## {} @ {}\n\n**Mode:** {}  |  **Lines:** {}\n\n{}\n\n---\n",
            self.file.path,
            self.file.short_sha(),
            self.mode,
            self.file_lines,
            self.body.unwrap_or(FAILED_REVIEW_BODY)
        )
    }
}

/// Destination for everything a run produces.
#[async_trait]
pub trait ReportSink: Send + Sync {
    /// Create output locations before the first file.
    async fn prepare(&self) -> Result<(), ReportError>;

    /// Persist the rendered prompt for debugging. Returns where it went.
    async fn write_prompt(
        &self,
        file: &ChangedFile,
        prompt: &str,
    ) -> Result<Option<PathBuf>, ReportError>;

    /// Persist one review report.
    async fn write_review(&self, review: &Review<'_>) -> Result<PathBuf, ReportError>;

    /// Persist the run summary.
    async fn write_summary(&self, summary: &RunSummary) -> Result<PathBuf, ReportError>;
}

/// Replace characters that are unsafe in file names with `_`.
pub fn sanitize_path(path: &str) -> String {
    path.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            other => other,
        })
        .collect()
}

/// Writes reports under a base directory.
#[derive(Debug, Clone)]
pub struct FsReportSink {
    reviews_dir: PathBuf,
    debug_dir: Option<PathBuf>,
    layout: ReportLayout,
}

impl FsReportSink {
    /// Relative directories in `config` resolve against `root`.
    pub fn new(root: &Path, config: &OutputConfig) -> Self {
        Self {
            reviews_dir: root.join(&config.reviews_dir),
            debug_dir: config
                .debug_prompts
                .then(|| root.join(&config.debug_dir)),
            layout: config.layout,
        }
    }

    pub fn reviews_dir(&self) -> &Path {
        &self.reviews_dir
    }

    /// Where the report for `file` goes.
    pub fn review_path(&self, file: &ChangedFile) -> PathBuf {
        let name = format!("{}.md", sanitize_path(&file.path));
        match self.layout {
            ReportLayout::Flat => self.reviews_dir.join(name),
            ReportLayout::PerCommit => self.reviews_dir.join(sanitize_path(&file.sha)).join(name),
        }
    }

    /// Where the debug prompt for `file` goes, if enabled.
    pub fn prompt_path(&self, file: &ChangedFile) -> Option<PathBuf> {
        self.debug_dir
            .as_ref()
            .map(|dir| dir.join(format!("PROMPT-{}.md", sanitize_path(&file.path))))
    }
}

async fn create_dir(dir: &Path) -> Result<(), ReportError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| ReportError::Write {
            path: dir.to_path_buf(),
            source,
        })
}

async fn write_file(path: &Path, contents: &str) -> Result<(), ReportError> {
    if let Some(parent) = path.parent() {
        create_dir(parent).await?;
    }
    tokio::fs::write(path, contents)
        .await
        .map_err(|source| ReportError::Write {
            path: path.to_path_buf(),
            source,
        })
}

#[async_trait]
impl ReportSink for FsReportSink {
    async fn prepare(&self) -> Result<(), ReportError> {
        create_dir(&self.reviews_dir).await?;
        if let Some(dir) = &self.debug_dir {
            create_dir(dir).await?;
        }
        Ok(())
    }

    async fn write_prompt(
        &self,
        file: &ChangedFile,
        prompt: &str,
    ) -> Result<Option<PathBuf>, ReportError> {
        let Some(path) = self.prompt_path(file) else {
            return Ok(None);
        };
        write_file(&path, prompt).await?;
        tracing::debug!(path = %path.display(), "debug prompt saved");
        Ok(Some(path))
    }

    async fn write_review(&self, review: &Review<'_>) -> Result<PathBuf, ReportError> {
        let path = self.review_path(review.file);
        write_file(&path, &review.render()).await?;
        Ok(path)
    }

    async fn write_summary(&self, summary: &RunSummary) -> Result<PathBuf, ReportError> {
        let path = self.reviews_dir.join(constants::SUMMARY_FILENAME);
        let json = serde_json::to_string_pretty(summary)?;
        write_file(&path, &json).await?;
        Ok(path)
    }
}
