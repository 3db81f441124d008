//! Diff and post-change content sources.
//!
//! The orchestrator only sees the [`DiffSource`] and [`ContentSource`]
//! traits; [`GitSource`] implements both on top of the git CLI.

pub mod git;

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

pub use git::GitSource;

use crate::models::ChangedFile;

/// Errors from the diff and content sources.
#[derive(Error, Debug)]
pub enum DiffError {
    #[error("git command failed: {0}")]
    GitError(String),

    #[error("failed to read diff file: {0}")]
    FileReadError(#[from] std::io::Error),
}

/// Produces the unified diff of one file at a revision.
#[async_trait]
pub trait DiffSource: Send + Sync {
    /// An empty string means no diff is available.
    async fn diff(&self, sha: &str, path: &str) -> Result<String, DiffError>;
}

/// Produces the post-change text of one file at a revision.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// `None` when the file does not exist at that revision.
    async fn content(&self, sha: &str, path: &str) -> Result<Option<String>, DiffError>;
}

/// Resolve the diff used for a file's prompt.
///
/// A pre-supplied patch wins. Otherwise the diff comes from `source`,
/// except for binary files which get none. The result is cut to
/// `max_lines` lines.
pub async fn resolve_diff(
    file: &ChangedFile,
    source: &dyn DiffSource,
    max_lines: usize,
) -> Result<String, DiffError> {
    let diff = match file.patch.as_deref().filter(|p| !p.is_empty()) {
        Some(patch) => patch.to_string(),
        None if file.is_binary => String::new(),
        None => source.diff(&file.sha, &file.path).await?,
    };
    Ok(truncate_lines(&diff, max_lines))
}

/// Keep the first `max_lines` `\n`-separated lines of `text`.
pub fn truncate_lines(text: &str, max_lines: usize) -> String {
    if text.split('\n').count() <= max_lines {
        return text.to_string();
    }
    text.split('\n')
        .take(max_lines)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Read a unified diff from a file.
pub async fn read_diff_file(path: &Path) -> Result<String, DiffError> {
    Ok(tokio::fs::read_to_string(path).await?)
}
