//! Changed-file input as produced by the CI job that enumerates a commit.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors reading or decoding the file list.
#[derive(Error, Debug)]
pub enum InputError {
    #[error("failed to read input file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid input JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no input given: {0}")]
    Missing(&'static str),
}

fn default_status() -> String {
    "modified".to_string()
}

/// One file touched by a commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedFile {
    /// Commit the file is reviewed at.
    pub sha: String,
    /// Repository-relative path.
    pub path: String,
    /// Change status as reported by the forge (`added`, `modified`, ...).
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub is_binary: bool,
    /// Pre-computed patch from the forge API, when available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch: Option<String>,
}

impl ChangedFile {
    /// First eight characters of the commit, for report headers.
    pub fn short_sha(&self) -> &str {
        self.sha.get(..8).unwrap_or(&self.sha)
    }

    /// Whether the path points into `dir` (a relative directory prefix).
    pub fn is_under(&self, dir: &str) -> bool {
        let dir = dir.trim_end_matches('/');
        !dir.is_empty() && self.path.contains(&format!("{dir}/"))
    }
}

/// A group of files reviewed in one batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub items: Vec<ChangedFile>,
}

impl Batch {
    pub fn from_json(json: &str) -> Result<Self, InputError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn id_or_unknown(&self) -> &str {
        self.id.as_deref().unwrap_or("unknown")
    }
}

/// Decode a bare JSON array of changed files.
pub fn files_from_json(json: &str) -> Result<Vec<ChangedFile>, InputError> {
    Ok(serde_json::from_str(json)?)
}

/// Resolve inline JSON or a JSON file into a string.
///
/// Inline JSON wins when both are given.
pub fn read_json_source(inline: Option<&str>, file: Option<&Path>) -> Result<String, InputError> {
    if let Some(json) = inline.filter(|s| !s.trim().is_empty()) {
        return Ok(json.to_string());
    }
    match file {
        Some(path) => std::fs::read_to_string(path).map_err(|source| InputError::Read {
            path: path.display().to_string(),
            source,
        }),
        None => Err(InputError::Missing("pass inline JSON or a JSON file")),
    }
}
