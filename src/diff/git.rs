//! Git CLI wrapper for per-file diffs and post-change content.
//!
//! Shells out to `git` via `tokio::process::Command`.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::Output;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{ContentSource, DiffError, DiffSource};

/// Reads diffs and file contents from a local clone.
///
/// Shallow CI checkouts may lack the reviewed commit, so each commit is
/// probed once and fetched from `remote` when missing.
pub struct GitSource {
    repo_root: PathBuf,
    remote: String,
    checked: Mutex<HashSet<String>>,
}

impl GitSource {
    pub fn new(repo_root: impl Into<PathBuf>) -> Self {
        Self {
            repo_root: repo_root.into(),
            remote: "origin".to_string(),
            checked: Mutex::new(HashSet::new()),
        }
    }

    /// Use a remote other than `origin` for missing commits.
    pub fn with_remote(mut self, remote: impl Into<String>) -> Self {
        self.remote = remote.into();
        self
    }

    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }

    async fn ensure_once(&self, sha: &str) {
        let mut checked = self.checked.lock().await;
        if checked.insert(sha.to_string()) {
            ensure_commit(&self.repo_root, &self.remote, sha).await;
        }
    }
}

#[async_trait]
impl DiffSource for GitSource {
    async fn diff(&self, sha: &str, path: &str) -> Result<String, DiffError> {
        self.ensure_once(sha).await;
        show_diff(&self.repo_root, sha, path).await
    }
}

#[async_trait]
impl ContentSource for GitSource {
    async fn content(&self, sha: &str, path: &str) -> Result<Option<String>, DiffError> {
        self.ensure_once(sha).await;
        show_content(&self.repo_root, sha, path).await
    }
}

async fn run_git(repo_root: &Path, args: &[&str]) -> Result<Output, DiffError> {
    tokio::process::Command::new("git")
        .args(args)
        .current_dir(repo_root)
        .output()
        .await
        .map_err(|e| DiffError::GitError(format!("failed to run git: {e}")))
}

/// Make sure `sha` exists locally, fetching it from `remote` if not.
///
/// Best-effort: returns whether the commit is available afterwards and
/// never fails.
pub async fn ensure_commit(repo_root: &Path, remote: &str, sha: &str) -> bool {
    let spec = format!("{sha}^{{commit}}");
    if let Ok(output) = run_git(repo_root, &["cat-file", "-e", &spec]).await {
        if output.status.success() {
            return true;
        }
    }

    tracing::debug!(sha, remote, "commit not present locally, fetching");
    match run_git(
        repo_root,
        &["fetch", "--no-tags", "--depth=1", remote, sha],
    )
    .await
    {
        Ok(output) if output.status.success() => true,
        Ok(output) => {
            tracing::warn!(
                sha,
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "could not fetch commit"
            );
            false
        }
        Err(e) => {
            tracing::warn!(sha, "could not fetch commit: {e}");
            false
        }
    }
}

/// `git show --unified=0` of one path at `sha`. Empty when git refuses.
pub async fn show_diff(repo_root: &Path, sha: &str, path: &str) -> Result<String, DiffError> {
    let output = run_git(
        repo_root,
        &["show", "--no-color", "--unified=0", sha, "--", path],
    )
    .await?;

    if !output.status.success() {
        tracing::debug!(
            sha,
            path,
            stderr = %String::from_utf8_lossy(&output.stderr).trim(),
            "git show produced no diff"
        );
        return Ok(String::new());
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Contents of `path` at `sha`, or `None` when it does not exist there.
pub async fn show_content(
    repo_root: &Path,
    sha: &str,
    path: &str,
) -> Result<Option<String>, DiffError> {
    let object = format!("{sha}:{path}");
    let output = run_git(repo_root, &["show", &object]).await?;

    if !output.status.success() {
        tracing::debug!(sha, path, "no post-change content");
        return Ok(None);
    }

    Ok(Some(String::from_utf8_lossy(&output.stdout).into_owned()))
}

/// Find the root of the git repository containing `start_dir`.
pub async fn find_repo_root(start_dir: &Path) -> Result<PathBuf, DiffError> {
    let output = run_git(start_dir, &["rev-parse", "--show-toplevel"]).await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(DiffError::GitError(format!(
            "not a git repository: {stderr}"
        )));
    }

    Ok(PathBuf::from(
        String::from_utf8_lossy(&output.stdout).trim(),
    ))
}
