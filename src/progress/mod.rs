//! Progress reporting for terminal output.
//!
//! Provides a live-updating file status display with colored checkmarks,
//! retry indicators, and failure markers. Designed for interactive
//! terminals; silenced with `--no-progress` and whenever stderr is not a
//! terminal (CI logs get `tracing` events instead).

use std::io::{self, Write};
use std::sync::{Mutex, MutexGuard};

use colored::Colorize;

use crate::models::{ContextMode, RunSummary};

/// Status of a single file review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    /// Queued, waiting to start.
    Pending,
    /// Currently being reviewed.
    InProgress,
    /// An attempt failed; the retry policy is still going.
    Retrying {
        round: u32,
        max: u32,
        model: String,
        reason: String,
    },
    /// Report written with a generated review.
    Done(ContextMode),
    /// Report written, but every generation attempt failed.
    NoReview,
    /// Hard error; no report.
    Failed(String),
    /// Deliberately not reviewed.
    Skipped,
}

/// Tracks and renders live progress for file reviews.
///
/// Thread-safe; share it via `Arc` when needed.
pub struct ProgressTracker {
    inner: Mutex<ProgressState>,
    /// If false, all output is suppressed.
    enabled: bool,
}

struct ProgressState {
    /// (path, status) in input order.
    files: Vec<(String, TaskStatus)>,
    /// Number of lines we last printed (for clearing).
    rendered_lines: usize,
    model: String,
}

impl ProgressTracker {
    /// Create a new progress tracker.
    ///
    /// `files` is the list of file paths being reviewed, `model` the
    /// primary model shown in the header.
    pub fn new(files: &[String], model: &str, enabled: bool) -> Self {
        Self {
            inner: Mutex::new(ProgressState {
                files: files
                    .iter()
                    .map(|f| (f.clone(), TaskStatus::Pending))
                    .collect(),
                rendered_lines: 0,
                model: model.to_string(),
            }),
            enabled,
        }
    }

    /// A tracker that never prints.
    pub fn disabled() -> Self {
        Self::new(&[], "", false)
    }

    fn state(&self) -> MutexGuard<'_, ProgressState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Update the status of the file at `index` and re-render.
    pub fn update(&self, index: usize, status: TaskStatus) {
        let mut state = self.state();
        if let Some(entry) = state.files.get_mut(index) {
            entry.1 = status;
        }
        if self.enabled {
            Self::render(&mut state);
        }
    }

    pub fn status(&self, index: usize) -> Option<TaskStatus> {
        self.state().files.get(index).map(|(_, s)| s.clone())
    }

    /// Print the initial header and file listing.
    pub fn start(&self) {
        if !self.enabled {
            return;
        }
        let mut state = self.state();
        Self::render(&mut state);
    }

    /// Clear progress lines and print a final summary.
    pub fn finish(&self, summary: &RunSummary) {
        if !self.enabled {
            return;
        }
        let mut state = self.state();
        Self::clear_lines(state.rendered_lines);
        state.rendered_lines = 0;

        let stderr = io::stderr();
        let mut handle = stderr.lock();
        for (file, status) in &state.files {
            let (icon, status_text) = Self::describe(status);
            let _ = writeln!(handle, "  {icon} {} {status_text}", file.dimmed());
        }

        let _ = writeln!(handle);
        let counts = format!(
            "{} processed, {} failed, {} skipped",
            summary.processed, summary.failed, summary.skipped
        );
        if summary.failed == 0 && summary.generation_failures == 0 {
            let _ = writeln!(handle, "  {} {}", "✔".green().bold(), counts.green());
        } else if summary.failed == 0 {
            let _ = writeln!(
                handle,
                "  {} {} ({} without a review)",
                "!".yellow().bold(),
                counts.yellow(),
                summary.generation_failures
            );
        } else {
            let _ = writeln!(handle, "  {} {}", "✖".red().bold(), counts.red());
        }
    }

    fn describe(status: &TaskStatus) -> (String, String) {
        match status {
            TaskStatus::Pending => ("○".dimmed().to_string(), "waiting".dimmed().to_string()),
            TaskStatus::InProgress => (
                "◌".cyan().bold().to_string(),
                "reviewing…".cyan().to_string(),
            ),
            TaskStatus::Retrying {
                round,
                max,
                model,
                reason,
            } => (
                "⟳".yellow().bold().to_string(),
                format!("{reason} from {model}, retrying ({round}/{max})")
                    .yellow()
                    .to_string(),
            ),
            TaskStatus::Done(mode) => (
                "✔".green().bold().to_string(),
                format!("done ({mode})").green().to_string(),
            ),
            TaskStatus::NoReview => (
                "!".yellow().bold().to_string(),
                "no response from AI service".yellow().to_string(),
            ),
            TaskStatus::Failed(reason) => ("✖".red().bold().to_string(), reason.red().to_string()),
            TaskStatus::Skipped => ("-".dimmed().to_string(), "skipped".dimmed().to_string()),
        }
    }

    /// Render the current state to stderr, clearing previous output.
    fn render(state: &mut ProgressState) {
        Self::clear_lines(state.rendered_lines);

        let stderr = io::stderr();
        let mut handle = stderr.lock();
        let mut lines = 0;

        let _ = writeln!(
            handle,
            "  {} Reviewing {} file(s) with {}",
            "▸".cyan().bold(),
            state.files.len(),
            state.model.dimmed(),
        );
        lines += 1;

        for (file, status) in &state.files {
            let (icon, status_text) = Self::describe(status);
            let _ = writeln!(handle, "    {icon} {} {status_text}", file.dimmed());
            lines += 1;
        }

        let _ = handle.flush();
        state.rendered_lines = lines;
    }

    /// Move cursor up and clear `n` lines.
    fn clear_lines(n: usize) {
        if n == 0 {
            return;
        }
        let stderr = io::stderr();
        let mut handle = stderr.lock();
        for _ in 0..n {
            let _ = write!(handle, "\x1b[1A\x1b[2K");
        }
        let _ = handle.flush();
    }
}
