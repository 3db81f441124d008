//! Review orchestrator: the per-file pipeline and the run variants.
//!
//! [`FileReviewer`] takes one changed file from diff to written report.
//! The runners ([`run_single`], [`run_batch`], [`run_sequential`]) only
//! differ in how they enumerate files, what they skip, and how they pace.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::config::{Config, WindowConfig};
use crate::diff::{self, ContentSource, DiffError, DiffSource};
use crate::excerpt;
use crate::models::{Batch, ChangedFile, ContextMode, FileOutcome, RunSummary, RunVariant};
use crate::progress::{ProgressTracker, TaskStatus};
use crate::prompt::{Policy, PromptContext, PromptTemplate};
use crate::providers::{GenerationService, classify_error};
use crate::report::{ReportError, ReportSink, Review};
use crate::retry::RetryPolicy;

/// Batch runs log progress every this many files.
const BATCH_PROGRESS_EVERY: usize = 5;

/// Errors that stop the review of a file (or, from `prepare` and the
/// summary, a whole run).
#[derive(Error, Debug)]
pub enum ReviewError {
    #[error(transparent)]
    Diff(#[from] DiffError),

    #[error(transparent)]
    Report(#[from] ReportError),
}

/// Everything about a review that is not a collaborator.
#[derive(Debug, Clone)]
pub struct ReviewSettings {
    pub window: WindowConfig,
    pub model: String,
    pub repository: Option<String>,
    pub retry: RetryPolicy,
    pub template: PromptTemplate,
    pub policy: Option<Policy>,
}

impl ReviewSettings {
    pub fn from_config(config: &Config, template: PromptTemplate, policy: Option<Policy>) -> Self {
        Self {
            window: config.window.clone(),
            model: config.generation.model.clone(),
            repository: config.prompt.repository.clone(),
            retry: RetryPolicy::from_config(&config.generation),
            template,
            policy,
        }
    }
}

/// How a runner paces and filters files.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Render the live terminal display.
    pub progress: bool,
    /// Pause after each file (sequential runs).
    pub inter_file_delay: Duration,
    /// Files under this directory are skipped (batch runs).
    pub skip_dir: Option<String>,
}

/// The rendered prompt and the facts that shaped it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedPrompt {
    pub mode: ContextMode,
    pub file_lines: usize,
    pub prompt: String,
}

/// Reviews one file at a time through the configured collaborators.
pub struct FileReviewer {
    diffs: Arc<dyn DiffSource>,
    contents: Arc<dyn ContentSource>,
    generator: Arc<dyn GenerationService>,
    sink: Arc<dyn ReportSink>,
    settings: ReviewSettings,
}

impl FileReviewer {
    pub fn new(
        diffs: Arc<dyn DiffSource>,
        contents: Arc<dyn ContentSource>,
        generator: Arc<dyn GenerationService>,
        sink: Arc<dyn ReportSink>,
        settings: ReviewSettings,
    ) -> Self {
        Self {
            diffs,
            contents,
            generator,
            sink,
            settings,
        }
    }

    pub fn settings(&self) -> &ReviewSettings {
        &self.settings
    }

    /// Resolve diff and content, pick the mode, and render the prompt.
    pub async fn prepare(&self, file: &ChangedFile) -> Result<PreparedPrompt, ReviewError> {
        let window = &self.settings.window;
        let diff = diff::resolve_diff(file, self.diffs.as_ref(), window.max_diff_lines).await?;

        let content = if file.is_binary {
            None
        } else {
            self.contents.content(&file.sha, &file.path).await?
        };

        let (mode, file_lines) =
            ContextMode::select(content.as_deref(), window.full_file_threshold_lines);

        let excerpts = match (mode, content.as_deref()) {
            (ContextMode::Windowed, Some(text)) => {
                excerpt::build_excerpts(&diff, text, &window.params())
            }
            _ => String::new(),
        };

        let prompt = self.settings.template.render(&PromptContext {
            file,
            repository: self.settings.repository.as_deref(),
            mode,
            file_lines,
            diff: &diff,
            content: content.as_deref(),
            excerpts: &excerpts,
            policy: self.settings.policy.as_ref(),
        });

        Ok(PreparedPrompt {
            mode,
            file_lines,
            prompt,
        })
    }

    /// Run the full pipeline for one file.
    ///
    /// Generation failure is not an error: the report records it and the
    /// outcome has `success = false`.
    pub async fn review(
        &self,
        file: &ChangedFile,
        index: usize,
        progress: &ProgressTracker,
    ) -> Result<FileOutcome, ReviewError> {
        progress.update(index, TaskStatus::InProgress);

        let prepared = self.prepare(file).await?;
        tracing::info!(
            path = %file.path,
            sha = file.short_sha(),
            mode = %prepared.mode,
            lines = prepared.file_lines,
            "reviewing"
        );

        self.sink.write_prompt(file, &prepared.prompt).await?;

        let generated = self
            .settings
            .retry
            .execute(
                self.generator.as_ref(),
                &self.settings.model,
                &prepared.prompt,
                |failure| {
                    progress.update(
                        index,
                        TaskStatus::Retrying {
                            round: failure.round,
                            max: failure.max_rounds,
                            model: failure.model.to_string(),
                            reason: classify_error(failure.error)
                                .unwrap_or("Generation error")
                                .to_string(),
                        },
                    )
                },
            )
            .await;

        let (body, model) = match generated {
            Ok(g) => (Some(g.text), Some(g.model)),
            Err(e) => {
                tracing::warn!(path = %file.path, "no review generated: {e}");
                (None, None)
            }
        };

        let path = self
            .sink
            .write_review(&Review {
                file,
                mode: prepared.mode,
                file_lines: prepared.file_lines,
                body: body.as_deref(),
            })
            .await?;
        tracing::info!(path = %file.path, report = %path.display(), "review written");

        let success = body.is_some();
        progress.update(
            index,
            if success {
                TaskStatus::Done(prepared.mode)
            } else {
                TaskStatus::NoReview
            },
        );

        Ok(FileOutcome {
            path: file.path.clone(),
            status: file.status.clone(),
            mode: prepared.mode,
            file_lines: prepared.file_lines,
            success,
            model,
            error: None,
        })
    }

    /// Like [`review`](Self::review), but records hard errors in the outcome.
    async fn review_recorded(
        &self,
        file: &ChangedFile,
        index: usize,
        progress: &ProgressTracker,
    ) -> FileOutcome {
        match self.review(file, index, progress).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(path = %file.path, "review failed: {e}");
                progress.update(index, TaskStatus::Failed(e.to_string()));
                FileOutcome::errored(&file.path, &file.status, e)
            }
        }
    }

    async fn finish(
        &self,
        progress: &ProgressTracker,
        summary: RunSummary,
    ) -> Result<RunSummary, ReviewError> {
        let path = self.sink.write_summary(&summary).await?;
        progress.finish(&summary);
        tracing::info!(
            total = summary.total,
            processed = summary.processed,
            failed = summary.failed,
            skipped = summary.skipped,
            generation_failures = summary.generation_failures,
            summary = %path.display(),
            "run complete"
        );
        Ok(summary)
    }
}

fn tracker(files: &[ChangedFile], model: &str, enabled: bool) -> ProgressTracker {
    let paths: Vec<String> = files.iter().map(|f| f.path.clone()).collect();
    ProgressTracker::new(&paths, model, enabled)
}

/// Review a single file.
pub async fn run_single(
    reviewer: &FileReviewer,
    file: &ChangedFile,
    options: &RunOptions,
) -> Result<RunSummary, ReviewError> {
    reviewer.sink.prepare().await?;
    let progress = tracker(std::slice::from_ref(file), &reviewer.settings.model, options.progress);
    progress.start();

    let outcome = reviewer.review_recorded(file, 0, &progress).await;
    let summary = RunSummary::from_outcomes(RunVariant::Single, None, 1, 0, vec![outcome]);
    reviewer.finish(&progress, summary).await
}

/// Review every item of a batch.
///
/// Items under `options.skip_dir` (the debug prompt directory) are
/// skipped so a run never reviews its own output.
pub async fn run_batch(
    reviewer: &FileReviewer,
    batch: &Batch,
    options: &RunOptions,
) -> Result<RunSummary, ReviewError> {
    reviewer.sink.prepare().await?;
    let total = batch.items.len();
    tracing::info!(batch = batch.id_or_unknown(), files = total, "starting batch");

    let progress = tracker(&batch.items, &reviewer.settings.model, options.progress);
    progress.start();

    let mut results = Vec::with_capacity(total);
    let mut skipped = 0;
    for (index, file) in batch.items.iter().enumerate() {
        let skip = options
            .skip_dir
            .as_deref()
            .is_some_and(|dir| file.is_under(dir));
        if skip {
            tracing::info!(path = %file.path, "skipping generated file");
            progress.update(index, TaskStatus::Skipped);
            skipped += 1;
        } else {
            results.push(reviewer.review_recorded(file, index, &progress).await);
        }

        let done = index + 1;
        if done % BATCH_PROGRESS_EVERY == 0 || done == total {
            tracing::info!(done, total, "batch progress");
        }
    }

    let summary = RunSummary::from_outcomes(
        RunVariant::Batch,
        Some(batch.id_or_unknown().to_string()),
        total,
        skipped,
        results,
    );
    reviewer.finish(&progress, summary).await
}

/// Review files one after another with a pause between them.
pub async fn run_sequential(
    reviewer: &FileReviewer,
    files: &[ChangedFile],
    options: &RunOptions,
) -> Result<RunSummary, ReviewError> {
    reviewer.sink.prepare().await?;
    let total = files.len();
    tracing::info!(files = total, "starting sequential review");

    let progress = tracker(files, &reviewer.settings.model, options.progress);
    progress.start();

    let mut results = Vec::with_capacity(total);
    for (index, file) in files.iter().enumerate() {
        results.push(reviewer.review_recorded(file, index, &progress).await);
        if index + 1 < total && !options.inter_file_delay.is_zero() {
            tokio::time::sleep(options.inter_file_delay).await;
        }
    }

    let summary = RunSummary::from_outcomes(RunVariant::Sequential, None, total, 0, results);
    reviewer.finish(&progress, summary).await
}
