//! patchwise: commit file review orchestrator.
//!
//! Entry point and error handling boundary. Uses `anyhow` for
//! ergonomic error propagation and user-facing messages.

mod cli;

use patchwise::config;
use patchwise::constants;
use patchwise::diff;
use patchwise::env;
use patchwise::excerpt;
use patchwise::models;
use patchwise::orchestrator;
use patchwise::prompt;
use patchwise::providers;
use patchwise::report;

use std::io::IsTerminal;
use std::path::Path;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;

use cli::args::{BatchArgs, Cli, Command, ExcerptArgs, FileArgs, ReviewArgs, SequentialArgs};
use config::Config;
use diff::GitSource;
use env::Env;
use models::{Batch, ChangedFile, RunSummary};
use orchestrator::{FileReviewer, ReviewSettings, RunOptions};
use prompt::{Policy, PromptTemplate};
use report::FsReportSink;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("Error: {err:#}");
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::File(args) => run_file(*args).await,
        Command::Batch(args) => run_batch(*args).await,
        Command::Sequential(args) => run_sequential(*args).await,
        Command::Excerpt(args) => run_excerpt(args).await,
        Command::Version => run_version(),
    }
}

/// Print version and build information.
fn run_version() -> Result<()> {
    use colored::Colorize;

    println!(
        "{} {}",
        constants::APP_NAME.bold(),
        constants::VERSION.green().bold()
    );
    println!("{}     {}", "target:".dimmed(), constants::TARGET);
    Ok(())
}

/// A configured reviewer plus how to run it.
struct Session {
    config: Config,
    reviewer: FileReviewer,
    options: RunOptions,
}

/// Set up logging, config, and collaborators for a review command.
async fn open_session(args: &ReviewArgs) -> Result<Session> {
    let progress = !args.no_progress && !args.quiet && std::io::stderr().is_terminal();
    cli::init_logging(if args.quiet || progress { "warn" } else { "info" });

    let root = match diff::git::find_repo_root(&args.path).await {
        Ok(root) => root,
        Err(e) => {
            tracing::warn!(path = %args.path.display(), "{e}");
            args.path.clone()
        }
    };

    let mut config = Config::load(Some(&root), &Env::real()).context("failed to load config")?;
    args.apply_to(&mut config);
    tracing::debug!(?config, "configuration loaded");

    let template_path = config.prompt.template.as_deref().map(|t| root.join(t));
    let template = PromptTemplate::load(template_path.as_deref()).await;
    let policy = Policy::load(&config.policy, &root).await;

    let generator: Arc<dyn providers::GenerationService> = Arc::from(
        providers::from_config(&config).context("failed to set up generation backend")?,
    );
    let git = Arc::new(GitSource::new(&root));
    let sink = Arc::new(FsReportSink::new(&root, &config.output));

    let reviewer = FileReviewer::new(
        git.clone(),
        git,
        generator,
        sink,
        ReviewSettings::from_config(&config, template, policy),
    );

    let options = RunOptions {
        progress,
        inter_file_delay: Duration::from_millis(config.generation.inter_file_delay_ms),
        skip_dir: Some(config.output.debug_dir.clone()),
    };

    Ok(Session {
        config,
        reviewer,
        options,
    })
}

/// Fail the process when any file hit a hard error.
fn conclude(summary: &RunSummary) -> Result<()> {
    if summary.generation_failures > 0 {
        tracing::warn!(
            files = summary.generation_failures,
            "some files were reported without a review"
        );
    }
    if summary.failed > 0 {
        bail!("{} of {} file(s) failed", summary.failed, summary.total);
    }
    Ok(())
}

async fn run_file(args: FileArgs) -> Result<()> {
    let session = open_session(&args.review).await?;

    let patch = match args.patch_file {
        Some(ref path) => Some(
            diff::read_diff_file(path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))?,
        ),
        None => None,
    };
    let file = ChangedFile {
        sha: args.sha,
        path: args.file,
        status: args.status,
        is_binary: args.binary,
        patch,
    };

    let summary = orchestrator::run_single(&session.reviewer, &file, &session.options).await?;
    conclude(&summary)
}

async fn run_batch(args: BatchArgs) -> Result<()> {
    let session = open_session(&args.review).await?;

    let json = models::input::read_json_source(args.batch_json.as_deref(), args.batch_file.as_deref())
        .context("no batch given (--batch-json, --batch-file, or INPUT_BATCH_JSON)")?;
    let batch = Batch::from_json(&json)?;
    if batch.items.is_empty() {
        tracing::warn!(batch = batch.id_or_unknown(), "batch has no items");
    }

    let summary = orchestrator::run_batch(&session.reviewer, &batch, &session.options).await?;
    conclude(&summary)
}

async fn run_sequential(args: SequentialArgs) -> Result<()> {
    let mut session = open_session(&args.review).await?;
    if let Some(ms) = args.inter_file_delay_ms {
        session.options.inter_file_delay = Duration::from_millis(ms);
    }

    let json = models::input::read_json_source(args.files_json.as_deref(), args.files_file.as_deref())
        .context("no files given (--files-json, --files-file, or INPUT_FILES_JSON)")?;
    let files = models::input::files_from_json(&json)?;
    tracing::info!(
        files = files.len(),
        model = %session.config.generation.model,
        "loaded file list"
    );

    let summary =
        orchestrator::run_sequential(&session.reviewer, &files, &session.options).await?;
    conclude(&summary)
}

/// Print the excerpts the windowed mode would send for a file.
async fn run_excerpt(args: ExcerptArgs) -> Result<()> {
    cli::init_logging("warn");

    let mut config = Config::load(Some(Path::new(".")), &Env::real())?;
    args.apply_to(&mut config);

    let diff = read(&args.diff_file).await?;
    let content = read(&args.content_file).await?;

    let set = excerpt::select_excerpts(&diff, &content, &config.window.params());
    if set.is_empty() {
        tracing::warn!("no excerpts: the diff has no usable hunks or the budget is zero");
        return Ok(());
    }
    print!("{}", set.render());
    tracing::info!(
        excerpts = set.excerpts.len(),
        charged_lines = set.charged_lines,
        "excerpts built"
    );
    Ok(())
}

async fn read(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))
}
