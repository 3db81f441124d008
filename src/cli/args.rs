//! Clap argument types and config overrides.

use clap::Parser;
use std::path::PathBuf;

use patchwise::config::{Backend, Config, ReportLayout};
use patchwise::models::ProviderName;

/// Review the files of a commit with an AI text-generation service.
#[derive(Parser, Debug)]
#[command(name = "patchwise", version = patchwise::constants::VERSION)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(clap::Subcommand, Debug)]
pub enum Command {
    /// Review one file at one commit.
    File(Box<FileArgs>),

    /// Review every item of a batch JSON document.
    Batch(Box<BatchArgs>),

    /// Review a JSON array of files one after another.
    Sequential(Box<SequentialArgs>),

    /// Print the windowed excerpts for a diff and a file.
    Excerpt(ExcerptArgs),

    /// Print version and build information.
    Version,
}

/// Flags shared by every review command.
#[derive(clap::Args, Debug, Default, Clone)]
pub struct ReviewArgs {
    // --- Repo location ---
    /// Path to the repository (default: current directory).
    #[arg(long, default_value = ".")]
    pub path: PathBuf,

    // --- Generation ---
    /// Primary model.
    #[arg(long)]
    pub model: Option<String>,

    /// Model tried after the primary one in every round ("" disables it).
    #[arg(long)]
    pub fallback_model: Option<String>,

    /// Generation backend: `command` or `api`.
    #[arg(long)]
    pub backend: Option<Backend>,

    /// API provider for the `api` backend.
    #[arg(long)]
    pub provider: Option<ProviderName>,

    /// Retry rounds per file.
    #[arg(long)]
    pub max_rounds: Option<u32>,

    // --- Window sizing ---
    /// Diffs are cut to this many lines.
    #[arg(long)]
    pub max_diff_lines: Option<usize>,

    /// Files up to this many lines are sent in full.
    #[arg(long)]
    pub full_file_threshold_lines: Option<usize>,

    /// Context lines above each hunk.
    #[arg(long)]
    pub window_before: Option<usize>,

    /// Context lines below each hunk.
    #[arg(long)]
    pub window_after: Option<usize>,

    /// Largest gap that still merges two windows.
    #[arg(long)]
    pub merge_gap_tolerance: Option<usize>,

    /// Line budget across all excerpts of a file.
    #[arg(long)]
    pub max_windowed_lines: Option<usize>,

    // --- Prompt ---
    /// Custom prompt template file.
    #[arg(long)]
    pub template: Option<PathBuf>,

    /// Review policy file; enables the policy section.
    #[arg(long)]
    pub policy_path: Option<String>,

    /// Scope label of the review policy (e.g. `repo`, `org`).
    #[arg(long)]
    pub policy_scope: Option<String>,

    // --- Output ---
    /// Directory for review reports and `summary.json`.
    #[arg(long)]
    pub reviews_dir: Option<String>,

    /// Group reports into one directory per commit.
    #[arg(long, default_value_t = false)]
    pub per_commit: bool,

    /// Do not save rendered prompts.
    #[arg(long, default_value_t = false)]
    pub no_debug_prompts: bool,

    /// Disable the live progress display.
    #[arg(long, default_value_t = false)]
    pub no_progress: bool,

    /// Only log warnings and errors.
    #[arg(long, short = 'q', default_value_t = false)]
    pub quiet: bool,
}

impl ReviewArgs {
    /// Apply CLI flags on top of the layered config.
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(ref model) = self.model {
            config.generation.model = model.clone();
        }
        if let Some(ref fallback) = self.fallback_model {
            config.generation.fallback_model = fallback.trim().to_string();
        }
        if let Some(backend) = self.backend {
            config.generation.backend = backend;
        }
        if let Some(provider) = self.provider {
            config.provider.name = provider;
        }
        if let Some(rounds) = self.max_rounds {
            config.generation.max_rounds = rounds;
        }

        let window = &mut config.window;
        for (flag, slot) in [
            (self.max_diff_lines, &mut window.max_diff_lines),
            (
                self.full_file_threshold_lines,
                &mut window.full_file_threshold_lines,
            ),
            (self.window_before, &mut window.window_before),
            (self.window_after, &mut window.window_after),
            (self.merge_gap_tolerance, &mut window.merge_gap_tolerance),
            (self.max_windowed_lines, &mut window.max_windowed_lines),
        ] {
            if let Some(value) = flag {
                *slot = value;
            }
        }

        if let Some(ref template) = self.template {
            config.prompt.template = Some(template.display().to_string());
        }
        if let Some(ref path) = self.policy_path {
            config.policy.enabled = true;
            config.policy.path = Some(path.clone());
        }
        if let Some(ref scope) = self.policy_scope {
            config.policy.scope = scope.clone();
        }

        if let Some(ref dir) = self.reviews_dir {
            config.output.reviews_dir = dir.clone();
        }
        if self.per_commit {
            config.output.layout = ReportLayout::PerCommit;
        }
        if self.no_debug_prompts {
            config.output.debug_prompts = false;
        }
    }
}

/// Arguments for the `file` subcommand.
#[derive(Parser, Debug)]
pub struct FileArgs {
    /// Commit to review the file at.
    #[arg(long, env = "INPUT_SHA")]
    pub sha: String,

    /// Repository-relative file path.
    #[arg(long, env = "INPUT_FILE")]
    pub file: String,

    /// Change status (`added`, `modified`, ...).
    #[arg(long, env = "INPUT_STATUS", default_value = "modified")]
    pub status: String,

    /// Pre-computed patch; the diff is taken from git when absent.
    #[arg(long)]
    pub patch_file: Option<PathBuf>,

    /// Treat the file as binary (no content is read).
    #[arg(long, default_value_t = false)]
    pub binary: bool,

    #[command(flatten)]
    pub review: ReviewArgs,
}

/// Arguments for the `batch` subcommand.
#[derive(Parser, Debug)]
pub struct BatchArgs {
    /// Batch JSON: `{"id": "...", "items": [...]}`.
    #[arg(long, env = "INPUT_BATCH_JSON", conflicts_with = "batch_file")]
    pub batch_json: Option<String>,

    /// File containing the batch JSON.
    #[arg(long)]
    pub batch_file: Option<PathBuf>,

    #[command(flatten)]
    pub review: ReviewArgs,
}

/// Arguments for the `sequential` subcommand.
#[derive(Parser, Debug)]
pub struct SequentialArgs {
    /// JSON array of changed files.
    #[arg(long, env = "INPUT_FILES_JSON", conflicts_with = "files_file")]
    pub files_json: Option<String>,

    /// File containing the JSON array.
    #[arg(long)]
    pub files_file: Option<PathBuf>,

    /// Pause between files, in milliseconds.
    #[arg(long)]
    pub inter_file_delay_ms: Option<u64>,

    #[command(flatten)]
    pub review: ReviewArgs,
}

/// Arguments for the `excerpt` subcommand.
#[derive(Parser, Debug)]
pub struct ExcerptArgs {
    /// Unified diff of the file.
    #[arg(long)]
    pub diff_file: PathBuf,

    /// Post-change content of the file.
    #[arg(long)]
    pub content_file: PathBuf,

    /// Context lines above each hunk.
    #[arg(long)]
    pub window_before: Option<usize>,

    /// Context lines below each hunk.
    #[arg(long)]
    pub window_after: Option<usize>,

    /// Largest gap that still merges two windows.
    #[arg(long)]
    pub merge_gap_tolerance: Option<usize>,

    /// Line budget across all excerpts.
    #[arg(long)]
    pub max_windowed_lines: Option<usize>,
}

impl ExcerptArgs {
    /// Apply flags to the configured window settings.
    pub fn apply_to(&self, config: &mut Config) {
        let window = &mut config.window;
        for (flag, slot) in [
            (self.window_before, &mut window.window_before),
            (self.window_after, &mut window.window_after),
            (self.merge_gap_tolerance, &mut window.merge_gap_tolerance),
            (self.max_windowed_lines, &mut window.max_windowed_lines),
        ] {
            if let Some(value) = flag {
                *slot = value;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("patchwise").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn file_command_parses() {
        let cli = parse(&["file", "--sha", "abc", "--file", "src/a.rs", "--binary"]);
        let Command::File(args) = cli.command else {
            panic!("expected file command");
        };
        assert_eq!(args.sha, "abc");
        assert_eq!(args.file, "src/a.rs");
        assert_eq!(args.status, "modified");
        assert!(args.binary);
        assert_eq!(args.review.path, PathBuf::from("."));
    }

    #[test]
    fn batch_json_and_file_conflict() {
        let result = Cli::try_parse_from([
            "patchwise",
            "batch",
            "--batch-json",
            "{}",
            "--batch-file",
            "b.json",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn sequential_with_shared_flags() {
        let cli = parse(&[
            "sequential",
            "--files-file",
            "files.json",
            "--inter-file-delay-ms",
            "0",
            "--window-before",
            "5",
            "--backend",
            "api",
            "--provider",
            "anthropic",
            "-q",
        ]);
        let Command::Sequential(args) = cli.command else {
            panic!("expected sequential command");
        };
        assert_eq!(args.files_file, Some(PathBuf::from("files.json")));
        assert_eq!(args.inter_file_delay_ms, Some(0));
        assert_eq!(args.review.window_before, Some(5));
        assert_eq!(args.review.backend, Some(Backend::Api));
        assert_eq!(args.review.provider, Some(ProviderName::Anthropic));
        assert!(args.review.quiet);
    }

    #[test]
    fn unknown_backend_is_rejected() {
        let result = Cli::try_parse_from(["patchwise", "batch", "--backend", "carrier-pigeon"]);
        assert!(result.is_err());
    }

    #[test]
    fn apply_to_overrides_config() {
        let args = ReviewArgs {
            model: Some("gemini-2.5-flash".into()),
            fallback_model: Some(" ".into()),
            max_rounds: Some(1),
            max_windowed_lines: Some(99),
            policy_path: Some("POLICY.md".into()),
            reviews_dir: Some("out".into()),
            per_commit: true,
            no_debug_prompts: true,
            ..ReviewArgs::default()
        };
        let mut config = Config::default();
        args.apply_to(&mut config);

        assert_eq!(config.generation.model, "gemini-2.5-flash");
        assert_eq!(config.generation.fallback(), None);
        assert_eq!(config.generation.max_rounds, 1);
        assert_eq!(config.window.max_windowed_lines, 99);
        assert_eq!(config.window.window_before, 30);
        assert!(config.policy.enabled);
        assert_eq!(config.policy.path.as_deref(), Some("POLICY.md"));
        assert_eq!(config.output.reviews_dir, "out");
        assert_eq!(config.output.layout, ReportLayout::PerCommit);
        assert!(!config.output.debug_prompts);
    }

    #[test]
    fn apply_to_without_flags_keeps_config() {
        let mut config = Config::default();
        config.generation.model = "from-config".into();
        ReviewArgs::default().apply_to(&mut config);
        assert_eq!(config.generation.model, "from-config");
        assert!(config.output.debug_prompts);
    }

    #[test]
    fn excerpt_args_override_window() {
        let cli = parse(&[
            "excerpt",
            "--diff-file",
            "a.diff",
            "--content-file",
            "a.rs",
            "--window-after",
            "2",
        ]);
        let Command::Excerpt(args) = cli.command else {
            panic!("expected excerpt command");
        };
        let mut config = Config::default();
        args.apply_to(&mut config);
        assert_eq!(config.window.window_after, 2);
        assert_eq!(config.window.window_before, 30);
    }
}
