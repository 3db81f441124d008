//! App-wide constants.
//!
//! Centralises the tool name, config paths, output locations and
//! environment variable names so a rename only requires changing this file.

/// Display name of the tool (lowercase).
pub const APP_NAME: &str = "patchwise";

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Compilation target triple, exported by `build.rs`.
pub const TARGET: &str = env!("TARGET");

/// Local config filename (e.g. `.patchwise.toml` in repo root).
pub const CONFIG_FILENAME: &str = ".patchwise.toml";

/// Directory name under `~/.config/` for global config.
pub const CONFIG_DIR: &str = "patchwise";

/// Default directory for per-file review reports and `summary.json`.
pub const DEFAULT_REVIEWS_DIR: &str = "reviews";

/// Default directory for rendered debug prompts.
pub const DEFAULT_DEBUG_DIR: &str = ".github/review-results";

/// Summary file name inside the reviews directory.
pub const SUMMARY_FILENAME: &str = "summary.json";

// ── Environment variable names ──────────────────────────────────────

pub const ENV_LOG: &str = "PATCHWISE_LOG";
pub const ENV_BACKEND: &str = "PATCHWISE_BACKEND";
pub const ENV_PROVIDER: &str = "PATCHWISE_PROVIDER";
pub const ENV_MODEL: &str = "PATCHWISE_MODEL";
pub const ENV_FALLBACK_MODEL: &str = "PATCHWISE_FALLBACK_MODEL";
pub const ENV_API_KEY: &str = "PATCHWISE_API_KEY";
pub const ENV_BASE_URL: &str = "PATCHWISE_BASE_URL";

/// Set by GitHub Actions to `owner/repo`.
pub const ENV_GITHUB_REPOSITORY: &str = "GITHUB_REPOSITORY";

// GitHub Action inputs (`with:` keys are exposed as `INPUT_<UPPERCASE>`).

pub const INPUT_MODEL: &str = "INPUT_MODEL";
pub const INPUT_MAX_DIFF_LINES: &str = "INPUT_MAX_DIFF_LINES";
pub const INPUT_FULL_FILE_THRESHOLD_LINES: &str = "INPUT_FULL_FILE_THRESHOLD_LINES";
pub const INPUT_WINDOW_BEFORE: &str = "INPUT_WINDOW_BEFORE";
pub const INPUT_WINDOW_AFTER: &str = "INPUT_WINDOW_AFTER";
pub const INPUT_MERGE_GAP_TOLERANCE: &str = "INPUT_MERGE_GAP_TOLERANCE";
pub const INPUT_MAX_WINDOWED_LINES: &str = "INPUT_MAX_WINDOWED_LINES";
pub const INPUT_POLICY_FOUND: &str = "INPUT_POLICY_FOUND";
pub const INPUT_POLICY_SCOPE: &str = "INPUT_POLICY_SCOPE";
pub const INPUT_POLICY_PATH: &str = "INPUT_POLICY_PATH";
