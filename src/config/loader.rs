//! Config struct and loading logic.
//!
//! Priority (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (`PATCHWISE_*`, GitHub Action `INPUT_*`)
//! 3. `.patchwise.toml` in repo root
//! 4. `~/.config/patchwise/config.toml` (global defaults)
//! 5. Built-in defaults

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::constants;
use crate::env::Env;
use crate::excerpt::WindowParams;
use crate::models::{DEFAULT_FALLBACK_MODEL, ProviderName};

/// Errors during config loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    ParseFile {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub window: WindowConfig,
    pub generation: GenerationConfig,
    pub provider: ProviderConfig,
    pub policy: PolicyConfig,
    pub prompt: PromptConfig,
    pub output: OutputConfig,
}

/// Diff truncation, mode selection, and excerpt window sizing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Diffs are cut to this many lines before entering the prompt.
    pub max_diff_lines: usize,
    /// Files up to this many lines are sent in full.
    pub full_file_threshold_lines: usize,
    pub window_before: usize,
    pub window_after: usize,
    pub merge_gap_tolerance: usize,
    pub max_windowed_lines: usize,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            max_diff_lines: 800,
            full_file_threshold_lines: 400,
            window_before: 30,
            window_after: 30,
            merge_gap_tolerance: 10,
            max_windowed_lines: 600,
        }
    }
}

impl WindowConfig {
    /// Excerpt builder parameters.
    pub fn params(&self) -> WindowParams {
        WindowParams {
            before: self.window_before,
            after: self.window_after,
            gap_tolerance: self.merge_gap_tolerance,
            max_total_lines: self.max_windowed_lines,
        }
    }
}

/// Which generation backend to use.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Backend {
    /// Spawn an external CLI (e.g. `gemini`).
    #[default]
    Command,
    /// Call the provider API directly.
    Api,
}

/// Delay growth between retry rounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffKind {
    #[default]
    Fixed,
    Exponential,
}

/// Generation backend, models, and retry settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub backend: Backend,
    pub model: String,
    /// Tried after the primary model in every round. Empty disables it.
    pub fallback_model: String,
    /// Program spawned by the command backend.
    pub command: String,
    /// Argument templates; `{model}` and `{prompt}` are substituted.
    pub args: Vec<String>,
    pub max_rounds: u32,
    pub retry_delay_ms: u64,
    pub backoff: BackoffKind,
    pub max_retry_delay_ms: u64,
    /// Pause after each file in sequential runs.
    pub inter_file_delay_ms: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Command,
            model: "gemini-2.5-pro".to_string(),
            fallback_model: DEFAULT_FALLBACK_MODEL.to_string(),
            command: "gemini".to_string(),
            args: ["--yolo", "--model", "{model}", "--prompt", "{prompt}"]
                .map(String::from)
                .to_vec(),
            max_rounds: 3,
            retry_delay_ms: 2000,
            backoff: BackoffKind::Fixed,
            max_retry_delay_ms: 60_000,
            inter_file_delay_ms: 1000,
        }
    }
}

impl GenerationConfig {
    pub fn fallback(&self) -> Option<&str> {
        Some(self.fallback_model.trim()).filter(|m| !m.is_empty())
    }
}

/// API provider settings for the `api` backend.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub name: ProviderName,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("name", &self.name)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Repository review policy appended to every prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    pub enabled: bool,
    pub path: Option<String>,
    /// Label shown in the policy section header (e.g. `repo`, `org`).
    pub scope: String,
}

/// Prompt template settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    /// Custom template file; the built-in template is used when unset.
    pub template: Option<String>,
    /// `owner/name`, shown to the reviewer.
    pub repository: Option<String>,
}

/// Directory arrangement for per-file reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportLayout {
    /// `reviews/<file>.md`
    #[default]
    Flat,
    /// `reviews/<sha>/<file>.md`
    PerCommit,
}

/// Where reports and debug prompts go.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub reviews_dir: String,
    pub debug_dir: String,
    pub debug_prompts: bool,
    pub layout: ReportLayout,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            reviews_dir: constants::DEFAULT_REVIEWS_DIR.to_string(),
            debug_dir: constants::DEFAULT_DEBUG_DIR.to_string(),
            debug_prompts: true,
            layout: ReportLayout::Flat,
        }
    }
}

impl Config {
    /// Load configuration with proper layering.
    ///
    /// Reads from global config, repo-local config, then applies
    /// environment variable overrides.
    pub fn load(repo_root: Option<&Path>, env: &Env) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                let global = Self::load_file(&global_path)?;
                config.merge(global);
            }
        }

        if let Some(root) = repo_root {
            let local_path = root.join(constants::CONFIG_FILENAME);
            if local_path.exists() {
                let local = Self::load_file(&local_path)?;
                config.merge(local);
            }
        }

        config.apply_env_vars(env);

        Ok(config)
    }

    /// Load a config from a specific file.
    fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::ParseFile {
            path: path.to_path_buf(),
            source: e,
        })
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(constants::CONFIG_DIR).join("config.toml"))
    }

    /// Merge another config into this one (other wins for non-default values).
    fn merge(&mut self, other: Config) {
        let dw = WindowConfig::default();
        let w = other.window;
        if w.max_diff_lines != dw.max_diff_lines {
            self.window.max_diff_lines = w.max_diff_lines;
        }
        if w.full_file_threshold_lines != dw.full_file_threshold_lines {
            self.window.full_file_threshold_lines = w.full_file_threshold_lines;
        }
        if w.window_before != dw.window_before {
            self.window.window_before = w.window_before;
        }
        if w.window_after != dw.window_after {
            self.window.window_after = w.window_after;
        }
        if w.merge_gap_tolerance != dw.merge_gap_tolerance {
            self.window.merge_gap_tolerance = w.merge_gap_tolerance;
        }
        if w.max_windowed_lines != dw.max_windowed_lines {
            self.window.max_windowed_lines = w.max_windowed_lines;
        }

        let dg = GenerationConfig::default();
        let g = other.generation;
        if g.backend != dg.backend {
            self.generation.backend = g.backend;
        }
        if g.model != dg.model {
            self.generation.model = g.model;
        }
        if g.fallback_model != dg.fallback_model {
            self.generation.fallback_model = g.fallback_model;
        }
        if g.command != dg.command {
            self.generation.command = g.command;
        }
        if g.args != dg.args {
            self.generation.args = g.args;
        }
        if g.max_rounds != dg.max_rounds {
            self.generation.max_rounds = g.max_rounds;
        }
        if g.retry_delay_ms != dg.retry_delay_ms {
            self.generation.retry_delay_ms = g.retry_delay_ms;
        }
        if g.backoff != dg.backoff {
            self.generation.backoff = g.backoff;
        }
        if g.max_retry_delay_ms != dg.max_retry_delay_ms {
            self.generation.max_retry_delay_ms = g.max_retry_delay_ms;
        }
        if g.inter_file_delay_ms != dg.inter_file_delay_ms {
            self.generation.inter_file_delay_ms = g.inter_file_delay_ms;
        }

        if other.provider.name != ProviderName::default() {
            self.provider.name = other.provider.name;
        }
        if other.provider.base_url.is_some() {
            self.provider.base_url = other.provider.base_url;
        }
        if other.provider.api_key.is_some() {
            self.provider.api_key = other.provider.api_key;
        }

        if other.policy.enabled {
            self.policy.enabled = true;
        }
        if other.policy.path.is_some() {
            self.policy.path = other.policy.path;
        }
        if !other.policy.scope.is_empty() {
            self.policy.scope = other.policy.scope;
        }

        if other.prompt.template.is_some() {
            self.prompt.template = other.prompt.template;
        }
        if other.prompt.repository.is_some() {
            self.prompt.repository = other.prompt.repository;
        }

        let dout = OutputConfig::default();
        if other.output.reviews_dir != dout.reviews_dir {
            self.output.reviews_dir = other.output.reviews_dir;
        }
        if other.output.debug_dir != dout.debug_dir {
            self.output.debug_dir = other.output.debug_dir;
        }
        // Disabling debug prompts overrides enabling.
        if !other.output.debug_prompts {
            self.output.debug_prompts = false;
        }
        if other.output.layout != dout.layout {
            self.output.layout = other.output.layout;
        }
    }

    /// Apply environment variable overrides.
    fn apply_env_vars(&mut self, env: &Env) {
        if let Some(val) = env.non_empty(constants::ENV_BACKEND) {
            match val.parse::<Backend>() {
                Ok(backend) => self.generation.backend = backend,
                Err(_) => tracing::warn!(
                    var = constants::ENV_BACKEND,
                    value = %val,
                    "ignoring invalid backend"
                ),
            }
        }
        if let Some(val) = env.non_empty(constants::ENV_PROVIDER) {
            match val.parse::<ProviderName>() {
                Ok(name) => self.provider.name = name,
                Err(e) => tracing::warn!(var = constants::ENV_PROVIDER, "{e}"),
            }
        }

        // The action input wins over the tool's own variable.
        if let Some(model) = env
            .non_empty(constants::INPUT_MODEL)
            .or_else(|| env.non_empty(constants::ENV_MODEL))
        {
            self.generation.model = model;
        }
        if let Ok(val) = env.var(constants::ENV_FALLBACK_MODEL) {
            self.generation.fallback_model = val.trim().to_string();
        }
        if let Some(val) = env.non_empty(constants::ENV_BASE_URL) {
            self.provider.base_url = Some(val);
        }

        let api_key = env
            .non_empty(constants::ENV_API_KEY)
            .or_else(|| env.non_empty(self.provider.name.api_key_env_var()));
        if api_key.is_some() {
            self.provider.api_key = api_key;
        }

        let window = &mut self.window;
        for (name, slot) in [
            (constants::INPUT_MAX_DIFF_LINES, &mut window.max_diff_lines),
            (
                constants::INPUT_FULL_FILE_THRESHOLD_LINES,
                &mut window.full_file_threshold_lines,
            ),
            (constants::INPUT_WINDOW_BEFORE, &mut window.window_before),
            (constants::INPUT_WINDOW_AFTER, &mut window.window_after),
            (
                constants::INPUT_MERGE_GAP_TOLERANCE,
                &mut window.merge_gap_tolerance,
            ),
            (
                constants::INPUT_MAX_WINDOWED_LINES,
                &mut window.max_windowed_lines,
            ),
        ] {
            match env.parsed::<usize>(name) {
                Ok(Some(value)) => *slot = value,
                Ok(None) => {}
                Err(e) => tracing::warn!("{e}"),
            }
        }

        match env.flag(constants::INPUT_POLICY_FOUND) {
            Ok(Some(found)) => self.policy.enabled = found,
            Ok(None) => {}
            Err(e) => tracing::warn!("{e}"),
        }
        if let Some(path) = env.non_empty(constants::INPUT_POLICY_PATH) {
            self.policy.path = Some(path);
        }
        if let Some(scope) = env.non_empty(constants::INPUT_POLICY_SCOPE) {
            self.policy.scope = scope;
        }

        if self.prompt.repository.is_none() {
            self.prompt.repository = env.non_empty(constants::ENV_GITHUB_REPOSITORY);
        }
    }
}
