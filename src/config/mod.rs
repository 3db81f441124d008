//! Configuration loading and layering.
//!
//! Handles `.patchwise.toml` loading, environment variable resolution
//! (including GitHub Action inputs), and CLI flag merging with proper
//! priority ordering.

pub mod loader;

pub use loader::{
    Backend, BackoffKind, Config, ConfigError, GenerationConfig, OutputConfig, PolicyConfig,
    PromptConfig, ProviderConfig, ReportLayout, WindowConfig,
};
