//! GenerationService trait and backends.
//!
//! A generation service turns a rendered prompt into review text. The
//! command backend shells out to an installed CLI; the API backend goes
//! through rig-core.

pub mod command;
pub mod rig;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{Backend, Config};

pub use command::CommandProvider;
pub use rig::RigProvider;

/// Errors from a generation backend.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("LLM API error: {0}")]
    ApiError(String),

    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    CommandFailed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("empty response from model {model}")]
    EmptyResponse { model: String },

    #[error("provider not configured: {0}")]
    NotConfigured(String),
}

/// Turns a prompt into generated text.
#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Generate a review with `model`.
    ///
    /// Output that is empty after trimming is an [`ProviderError::EmptyResponse`].
    async fn generate(&self, model: &str, prompt: &str) -> Result<String, ProviderError>;
}

/// Build the backend selected in config.
pub fn from_config(config: &Config) -> Result<Box<dyn GenerationService>, ProviderError> {
    match config.generation.backend {
        Backend::Command => Ok(Box::new(CommandProvider::new(
            &config.generation.command,
            config.generation.args.clone(),
        )?)),
        Backend::Api => Ok(Box::new(RigProvider::new(config.provider.clone())?)),
    }
}

/// Reject blank output.
pub(crate) fn non_empty(model: &str, text: String) -> Result<String, ProviderError> {
    if text.trim().is_empty() {
        Err(ProviderError::EmptyResponse {
            model: model.to_string(),
        })
    } else {
        Ok(text)
    }
}

/// Classifies a provider error into a short, user-friendly message.
///
/// Returns `Some(message)` for transient errors, `None` otherwise.
pub fn classify_error(err: &ProviderError) -> Option<&'static str> {
    match err {
        ProviderError::ApiError(msg) | ProviderError::CommandFailed { stderr: msg, .. } => {
            let msg_lower = msg.to_lowercase();
            if msg_lower.contains("429")
                || msg_lower.contains("rate limit")
                || msg_lower.contains("too many requests")
                || msg_lower.contains("quota")
            {
                Some("Rate limited by API")
            } else if msg_lower.contains("503")
                || msg_lower.contains("service unavailable")
                || msg_lower.contains("high demand")
            {
                Some("High model load")
            } else if msg_lower.contains("529") || msg_lower.contains("overloaded") {
                Some("API overloaded")
            } else if msg_lower.contains("502") {
                Some("API gateway error")
            } else if msg_lower.contains("timeout") || msg_lower.contains("timed out") {
                Some("Request timed out")
            } else if msg_lower.contains("connection") {
                Some("Connection error")
            } else if msg_lower.contains("temporarily") || msg_lower.contains("try again") {
                Some("Temporary API error")
            } else {
                None
            }
        }
        ProviderError::EmptyResponse { .. } => Some("Empty response"),
        _ => None,
    }
}
