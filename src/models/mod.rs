//! Shared types used across all modules.
//!
//! Input items, per-file context modes, run outcomes, and the provider
//! selector live here so that the orchestrator, reports and CLI agree on
//! one vocabulary.

pub mod input;
pub mod summary;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use input::{Batch, ChangedFile, InputError};
pub use summary::{FileOutcome, RunSummary, RunVariant};

/// Fallback model tried after the primary one in every retry round.
pub const DEFAULT_FALLBACK_MODEL: &str = "gemini-2.0-pro";

/// How much post-change content accompanies the diff in a prompt.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ContextMode {
    /// No usable content (binary, deleted, or unavailable).
    DiffOnly,
    /// The whole file fits under the full-file threshold.
    Full,
    /// Large file: only excerpts around the hunks are included.
    Windowed,
}

impl ContextMode {
    /// Pick the mode for a file and return it with the file's line count.
    ///
    /// Line counting splits on `\n`, so a trailing newline adds one empty
    /// line. Missing or empty content counts as zero lines.
    pub fn select(content: Option<&str>, full_file_threshold: usize) -> (Self, usize) {
        match content {
            Some(text) if !text.is_empty() => {
                let lines = text.split('\n').count();
                if lines <= full_file_threshold {
                    (Self::Full, lines)
                } else {
                    (Self::Windowed, lines)
                }
            }
            _ => (Self::DiffOnly, 0),
        }
    }
}

/// Supported API backends for direct generation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderName {
    #[default]
    Gemini,
    Anthropic,
    #[serde(rename = "openai")]
    OpenAI,
    /// Any OpenAI-compatible endpoint (Ollama, vLLM, proxies).
    #[serde(rename = "openai-compatible")]
    OpenAICompatible,
}

impl fmt::Display for ProviderName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderName::Gemini => write!(f, "gemini"),
            ProviderName::Anthropic => write!(f, "anthropic"),
            ProviderName::OpenAI => write!(f, "openai"),
            ProviderName::OpenAICompatible => write!(f, "openai-compatible"),
        }
    }
}

impl std::str::FromStr for ProviderName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gemini" => Ok(ProviderName::Gemini),
            "anthropic" => Ok(ProviderName::Anthropic),
            "openai" => Ok(ProviderName::OpenAI),
            "openai-compatible" => Ok(ProviderName::OpenAICompatible),
            other => Err(format!(
                "unsupported provider: '{other}'. Supported: gemini, anthropic, openai, openai-compatible"
            )),
        }
    }
}

impl ProviderName {
    /// Provider-specific API key variable, consulted when the generic one is unset.
    pub fn api_key_env_var(self) -> &'static str {
        match self {
            ProviderName::Gemini => "GEMINI_API_KEY",
            ProviderName::Anthropic => "ANTHROPIC_API_KEY",
            ProviderName::OpenAI | ProviderName::OpenAICompatible => "OPENAI_API_KEY",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_without_content_is_diff_only() {
        assert_eq!(ContextMode::select(None, 100), (ContextMode::DiffOnly, 0));
        assert_eq!(ContextMode::select(Some(""), 100), (ContextMode::DiffOnly, 0));
    }

    #[test]
    fn mode_at_threshold_is_full() {
        let content = "a\nb\nc";
        assert_eq!(ContextMode::select(Some(content), 3), (ContextMode::Full, 3));
    }

    #[test]
    fn mode_above_threshold_is_windowed() {
        // Trailing newline adds a fourth (empty) line.
        let content = "a\nb\nc\n";
        assert_eq!(ContextMode::select(Some(content), 3), (ContextMode::Windowed, 4));
    }

    #[test]
    fn mode_string_forms() {
        assert_eq!(ContextMode::DiffOnly.to_string(), "diff_only");
        assert_eq!(ContextMode::Windowed.as_ref(), "windowed");
        assert_eq!("full".parse::<ContextMode>().unwrap(), ContextMode::Full);
        assert_eq!(
            serde_json::to_string(&ContextMode::DiffOnly).unwrap(),
            "\"diff_only\""
        );
    }

    #[test]
    fn provider_name_round_trips_through_str() {
        for name in [
            ProviderName::Gemini,
            ProviderName::Anthropic,
            ProviderName::OpenAI,
            ProviderName::OpenAICompatible,
        ] {
            assert_eq!(name.to_string().parse::<ProviderName>().unwrap(), name);
        }
    }

    #[test]
    fn provider_name_rejects_unknown() {
        let err = "cohere".parse::<ProviderName>().unwrap_err();
        assert!(err.contains("unsupported provider"));
    }

    #[test]
    fn provider_api_key_vars() {
        assert_eq!(ProviderName::Gemini.api_key_env_var(), "GEMINI_API_KEY");
        assert_eq!(
            ProviderName::OpenAICompatible.api_key_env_var(),
            "OPENAI_API_KEY"
        );
    }
}
