//! Bounded retry with fallback model for generation calls.
//!
//! Each round waits its delay, tries the primary model, then the fallback
//! model. The first non-empty response wins.

use std::time::Duration;

use thiserror::Error;

use crate::config::{BackoffKind, GenerationConfig};
use crate::models::DEFAULT_FALLBACK_MODEL;
use crate::providers::{GenerationService, ProviderError, classify_error};

/// All rounds failed.
#[derive(Error, Debug)]
pub enum RetryError {
    #[error("generation failed after {attempts} attempts: {last_error}")]
    Exhausted {
        attempts: u32,
        last_error: ProviderError,
    },
}

/// Delay growth between rounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    Fixed,
    /// Doubles each round, capped at `max`.
    Exponential { max: Duration },
}

/// A failed attempt, handed to the observer.
#[derive(Debug)]
pub struct AttemptFailure<'a> {
    /// 1-based round number.
    pub round: u32,
    pub max_rounds: u32,
    pub model: &'a str,
    pub error: &'a ProviderError,
}

/// Successful generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generated {
    pub text: String,
    /// Model that answered (primary or fallback).
    pub model: String,
    /// Attempts made, including the successful one.
    pub attempts: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_rounds: u32,
    pub delay: Duration,
    pub backoff: Backoff,
    pub fallback_model: Option<String>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_rounds: 3,
            delay: Duration::from_secs(2),
            backoff: Backoff::Fixed,
            fallback_model: Some(DEFAULT_FALLBACK_MODEL.to_string()),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &GenerationConfig) -> Self {
        let backoff = match config.backoff {
            BackoffKind::Fixed => Backoff::Fixed,
            BackoffKind::Exponential => Backoff::Exponential {
                max: Duration::from_millis(config.max_retry_delay_ms),
            },
        };
        Self {
            max_rounds: config.max_rounds,
            delay: Duration::from_millis(config.retry_delay_ms),
            backoff,
            fallback_model: config.fallback().map(String::from),
        }
    }

    /// Rounds actually run; at least one.
    pub fn rounds(&self) -> u32 {
        self.max_rounds.max(1)
    }

    /// Wait before the given 0-based round.
    pub fn delay_for_round(&self, round: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed => self.delay,
            Backoff::Exponential { max } => self
                .delay
                .saturating_mul(2u32.saturating_pow(round))
                .min(max),
        }
    }

    /// Models tried in each round, in order.
    pub fn models<'a>(&'a self, primary: &'a str) -> Vec<&'a str> {
        let mut models = vec![primary];
        if let Some(fallback) = self.fallback_model.as_deref() {
            if fallback != primary {
                models.push(fallback);
            }
        }
        models
    }

    /// Run `service` until a model answers or the rounds run out.
    ///
    /// `observer` sees every failed attempt.
    pub async fn execute<F>(
        &self,
        service: &dyn GenerationService,
        model: &str,
        prompt: &str,
        mut observer: F,
    ) -> Result<Generated, RetryError>
    where
        F: FnMut(&AttemptFailure<'_>) + Send,
    {
        let rounds = self.rounds();
        let models = self.models(model);
        let mut attempts = 0;
        let mut last_error = None;

        for round in 0..rounds {
            let delay = self.delay_for_round(round);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            for &candidate in &models {
                attempts += 1;
                match service.generate(candidate, prompt).await {
                    Ok(text) => {
                        return Ok(Generated {
                            text,
                            model: candidate.to_string(),
                            attempts,
                        });
                    }
                    Err(error) => {
                        tracing::warn!(
                            round = round + 1,
                            max_rounds = rounds,
                            model = candidate,
                            reason = classify_error(&error).unwrap_or("generation error"),
                            "attempt failed: {error}"
                        );
                        observer(&AttemptFailure {
                            round: round + 1,
                            max_rounds: rounds,
                            model: candidate,
                            error: &error,
                        });
                        last_error = Some(error);
                    }
                }
            }
        }

        // At least one attempt always runs, so an error is recorded.
        let last_error = last_error.unwrap_or_else(|| ProviderError::EmptyResponse {
            model: model.to_string(),
        });
        Err(RetryError::Exhausted {
            attempts,
            last_error,
        })
    }
}
