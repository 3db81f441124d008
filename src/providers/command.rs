//! External CLI backend (e.g. the `gemini` command).
//!
//! Argument templates are expanded per call: `{model}` and `{prompt}` are
//! substituted inside each argument. When no argument mentions
//! `{prompt}`, the prompt is written to the child's stdin instead.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use super::{GenerationService, ProviderError, non_empty};

/// Upper bound for one generation call.
const COMMAND_TIMEOUT: Duration = Duration::from_secs(600);

/// Runs a generation CLI once per attempt.
#[derive(Debug, Clone)]
pub struct CommandProvider {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandProvider {
    pub fn new(program: &str, args: Vec<String>) -> Result<Self, ProviderError> {
        let program = program.trim();
        if program.is_empty() {
            return Err(ProviderError::NotConfigured(
                "generation command is empty".to_string(),
            ));
        }
        Ok(Self {
            program: program.to_string(),
            args,
            timeout: COMMAND_TIMEOUT,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn prompt_via_stdin(&self) -> bool {
        !self.args.iter().any(|a| a.contains("{prompt}"))
    }

    fn expand_args(&self, model: &str, prompt: &str) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.replace("{model}", model).replace("{prompt}", prompt))
            .collect()
    }

    async fn run(&self, model: &str, prompt: &str) -> Result<std::process::Output, ProviderError> {
        let via_stdin = self.prompt_via_stdin();
        let mut child = tokio::process::Command::new(&self.program)
            .args(self.expand_args(model, prompt))
            .stdin(if via_stdin { Stdio::piped() } else { Stdio::null() })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ProviderError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            // The child may exit without reading; a broken pipe shows up in its status.
            if let Err(e) = stdin.write_all(prompt.as_bytes()).await {
                tracing::debug!(program = %self.program, "writing prompt to stdin failed: {e}");
            }
        }

        child.wait_with_output().await.map_err(|source| ProviderError::Spawn {
            program: self.program.clone(),
            source,
        })
    }
}

#[async_trait]
impl GenerationService for CommandProvider {
    async fn generate(&self, model: &str, prompt: &str) -> Result<String, ProviderError> {
        let output = tokio::time::timeout(self.timeout, self.run(model, prompt))
            .await
            .map_err(|_| {
                ProviderError::ApiError(format!(
                    "{} timed out after {}s",
                    self.program,
                    self.timeout.as_secs()
                ))
            })??;

        if !output.status.success() {
            return Err(ProviderError::CommandFailed {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        non_empty(model, String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
