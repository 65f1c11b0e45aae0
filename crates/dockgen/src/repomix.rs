use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use dockgen_core::context::{
    repomix_args, ContextError, ContextFailure, ContextOptions, RepositoryContext,
};

use crate::prelude::*;

/// Default command used to run repomix.
pub const DEFAULT_REPOMIX_COMMAND: &str = "repomix";

/// Flattens a repository into a single text context.
#[async_trait]
pub trait ContextBuilder: Send + Sync {
    async fn build(&self, repo_url: &str) -> std::result::Result<RepositoryContext, ContextError>;
}

/// [`ContextBuilder`] backed by the repomix CLI.
///
/// Every call writes to its own temporary file, which is removed when the
/// call returns, whatever the outcome.
#[derive(Debug, Clone)]
pub struct RepomixContextBuilder {
    program: String,
    base_args: Vec<String>,
    options: ContextOptions,
    max_context_chars: usize,
}

impl RepomixContextBuilder {
    /// `command` is split with shell rules, so `npx repomix` works.
    pub fn new(
        command: &str,
        options: ContextOptions,
        max_context_chars: usize,
    ) -> std::result::Result<Self, Error> {
        let mut parts = shlex::split(command)
            .filter(|parts| !parts.is_empty())
            .ok_or_else(|| Error::InvalidCommand(command.to_string()))?;
        let program = parts.remove(0);

        Ok(Self {
            program,
            base_args: parts,
            options,
            max_context_chars,
        })
    }

    /// Resolve the repomix program on `PATH`.
    pub fn locate(&self) -> std::result::Result<PathBuf, ContextError> {
        which::which(&self.program).map_err(|e| {
            ContextError::new(
                ContextFailure::Other,
                format!("repomix program '{}' is unavailable: {}", self.program, e),
            )
        })
    }

    async fn run_repomix(&self, repo_url: &str) -> std::result::Result<String, ContextError> {
        let output_file = tempfile::Builder::new()
            .prefix("dockgen-")
            .suffix(".repomix.xml")
            .tempfile()
            .map_err(|e| {
                ContextError::new(
                    ContextFailure::Other,
                    format!("Failed to create temporary output file: {}", e),
                )
            })?;

        let output_path = output_file.path().to_string_lossy().to_string();
        log::debug!("Using temporary file for repomix output: {}", output_path);

        let args = repomix_args(repo_url, &output_path, &self.options);
        let output = tokio::process::Command::new(&self.program)
            .args(&self.base_args)
            .args(&args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                // Spawn failures say nothing about the repository.
                ContextError::new(
                    ContextFailure::Other,
                    format!("Failed to run '{}': {}", self.program, e),
                )
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            let message = [stderr.trim(), stdout.trim()]
                .into_iter()
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join("\n");
            let message = if message.is_empty() {
                format!("repomix exited with {}", output.status)
            } else {
                message
            };

            return Err(ContextError::from_message(message));
        }

        tokio::fs::read_to_string(output_file.path())
            .await
            .map_err(|e| {
                ContextError::new(
                    ContextFailure::Other,
                    format!("Failed to read repomix output: {}", e),
                )
            })
    }
}

#[async_trait]
impl ContextBuilder for RepomixContextBuilder {
    async fn build(&self, repo_url: &str) -> std::result::Result<RepositoryContext, ContextError> {
        let output = self.run_repomix(repo_url).await?;
        let context = RepositoryContext::from_output(output, self.max_context_chars);

        log::info!(
            "Repomix processing complete for {}. Tokens: {}, Files processed: {}",
            repo_url,
            context.total_tokens,
            context.total_files
        );

        Ok(context)
    }
}
