use std::sync::Arc;

use dockgen_core::context::validate_repository_url;
use dockgen_core::docker::{
    build_prompt, parse_generation_result, strip_code_fence, ErrorCategory, GenerateError,
    GenerationRequest, GenerationResult, ResponseError, Stage,
};

use crate::openai::GenerationProvider;
use crate::repomix::ContextBuilder;

/// Longest raw-response excerpt kept in a diagnostic.
const DIAGNOSTIC_EXCERPT_CHARS: usize = 2000;

/// Runs one generation request end to end.
///
/// Holds no per-request state, so one instance serves concurrent requests.
#[derive(Clone)]
pub struct Generator {
    context_builder: Arc<dyn ContextBuilder>,
    provider: Arc<dyn GenerationProvider>,
}

impl Generator {
    pub fn new(
        context_builder: Arc<dyn ContextBuilder>,
        provider: Arc<dyn GenerationProvider>,
    ) -> Self {
        Self {
            context_builder,
            provider,
        }
    }

    /// Produce a validated [`GenerationResult`] or exactly one categorized failure.
    pub async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResult, GenerateError> {
        match self.run(request).await {
            Ok(result) => Ok(result),
            Err(err) => {
                let err = err.censored(&request.api_key);
                log::error!(
                    "Request for {} failed after {} [{}]: {}{}",
                    request.repo_url.trim(),
                    err.stage,
                    err.category,
                    err.detail,
                    err.diagnostic
                        .as_deref()
                        .map(|d| format!("\n{d}"))
                        .unwrap_or_default()
                );
                Err(err)
            }
        }
    }

    async fn run(&self, request: &GenerationRequest) -> Result<GenerationResult, GenerateError> {
        if request.api_key.trim().is_empty() {
            return Err(GenerateError::new(
                ErrorCategory::InvalidRequest,
                Stage::Received,
                "OpenAI API key is required.",
            ));
        }

        let repo_url = validate_repository_url(&request.repo_url).map_err(|e| {
            GenerateError::new(ErrorCategory::InvalidRequest, Stage::Received, e.to_string())
        })?;

        log::info!("Processing request for repository: {}", repo_url);

        let context = self.context_builder.build(repo_url).await.map_err(|e| {
            GenerateError::new(e.kind.category(), Stage::Received, e.detail(repo_url))
                .with_diagnostic(format!("context builder: {}", e.message))
        })?;

        if context.is_empty() {
            return Err(GenerateError::new(
                ErrorCategory::FatalInternal,
                Stage::Received,
                "Context builder produced an empty context.",
            ));
        }

        if context.truncated {
            log::warn!(
                "Context for {} was truncated to fit the size bound ({} files, ~{} tokens kept)",
                repo_url,
                context.total_files,
                context.total_tokens
            );
        }
        transition(repo_url, Stage::Received, Stage::ContextBuilt);

        let prompt = build_prompt(&context.content);
        transition(repo_url, Stage::ContextBuilt, Stage::PromptAssembled);

        let raw = self
            .provider
            .generate(&request.api_key, &request.model, &prompt)
            .await
            .map_err(|e| {
                GenerateError::new(e.kind.category(), Stage::PromptAssembled, e.detail())
                    .with_diagnostic(format!("provider ({}): {}", request.model, e.message))
            })?;
        transition(repo_url, Stage::PromptAssembled, Stage::ModelInvoked);

        if raw.is_empty() {
            return Err(GenerateError::new(
                ErrorCategory::FatalInternal,
                Stage::ModelInvoked,
                "Model returned an empty response.",
            ));
        }

        let normalized = strip_code_fence(&raw);
        transition(repo_url, Stage::ModelInvoked, Stage::ResponseNormalized);

        let result = parse_generation_result(&normalized).map_err(response_failure)?;
        transition(repo_url, Stage::ResponseNormalized, Stage::Validated);

        log::info!(
            "Successfully parsed and validated model response for {}",
            repo_url
        );
        transition(repo_url, Stage::Validated, Stage::Completed);

        Ok(result)
    }
}

fn transition(repo_url: &str, from: Stage, to: Stage) {
    log::debug!("{}: {} -> {}", repo_url, from, to);
}

fn response_failure(err: ResponseError) -> GenerateError {
    match &err {
        ResponseError::Decode { raw, message } => GenerateError::new(
            ErrorCategory::FatalInternal,
            Stage::ResponseNormalized,
            format!("Model response was not valid JSON: {}", message),
        )
        .with_diagnostic(format!("raw response: {}", excerpt(raw))),
        ResponseError::Validation { path, .. } => GenerateError::new(
            ErrorCategory::FatalInternal,
            Stage::ResponseNormalized,
            format!("Model response did not match required format: {}", err),
        )
        .with_diagnostic(format!("field path: {}", path)),
    }
}

fn excerpt(text: &str) -> String {
    match text.char_indices().nth(DIAGNOSTIC_EXCERPT_CHARS) {
        Some((index, _)) => format!("{}...", &text[..index]),
        None => text.to_string(),
    }
}
