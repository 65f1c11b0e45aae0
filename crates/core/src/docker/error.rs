use serde::Serialize;

/// Client-facing failure categories.
///
/// Every failure at any boundary ends up as exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorCategory {
    /// Missing credential or malformed repository location.
    InvalidRequest,
    /// The repository location does not resolve to a public repository.
    NotFound,
    /// The context builder or the provider is rate limiting; retry later.
    RateLimited,
    /// The provider could not be reached.
    UpstreamUnavailable,
    /// The provider was reached but failed the call.
    UpstreamFailure,
    /// Empty context, empty response, undecodable or invalid response.
    FatalInternal,
    /// Anything not categorized above.
    GenericInternal,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::InvalidRequest => "invalid-request",
            ErrorCategory::NotFound => "not-found",
            ErrorCategory::RateLimited => "rate-limited",
            ErrorCategory::UpstreamUnavailable => "upstream-unavailable",
            ErrorCategory::UpstreamFailure => "upstream-failure",
            ErrorCategory::FatalInternal => "fatal-internal",
            ErrorCategory::GenericInternal => "generic-internal",
        }
    }

    /// HTTP status used when the category is returned over HTTP.
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorCategory::InvalidRequest => 400,
            ErrorCategory::NotFound => 404,
            ErrorCategory::RateLimited => 429,
            ErrorCategory::UpstreamUnavailable => 503,
            ErrorCategory::UpstreamFailure => 502,
            ErrorCategory::FatalInternal | ErrorCategory::GenericInternal => 500,
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// States of a single generation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Received,
    ContextBuilt,
    PromptAssembled,
    ModelInvoked,
    ResponseNormalized,
    Validated,
    Completed,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Received => "received",
            Stage::ContextBuilt => "context_built",
            Stage::PromptAssembled => "prompt_assembled",
            Stage::ModelInvoked => "model_invoked",
            Stage::ResponseNormalized => "response_normalized",
            Stage::Validated => "validated",
            Stage::Completed => "completed",
        };
        f.write_str(name)
    }
}

/// Failure of a request, as reported to the caller.
///
/// `detail` is safe to show to clients. `diagnostic` carries raw excerpts and
/// field paths for logs only.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{category}: {detail}")]
pub struct GenerateError {
    pub category: ErrorCategory,
    /// Last state reached before the failure.
    pub stage: Stage,
    pub detail: String,
    pub diagnostic: Option<String>,
}

impl GenerateError {
    pub fn new(category: ErrorCategory, stage: Stage, detail: impl Into<String>) -> Self {
        Self {
            category,
            stage,
            detail: detail.into(),
            diagnostic: None,
        }
    }

    pub fn with_diagnostic(mut self, diagnostic: impl Into<String>) -> Self {
        self.diagnostic = Some(diagnostic.into());
        self
    }

    /// Remove every occurrence of `secret` from detail and diagnostic.
    pub fn censored(mut self, secret: &str) -> Self {
        self.detail = censor_secret(&self.detail, secret);
        self.diagnostic = self.diagnostic.map(|d| censor_secret(&d, secret));
        self
    }
}

/// Errors produced while decoding and validating a model response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResponseError {
    #[error("response was not valid JSON: {message}")]
    Decode { raw: String, message: String },

    #[error("field `{path}` is invalid: expected {expected}, found {actual}")]
    Validation {
        path: String,
        expected: String,
        actual: String,
    },
}

/// Typed failure categories of the generation provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderFailure {
    RateLimited,
    Auth,
    Server,
    Connectivity,
    Other,
}

impl ProviderFailure {
    /// Classify an HTTP status returned by the provider.
    pub fn from_status(status: u16) -> Self {
        match status {
            429 => ProviderFailure::RateLimited,
            401 | 403 => ProviderFailure::Auth,
            500..=599 => ProviderFailure::Server,
            _ => ProviderFailure::Other,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            ProviderFailure::RateLimited => ErrorCategory::RateLimited,
            ProviderFailure::Auth | ProviderFailure::Server => ErrorCategory::UpstreamFailure,
            ProviderFailure::Connectivity => ErrorCategory::UpstreamUnavailable,
            ProviderFailure::Other => ErrorCategory::GenericInternal,
        }
    }
}

/// Failure reported by the generation provider.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ProviderError {
    pub kind: ProviderFailure,
    pub message: String,
}

impl ProviderError {
    pub fn new(kind: ProviderFailure, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Client-facing detail for this failure.
    ///
    /// Never includes the provider's own message; that belongs in logs.
    pub fn detail(&self) -> String {
        match self.kind {
            ProviderFailure::RateLimited => {
                "Rate limit exceeded. Please try again later.".to_string()
            }
            ProviderFailure::Auth => "The provider rejected the credential.".to_string(),
            ProviderFailure::Server => "Failed to get a response from the provider.".to_string(),
            ProviderFailure::Connectivity => "Failed to connect to the provider.".to_string(),
            ProviderFailure::Other => {
                "An unexpected error occurred while calling the provider.".to_string()
            }
        }
    }
}

/// Replace `secret` in `text` with a short, non-reversible hint.
pub fn censor_secret(text: &str, secret: &str) -> String {
    if secret.is_empty() {
        return text.to_string();
    }

    let hint = if secret.len() > 8 && secret.is_char_boundary(secret.len() - 4) {
        format!("...{}", &secret[secret.len() - 4..])
    } else {
        "...".to_string()
    };
    text.replace(secret, &hint)
}
