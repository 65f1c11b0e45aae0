use std::time::Duration;

use async_trait::async_trait;
use dockgen_core::docker::{censor_secret, response_format, ProviderError, ProviderFailure};
use dockgen_core::models::{ProviderModel, ProviderModelsResponse};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::prelude::*;

/// Default OpenAI-compatible API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

const MAX_TOKENS: u32 = 8000;
const TEMPERATURE: f32 = 0.2;

/// Generates text for a prompt under the strict response schema.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    async fn generate(
        &self,
        api_key: &str,
        model: &str,
        prompt: &str,
    ) -> std::result::Result<String, ProviderError>;
}

/// Chat-completions client for OpenAI-compatible APIs.
#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
    refusal: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

impl OpenAiProvider {
    pub fn new(base_url: &str, request_timeout: Duration) -> std::result::Result<Self, Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(15))
            .timeout(request_timeout)
            .build()
            .map_err(|e| Error::HttpClient(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Chat-completions request body for a single user prompt.
    pub fn request_body(model: &str, prompt: &str) -> Value {
        json!({
            "model": model,
            "max_tokens": MAX_TOKENS,
            "temperature": TEMPERATURE,
            "messages": [
                {"role": "user", "content": prompt}
            ],
            "response_format": response_format()
        })
    }

    /// List the models available to `api_key`.
    pub async fn list_models(
        &self,
        api_key: &str,
    ) -> std::result::Result<Vec<ProviderModel>, ProviderError> {
        let response = self
            .client
            .get(format!("{}/models", self.base_url))
            .bearer_auth(api_key)
            .send()
            .await
            .map_err(|e| transport_error(e, api_key))?;

        let body = read_success_body(response, api_key).await?;
        let listing: ProviderModelsResponse = serde_json::from_str(&body).map_err(|e| {
            ProviderError::new(
                ProviderFailure::Other,
                format!("Failed to parse model listing: {}", e),
            )
        })?;

        Ok(listing.data)
    }
}

#[async_trait]
impl GenerationProvider for OpenAiProvider {
    async fn generate(
        &self,
        api_key: &str,
        model: &str,
        prompt: &str,
    ) -> std::result::Result<String, ProviderError> {
        log::info!("Sending request to {} model {}", self.base_url, model);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&Self::request_body(model, prompt))
            .send()
            .await
            .map_err(|e| transport_error(e, api_key))?;

        let body = read_success_body(response, api_key).await?;
        let completion: ChatCompletion = serde_json::from_str(&body).map_err(|e| {
            ProviderError::new(
                ProviderFailure::Other,
                format!("Invalid JSON in completion response: {}", e),
            )
        })?;

        extract_content(completion)
    }
}

fn extract_content(completion: ChatCompletion) -> std::result::Result<String, ProviderError> {
    let Some(choice) = completion.choices.into_iter().next() else {
        return Ok(String::new());
    };

    match (choice.message.content, choice.message.refusal) {
        (Some(content), _) => Ok(content),
        (None, Some(refusal)) => Err(ProviderError::new(
            ProviderFailure::Other,
            format!("Model refused the request: {}", refusal),
        )),
        (None, None) => Ok(String::new()),
    }
}

fn transport_error(e: reqwest::Error, api_key: &str) -> ProviderError {
    let kind = if e.is_connect() || e.is_timeout() {
        ProviderFailure::Connectivity
    } else {
        ProviderFailure::Other
    };
    ProviderError::new(kind, censor_secret(&e.to_string(), api_key))
}

async fn read_success_body(
    response: reqwest::Response,
    api_key: &str,
) -> std::result::Result<String, ProviderError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| transport_error(e, api_key))?;

    if status.is_success() {
        return Ok(body);
    }

    Err(ProviderError::new(
        ProviderFailure::from_status(status.as_u16()),
        censor_secret(&error_message(status, &body), api_key),
    ))
}

/// Prefer the provider's own `error.message` over the raw body.
fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    match serde_json::from_str::<ApiErrorEnvelope>(body) {
        Ok(envelope) => f!("HTTP {}: {}", status, envelope.error.message),
        Err(_) if body.trim().is_empty() => f!("HTTP {}", status),
        Err(_) => f!("HTTP {}: {}", status, body.trim()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let body = OpenAiProvider::request_body("gpt-4o", "hello");
        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["max_tokens"], 8000);
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "hello");
        assert_eq!(body["response_format"]["type"], "json_schema");
        assert_eq!(body["response_format"]["json_schema"]["strict"], true);
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let provider =
            OpenAiProvider::new("http://localhost:8080/v1/", Duration::from_secs(5)).unwrap();
        assert_eq!(provider.base_url, "http://localhost:8080/v1");
    }

    #[test]
    fn test_extract_content() {
        let completion: ChatCompletion = serde_json::from_str(
            r#"{"choices": [{"message": {"role": "assistant", "content": "{}"}}]}"#,
        )
        .unwrap();
        assert_eq!(extract_content(completion).unwrap(), "{}");
    }

    #[test]
    fn test_extract_null_content_is_empty() {
        let completion: ChatCompletion =
            serde_json::from_str(r#"{"choices": [{"message": {"content": null}}]}"#).unwrap();
        assert_eq!(extract_content(completion).unwrap(), "");

        let completion: ChatCompletion = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert_eq!(extract_content(completion).unwrap(), "");
    }

    #[test]
    fn test_extract_refusal() {
        let completion: ChatCompletion = serde_json::from_str(
            r#"{"choices": [{"message": {"content": null, "refusal": "no"}}]}"#,
        )
        .unwrap();
        let err = extract_content(completion).unwrap_err();
        assert_eq!(err.kind, ProviderFailure::Other);
        assert!(err.message.contains("no"));
    }

    #[test]
    fn test_error_message_prefers_provider_message() {
        let status = reqwest::StatusCode::TOO_MANY_REQUESTS;
        assert_eq!(
            error_message(status, r#"{"error": {"message": "Slow down", "type": "requests"}}"#),
            "HTTP 429 Too Many Requests: Slow down"
        );
        assert_eq!(error_message(status, "  "), "HTTP 429 Too Many Requests");
        assert_eq!(
            error_message(status, "plain text"),
            "HTTP 429 Too Many Requests: plain text"
        );
    }

    #[tokio::test]
    async fn test_unreachable_provider_is_connectivity_failure() {
        // Nothing listens on port 9 of the loopback interface.
        let provider = OpenAiProvider::new("http://127.0.0.1:9/v1", Duration::from_secs(5)).unwrap();
        let err = provider
            .generate("sk-test-key-123456", "gpt-4o", "hello")
            .await
            .unwrap_err();

        assert_eq!(err.kind, ProviderFailure::Connectivity);
        assert!(!err.message.contains("sk-test-key-123456"));
    }
}
