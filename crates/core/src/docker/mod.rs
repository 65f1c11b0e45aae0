pub mod error;
pub mod extract;
pub mod prompt;
pub mod schema;
pub mod types;
pub mod validate;

pub use error::{
    censor_secret, ErrorCategory, GenerateError, ProviderError, ProviderFailure, ResponseError,
    Stage,
};
pub use extract::strip_code_fence;
pub use prompt::{build_prompt, BEGIN_CONTEXT, END_CONTEXT};
pub use schema::{response_format, response_schema};
pub use types::{
    ArtifactLanguage, ArtifactSlot, CodeArtifact, GenerationRequest, GenerationResult, TechStack,
    DEFAULT_MODEL,
};
pub use validate::parse_generation_result;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fenced_legacy_response_parses() {
        let raw = "```json\n{\"techStack\": {\"languages\": [\"Ruby\"], \"frameworks\": [\"Rails\"], \"databases\": [\"PostgreSQL\"], \"packageManager\": \"bundler\", \"runtime\": null}, \"dockerfile\": \"FROM ruby:3.3\", \"dockerCompose\": \"services: {}\"}\n```";

        let result = parse_generation_result(&strip_code_fence(raw)).unwrap();
        assert_eq!(result.tech_stack.databases, vec!["PostgreSQL"]);
        assert_eq!(result.dockerfile.content, "FROM ruby:3.3");
        assert_eq!(result.docker_compose.language, ArtifactLanguage::Yaml);
    }

    #[test]
    fn test_decode_error_keeps_stripped_text() {
        let err = parse_generation_result(&strip_code_fence("```json\nnot json\n```")).unwrap_err();
        match err {
            ResponseError::Decode { raw, .. } => assert_eq!(raw, "not json"),
            other => panic!("expected decode error, got {other:?}"),
        }
    }
}
