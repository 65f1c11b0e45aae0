use dockgen_core::docker::GenerateError;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("OpenAI API key is required: pass --api-key or set OPENAI_API_KEY")]
    MissingApiKey,

    #[error("Invalid repomix command '{0}'")]
    InvalidCommand(String),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),

    #[error(transparent)]
    Generate(#[from] GenerateError),
}
