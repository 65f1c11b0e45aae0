use serde::{Deserialize, Serialize};

/// Default model used when a request does not name one.
pub const DEFAULT_MODEL: &str = "gpt-4.1-mini-2025-04-14";

/// Tech stack detected in the repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechStack {
    pub languages: Vec<String>,
    pub frameworks: Vec<String>,
    pub databases: Vec<String>,
    pub package_manager: Option<String>,
    pub runtime: Option<String>,
}

/// Syntax tag attached to a generated artifact.
///
/// Each artifact slot accepts exactly one tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactLanguage {
    Dockerfile,
    Yaml,
}

impl ArtifactLanguage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactLanguage::Dockerfile => "dockerfile",
            ArtifactLanguage::Yaml => "yaml",
        }
    }
}

impl std::fmt::Display for ArtifactLanguage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A generated file: raw text plus its syntax tag.
///
/// `content` may be empty (e.g. no Dockerfile needed) but is never null.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeArtifact {
    pub content: String,
    pub language: ArtifactLanguage,
}

/// The two artifact slots of a [`GenerationResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactSlot {
    Dockerfile,
    DockerCompose,
}

impl ArtifactSlot {
    /// JSON key of the slot in the response object.
    pub fn key(&self) -> &'static str {
        match self {
            ArtifactSlot::Dockerfile => "dockerfile",
            ArtifactSlot::DockerCompose => "dockerCompose",
        }
    }

    /// The only tag this slot accepts.
    pub fn language(&self) -> ArtifactLanguage {
        match self {
            ArtifactSlot::Dockerfile => ArtifactLanguage::Dockerfile,
            ArtifactSlot::DockerCompose => ArtifactLanguage::Yaml,
        }
    }
}

/// Canonical, fully validated response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    pub tech_stack: TechStack,
    pub dockerfile: CodeArtifact,
    pub docker_compose: CodeArtifact,
}

/// An inbound generation request.
#[derive(Clone, Deserialize)]
pub struct GenerationRequest {
    #[serde(default)]
    pub repo_url: String,
    #[serde(default, rename = "openai_api_key")]
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

impl GenerationRequest {
    pub fn new(repo_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            repo_url: repo_url.into(),
            api_key: api_key.into(),
            model: default_model(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

// The credential must never reach a log line.
impl std::fmt::Debug for GenerationRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationRequest")
            .field("repo_url", &self.repo_url)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .finish()
    }
}
