use serde_json::{json, Value};

use super::types::ArtifactSlot;

/// Name under which the schema is declared to the provider.
pub const SCHEMA_NAME: &str = "DockerConfigResponse";

fn artifact_schema(slot: ArtifactSlot, description: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            "content": {
                "type": "string",
                "description": description
            },
            "language": {
                "type": "string",
                "description": "Language identifier for syntax highlighting",
                "enum": [slot.language().as_str()]
            }
        },
        "required": ["content", "language"],
        "additionalProperties": false
    })
}

/// Strict JSON schema the model output must follow.
pub fn response_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "techStack": {
                "type": "object",
                "properties": {
                    "languages": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "Programming languages used in the project"
                    },
                    "frameworks": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "Frameworks used in the project"
                    },
                    "databases": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "Databases used in the project"
                    },
                    "packageManager": {
                        "type": ["string", "null"],
                        "description": "Package manager used in the project"
                    },
                    "runtime": {
                        "type": ["string", "null"],
                        "description": "Runtime environment for the project"
                    }
                },
                "required": ["languages", "frameworks", "databases", "packageManager", "runtime"],
                "additionalProperties": false
            },
            "dockerfile": artifact_schema(ArtifactSlot::Dockerfile, "Complete Dockerfile content"),
            "dockerCompose": artifact_schema(
                ArtifactSlot::DockerCompose,
                "Complete docker-compose.yaml content"
            )
        },
        "required": ["techStack", "dockerfile", "dockerCompose"],
        "additionalProperties": false
    })
}

/// `response_format` parameter of a chat-completions request.
pub fn response_format() -> Value {
    json!({
        "type": "json_schema",
        "json_schema": {
            "name": SCHEMA_NAME,
            "schema": response_schema(),
            "strict": true
        }
    })
}
