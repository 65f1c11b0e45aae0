use serde_json::{Map, Value};

use super::error::ResponseError;
use super::types::{ArtifactSlot, CodeArtifact, GenerationResult, TechStack};

/// Decode, migrate and validate a normalized model response.
///
/// The result is all-or-nothing: any missing or mistyped required field
/// rejects the whole response.
pub fn parse_generation_result(text: &str) -> Result<GenerationResult, ResponseError> {
    let value: Value = serde_json::from_str(text).map_err(|e| ResponseError::Decode {
        raw: text.to_string(),
        message: e.to_string(),
    })?;

    let root = as_object(&value, "$")?;

    let tech_stack = parse_tech_stack(required(root, "", "techStack")?)?;
    let dockerfile = parse_artifact(root, ArtifactSlot::Dockerfile)?;
    let docker_compose = parse_artifact(root, ArtifactSlot::DockerCompose)?;

    Ok(GenerationResult {
        tech_stack,
        dockerfile,
        docker_compose,
    })
}

/// An artifact slot as the model may send it.
///
/// Older responses carry the file as a bare string; current ones carry a
/// `{content, language}` record. Only [`RawArtifact::migrate`] turns this
/// into a [`CodeArtifact`].
#[derive(Debug)]
enum RawArtifact<'a> {
    Bare(&'a str),
    Record(&'a Map<String, Value>),
}

impl<'a> RawArtifact<'a> {
    fn from_value(value: &'a Value, slot: ArtifactSlot) -> Result<Self, ResponseError> {
        match value {
            Value::String(content) => Ok(RawArtifact::Bare(content)),
            Value::Object(record) => Ok(RawArtifact::Record(record)),
            other => Err(mismatch(slot.key(), "object or string", other)),
        }
    }

    fn migrate(self, slot: ArtifactSlot) -> Result<CodeArtifact, ResponseError> {
        match self {
            RawArtifact::Bare(content) => Ok(CodeArtifact {
                content: content.to_string(),
                language: slot.language(),
            }),
            RawArtifact::Record(record) => {
                let content = required_string(record, slot.key(), "content")?;
                let language = required_string(record, slot.key(), "language")?;
                let expected = slot.language();

                if language != expected.as_str() {
                    return Err(ResponseError::Validation {
                        path: field_path(slot.key(), "language"),
                        expected: format!("\"{}\"", expected),
                        actual: format!("\"{}\"", language),
                    });
                }

                Ok(CodeArtifact {
                    content,
                    language: expected,
                })
            }
        }
    }
}

fn parse_artifact(
    root: &Map<String, Value>,
    slot: ArtifactSlot,
) -> Result<CodeArtifact, ResponseError> {
    let value = required(root, "", slot.key())?;
    RawArtifact::from_value(value, slot)?.migrate(slot)
}

fn parse_tech_stack(value: &Value) -> Result<TechStack, ResponseError> {
    let prefix = "techStack";
    let object = as_object(value, prefix)?;

    Ok(TechStack {
        languages: string_list(object, prefix, "languages")?,
        frameworks: string_list(object, prefix, "frameworks")?,
        databases: string_list(object, prefix, "databases")?,
        package_manager: optional_string(object, prefix, "packageManager")?,
        runtime: optional_string(object, prefix, "runtime")?,
    })
}

fn field_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn mismatch(path: impl Into<String>, expected: &str, actual: &Value) -> ResponseError {
    ResponseError::Validation {
        path: path.into(),
        expected: expected.to_string(),
        actual: kind(actual).to_string(),
    }
}

fn as_object<'a>(value: &'a Value, path: &str) -> Result<&'a Map<String, Value>, ResponseError> {
    value.as_object().ok_or_else(|| mismatch(path, "object", value))
}

fn required<'a>(
    object: &'a Map<String, Value>,
    prefix: &str,
    key: &str,
) -> Result<&'a Value, ResponseError> {
    object.get(key).ok_or_else(|| ResponseError::Validation {
        path: field_path(prefix, key),
        expected: "required field".to_string(),
        actual: "missing".to_string(),
    })
}

fn required_string(
    object: &Map<String, Value>,
    prefix: &str,
    key: &str,
) -> Result<String, ResponseError> {
    match required(object, prefix, key)? {
        Value::String(s) => Ok(s.clone()),
        other => Err(mismatch(field_path(prefix, key), "string", other)),
    }
}

fn string_list(
    object: &Map<String, Value>,
    prefix: &str,
    key: &str,
) -> Result<Vec<String>, ResponseError> {
    let path = field_path(prefix, key);
    let value = required(object, prefix, key)?;
    let Value::Array(items) = value else {
        return Err(mismatch(path, "array of strings", value));
    };

    items
        .iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::String(s) => Ok(s.clone()),
            other => Err(mismatch(format!("{path}[{index}]"), "string", other)),
        })
        .collect()
}

/// Absent and explicit `null` both mean "not detected".
fn optional_string(
    object: &Map<String, Value>,
    prefix: &str,
    key: &str,
) -> Result<Option<String>, ResponseError> {
    match object.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(mismatch(field_path(prefix, key), "string or null", other)),
    }
}
