use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("expected a json array at the top level, got {0}")]
    NotAnArray(&'static str),
    #[error("element {index} is not a json object")]
    NotAnObject { index: usize },
}

/// One entry of the folder-list response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteFolder {
    #[serde(rename = "folder_name", default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
}

/// One entry of a folder's photo-list response. `url` is an absolute,
/// possibly signed, download link.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteFile {
    #[serde(rename = "file_name", default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub url: String,
}

pub fn decode_folder_list(body: &[u8]) -> Result<Vec<RemoteFolder>, DecodeError> {
    decode_objects(body)
}

pub fn decode_file_list(body: &[u8]) -> Result<Vec<RemoteFile>, DecodeError> {
    decode_objects(body)
}

fn decode_objects<T: DeserializeOwned>(body: &[u8]) -> Result<Vec<T>, DecodeError> {
    let root: Value = serde_json::from_slice(body)?;
    let elements = match root {
        Value::Array(elements) => elements,
        other => return Err(DecodeError::NotAnArray(json_kind(&other))),
    };
    elements
        .into_iter()
        .enumerate()
        .map(|(index, element)| {
            if !element.is_object() {
                return Err(DecodeError::NotAnObject { index });
            }
            Ok(serde_json::from_value(element)?)
        })
        .collect()
}

// Null and non-string members read as "" instead of failing the list; absent
// ones are covered by `#[serde(default)]`.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(value) => value,
        _ => String::new(),
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
