//! JSON serialization helpers.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::ser::{PrettyFormatter, Serializer};

/// Error type for serialization operations.
#[derive(Debug, thiserror::Error)]
pub enum SerializationError {
    /// JSON serialization failed.
    #[error("JSON serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    /// JSON deserialization failed.
    #[error("JSON deserialization failed: {0}")]
    Deserialize(serde_json::Error),

    /// UTF-8 encoding error.
    #[error("UTF-8 encoding error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Serializes a value to indented JSON with a trailing newline.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_json_pretty<T: Serialize>(value: &T) -> Result<String, SerializationError> {
    let mut buffer = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"  ");
    let mut serializer = Serializer::with_formatter(&mut buffer, formatter);
    value.serialize(&mut serializer)?;

    let mut json = String::from_utf8(buffer)?;
    json.push('\n');
    Ok(json)
}

/// Deserializes JSON from bytes.
///
/// # Errors
///
/// Returns an error if the JSON is invalid or doesn't match the expected type.
pub fn from_json_bytes<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, SerializationError> {
    serde_json::from_slice(bytes).map_err(SerializationError::Deserialize)
}

/// Re-indents a JSON document for storage.
///
/// # Errors
///
/// Returns an error if `json` is not valid JSON.
pub fn prettify(json: &str) -> Result<String, SerializationError> {
    let value: serde_json::Value =
        serde_json::from_str(json).map_err(SerializationError::Deserialize)?;
    to_json_pretty(&value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_pretty_output_layout() {
        let mut map = BTreeMap::new();
        map.insert("key", "value");

        let json = to_json_pretty(&map).expect("serialization should work");
        assert!(json.ends_with('\n'));
        assert!(json.contains("  \"key\""));
    }

    #[test]
    fn test_from_json_bytes() {
        let json = r#"{"base_url": "http://drupal.test"}"#;
        let result: serde_json::Value =
            from_json_bytes(json.as_bytes()).expect("deserialization should work");
        assert_eq!(result["base_url"], "http://drupal.test");
    }

    #[test]
    fn test_prettify_rejects_invalid_json() {
        assert!(prettify(r#"{"access_token": }"#).is_err());
        let pretty = prettify(r#"{"access_token":"abc"}"#).expect("valid json");
        assert_eq!(pretty, "{\n  \"access_token\": \"abc\"\n}\n");
    }
}
