//! JSON helpers for the storage file.

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

/// Serializes a value to pretty JSON bytes: 2-space indentation and a
/// trailing newline. Keys come out sorted when the source is a `BTreeMap`.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_json_stable_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, SerializationError> {
    let mut buffer = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"  ");
    let mut serializer = Serializer::with_formatter(&mut buffer, formatter);
    value.serialize(&mut serializer)?;

    let mut json = String::from_utf8(buffer)?;
    json.push('\n');
    Ok(json.into_bytes())
}

/// Deserializes JSON from bytes.
///
/// # Errors
///
/// Returns an error if the JSON is invalid or doesn't match the expected type.
pub fn from_json_bytes<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, SerializationError> {
    serde_json::from_slice(bytes).map_err(SerializationError::Deserialize)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_output_is_sorted_indented_and_newline_terminated() {
        let mut map = BTreeMap::new();
        map.insert("session", "{}");
        map.insert("accessToken", "abc");

        let json = String::from_utf8(to_json_stable_bytes(&map).unwrap()).unwrap();

        assert_eq!(json, "{\n  \"accessToken\": \"abc\",\n  \"session\": \"{}\"\n}\n");
    }

    #[test]
    fn test_from_json_bytes_rejects_wrong_shape() {
        let result: Result<BTreeMap<String, String>, _> = from_json_bytes(b"[1, 2]");
        assert!(matches!(result, Err(SerializationError::Deserialize(_))));
    }
}
