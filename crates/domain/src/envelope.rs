//! Response envelope used by every backend endpoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// `{Status, Timestamp, Message, Error, Data}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>", serialize = "T: Serialize"))]
pub struct ApiEnvelope<T> {
    /// `success` or `error`
    #[serde(rename = "Status", default)]
    pub status: String,
    /// Server time of the response
    #[serde(rename = "Timestamp", default)]
    pub timestamp: Option<DateTime<Utc>>,
    /// Human readable message, set on errors
    #[serde(rename = "Message", default)]
    pub message: Option<String>,
    /// Error detail; its shape is not stable across endpoints
    #[serde(rename = "Error", default)]
    pub error: Option<serde_json::Value>,
    /// Payload
    #[serde(rename = "Data", default)]
    pub data: Option<T>,
}

impl<T> ApiEnvelope<T> {
    /// Returns true if the backend reported success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.eq_ignore_ascii_case("success")
    }

    /// Best available error description.
    #[must_use]
    pub fn error_message(&self) -> Option<String> {
        if let Some(message) = self.message.as_deref().filter(|m| !m.is_empty()) {
            return Some(message.to_string());
        }
        match &self.error {
            Some(serde_json::Value::String(s)) if !s.is_empty() => Some(s.clone()),
            _ => None,
        }
    }
}
