//! Response construction and serialization

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One wire response. `error` and `traceback` are present only on failures;
/// operation-specific fields (result, metadata, plugin_id, ...) are carried
/// in the flattened map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub id: i64,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub traceback: Option<String>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Response {
    /// A successful response echoing the request id
    pub fn ok(id: i64) -> Self {
        Response {
            id,
            success: true,
            error: None,
            traceback: None,
            fields: Map::new(),
        }
    }

    /// A failure response with a message and optional Python traceback text
    pub fn failure(id: i64, error: String, traceback: Option<String>) -> Self {
        Response {
            id,
            success: false,
            error: Some(error),
            traceback,
            fields: Map::new(),
        }
    }

    /// Attach an operation-specific field
    pub fn with_field(mut self, key: &str, value: Value) -> Self {
        self.fields.insert(key.to_string(), value);
        self
    }

    /// Attach a human-readable `message` field
    pub fn with_message(self, message: &str) -> Self {
        self.with_field("message", Value::String(message.to_string()))
    }

    /// Serialize to one wire line (without trailing newline).
    ///
    /// Serialization of a `Response` cannot realistically fail since every
    /// field is already JSON, but the fallback keeps the contract that the
    /// loop always emits exactly one line per request.
    pub fn to_line(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(
                r#"{{"id":{},"success":false,"error":"Failed to serialize response: {}"}}"#,
                self.id, e
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_response_omits_error_fields() {
        let line = Response::ok(5).with_message("done").to_line();
        assert!(line.contains("\"id\":5"));
        assert!(line.contains("\"success\":true"));
        assert!(line.contains("\"message\":\"done\""));
        assert!(!line.contains("\"error\""));
        assert!(!line.contains("\"traceback\""));
    }

    #[test]
    fn failure_carries_error_and_traceback() {
        let line = Response::failure(
            2,
            "boom".to_string(),
            Some("Traceback (most recent call last): ...".to_string()),
        )
        .to_line();
        assert!(line.contains("\"success\":false"));
        assert!(line.contains("\"error\":\"boom\""));
        assert!(line.contains("Traceback"));
    }

    #[test]
    fn extra_fields_flatten_to_top_level() {
        let resp = Response::ok(1)
            .with_field("plugin_id", Value::String("python_0".to_string()))
            .with_field("result", Value::from(4));
        let parsed: Value = serde_json::from_str(&resp.to_line()).unwrap();
        assert_eq!(parsed["plugin_id"], "python_0");
        assert_eq!(parsed["result"], 4);
    }
}
