//! Request parsing
//!
//! Requests are parsed in two stages so that decode failures are
//! distinguishable: invalid JSON has no usable id and is reported with
//! `id: 0`, while a structurally valid object with an unknown or malformed
//! `type` still echoes the id it carried.

use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// All operation kinds the bridge accepts, keyed by the `type` field.
pub const KNOWN_TYPES: &[&str] = &[
    "initialize",
    "shutdown",
    "ping",
    "execute_code",
    "load_plugin",
    "list_plugins",
    "call_method",
    "get_plugin_info",
    "get_property",
    "set_property",
    "subscribe_events",
    "unsubscribe_events",
    "emit_event",
];

/// A single parsed request: correlation id plus the operation payload.
#[derive(Debug, Clone, Deserialize)]
pub struct Request {
    #[serde(default)]
    pub id: i64,
    #[serde(flatten)]
    pub op: RequestOp,
}

/// Operation payloads, dispatched on the `type` field.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RequestOp {
    Initialize,
    Shutdown,
    Ping,
    ExecuteCode {
        code: String,
        #[serde(default)]
        context: Map<String, Value>,
    },
    LoadPlugin {
        plugin_path: String,
        #[serde(default)]
        plugin_class: Option<String>,
    },
    ListPlugins,
    CallMethod {
        plugin_id: String,
        method_name: String,
        #[serde(default)]
        parameters: Vec<Value>,
    },
    GetPluginInfo {
        plugin_id: String,
    },
    GetProperty {
        plugin_id: String,
        property_name: String,
    },
    SetProperty {
        plugin_id: String,
        property_name: String,
        value: Value,
    },
    SubscribeEvents {
        plugin_id: String,
        #[serde(default)]
        event_names: Vec<String>,
    },
    UnsubscribeEvents {
        plugin_id: String,
        #[serde(default)]
        event_names: Vec<String>,
    },
    EmitEvent {
        plugin_id: String,
        event_name: String,
        #[serde(default)]
        event_data: Value,
    },
}

/// Failures while decoding one request line
#[derive(Error, Debug)]
pub enum ParseError {
    /// The line was not valid JSON at all; no id could be recovered
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    /// Valid JSON but the `type` is not one of the known operations
    #[error("Unknown request type: {kind}")]
    UnknownType { id: i64, kind: String },

    /// Known `type` but the payload fields did not deserialize
    #[error("Invalid request: {message}")]
    InvalidRequest { id: i64, message: String },
}

impl ParseError {
    /// The id to echo in the failure response (0 when none is recoverable)
    pub fn id(&self) -> i64 {
        match self {
            ParseError::InvalidJson(_) => 0,
            ParseError::UnknownType { id, .. } | ParseError::InvalidRequest { id, .. } => *id,
        }
    }
}

impl Request {
    /// Parse one wire line into a request.
    pub fn from_line(line: &str) -> Result<Request, ParseError> {
        let value: Value = serde_json::from_str(line)
            .map_err(|e| ParseError::InvalidJson(format!("{}", e)))?;

        let id = value.get("id").and_then(Value::as_i64).unwrap_or(0);
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();

        if !KNOWN_TYPES.contains(&kind.as_str()) {
            return Err(ParseError::UnknownType { id, kind });
        }

        serde_json::from_value(value).map_err(|e| ParseError::InvalidRequest {
            id,
            message: format!("{}", e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_defaults_to_zero() {
        let req = Request::from_line(r#"{"type":"initialize"}"#).unwrap();
        assert_eq!(req.id, 0);
        assert!(matches!(req.op, RequestOp::Initialize));
    }

    #[test]
    fn invalid_json_has_id_zero() {
        let err = Request::from_line("not json").unwrap_err();
        assert!(matches!(err, ParseError::InvalidJson(_)));
        assert_eq!(err.id(), 0);
        assert!(err.to_string().starts_with("Invalid JSON:"));
    }

    #[test]
    fn unknown_type_echoes_id() {
        let err = Request::from_line(r#"{"type":"frobnicate","id":9}"#).unwrap_err();
        assert_eq!(err.id(), 9);
        assert!(err.to_string().contains("Unknown request type"));
    }

    #[test]
    fn missing_field_is_invalid_request() {
        let err = Request::from_line(r#"{"type":"call_method","id":4}"#).unwrap_err();
        assert_eq!(err.id(), 4);
        assert!(matches!(err, ParseError::InvalidRequest { .. }));
    }

    #[test]
    fn call_method_parameters_default_empty() {
        let req = Request::from_line(
            r#"{"type":"call_method","id":2,"plugin_id":"python_0","method_name":"run"}"#,
        )
        .unwrap();
        match req.op {
            RequestOp::CallMethod { parameters, .. } => assert!(parameters.is_empty()),
            other => panic!("unexpected op: {:?}", other),
        }
    }

    #[test]
    fn load_plugin_class_is_optional() {
        let req =
            Request::from_line(r#"{"type":"load_plugin","id":1,"plugin_path":"/tmp/p.py"}"#)
                .unwrap();
        match req.op {
            RequestOp::LoadPlugin { plugin_class, .. } => assert!(plugin_class.is_none()),
            other => panic!("unexpected op: {:?}", other),
        }
    }
}
