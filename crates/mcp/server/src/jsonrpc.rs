//! JSON-RPC 2.0 wire types for the line-delimited stdio transport.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub const JSONRPC_VERSION: &str = "2.0";

/// MCP protocol revision returned from `initialize`.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Reserved JSON-RPC error codes, plus the MCP cancellation code.
pub mod code {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;
    pub const REQUEST_CANCELLED: i64 = -32800;
    pub const RESOURCE_NOT_FOUND: i64 = -32002;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// A parsed client request (has an id).
#[derive(Debug, Clone)]
pub struct Request {
    pub id: Value,
    pub method: String,
    pub params: Value,
}

/// Any well-formed incoming message.
#[derive(Debug, Clone)]
pub enum Incoming {
    Request(Request),
    /// No id: fire-and-forget.
    Notification { method: String, params: Value },
    /// A response to a server-initiated request. Not used in normal
    /// operation; skipped.
    Response { id: Value },
}

/// Client-caused framing faults. Each maps to an error response; none of
/// them abort the server.
#[derive(Error, Debug)]
pub enum FramingError {
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid request: {reason}")]
    InvalidRequest { id: Value, reason: &'static str },
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    jsonrpc: Option<String>,
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    method: Option<String>,
    #[serde(default)]
    params: Option<Value>,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<ErrorObject>,
}

/// Classify one line of input.
pub fn parse_line(line: &str) -> Result<Incoming, FramingError> {
    let raw: RawMessage = serde_json::from_str(line)?;
    let id = raw.id.filter(|id| !id.is_null());

    if raw.jsonrpc.as_deref() != Some(JSONRPC_VERSION) {
        return Err(FramingError::InvalidRequest {
            id: id.unwrap_or(Value::Null),
            reason: "missing or unsupported jsonrpc version",
        });
    }

    match (raw.method, id) {
        (Some(method), Some(id)) => Ok(Incoming::Request(Request {
            id,
            method,
            params: raw.params.unwrap_or(Value::Null),
        })),
        (Some(method), None) => Ok(Incoming::Notification {
            method,
            params: raw.params.unwrap_or(Value::Null),
        }),
        (None, Some(id)) if raw.result.is_some() || raw.error.is_some() => {
            Ok(Incoming::Response { id })
        }
        (None, id) => Err(FramingError::InvalidRequest {
            id: id.unwrap_or(Value::Null),
            reason: "message has neither method nor result",
        }),
    }
}

/// An outgoing message: a response to a client request, or a
/// server-originated notification.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Outgoing {
    Response(Response),
    Notification(Notification),
}

#[derive(Debug, Clone, Serialize)]
pub struct Response {
    pub jsonrpc: &'static str,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorObject>,
}

impl Response {
    pub fn ok(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Value, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result: None,
            error: Some(ErrorObject {
                code,
                message: message.into(),
                data: None,
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub jsonrpc: &'static str,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl Notification {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            method: method.into(),
            params: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classifies_request() {
        let msg = parse_line(r#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#).unwrap();
        match msg {
            Incoming::Request(req) => {
                assert_eq!(req.id, json!(1));
                assert_eq!(req.method, "tools/list");
                assert!(req.params.is_null());
            }
            other => panic!("expected request, got {other:?}"),
        }
    }

    #[test]
    fn classifies_notification() {
        let msg =
            parse_line(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#).unwrap();
        assert!(matches!(msg, Incoming::Notification { method, .. } if method == "notifications/initialized"));
    }

    #[test]
    fn null_id_counts_as_notification() {
        let msg = parse_line(r#"{"jsonrpc":"2.0","id":null,"method":"noted"}"#).unwrap();
        assert!(matches!(msg, Incoming::Notification { .. }));
    }

    #[test]
    fn classifies_response_message() {
        let msg = parse_line(r#"{"jsonrpc":"2.0","id":3,"result":{}}"#).unwrap();
        assert!(matches!(msg, Incoming::Response { id } if id == json!(3)));
    }

    #[test]
    fn malformed_json_is_parse_error() {
        assert!(matches!(
            parse_line("{not json"),
            Err(FramingError::Parse(_))
        ));
    }

    #[test]
    fn missing_jsonrpc_field_is_invalid_request() {
        let err = parse_line(r#"{"id":1,"method":"x"}"#).unwrap_err();
        assert!(matches!(err, FramingError::InvalidRequest { id, .. } if id == json!(1)));
    }

    #[test]
    fn responses_serialize_with_exactly_one_of_result_or_error() {
        let ok = serde_json::to_value(Response::ok(json!(1), json!({"a": 1}))).unwrap();
        assert!(ok.get("error").is_none());
        assert_eq!(ok["result"]["a"], 1);

        let err =
            serde_json::to_value(Response::error(json!(2), code::METHOD_NOT_FOUND, "nope"))
                .unwrap();
        assert!(err.get("result").is_none());
        assert_eq!(err["error"]["code"], code::METHOD_NOT_FOUND);
    }

    #[test]
    fn notifications_serialize_without_id() {
        let note = serde_json::to_value(Outgoing::Notification(Notification::new(
            "notifications/tools/list_changed",
        )))
        .unwrap();
        assert!(note.get("id").is_none());
        assert_eq!(note["method"], "notifications/tools/list_changed");
    }
}
