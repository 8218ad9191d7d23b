//! Typed error taxonomy and the tool-result constructors.
//!
//! Upstream and validation failures become error-shaped tool results with a
//! typed payload attached; middleware recovers the payload with
//! `CallToolResult::error_payload::<ErrorKind>()` and interrogates it by
//! kind. Internal failures never take this path: they propagate as plain
//! errors and surface as JSON-RPC internal errors.

use crate::client::HttpSnapshot;
use octomcp_core::CallToolResult;
use std::sync::Arc;
use thiserror::Error;

/// A REST call reached the upstream and failed.
#[derive(Error, Debug, Clone)]
#[error("{message}: {} (status {})", .response.message(), .response.status)]
pub struct ApiError {
    pub message: String,
    pub response: HttpSnapshot,
}

/// A GraphQL call failed, either at the HTTP layer or with an error chain.
#[derive(Error, Debug, Clone)]
#[error("{message}: {}", .errors.join("; "))]
pub struct GraphqlError {
    pub message: String,
    pub errors: Vec<String>,
}

/// A raw-HTTP call reached the upstream and failed.
#[derive(Error, Debug, Clone)]
#[error("{message}: {} (status {})", .response.message(), .response.status)]
pub struct RawApiError {
    pub message: String,
    pub response: HttpSnapshot,
}

/// A required parameter was missing or malformed; no upstream call was made.
#[derive(Error, Debug, Clone)]
#[error("{message}")]
pub struct ValidationError {
    pub message: String,
}

/// The sum over every failure kind a tool result can embed.
#[derive(Error, Debug)]
pub enum ErrorKind {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Graphql(#[from] GraphqlError),

    #[error(transparent)]
    RawApi(#[from] RawApiError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl ErrorKind {
    /// The typed payload of an error-shaped result, if present.
    pub fn of(result: &CallToolResult) -> Option<&ErrorKind> {
        result.error_payload::<ErrorKind>()
    }

    pub fn as_api(&self) -> Option<&ApiError> {
        match self {
            ErrorKind::Api(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_graphql(&self) -> Option<&GraphqlError> {
        match self {
            ErrorKind::Graphql(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_raw_api(&self) -> Option<&RawApiError> {
        match self {
            ErrorKind::RawApi(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            ErrorKind::Validation(e) => Some(e),
            _ => None,
        }
    }
}

fn error_result(kind: ErrorKind) -> CallToolResult {
    let text = kind.to_string();
    CallToolResult::error(text).with_payload(Arc::new(kind))
}

/// Error-shaped result for a failed REST call. `message` should read
/// `failed to <operation>`.
pub fn api_error_result(message: impl Into<String>, response: HttpSnapshot) -> CallToolResult {
    error_result(ErrorKind::Api(ApiError {
        message: message.into(),
        response,
    }))
}

/// Error-shaped result for a failed GraphQL call.
pub fn graphql_error_result(
    message: impl Into<String>,
    errors: Vec<String>,
) -> CallToolResult {
    error_result(ErrorKind::Graphql(GraphqlError {
        message: message.into(),
        errors,
    }))
}

/// Error-shaped result for a failed raw-HTTP call.
pub fn raw_api_error_result(
    message: impl Into<String>,
    response: HttpSnapshot,
) -> CallToolResult {
    error_result(ErrorKind::RawApi(RawApiError {
        message: message.into(),
        response,
    }))
}

/// Error-shaped result for a validation failure. No upstream call was made.
pub fn validation_error_result(message: impl Into<String>) -> CallToolResult {
    error_result(ErrorKind::Validation(ValidationError {
        message: message.into(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn not_found() -> HttpSnapshot {
        HttpSnapshot::new(404, std::iter::empty(), r#"{"message":"Not Found"}"#)
    }

    #[test]
    fn api_error_result_preserves_response() {
        let result = api_error_result("failed to get issue", not_found());
        assert!(result.is_error);
        assert!(result.text().starts_with("failed to get issue"));

        let kind = ErrorKind::of(&result).unwrap();
        let api = kind.as_api().unwrap();
        assert_eq!(api.response.status, 404);
        assert_eq!(api.response.body, r#"{"message":"Not Found"}"#);
    }

    #[test]
    fn validation_result_has_no_response() {
        let result = validation_error_result("missing required parameter: issue_number");
        assert!(result.is_error);
        assert_eq!(
            result.text(),
            "missing required parameter: issue_number"
        );
        let kind = ErrorKind::of(&result).unwrap();
        assert!(kind.as_validation().is_some());
        assert!(kind.as_api().is_none());
    }

    #[test]
    fn graphql_result_joins_error_chain() {
        let result = graphql_error_result(
            "failed to resolve threads",
            vec!["first".to_string(), "second".to_string()],
        );
        assert!(result.text().contains("first; second"));
        assert!(ErrorKind::of(&result).unwrap().as_graphql().is_some());
    }
}
