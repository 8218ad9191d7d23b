//! Tool call results as they appear on the wire.

use serde::Serialize;
use std::sync::Arc;

/// A single content block in a tool result.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Content {
    Text { text: String },
}

impl Content {
    pub fn text(text: impl Into<String>) -> Self {
        Content::Text { text: text.into() }
    }

    /// The text of this block, for log truncation and tests.
    pub fn as_text(&self) -> &str {
        match self {
            Content::Text { text } => text,
        }
    }
}

/// Result of a tool invocation.
///
/// Error-shaped results (`is_error = true`) carry the human message in
/// `content` and, for upstream/validation failures, a typed error payload
/// that middleware can recover with [`CallToolResult::error_payload`]. The
/// payload never crosses the wire; it exists for in-process interrogation.
#[derive(Debug, Clone, Serialize)]
pub struct CallToolResult {
    pub content: Vec<Content>,
    #[serde(rename = "isError", skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
    #[serde(skip)]
    payload: Option<Arc<dyn std::error::Error + Send + Sync + 'static>>,
}

impl CallToolResult {
    /// A successful result with a single text block.
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            content: vec![Content::text(text)],
            is_error: false,
            payload: None,
        }
    }

    /// A successful result whose text is the pretty-printed JSON of `value`.
    pub fn json<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        Ok(Self::success(serde_json::to_string_pretty(value)?))
    }

    /// An error-shaped result with a single text block.
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            content: vec![Content::text(text)],
            is_error: true,
            payload: None,
        }
    }

    /// Attach a typed error payload to this result.
    #[must_use]
    pub fn with_payload(
        mut self,
        payload: Arc<dyn std::error::Error + Send + Sync + 'static>,
    ) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Recover the typed error payload, if one of type `E` is attached.
    pub fn error_payload<E>(&self) -> Option<&E>
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.payload.as_deref().and_then(|e| e.downcast_ref::<E>())
    }

    /// Concatenated text of all content blocks.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .map(Content::as_text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}
