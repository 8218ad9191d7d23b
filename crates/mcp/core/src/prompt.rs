//! Prompt declarations.

use crate::result::Content;
use crate::tool::CallContext;
use futures::future::BoxFuture;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// One message of a rendered prompt.
#[derive(Debug, Clone, Serialize)]
pub struct PromptMessage {
    pub role: String,
    pub content: Content,
}

impl PromptMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: Content::text(text),
        }
    }
}

/// Result of `prompts/get`.
#[derive(Debug, Clone, Serialize)]
pub struct GetPromptResult {
    pub description: String,
    pub messages: Vec<PromptMessage>,
}

/// A named argument a prompt accepts.
#[derive(Debug, Clone, Serialize)]
pub struct PromptArgument {
    pub name: String,
    pub description: String,
    pub required: bool,
}

pub type PromptFuture = BoxFuture<'static, Result<GetPromptResult, anyhow::Error>>;
pub type PromptFn = Arc<dyn Fn(CallContext, Value) -> PromptFuture + Send + Sync>;
pub type PromptFactory<D> = Arc<dyn Fn(&D) -> PromptFn + Send + Sync>;

/// A prompt exposed through `prompts/list` / `prompts/get`.
pub struct PromptDeclaration<D> {
    pub name: String,
    pub description: String,
    pub arguments: Vec<PromptArgument>,
    pub handler: PromptFactory<D>,
}

impl<D> std::fmt::Debug for PromptDeclaration<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptDeclaration")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl<D> Clone for PromptDeclaration<D> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            description: self.description.clone(),
            arguments: self.arguments.clone(),
            handler: Arc::clone(&self.handler),
        }
    }
}

impl<D> PromptDeclaration<D> {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        handler: impl Fn(&D) -> PromptFn + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            arguments: Vec::new(),
            handler: Arc::new(handler),
        }
    }

    #[must_use]
    pub fn argument(mut self, name: &str, description: &str, required: bool) -> Self {
        self.arguments.push(PromptArgument {
            name: name.to_string(),
            description: description.to_string(),
            required,
        });
        self
    }

    /// The `prompts/list` entry for this declaration.
    pub fn descriptor(&self) -> Value {
        serde_json::json!({
            "name": self.name,
            "description": self.description,
            "arguments": self.arguments,
        })
    }
}
