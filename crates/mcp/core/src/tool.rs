//! Tool declarations and handler plumbing.

use crate::result::CallToolResult;
use crate::schema::InputSchema;
use futures::future::BoxFuture;
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Per-invocation context threaded from the transport into handlers.
///
/// Carries the cancellation token derived from the request lifetime; every
/// upstream call a handler makes must observe it so that a client disconnect
/// or cancellation aborts in-flight work promptly.
#[derive(Clone, Debug, Default)]
pub struct CallContext {
    pub cancel: CancellationToken,
}

impl CallContext {
    pub fn new(cancel: CancellationToken) -> Self {
        Self { cancel }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Future returned by an invocation-ready tool callable.
///
/// `Ok` carries both successful and error-shaped tool results; `Err` is the
/// internal-failure path that surfaces as a JSON-RPC level error.
pub type ToolFuture = BoxFuture<'static, Result<CallToolResult, anyhow::Error>>;

/// An invocation-ready tool callable.
pub type ToolFn = Arc<dyn Fn(CallContext, Value) -> ToolFuture + Send + Sync>;

/// Handler generator: given the dependency bundle, produce the callable.
///
/// Deferring client construction to the generator means a tool only pays for
/// the clients it actually needs, and the registry stays ignorant of what a
/// bundle contains.
pub type HandlerFactory<D> = Arc<dyn Fn(&D) -> ToolFn + Send + Sync>;

/// Everything knowable about a tool without invoking it.
pub struct ToolDeclaration<D> {
    pub name: String,
    pub title: String,
    pub description: String,
    pub schema: InputSchema,
    pub toolset: String,
    pub read_only: bool,
    pub required_scopes: Vec<String>,
    pub enable_flag: Option<String>,
    pub disable_flag: Option<String>,
    pub handler: HandlerFactory<D>,
}

impl<D> Clone for ToolDeclaration<D> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            schema: self.schema.clone(),
            toolset: self.toolset.clone(),
            read_only: self.read_only,
            required_scopes: self.required_scopes.clone(),
            enable_flag: self.enable_flag.clone(),
            disable_flag: self.disable_flag.clone(),
            handler: Arc::clone(&self.handler),
        }
    }
}

impl<D> std::fmt::Debug for ToolDeclaration<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolDeclaration")
            .field("name", &self.name)
            .field("toolset", &self.toolset)
            .field("read_only", &self.read_only)
            .finish_non_exhaustive()
    }
}

impl<D> ToolDeclaration<D> {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        schema: InputSchema,
        handler: impl Fn(&D) -> ToolFn + Send + Sync + 'static,
    ) -> Self {
        let name = name.into();
        Self {
            title: name.clone(),
            name,
            description: description.into(),
            schema,
            toolset: String::new(),
            read_only: false,
            required_scopes: Vec::new(),
            enable_flag: None,
            disable_flag: None,
            handler: Arc::new(handler),
        }
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    #[must_use]
    pub fn in_toolset(mut self, toolset: impl Into<String>) -> Self {
        self.toolset = toolset.into();
        self
    }

    #[must_use]
    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Authorization scopes the handler's upstream calls may consume.
    #[must_use]
    pub fn scopes<S: Into<String>>(mut self, scopes: impl IntoIterator<Item = S>) -> Self {
        self.required_scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    /// Only list this tool when the named feature flag evaluates true.
    #[must_use]
    pub fn enable_flag(mut self, flag: impl Into<String>) -> Self {
        self.enable_flag = Some(flag.into());
        self
    }

    /// Hide this tool when the named feature flag evaluates true.
    #[must_use]
    pub fn disable_flag(mut self, flag: impl Into<String>) -> Self {
        self.disable_flag = Some(flag.into());
        self
    }

    /// The `tools/list` entry for this declaration.
    pub fn descriptor(&self) -> Value {
        let mut annotations = Map::new();
        annotations.insert("title".to_string(), Value::String(self.title.clone()));
        annotations.insert("readOnlyHint".to_string(), Value::Bool(self.read_only));

        let mut entry = Map::new();
        entry.insert("name".to_string(), Value::String(self.name.clone()));
        entry.insert(
            "description".to_string(),
            Value::String(self.description.clone()),
        );
        entry.insert("inputSchema".to_string(), self.schema.to_json());
        entry.insert("annotations".to_string(), Value::Object(annotations));
        Value::Object(entry)
    }
}
