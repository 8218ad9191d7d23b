//! Routes parsed JSON-RPC requests to the registry and its handlers.
//!
//! A fresh view is derived from the shared registry on entry to every
//! request, so concurrent dispatches never observe a half-applied filter
//! change. The same filter path answers `tools/list` and `tools/call`:
//! what a client sees listed is exactly what it can call.

use crate::jsonrpc::{Notification, Outgoing, Request, Response, code, PROTOCOL_VERSION};
use octomcp_core::{CallContext, Registry, ResourceRequest};
use serde_json::{Value, json};
use std::sync::{Arc, OnceLock};
use tokio::sync::{RwLock, mpsc};

/// The registry as seen by the dispatcher and the dynamic-toolset tools.
/// Reads clone a cheap view; updates swap in a transformed registry.
pub struct SharedRegistry<D>(Arc<RwLock<Registry<D>>>);

impl<D> Clone for SharedRegistry<D> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<D> SharedRegistry<D> {
    pub fn new(registry: Registry<D>) -> Self {
        Self(Arc::new(RwLock::new(registry)))
    }

    pub async fn view(&self) -> Registry<D> {
        self.0.read().await.clone()
    }

    /// Swap in the registry produced by `transform`.
    pub async fn update(&self, transform: impl FnOnce(&Registry<D>) -> Registry<D>) {
        let mut guard = self.0.write().await;
        *guard = transform(&*guard);
    }

    /// Replace the placeholder registry during startup wiring.
    pub async fn replace(&self, registry: Registry<D>) {
        *self.0.write().await = registry;
    }
}

/// Outbound notification handle. The sender is installed when the framer
/// starts; notifications fired before that are dropped.
#[derive(Clone, Default)]
pub struct Notifier {
    tx: Arc<OnceLock<mpsc::Sender<Outgoing>>>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn install(&self, tx: mpsc::Sender<Outgoing>) {
        let _ = self.tx.set(tx);
    }

    /// Tell the client the enabled tool set changed.
    pub fn tools_list_changed(&self) {
        if let Some(tx) = self.tx.get() {
            let _ = tx.try_send(Outgoing::Notification(Notification::new(
                "notifications/tools/list_changed",
            )));
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

pub struct Dispatcher<D> {
    registry: SharedRegistry<D>,
    deps: D,
    info: ServerInfo,
    content_window: usize,
}

impl<D: Send + Sync + 'static> Dispatcher<D> {
    pub fn new(
        registry: SharedRegistry<D>,
        deps: D,
        info: ServerInfo,
        content_window: usize,
    ) -> Self {
        Self {
            registry,
            deps,
            info,
            content_window,
        }
    }

    pub fn registry(&self) -> &SharedRegistry<D> {
        &self.registry
    }

    /// Handle one request to completion. Always yields a response; client
    /// mistakes become error responses, never a dead connection.
    pub async fn handle(&self, req: Request, ctx: CallContext) -> Response {
        match req.method.as_str() {
            "initialize" => self.initialize(req.id),
            "ping" => Response::ok(req.id, json!({})),
            "tools/list" => self.list_tools(req.id).await,
            "tools/call" => self.call_tool(req.id, &req.params, ctx).await,
            "resources/list" => Response::ok(req.id, json!({ "resources": [] })),
            "resources/templates/list" => self.list_resource_templates(req.id).await,
            "resources/read" => self.read_resource(req.id, &req.params, ctx).await,
            "prompts/list" => self.list_prompts(req.id).await,
            "prompts/get" => self.get_prompt(req.id, &req.params, ctx).await,
            other => Response::error(
                req.id,
                code::METHOD_NOT_FOUND,
                format!("method not found: {other}"),
            ),
        }
    }

    /// Handle a client notification. Never produces a response.
    pub fn handle_notification(&self, method: &str, _params: &Value) {
        match method {
            "notifications/initialized" => tracing::debug!("client initialized"),
            other => tracing::debug!(method = other, "ignoring notification"),
        }
    }

    fn initialize(&self, id: Value) -> Response {
        Response::ok(
            id,
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {
                    "tools": { "listChanged": true },
                    "resources": {},
                    "prompts": {},
                },
                "serverInfo": {
                    "name": self.info.name,
                    "version": self.info.version,
                },
            }),
        )
    }

    async fn list_tools(&self, id: Value) -> Response {
        let view = self.registry.view().await.for_mcp_request("tools/list", None);
        let tools: Vec<Value> = view
            .available_tools()
            .into_iter()
            .map(|decl| decl.descriptor())
            .collect();
        Response::ok(id, json!({ "tools": tools }))
    }

    async fn call_tool(&self, id: Value, params: &Value, ctx: CallContext) -> Response {
        let Some(name) = params.get("name").and_then(Value::as_str) else {
            return Response::error(id, code::INVALID_PARAMS, "missing tool name");
        };
        let arguments = params.get("arguments").cloned().unwrap_or(json!({}));

        let view = self
            .registry
            .view()
            .await
            .for_mcp_request("tools/call", Some(name));
        let Some(decl) = view.lookup(name) else {
            return Response::error(
                id,
                code::METHOD_NOT_FOUND,
                format!("tool not found: {name}"),
            );
        };

        tracing::debug!(tool = decl.name.as_str(), "dispatching tool call");
        let handler = (decl.handler)(&self.deps);
        let fut = handler(ctx.clone(), arguments);

        tokio::select! {
            () = ctx.cancel.cancelled() => {
                Response::error(id, code::REQUEST_CANCELLED, "request cancelled")
            }
            result = fut => match result {
                Ok(result) => {
                    tracing::debug!(
                        tool = decl.name.as_str(),
                        is_error = result.is_error,
                        content = truncate_for_log(&result.text(), self.content_window).as_str(),
                        "tool call finished"
                    );
                    match serde_json::to_value(&result) {
                        Ok(value) => Response::ok(id, value),
                        Err(e) => Response::error(
                            id,
                            code::INTERNAL_ERROR,
                            format!("failed to serialize tool result: {e}"),
                        ),
                    }
                }
                Err(e) => Response::error(id, code::INTERNAL_ERROR, format!("{e:#}")),
            },
        }
    }

    async fn list_resource_templates(&self, id: Value) -> Response {
        let view = self
            .registry
            .view()
            .await
            .for_mcp_request("resources/templates/list", None);
        let templates: Vec<Value> = view
            .resource_templates()
            .into_iter()
            .map(|t| t.descriptor())
            .collect();
        Response::ok(id, json!({ "resourceTemplates": templates }))
    }

    async fn read_resource(&self, id: Value, params: &Value, ctx: CallContext) -> Response {
        let Some(uri) = params.get("uri").and_then(Value::as_str) else {
            return Response::error(id, code::INVALID_PARAMS, "missing resource uri");
        };

        let view = self
            .registry
            .view()
            .await
            .for_mcp_request("resources/read", None);
        let Some((template, vars)) = view.match_resource(uri) else {
            return Response::error(
                id,
                code::RESOURCE_NOT_FOUND,
                format!("no resource matches {uri}"),
            );
        };

        let handler = (template.handler)(&self.deps);
        let request = ResourceRequest {
            uri: uri.to_string(),
            vars,
        };
        tokio::select! {
            () = ctx.cancel.cancelled() => {
                Response::error(id, code::REQUEST_CANCELLED, "request cancelled")
            }
            result = handler(ctx.clone(), request) => match result {
                Ok(contents) => Response::ok(id, json!({ "contents": contents })),
                Err(e) => Response::error(id, code::INTERNAL_ERROR, format!("{e:#}")),
            },
        }
    }

    async fn list_prompts(&self, id: Value) -> Response {
        let view = self.registry.view().await.for_mcp_request("prompts/list", None);
        let prompts: Vec<Value> = view.prompts().into_iter().map(|p| p.descriptor()).collect();
        Response::ok(id, json!({ "prompts": prompts }))
    }

    async fn get_prompt(&self, id: Value, params: &Value, ctx: CallContext) -> Response {
        let Some(name) = params.get("name").and_then(Value::as_str) else {
            return Response::error(id, code::INVALID_PARAMS, "missing prompt name");
        };
        let arguments = params.get("arguments").cloned().unwrap_or(json!({}));

        let view = self
            .registry
            .view()
            .await
            .for_mcp_request("prompts/get", Some(name));
        let Some(prompt) = view.prompt(name) else {
            return Response::error(
                id,
                code::INVALID_PARAMS,
                format!("prompt not found: {name}"),
            );
        };

        let handler = (prompt.handler)(&self.deps);
        tokio::select! {
            () = ctx.cancel.cancelled() => {
                Response::error(id, code::REQUEST_CANCELLED, "request cancelled")
            }
            result = handler(ctx.clone(), arguments) => match result {
                Ok(rendered) => match serde_json::to_value(&rendered) {
                    Ok(value) => Response::ok(id, value),
                    Err(e) => Response::error(
                        id,
                        code::INTERNAL_ERROR,
                        format!("failed to serialize prompt: {e}"),
                    ),
                },
                Err(e) => Response::error(id, code::INTERNAL_ERROR, format!("{e:#}")),
            },
        }
    }
}

/// Clip tool output for the log channel; the window is configurable via
/// `--content-window-size`.
pub fn truncate_for_log(content: &str, window: usize) -> String {
    if window == 0 || content.len() <= window {
        return content.to_string();
    }
    let mut end = window;
    while !content.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}… ({} bytes)", &content[..end], content.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_respects_window_and_char_boundaries() {
        assert_eq!(truncate_for_log("short", 100), "short");
        assert_eq!(truncate_for_log("unbounded", 0), "unbounded");

        let clipped = truncate_for_log(&"x".repeat(50), 10);
        assert!(clipped.starts_with("xxxxxxxxxx…"));
        assert!(clipped.contains("50 bytes"));

        // Multibyte content never splits a character.
        let clipped = truncate_for_log("ééééé", 3);
        assert!(clipped.starts_with("é"));
    }
}
