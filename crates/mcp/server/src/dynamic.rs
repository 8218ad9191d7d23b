//! Dynamic toolset discovery: meta tools that widen the enabled set at
//! runtime.
//!
//! Enabling a toolset never mutates the registry; it swaps in a new view
//! with one more toolset enabled and tells the client via
//! `notifications/tools/list_changed`.

use crate::dispatch::{Notifier, SharedRegistry};
use octomcp_core::schema::args;
use octomcp_core::{CallToolResult, InputSchema, ToolDeclaration, ToolFn, ToolsetMeta};
use serde_json::json;
use std::sync::Arc;

pub const DYNAMIC_TOOLSET_ID: &str = "dynamic";

pub fn dynamic_toolset_meta() -> ToolsetMeta {
    ToolsetMeta::new(
        DYNAMIC_TOOLSET_ID,
        "Discover and enable toolsets at runtime",
    )
    .icon("toggles")
}

/// The meta tools, closed over the shared registry and the notifier.
pub fn dynamic_tool_declarations<D: Send + Sync + 'static>(
    shared: &SharedRegistry<D>,
    notifier: &Notifier,
) -> Vec<ToolDeclaration<D>> {
    vec![
        list_available_toolsets(shared),
        get_toolset_tools(shared),
        enable_toolset(shared, notifier),
    ]
}

fn list_available_toolsets<D: Send + Sync + 'static>(
    shared: &SharedRegistry<D>,
) -> ToolDeclaration<D> {
    let shared = shared.clone();
    ToolDeclaration::new(
        "list_available_toolsets",
        "List all toolsets this server knows, with their enablement state.",
        InputSchema::new(),
        move |_deps| {
            let shared = shared.clone();
            let handler: ToolFn = Arc::new(move |_ctx, _args| {
                let shared = shared.clone();
                Box::pin(async move {
                    let view = shared.view().await;
                    let toolsets: Vec<_> = view
                        .toolsets()
                        .into_iter()
                        .map(|(meta, enabled)| {
                            json!({
                                "id": meta.id,
                                "description": meta.description,
                                "default": meta.default,
                                "enabled": enabled,
                            })
                        })
                        .collect();
                    Ok(CallToolResult::json(&toolsets)?)
                })
            });
            handler
        },
    )
    .in_toolset(DYNAMIC_TOOLSET_ID)
    .read_only(true)
}

fn get_toolset_tools<D: Send + Sync + 'static>(shared: &SharedRegistry<D>) -> ToolDeclaration<D> {
    let shared = shared.clone();
    ToolDeclaration::new(
        "get_toolset_tools",
        "List the tools a toolset would expose once enabled.",
        InputSchema::new().string("toolset", "Toolset id to inspect", true),
        move |_deps| {
            let shared = shared.clone();
            let handler: ToolFn = Arc::new(move |_ctx, args| {
                let shared = shared.clone();
                Box::pin(async move {
                    let id = match args::required_string(&args, "toolset") {
                        Ok(id) => id,
                        Err(e) => return Ok(CallToolResult::error(e.to_string())),
                    };
                    let view = shared.view().await;
                    if view.toolset(&id).is_none() {
                        return Ok(CallToolResult::error(format!("unknown toolset: {id}")));
                    }
                    let tools: Vec<_> = view
                        .toolset_tools(&id)
                        .into_iter()
                        .map(|t| {
                            json!({
                                "name": t.name,
                                "description": t.description,
                                "readOnly": t.read_only,
                            })
                        })
                        .collect();
                    Ok(CallToolResult::json(&tools)?)
                })
            });
            handler
        },
    )
    .in_toolset(DYNAMIC_TOOLSET_ID)
    .read_only(true)
}

fn enable_toolset<D: Send + Sync + 'static>(
    shared: &SharedRegistry<D>,
    notifier: &Notifier,
) -> ToolDeclaration<D> {
    let shared = shared.clone();
    let notifier = notifier.clone();
    ToolDeclaration::new(
        "enable_toolset",
        "Enable one additional toolset for the rest of this session.",
        InputSchema::new().string("toolset", "Toolset id to enable", true),
        move |_deps| {
            let shared = shared.clone();
            let notifier = notifier.clone();
            let handler: ToolFn = Arc::new(move |_ctx, args| {
                let shared = shared.clone();
                let notifier = notifier.clone();
                Box::pin(async move {
                    let id = match args::required_string(&args, "toolset") {
                        Ok(id) => id,
                        Err(e) => return Ok(CallToolResult::error(e.to_string())),
                    };
                    let view = shared.view().await;
                    if view.toolset(&id).is_none() {
                        return Ok(CallToolResult::error(format!("unknown toolset: {id}")));
                    }
                    if view.is_toolset_enabled(&id) {
                        return Ok(CallToolResult::success(format!(
                            "toolset {id} is already enabled"
                        )));
                    }
                    shared.update(|r| r.with_toolset_enabled(&id)).await;
                    notifier.tools_list_changed();
                    tracing::info!(toolset = id.as_str(), "toolset enabled at runtime");
                    Ok(CallToolResult::success(format!("enabled toolset {id}")))
                })
            });
            handler
        },
    )
    .in_toolset(DYNAMIC_TOOLSET_ID)
}
