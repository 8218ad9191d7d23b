//! Experiments toolset: preview-API endpoints behind feature flags.

use crate::{TOOLSET_EXPERIMENTS, require};
use octomcp_core::schema::args;
use octomcp_core::{CallToolResult, InputSchema, ToolDeclaration, ToolFn};
use octomcp_github::{GitHubDeps, api_error_result};
use serde_json::Value;
use std::sync::Arc;

pub fn declarations() -> Vec<ToolDeclaration<GitHubDeps>> {
    vec![list_issue_types()]
}

fn list_issue_types() -> ToolDeclaration<GitHubDeps> {
    ToolDeclaration::new(
        "list_issue_types",
        "List the custom issue types configured for an organization \
         (preview API).",
        InputSchema::new().string("org", "Organization login", true),
        |deps: &GitHubDeps| {
            let deps = deps.clone();
            let handler: ToolFn = Arc::new(move |ctx, arguments| {
                let deps = deps.clone();
                Box::pin(async move {
                    let org = require!(args::required_string(&arguments, "org"));

                    let clients = deps.clients_for(&org, "");
                    let resp = clients
                        .rest
                        .get(&ctx, &format!("orgs/{org}/issue-types"), &[])
                        .await?;
                    if !resp.ok() {
                        return Ok(api_error_result("failed to list issue types", resp));
                    }
                    let types: Value = resp.json()?;
                    Ok(CallToolResult::json(&types)?)
                })
            });
            handler
        },
    )
    .in_toolset(TOOLSET_EXPERIMENTS)
    .title("List issue types")
    .read_only(true)
    .scopes(["read:org"])
    .enable_flag("issue-types")
}
