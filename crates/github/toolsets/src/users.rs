//! Users toolset.

use crate::{TOOLSET_USERS, require};
use octomcp_core::schema::args;
use octomcp_core::{CallToolResult, InputSchema, ToolDeclaration, ToolFn};
use octomcp_github::{GitHubDeps, api_error_result};
use serde_json::Value;
use std::sync::Arc;

pub fn declarations() -> Vec<ToolDeclaration<GitHubDeps>> {
    vec![search_users()]
}

fn search_users() -> ToolDeclaration<GitHubDeps> {
    ToolDeclaration::new(
        "search_users",
        "Search GitHub users.",
        InputSchema::new()
            .string("query", "Search query, e.g. 'fullname:Ada location:London'", true)
            .number("per_page", "Results per page (max 100)", false),
        |deps: &GitHubDeps| {
            let deps = deps.clone();
            let handler: ToolFn = Arc::new(move |ctx, arguments| {
                let deps = deps.clone();
                Box::pin(async move {
                    let query = require!(args::required_string(&arguments, "query"));
                    let per_page = require!(args::optional_int(&arguments, "per_page"));

                    let clients = deps.clients();
                    let resp = clients
                        .rest
                        .get(
                            &ctx,
                            "search/users",
                            &[
                                ("q", query),
                                ("per_page", per_page.unwrap_or(30).clamp(1, 100).to_string()),
                            ],
                        )
                        .await?;
                    if !resp.ok() {
                        return Ok(api_error_result("failed to search users", resp));
                    }
                    let results: Value = resp.json()?;
                    Ok(CallToolResult::json(&results)?)
                })
            });
            handler
        },
    )
    .in_toolset(TOOLSET_USERS)
    .title("Search users")
    .read_only(true)
    .scopes(["read:user"])
}
