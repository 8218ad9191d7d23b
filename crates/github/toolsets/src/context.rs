//! Context toolset: who am I talking to GitHub as.

use crate::{TOOLSET_CONTEXT, require};
use octomcp_core::schema::args;
use octomcp_core::{CallToolResult, InputSchema, ToolDeclaration, ToolFn};
use octomcp_github::{GitHubDeps, api_error_result};
use serde_json::Value;
use std::sync::Arc;

pub fn declarations() -> Vec<ToolDeclaration<GitHubDeps>> {
    vec![get_me()]
}

fn get_me() -> ToolDeclaration<GitHubDeps> {
    ToolDeclaration::new(
        "get_me",
        "Get the authenticated user's profile. Useful for confirming which \
         account a request will run as.",
        InputSchema::new().string(
            "account",
            "Configured account name to inspect instead of the default",
            false,
        ),
        |deps: &GitHubDeps| {
            let deps = deps.clone();
            let handler: ToolFn = Arc::new(move |ctx, arguments| {
                let deps = deps.clone();
                Box::pin(async move {
                    let account = require!(args::optional_string(&arguments, "account"));
                    let clients = match account {
                        Some(name) => {
                            let Some(account) = deps
                                .router()
                                .accounts()
                                .iter()
                                .find(|a| a.name == name)
                            else {
                                return Ok(octomcp_github::validation_error_result(format!(
                                    "unknown account: {name}"
                                )));
                            };
                            deps.clients_for_account(account)
                        }
                        None => deps.clients(),
                    };

                    let resp = clients.rest.get(&ctx, "user", &[]).await?;
                    if !resp.ok() {
                        return Ok(api_error_result("failed to get user", resp));
                    }
                    let user: Value = resp.json()?;
                    Ok(CallToolResult::json(&user)?)
                })
            });
            handler
        },
    )
    .in_toolset(TOOLSET_CONTEXT)
    .title("Get my profile")
    .read_only(true)
    .scopes(["read:user"])
}
