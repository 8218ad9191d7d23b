//! Prompt declarations.

use octomcp_core::prompt::{GetPromptResult, PromptFn};
use octomcp_core::{PromptDeclaration, PromptMessage};
use octomcp_github::GitHubDeps;
use serde_json::Value;
use std::sync::Arc;

pub fn issue_triage() -> PromptDeclaration<GitHubDeps> {
    PromptDeclaration::new(
        "issue_triage",
        "Triage the open issues of a repository into actionable buckets.",
        |_deps: &GitHubDeps| {
            let handler: PromptFn = Arc::new(|_ctx, arguments| {
                Box::pin(async move {
                    let owner = arguments
                        .get("owner")
                        .and_then(Value::as_str)
                        .unwrap_or("the repository owner");
                    let repo = arguments
                        .get("repo")
                        .and_then(Value::as_str)
                        .unwrap_or("the repository");
                    Ok(GetPromptResult {
                        description: format!("Triage open issues in {owner}/{repo}"),
                        messages: vec![PromptMessage::user(format!(
                            "List the open issues in {owner}/{repo} with the list_issues \
                             tool, then group them into: bugs needing reproduction, \
                             actionable bugs, feature requests, and questions. For each \
                             group, suggest the next step and which issues look stale \
                             enough to close."
                        ))],
                    })
                })
            });
            handler
        },
    )
    .argument("owner", "Repository owner", true)
    .argument("repo", "Repository name", true)
}
