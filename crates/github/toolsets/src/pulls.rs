//! Pull request toolset.

use crate::{TOOLSET_PULL_REQUESTS, require};
use octomcp_core::schema::args;
use octomcp_core::{CallToolResult, InputSchema, ToolDeclaration, ToolFn};
use octomcp_github::{GitHubDeps, api_error_result, raw_api_error_result};
use serde_json::{Value, json};
use std::sync::Arc;

const DIFF_ACCEPT: &str = "application/vnd.github.diff";

pub fn declarations() -> Vec<ToolDeclaration<GitHubDeps>> {
    vec![
        get_pull_request(),
        list_pull_requests(),
        get_pull_request_diff(),
        create_pull_request(),
        merge_pull_request(),
    ]
}

// ============================================================================
// get_pull_request
// ============================================================================

fn get_pull_request() -> ToolDeclaration<GitHubDeps> {
    ToolDeclaration::new(
        "get_pull_request",
        "Get details of a pull request.",
        InputSchema::new()
            .string("owner", "Repository owner", true)
            .string("repo", "Repository name", true)
            .number("pull_number", "Pull request number", true),
        |deps: &GitHubDeps| {
            let deps = deps.clone();
            let handler: ToolFn = Arc::new(move |ctx, arguments| {
                let deps = deps.clone();
                Box::pin(async move {
                    let owner = require!(args::required_string(&arguments, "owner"));
                    let repo = require!(args::required_string(&arguments, "repo"));
                    let number = require!(args::required_u64(&arguments, "pull_number"));

                    let clients = deps.clients_for(&owner, &repo);
                    let resp = clients
                        .rest
                        .get(&ctx, &format!("repos/{owner}/{repo}/pulls/{number}"), &[])
                        .await?;
                    if !resp.ok() {
                        return Ok(api_error_result("failed to get pull request", resp));
                    }
                    let pull: Value = resp.json()?;
                    Ok(CallToolResult::json(&pull)?)
                })
            });
            handler
        },
    )
    .in_toolset(TOOLSET_PULL_REQUESTS)
    .title("Get pull request")
    .read_only(true)
    .scopes(["repo"])
}

// ============================================================================
// list_pull_requests
// ============================================================================

fn list_pull_requests() -> ToolDeclaration<GitHubDeps> {
    ToolDeclaration::new(
        "list_pull_requests",
        "List pull requests, filterable by state and base branch.",
        InputSchema::new()
            .string("owner", "Repository owner", true)
            .string("repo", "Repository name", true)
            .string("state", "State: open, closed, or all", false)
            .string("base", "Filter by base branch", false)
            .number("per_page", "Results per page (max 100)", false),
        |deps: &GitHubDeps| {
            let deps = deps.clone();
            let handler: ToolFn = Arc::new(move |ctx, arguments| {
                let deps = deps.clone();
                Box::pin(async move {
                    let owner = require!(args::required_string(&arguments, "owner"));
                    let repo = require!(args::required_string(&arguments, "repo"));
                    let state = require!(args::optional_string(&arguments, "state"));
                    let base = require!(args::optional_string(&arguments, "base"));
                    let per_page = require!(args::optional_int(&arguments, "per_page"));

                    let mut query: Vec<(&str, String)> = Vec::new();
                    if let Some(state) = state {
                        query.push(("state", state));
                    }
                    if let Some(base) = base {
                        query.push(("base", base));
                    }
                    query.push(("per_page", per_page.unwrap_or(30).clamp(1, 100).to_string()));

                    let clients = deps.clients_for(&owner, &repo);
                    let resp = clients
                        .rest
                        .get(&ctx, &format!("repos/{owner}/{repo}/pulls"), &query)
                        .await?;
                    if !resp.ok() {
                        return Ok(api_error_result("failed to list pull requests", resp));
                    }
                    let pulls: Value = resp.json()?;
                    Ok(CallToolResult::json(&pulls)?)
                })
            });
            handler
        },
    )
    .in_toolset(TOOLSET_PULL_REQUESTS)
    .title("List pull requests")
    .read_only(true)
    .scopes(["repo"])
}

// ============================================================================
// get_pull_request_diff
// ============================================================================

fn get_pull_request_diff() -> ToolDeclaration<GitHubDeps> {
    ToolDeclaration::new(
        "get_pull_request_diff",
        "Get the unified diff of a pull request.",
        InputSchema::new()
            .string("owner", "Repository owner", true)
            .string("repo", "Repository name", true)
            .number("pull_number", "Pull request number", true),
        |deps: &GitHubDeps| {
            let deps = deps.clone();
            let handler: ToolFn = Arc::new(move |ctx, arguments| {
                let deps = deps.clone();
                Box::pin(async move {
                    let owner = require!(args::required_string(&arguments, "owner"));
                    let repo = require!(args::required_string(&arguments, "repo"));
                    let number = require!(args::required_u64(&arguments, "pull_number"));

                    let clients = deps.clients_for(&owner, &repo);
                    let resp = clients
                        .raw
                        .get(
                            &ctx,
                            &format!("repos/{owner}/{repo}/pulls/{number}"),
                            DIFF_ACCEPT,
                        )
                        .await?;
                    if !resp.ok() {
                        return Ok(raw_api_error_result(
                            "failed to get pull request diff",
                            resp,
                        ));
                    }
                    Ok(CallToolResult::success(resp.body))
                })
            });
            handler
        },
    )
    .in_toolset(TOOLSET_PULL_REQUESTS)
    .title("Get pull request diff")
    .read_only(true)
    .scopes(["repo"])
}

// ============================================================================
// create_pull_request
// ============================================================================

fn create_pull_request() -> ToolDeclaration<GitHubDeps> {
    ToolDeclaration::new(
        "create_pull_request",
        "Open a pull request from head into base.",
        InputSchema::new()
            .string("owner", "Repository owner", true)
            .string("repo", "Repository name", true)
            .string("title", "Pull request title", true)
            .string("head", "Branch with the changes", true)
            .string("base", "Branch to merge into", true)
            .string("body", "Pull request body in markdown", false)
            .boolean("draft", "Open as a draft", false),
        |deps: &GitHubDeps| {
            let deps = deps.clone();
            let handler: ToolFn = Arc::new(move |ctx, arguments| {
                let deps = deps.clone();
                Box::pin(async move {
                    let owner = require!(args::required_string(&arguments, "owner"));
                    let repo = require!(args::required_string(&arguments, "repo"));
                    let title = require!(args::required_string(&arguments, "title"));
                    let head = require!(args::required_string(&arguments, "head"));
                    let base = require!(args::required_string(&arguments, "base"));
                    let body = require!(args::optional_string(&arguments, "body"));
                    let draft = require!(args::optional_bool(&arguments, "draft"));

                    let mut payload = json!({
                        "title": title,
                        "head": head,
                        "base": base,
                    });
                    if let Some(body) = body {
                        payload["body"] = json!(body);
                    }
                    if let Some(draft) = draft {
                        payload["draft"] = json!(draft);
                    }

                    let clients = deps.clients_for(&owner, &repo);
                    let resp = clients
                        .rest
                        .post(&ctx, &format!("repos/{owner}/{repo}/pulls"), &payload)
                        .await?;
                    if !resp.ok() {
                        return Ok(api_error_result("failed to create pull request", resp));
                    }
                    let pull: Value = resp.json()?;
                    Ok(CallToolResult::json(&pull)?)
                })
            });
            handler
        },
    )
    .in_toolset(TOOLSET_PULL_REQUESTS)
    .title("Create pull request")
    .scopes(["repo"])
}

// ============================================================================
// merge_pull_request
// ============================================================================

fn merge_pull_request() -> ToolDeclaration<GitHubDeps> {
    ToolDeclaration::new(
        "merge_pull_request",
        "Merge a pull request using the requested merge method.",
        InputSchema::new()
            .string("owner", "Repository owner", true)
            .string("repo", "Repository name", true)
            .number("pull_number", "Pull request number", true)
            .string("merge_method", "merge, squash, or rebase", false)
            .string("commit_title", "Title of the merge commit", false),
        |deps: &GitHubDeps| {
            let deps = deps.clone();
            let handler: ToolFn = Arc::new(move |ctx, arguments| {
                let deps = deps.clone();
                Box::pin(async move {
                    let owner = require!(args::required_string(&arguments, "owner"));
                    let repo = require!(args::required_string(&arguments, "repo"));
                    let number = require!(args::required_u64(&arguments, "pull_number"));
                    let method = require!(args::optional_string(&arguments, "merge_method"));
                    let commit_title =
                        require!(args::optional_string(&arguments, "commit_title"));

                    let mut payload = json!({});
                    if let Some(method) = method {
                        payload["merge_method"] = json!(method);
                    }
                    if let Some(commit_title) = commit_title {
                        payload["commit_title"] = json!(commit_title);
                    }

                    let clients = deps.clients_for(&owner, &repo);
                    let resp = clients
                        .rest
                        .put(
                            &ctx,
                            &format!("repos/{owner}/{repo}/pulls/{number}/merge"),
                            &payload,
                        )
                        .await?;
                    if !resp.ok() {
                        return Ok(api_error_result("failed to merge pull request", resp));
                    }
                    let outcome: Value = resp.json()?;
                    Ok(CallToolResult::json(&outcome)?)
                })
            });
            handler
        },
    )
    .in_toolset(TOOLSET_PULL_REQUESTS)
    .title("Merge pull request")
    .scopes(["repo"])
}
