//! Issues toolset.

use crate::{TOOLSET_ISSUES, require};
use octomcp_core::schema::args;
use octomcp_core::{CallToolResult, InputSchema, ToolDeclaration, ToolFn};
use octomcp_github::{GitHubDeps, api_error_result};
use serde_json::{Value, json};
use std::sync::Arc;

pub fn declarations() -> Vec<ToolDeclaration<GitHubDeps>> {
    vec![
        get_issue(),
        list_issues(),
        create_issue(),
        add_issue_comment(),
        update_issue(),
    ]
}

// ============================================================================
// get_issue
// ============================================================================

fn get_issue() -> ToolDeclaration<GitHubDeps> {
    ToolDeclaration::new(
        "get_issue",
        "Get details of a specific issue in a GitHub repository.",
        InputSchema::new()
            .string("owner", "Repository owner", true)
            .string("repo", "Repository name", true)
            .number("issue_number", "Issue number", true),
        |deps: &GitHubDeps| {
            let deps = deps.clone();
            let handler: ToolFn = Arc::new(move |ctx, arguments| {
                let deps = deps.clone();
                Box::pin(async move {
                    let owner = require!(args::required_string(&arguments, "owner"));
                    let repo = require!(args::required_string(&arguments, "repo"));
                    let number = require!(args::required_u64(&arguments, "issue_number"));

                    let clients = deps.clients_for(&owner, &repo);
                    let resp = clients
                        .rest
                        .get(&ctx, &format!("repos/{owner}/{repo}/issues/{number}"), &[])
                        .await?;
                    if !resp.ok() {
                        return Ok(api_error_result("failed to get issue", resp));
                    }
                    let issue: Value = resp.json()?;
                    Ok(CallToolResult::json(&issue)?)
                })
            });
            handler
        },
    )
    .in_toolset(TOOLSET_ISSUES)
    .title("Get issue")
    .read_only(true)
    .scopes(["repo"])
}

// ============================================================================
// list_issues
// ============================================================================

fn list_issues() -> ToolDeclaration<GitHubDeps> {
    ToolDeclaration::new(
        "list_issues",
        "List issues in a repository, filterable by state and labels.",
        InputSchema::new()
            .string("owner", "Repository owner", true)
            .string("repo", "Repository name", true)
            .string("state", "Issue state: open, closed, or all", false)
            .array("labels", "Only issues carrying all of these labels", false)
            .number("per_page", "Results per page (max 100)", false),
        |deps: &GitHubDeps| {
            let deps = deps.clone();
            let handler: ToolFn = Arc::new(move |ctx, arguments| {
                let deps = deps.clone();
                Box::pin(async move {
                    let owner = require!(args::required_string(&arguments, "owner"));
                    let repo = require!(args::required_string(&arguments, "repo"));
                    let state = require!(args::optional_string(&arguments, "state"));
                    let labels = require!(args::optional_string_list(&arguments, "labels"));
                    let per_page = require!(args::optional_int(&arguments, "per_page"));

                    let mut query: Vec<(&str, String)> = Vec::new();
                    if let Some(state) = state {
                        query.push(("state", state));
                    }
                    if !labels.is_empty() {
                        query.push(("labels", labels.join(",")));
                    }
                    query.push(("per_page", per_page.unwrap_or(30).clamp(1, 100).to_string()));

                    let clients = deps.clients_for(&owner, &repo);
                    let resp = clients
                        .rest
                        .get(&ctx, &format!("repos/{owner}/{repo}/issues"), &query)
                        .await?;
                    if !resp.ok() {
                        return Ok(api_error_result("failed to list issues", resp));
                    }
                    let issues: Value = resp.json()?;
                    Ok(CallToolResult::json(&issues)?)
                })
            });
            handler
        },
    )
    .in_toolset(TOOLSET_ISSUES)
    .title("List issues")
    .read_only(true)
    .scopes(["repo"])
}

// ============================================================================
// create_issue
// ============================================================================

fn create_issue() -> ToolDeclaration<GitHubDeps> {
    ToolDeclaration::new(
        "create_issue",
        "Open a new issue in a GitHub repository.",
        InputSchema::new()
            .string("owner", "Repository owner", true)
            .string("repo", "Repository name", true)
            .string("title", "Issue title", true)
            .string("body", "Issue body in markdown", false)
            .array("labels", "Labels to apply", false)
            .array("assignees", "Logins to assign", false),
        |deps: &GitHubDeps| {
            let deps = deps.clone();
            let handler: ToolFn = Arc::new(move |ctx, arguments| {
                let deps = deps.clone();
                Box::pin(async move {
                    let owner = require!(args::required_string(&arguments, "owner"));
                    let repo = require!(args::required_string(&arguments, "repo"));
                    let title = require!(args::required_string(&arguments, "title"));
                    let body = require!(args::optional_string(&arguments, "body"));
                    let labels = require!(args::optional_string_list(&arguments, "labels"));
                    let assignees = require!(args::optional_string_list(&arguments, "assignees"));

                    let mut payload = json!({ "title": title });
                    if let Some(body) = body {
                        payload["body"] = json!(body);
                    }
                    if !labels.is_empty() {
                        payload["labels"] = json!(labels);
                    }
                    if !assignees.is_empty() {
                        payload["assignees"] = json!(assignees);
                    }

                    let clients = deps.clients_for(&owner, &repo);
                    let resp = clients
                        .rest
                        .post(&ctx, &format!("repos/{owner}/{repo}/issues"), &payload)
                        .await?;
                    if !resp.ok() {
                        return Ok(api_error_result("failed to create issue", resp));
                    }
                    let issue: Value = resp.json()?;
                    Ok(CallToolResult::json(&issue)?)
                })
            });
            handler
        },
    )
    .in_toolset(TOOLSET_ISSUES)
    .title("Create issue")
    .scopes(["repo"])
}

// ============================================================================
// add_issue_comment
// ============================================================================

fn add_issue_comment() -> ToolDeclaration<GitHubDeps> {
    ToolDeclaration::new(
        "add_issue_comment",
        "Comment on an existing issue.",
        InputSchema::new()
            .string("owner", "Repository owner", true)
            .string("repo", "Repository name", true)
            .number("issue_number", "Issue number", true)
            .string("body", "Comment body in markdown", true),
        |deps: &GitHubDeps| {
            let deps = deps.clone();
            let handler: ToolFn = Arc::new(move |ctx, arguments| {
                let deps = deps.clone();
                Box::pin(async move {
                    let owner = require!(args::required_string(&arguments, "owner"));
                    let repo = require!(args::required_string(&arguments, "repo"));
                    let number = require!(args::required_u64(&arguments, "issue_number"));
                    let body = require!(args::required_string(&arguments, "body"));

                    let clients = deps.clients_for(&owner, &repo);
                    let resp = clients
                        .rest
                        .post(
                            &ctx,
                            &format!("repos/{owner}/{repo}/issues/{number}/comments"),
                            &json!({ "body": body }),
                        )
                        .await?;
                    if !resp.ok() {
                        return Ok(api_error_result("failed to add issue comment", resp));
                    }
                    let comment: Value = resp.json()?;
                    Ok(CallToolResult::json(&comment)?)
                })
            });
            handler
        },
    )
    .in_toolset(TOOLSET_ISSUES)
    .title("Add issue comment")
    .scopes(["repo"])
}

// ============================================================================
// update_issue
// ============================================================================

fn update_issue() -> ToolDeclaration<GitHubDeps> {
    ToolDeclaration::new(
        "update_issue",
        "Update an issue's title, body, or state.",
        InputSchema::new()
            .string("owner", "Repository owner", true)
            .string("repo", "Repository name", true)
            .number("issue_number", "Issue number", true)
            .string("title", "New title", false)
            .string("body", "New body", false)
            .string("state", "New state: open or closed", false),
        |deps: &GitHubDeps| {
            let deps = deps.clone();
            let handler: ToolFn = Arc::new(move |ctx, arguments| {
                let deps = deps.clone();
                Box::pin(async move {
                    let owner = require!(args::required_string(&arguments, "owner"));
                    let repo = require!(args::required_string(&arguments, "repo"));
                    let number = require!(args::required_u64(&arguments, "issue_number"));
                    let title = require!(args::optional_string(&arguments, "title"));
                    let body = require!(args::optional_string(&arguments, "body"));
                    let state = require!(args::optional_string(&arguments, "state"));

                    let mut payload = json!({});
                    if let Some(title) = title {
                        payload["title"] = json!(title);
                    }
                    if let Some(body) = body {
                        payload["body"] = json!(body);
                    }
                    if let Some(state) = state {
                        payload["state"] = json!(state);
                    }

                    let clients = deps.clients_for(&owner, &repo);
                    let resp = clients
                        .rest
                        .patch(
                            &ctx,
                            &format!("repos/{owner}/{repo}/issues/{number}"),
                            &payload,
                        )
                        .await?;
                    if !resp.ok() {
                        return Ok(api_error_result("failed to update issue", resp));
                    }
                    let issue: Value = resp.json()?;
                    Ok(CallToolResult::json(&issue)?)
                })
            });
            handler
        },
    )
    .in_toolset(TOOLSET_ISSUES)
    .title("Update issue")
    .scopes(["repo"])
}
