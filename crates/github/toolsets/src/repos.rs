//! Repository toolset.

use crate::{FLAG_LOCKDOWN, TOOLSET_REPOS, require};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use octomcp_core::schema::args;
use octomcp_core::{CallToolResult, InputSchema, ToolDeclaration, ToolFn};
use octomcp_github::cache::viewer_can_push;
use octomcp_github::{GitHubDeps, api_error_result, raw_api_error_result};
use serde_json::{Value, json};
use std::sync::Arc;

const RAW_CONTENT_ACCEPT: &str = "application/vnd.github.raw+json";

pub fn declarations() -> Vec<ToolDeclaration<GitHubDeps>> {
    vec![
        search_repositories(),
        get_file_contents(),
        list_branches(),
        list_commits(),
        create_or_update_file(),
    ]
}

// ============================================================================
// search_repositories
// ============================================================================

fn search_repositories() -> ToolDeclaration<GitHubDeps> {
    ToolDeclaration::new(
        "search_repositories",
        "Search repositories with GitHub's search syntax.",
        InputSchema::new()
            .string("query", "Search query, e.g. 'language:rust stars:>500'", true)
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
                            "search/repositories",
                            &[
                                ("q", query),
                                ("per_page", per_page.unwrap_or(30).clamp(1, 100).to_string()),
                            ],
                        )
                        .await?;
                    if !resp.ok() {
                        return Ok(api_error_result("failed to search repositories", resp));
                    }
                    let results: Value = resp.json()?;
                    Ok(CallToolResult::json(&results)?)
                })
            });
            handler
        },
    )
    .in_toolset(TOOLSET_REPOS)
    .title("Search repositories")
    .read_only(true)
    .scopes(["public_repo"])
}

// ============================================================================
// get_file_contents
// ============================================================================

fn get_file_contents() -> ToolDeclaration<GitHubDeps> {
    ToolDeclaration::new(
        "get_file_contents",
        "Read a file from a repository, optionally at a ref.",
        InputSchema::new()
            .string("owner", "Repository owner", true)
            .string("repo", "Repository name", true)
            .string("path", "File path inside the repository", true)
            .string("ref", "Branch, tag, or commit SHA", false),
        |deps: &GitHubDeps| {
            let deps = deps.clone();
            let handler: ToolFn = Arc::new(move |ctx, arguments| {
                let deps = deps.clone();
                Box::pin(async move {
                    let owner = require!(args::required_string(&arguments, "owner"));
                    let repo = require!(args::required_string(&arguments, "repo"));
                    let path = require!(args::required_string(&arguments, "path"));
                    let git_ref = require!(args::optional_string(&arguments, "ref"));

                    let clients = deps.clients_for(&owner, &repo);

                    // Lockdown mode withholds contents from repositories the
                    // viewer cannot push to.
                    if deps.flag_enabled(FLAG_LOCKDOWN)
                        && !viewer_can_push(&clients, deps.cache(), &ctx, &owner, &repo).await?
                    {
                        return Ok(CallToolResult::error(format!(
                            "content lockdown is enabled and the viewer cannot push to {owner}/{repo}"
                        )));
                    }

                    let mut url = format!("repos/{owner}/{repo}/contents/{path}");
                    if let Some(git_ref) = git_ref {
                        url.push_str(&format!("?ref={git_ref}"));
                    }
                    let resp = clients.raw.get(&ctx, &url, RAW_CONTENT_ACCEPT).await?;
                    if !resp.ok() {
                        return Ok(raw_api_error_result("failed to get file contents", resp));
                    }
                    Ok(CallToolResult::success(resp.body))
                })
            });
            handler
        },
    )
    .in_toolset(TOOLSET_REPOS)
    .title("Get file contents")
    .read_only(true)
    .scopes(["repo"])
}

// ============================================================================
// list_branches
// ============================================================================

fn list_branches() -> ToolDeclaration<GitHubDeps> {
    ToolDeclaration::new(
        "list_branches",
        "List branches in a repository.",
        InputSchema::new()
            .string("owner", "Repository owner", true)
            .string("repo", "Repository name", true)
            .number("per_page", "Results per page (max 100)", false),
        |deps: &GitHubDeps| {
            let deps = deps.clone();
            let handler: ToolFn = Arc::new(move |ctx, arguments| {
                let deps = deps.clone();
                Box::pin(async move {
                    let owner = require!(args::required_string(&arguments, "owner"));
                    let repo = require!(args::required_string(&arguments, "repo"));
                    let per_page = require!(args::optional_int(&arguments, "per_page"));

                    let clients = deps.clients_for(&owner, &repo);
                    let resp = clients
                        .rest
                        .get(
                            &ctx,
                            &format!("repos/{owner}/{repo}/branches"),
                            &[("per_page", per_page.unwrap_or(30).clamp(1, 100).to_string())],
                        )
                        .await?;
                    if !resp.ok() {
                        return Ok(api_error_result("failed to list branches", resp));
                    }
                    let branches: Value = resp.json()?;
                    Ok(CallToolResult::json(&branches)?)
                })
            });
            handler
        },
    )
    .in_toolset(TOOLSET_REPOS)
    .title("List branches")
    .read_only(true)
    .scopes(["repo"])
}

// ============================================================================
// list_commits
// ============================================================================

fn list_commits() -> ToolDeclaration<GitHubDeps> {
    ToolDeclaration::new(
        "list_commits",
        "List commits on a branch or ref.",
        InputSchema::new()
            .string("owner", "Repository owner", true)
            .string("repo", "Repository name", true)
            .string("sha", "Branch name or commit SHA to start from", false)
            .number("per_page", "Results per page (max 100)", false),
        |deps: &GitHubDeps| {
            let deps = deps.clone();
            let handler: ToolFn = Arc::new(move |ctx, arguments| {
                let deps = deps.clone();
                Box::pin(async move {
                    let owner = require!(args::required_string(&arguments, "owner"));
                    let repo = require!(args::required_string(&arguments, "repo"));
                    let sha = require!(args::optional_string(&arguments, "sha"));
                    let per_page = require!(args::optional_int(&arguments, "per_page"));

                    let mut query: Vec<(&str, String)> = Vec::new();
                    if let Some(sha) = sha {
                        query.push(("sha", sha));
                    }
                    query.push(("per_page", per_page.unwrap_or(30).clamp(1, 100).to_string()));

                    let clients = deps.clients_for(&owner, &repo);
                    let resp = clients
                        .rest
                        .get(&ctx, &format!("repos/{owner}/{repo}/commits"), &query)
                        .await?;
                    if !resp.ok() {
                        return Ok(api_error_result("failed to list commits", resp));
                    }
                    let commits: Value = resp.json()?;
                    Ok(CallToolResult::json(&commits)?)
                })
            });
            handler
        },
    )
    .in_toolset(TOOLSET_REPOS)
    .title("List commits")
    .read_only(true)
    .scopes(["repo"])
}

// ============================================================================
// create_or_update_file
// ============================================================================

fn create_or_update_file() -> ToolDeclaration<GitHubDeps> {
    ToolDeclaration::new(
        "create_or_update_file",
        "Create or replace a single file with a commit.",
        InputSchema::new()
            .string("owner", "Repository owner", true)
            .string("repo", "Repository name", true)
            .string("path", "File path inside the repository", true)
            .string("content", "New file content (plain text)", true)
            .string("message", "Commit message", true)
            .string("branch", "Branch to commit to", false)
            .string("sha", "Blob SHA of the file being replaced", false),
        |deps: &GitHubDeps| {
            let deps = deps.clone();
            let handler: ToolFn = Arc::new(move |ctx, arguments| {
                let deps = deps.clone();
                Box::pin(async move {
                    let owner = require!(args::required_string(&arguments, "owner"));
                    let repo = require!(args::required_string(&arguments, "repo"));
                    let path = require!(args::required_string(&arguments, "path"));
                    let content = require!(args::required_string(&arguments, "content"));
                    let message = require!(args::required_string(&arguments, "message"));
                    let branch = require!(args::optional_string(&arguments, "branch"));
                    let sha = require!(args::optional_string(&arguments, "sha"));

                    let mut payload = json!({
                        "message": message,
                        "content": BASE64.encode(content.as_bytes()),
                    });
                    if let Some(branch) = branch {
                        payload["branch"] = json!(branch);
                    }
                    if let Some(sha) = sha {
                        payload["sha"] = json!(sha);
                    }

                    let clients = deps.clients_for(&owner, &repo);
                    let resp = clients
                        .rest
                        .put(
                            &ctx,
                            &format!("repos/{owner}/{repo}/contents/{path}"),
                            &payload,
                        )
                        .await?;
                    if !resp.ok() {
                        return Ok(api_error_result("failed to create or update file", resp));
                    }
                    let commit: Value = resp.json()?;
                    Ok(CallToolResult::json(&commit)?)
                })
            });
            handler
        },
    )
    .in_toolset(TOOLSET_REPOS)
    .title("Create or update file")
    .scopes(["repo"])
}
