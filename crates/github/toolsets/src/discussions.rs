//! Discussions toolset. Discussions have no REST surface, so these tools
//! go through the GraphQL client.

use crate::{TOOLSET_DISCUSSIONS, require};
use octomcp_core::schema::args;
use octomcp_core::{CallToolResult, InputSchema, ToolDeclaration, ToolFn};
use octomcp_github::client::GraphqlFailure;
use octomcp_github::{GitHubDeps, graphql_error_result, raw_api_error_result};
use serde_json::json;
use std::sync::Arc;

pub fn declarations() -> Vec<ToolDeclaration<GitHubDeps>> {
    vec![list_discussions()]
}

const LIST_DISCUSSIONS_QUERY: &str = r"
    query($owner: String!, $repo: String!, $first: Int!) {
        repository(owner: $owner, name: $repo) {
            discussions(first: $first, orderBy: {field: UPDATED_AT, direction: DESC}) {
                nodes {
                    number
                    title
                    category { name }
                    author { login }
                    updatedAt
                    comments { totalCount }
                }
            }
        }
    }
";

fn list_discussions() -> ToolDeclaration<GitHubDeps> {
    ToolDeclaration::new(
        "list_discussions",
        "List recent discussions in a repository.",
        InputSchema::new()
            .string("owner", "Repository owner", true)
            .string("repo", "Repository name", true)
            .number("per_page", "Results to return (max 100)", false),
        |deps: &GitHubDeps| {
            let deps = deps.clone();
            let handler: ToolFn = Arc::new(move |ctx, arguments| {
                let deps = deps.clone();
                Box::pin(async move {
                    let owner = require!(args::required_string(&arguments, "owner"));
                    let repo = require!(args::required_string(&arguments, "repo"));
                    let first = require!(args::optional_int(&arguments, "per_page"))
                        .unwrap_or(30)
                        .clamp(1, 100);

                    let clients = deps.clients_for(&owner, &repo);
                    let variables = json!({
                        "owner": owner,
                        "repo": repo,
                        "first": first,
                    });
                    let data = match clients
                        .graphql
                        .query(&ctx, LIST_DISCUSSIONS_QUERY, variables)
                        .await?
                    {
                        Ok(data) => data,
                        Err(GraphqlFailure::Errors(errors)) => {
                            return Ok(graphql_error_result(
                                "failed to list discussions",
                                errors,
                            ));
                        }
                        Err(GraphqlFailure::Status(snapshot)) => {
                            return Ok(raw_api_error_result(
                                "failed to list discussions",
                                snapshot,
                            ));
                        }
                    };

                    let nodes = data
                        .pointer("/repository/discussions/nodes")
                        .cloned()
                        .unwrap_or_else(|| json!([]));
                    Ok(CallToolResult::json(&nodes)?)
                })
            });
            handler
        },
    )
    .in_toolset(TOOLSET_DISCUSSIONS)
    .title("List discussions")
    .read_only(true)
    .scopes(["repo"])
}
