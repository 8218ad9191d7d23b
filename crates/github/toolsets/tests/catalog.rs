//! Catalog tests: real declarations driven against a mock upstream.

use octomcp_core::{CallContext, CallToolResult, Registry};
use octomcp_github::{
    AccountRouter, ApiHost, ErrorKind, GitHubDeps, RepoAccessCache, single_token_account,
};
use octomcp_toolsets::default_registry;
use secrecy::SecretString;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

fn deps_for(server: &mockito::ServerGuard, flags: &[&str]) -> GitHubDeps {
    let rest = Url::parse(&format!("{}/", server.url())).unwrap();
    let graphql = Url::parse(&format!("{}/graphql", server.url())).unwrap();
    let router = Arc::new(AccountRouter::new(single_token_account(
        SecretString::from("test-token".to_string()),
    )));
    GitHubDeps::new(
        router,
        ApiHost::with_endpoints(rest, graphql),
        Arc::new(RepoAccessCache::new(Duration::from_secs(60))),
        flags.iter().map(|f| (*f).to_string()).collect(),
        5000,
    )
    .unwrap()
}

async fn call(
    registry: &Registry<GitHubDeps>,
    deps: &GitHubDeps,
    name: &str,
    arguments: Value,
) -> CallToolResult {
    let decl = registry
        .lookup(name)
        .unwrap_or_else(|| panic!("tool {name} not in view"));
    let handler = (decl.handler)(deps);
    handler(CallContext::default(), arguments).await.unwrap()
}

// Read-only + issues toolset exposes exactly the read-only issue tools.
#[test]
fn read_only_issues_view() {
    let registry = default_registry()
        .unwrap()
        .with_read_only(true)
        .with_toolsets(&["issues"]);
    let names: Vec<&str> = registry
        .available_tools()
        .into_iter()
        .map(|t| t.name.as_str())
        .collect();
    assert_eq!(names, vec!["get_issue", "list_issues"]);
}

#[test]
fn catalog_names_are_unique_and_sorted() {
    let registry = default_registry().unwrap().with_toolsets(&["all"]);
    let tools = registry.available_tools();
    let mut names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
    let original = names.clone();
    names.sort_unstable();
    names.dedup();
    assert_eq!(names.len(), original.len(), "duplicate tool names");
}

// Missing required parameter: validation error, no upstream request.
#[tokio::test]
async fn get_issue_missing_parameter_makes_no_upstream_call() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", mockito::Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let registry = default_registry().unwrap();
    let deps = deps_for(&server, &[]);
    let result = call(
        &registry,
        &deps,
        "get_issue",
        json!({"owner": "acme", "repo": "widget"}),
    )
    .await;

    assert!(result.is_error);
    assert!(
        result
            .text()
            .starts_with("missing required parameter: issue_number")
    );
    assert!(ErrorKind::of(&result).unwrap().as_validation().is_some());
    mock.assert_async().await;
}

// Upstream 404 flows through the api-error taxonomy with the full snapshot.
#[tokio::test]
async fn get_issue_404_preserves_upstream_response() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/repos/acme/widget/issues/12")
        .with_status(404)
        .with_body(r#"{"message":"Not Found"}"#)
        .create_async()
        .await;

    let registry = default_registry().unwrap();
    let deps = deps_for(&server, &[]);
    let result = call(
        &registry,
        &deps,
        "get_issue",
        json!({"owner": "acme", "repo": "widget", "issue_number": 12}),
    )
    .await;

    assert!(result.is_error);
    assert!(result.text().starts_with("failed to get issue"));
    let api = ErrorKind::of(&result).unwrap().as_api().unwrap();
    assert_eq!(api.response.status, 404);
    assert!(api.response.body.contains("Not Found"));
}

#[tokio::test]
async fn get_issue_success_returns_pretty_json() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/repos/acme/widget/issues/12")
        .with_status(200)
        .with_body(r#"{"number": 12, "title": "flaky test"}"#)
        .create_async()
        .await;

    let registry = default_registry().unwrap();
    let deps = deps_for(&server, &[]);
    let result = call(
        &registry,
        &deps,
        "get_issue",
        json!({"owner": "acme", "repo": "widget", "issue_number": 12}),
    )
    .await;

    assert!(!result.is_error);
    assert!(result.text().contains("flaky test"));
}

// The deprecated name reaches the canonical comment handler.
#[tokio::test]
async fn deprecated_alias_dispatches_to_add_issue_comment() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/repos/acme/widget/issues/3/comments")
        .with_status(201)
        .with_body(r#"{"id": 77, "body": "done"}"#)
        .create_async()
        .await;

    let registry = default_registry().unwrap();
    let deps = deps_for(&server, &[]);
    let result = call(
        &registry,
        &deps,
        "create_issue_comment",
        json!({"owner": "acme", "repo": "widget", "issue_number": 3, "body": "done"}),
    )
    .await;

    assert!(!result.is_error);
    mock.assert_async().await;
}

#[tokio::test]
async fn lockdown_blocks_file_contents_without_push_access() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/repos/acme/widget")
        .with_status(200)
        .with_body(r#"{"permissions": {"push": false}}"#)
        .create_async()
        .await;

    let registry = default_registry().unwrap();
    let deps = deps_for(&server, &["lockdown"]);
    let result = call(
        &registry,
        &deps,
        "get_file_contents",
        json!({"owner": "acme", "repo": "widget", "path": "README.md"}),
    )
    .await;

    assert!(result.is_error);
    assert!(result.text().contains("lockdown"));
}

#[tokio::test]
async fn lockdown_allows_file_contents_with_push_access() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/repos/acme/widget")
        .with_status(200)
        .with_body(r#"{"permissions": {"push": true}}"#)
        .create_async()
        .await;
    server
        .mock("GET", "/repos/acme/widget/contents/README.md")
        .with_status(200)
        .with_body("# Widget\n")
        .create_async()
        .await;

    let registry = default_registry().unwrap();
    let deps = deps_for(&server, &["lockdown"]);
    let result = call(
        &registry,
        &deps,
        "get_file_contents",
        json!({"owner": "acme", "repo": "widget", "path": "README.md"}),
    )
    .await;

    assert!(!result.is_error, "unexpected error: {}", result.text());
    assert_eq!(result.text(), "# Widget\n");
}

// Feature-flagged experiments stay hidden until the flag is on.
#[test]
fn experiments_need_their_feature_flag() {
    let registry = default_registry().unwrap().with_toolsets(&["experiments"]);
    assert!(registry.lookup("list_issue_types").is_none());

    let registry = registry.with_feature_checker(Arc::new(|flag| flag == "issue-types"));
    assert!(registry.lookup("list_issue_types").is_some());
}

// GraphQL error chains surface through the graphql-error taxonomy.
#[tokio::test]
async fn list_discussions_maps_graphql_errors() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/graphql")
        .with_status(200)
        .with_body(r#"{"errors":[{"message":"Could not resolve to a Repository"}]}"#)
        .create_async()
        .await;

    let registry = default_registry().unwrap();
    let deps = deps_for(&server, &[]);
    let result = call(
        &registry,
        &deps,
        "list_discussions",
        json!({"owner": "acme", "repo": "missing"}),
    )
    .await;

    assert!(result.is_error);
    assert!(result.text().starts_with("failed to list discussions"));
    let kind = ErrorKind::of(&result).unwrap();
    let graphql = kind.as_graphql().unwrap();
    assert_eq!(graphql.errors, vec!["Could not resolve to a Repository"]);
}

#[tokio::test]
async fn list_discussions_returns_nodes() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/graphql")
        .with_status(200)
        .with_body(
            r#"{"data":{"repository":{"discussions":{"nodes":[{"number":1,"title":"Roadmap"}]}}}}"#,
        )
        .create_async()
        .await;

    let registry = default_registry().unwrap();
    let deps = deps_for(&server, &[]);
    let result = call(
        &registry,
        &deps,
        "list_discussions",
        json!({"owner": "acme", "repo": "widget"}),
    )
    .await;

    assert!(!result.is_error);
    assert!(result.text().contains("Roadmap"));
}
