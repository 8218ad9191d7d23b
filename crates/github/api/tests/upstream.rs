//! Client-against-upstream tests over a mock HTTP server.

use octomcp_core::CallContext;
use octomcp_github::client::{GraphqlClient, GraphqlFailure, RestClient};
use octomcp_github::errors::{ErrorKind, api_error_result};
use octomcp_github::scopes::fetch_held_scopes;
use secrecy::SecretString;
use url::Url;

fn rest_client(server: &mockito::ServerGuard) -> RestClient {
    let base = Url::parse(&format!("{}/", server.url())).unwrap();
    RestClient::new(
        reqwest::Client::new(),
        base,
        SecretString::from("test-token".to_string()),
    )
}

#[tokio::test]
async fn rest_get_carries_auth_and_parses_json() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/repos/acme/widget/issues/7")
        .match_header("authorization", "Bearer test-token")
        .with_status(200)
        .with_header("x-ratelimit-remaining", "4999")
        .with_body(r#"{"number": 7, "title": "broken build"}"#)
        .create_async()
        .await;

    let rest = rest_client(&server);
    let ctx = CallContext::default();
    let snapshot = rest
        .get(&ctx, "repos/acme/widget/issues/7", &[])
        .await
        .unwrap();

    mock.assert_async().await;
    assert!(snapshot.ok());
    assert_eq!(snapshot.rate_limit_remaining(), Some(4999));
    let body: serde_json::Value = snapshot.json().unwrap();
    assert_eq!(body["title"], "broken build");
}

// Upstream 404 with a JSON message body: the tool result preserves the
// status and body through the typed payload.
#[tokio::test]
async fn rest_404_round_trips_through_error_taxonomy() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/repos/acme/widget/issues/404")
        .with_status(404)
        .with_body(r#"{"message":"Not Found"}"#)
        .create_async()
        .await;

    let rest = rest_client(&server);
    let ctx = CallContext::default();
    let snapshot = rest
        .get(&ctx, "repos/acme/widget/issues/404", &[])
        .await
        .unwrap();
    assert!(!snapshot.ok());

    let result = api_error_result("failed to get issue", snapshot);
    assert!(result.is_error);
    assert!(result.text().starts_with("failed to get issue"));
    assert!(result.text().contains("Not Found"));

    let api = ErrorKind::of(&result).unwrap().as_api().unwrap();
    assert_eq!(api.response.status, 404);
    assert_eq!(api.response.body, r#"{"message":"Not Found"}"#);
}

#[tokio::test]
async fn graphql_data_and_error_chain() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/graphql")
        .with_status(200)
        .with_body(r#"{"data":{"viewer":{"login":"octocat"}}}"#)
        .expect(1)
        .create_async()
        .await;

    let endpoint = Url::parse(&format!("{}/graphql", server.url())).unwrap();
    let graphql = GraphqlClient::new(
        reqwest::Client::new(),
        endpoint.clone(),
        SecretString::from("test-token".to_string()),
    );
    let ctx = CallContext::default();

    let data = graphql
        .query(&ctx, "query { viewer { login } }", serde_json::json!({}))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(data["viewer"]["login"], "octocat");

    server
        .mock("POST", "/graphql")
        .with_status(200)
        .with_body(r#"{"errors":[{"message":"rate limited"},{"message":"try later"}]}"#)
        .create_async()
        .await;

    let failure = graphql
        .query(&ctx, "query { viewer { login } }", serde_json::json!({}))
        .await
        .unwrap()
        .unwrap_err();
    match failure {
        GraphqlFailure::Errors(messages) => {
            assert_eq!(messages, vec!["rate limited", "try later"]);
        }
        GraphqlFailure::Status(_) => panic!("expected upstream error chain"),
    }
}

#[tokio::test]
async fn held_scopes_come_from_the_response_header() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/")
        .with_status(200)
        .with_header("x-oauth-scopes", "repo, read:org")
        .with_body("{}")
        .create_async()
        .await;

    let rest = rest_client(&server);
    let ctx = CallContext::default();
    let scopes = fetch_held_scopes(&rest, &ctx).await.unwrap();
    assert_eq!(
        scopes,
        Some(vec!["repo".to_string(), "read:org".to_string()])
    );
}

// Fine-grained tokens expose no scope header: unknown, not an error.
#[tokio::test]
async fn missing_scope_header_is_unknown() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/")
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let rest = rest_client(&server);
    let ctx = CallContext::default();
    assert_eq!(fetch_held_scopes(&rest, &ctx).await.unwrap(), None);
}

#[tokio::test]
async fn cancelled_context_aborts_the_call() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/slow")
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let rest = rest_client(&server);
    let token = tokio_util::sync::CancellationToken::new();
    token.cancel();
    let ctx = CallContext::new(token);
    let err = rest.get(&ctx, "slow", &[]).await.unwrap_err();
    assert!(matches!(
        err,
        octomcp_github::client::ClientError::Cancelled
    ));
}
