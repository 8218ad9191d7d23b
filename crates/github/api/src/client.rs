//! Per-dispatch API client bundle: REST, GraphQL, and raw HTTP.
//!
//! Every response is captured as an [`HttpSnapshot`] before interpretation
//! so failures can preserve the full upstream response (status, headers,
//! body) for the error taxonomy. Clients thread the request context into
//! each call; a cancelled context aborts the request without waiting for
//! the upstream.

use crate::host::ApiHost;
use octomcp_core::CallContext;
use reqwest::Method;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;
use url::Url;

const JSON_ACCEPT: &str = "application/vnd.github+json";

/// Failures below the HTTP layer (or in request construction). These are
/// internal errors: the upstream never produced a response.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid request path {path}: {source}")]
    Path {
        path: String,
        #[source]
        source: url::ParseError,
    },

    #[error("failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),

    #[error("request cancelled")]
    Cancelled,
}

/// A fully-read upstream HTTP response.
#[derive(Debug, Clone)]
pub struct HttpSnapshot {
    pub status: u16,
    headers: BTreeMap<String, String>,
    pub body: String,
}

impl HttpSnapshot {
    /// Assemble a snapshot from parts. Header names are lowercased.
    pub fn new(
        status: u16,
        headers: impl IntoIterator<Item = (String, String)>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            status,
            headers: headers
                .into_iter()
                .map(|(k, v)| (k.to_lowercase(), v))
                .collect(),
            body: body.into(),
        }
    }

    async fn capture(response: reqwest::Response) -> Result<Self, ClientError> {
        let status = response.status().as_u16();
        let headers = flatten_headers(response.headers());
        let body = response.text().await?;
        Ok(Self {
            status,
            headers,
            body,
        })
    }

    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(String::as_str)
    }

    pub fn rate_limit_remaining(&self) -> Option<u64> {
        self.header("x-ratelimit-remaining")?.parse().ok()
    }

    /// The upstream's human message: the `message` field of an error body
    /// when present, otherwise a truncated body.
    pub fn message(&self) -> String {
        if let Ok(value) = serde_json::from_str::<Value>(&self.body)
            && let Some(message) = value.get("message").and_then(Value::as_str)
        {
            return message.to_string();
        }
        let mut body = self.body.trim().to_string();
        if body.len() > 200 {
            body.truncate(200);
            body.push('…');
        }
        body
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

fn flatten_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_lowercase(), v.to_string()))
        })
        .collect()
}

/// Build the shared HTTP client once; bundles borrow it per dispatch.
pub fn build_http_client(user_agent: &str) -> Result<reqwest::Client, ClientError> {
    reqwest::Client::builder()
        .user_agent(user_agent)
        .connect_timeout(Duration::from_secs(10))
        .timeout(Duration::from_secs(30))
        .build()
        .map_err(ClientError::Build)
}

async fn run_cancellable(
    ctx: &CallContext,
    request: reqwest::RequestBuilder,
) -> Result<HttpSnapshot, ClientError> {
    let fut = async {
        let response = request.send().await?;
        HttpSnapshot::capture(response).await
    };
    tokio::select! {
        () = ctx.cancel.cancelled() => Err(ClientError::Cancelled),
        result = fut => result,
    }
}

fn bearer(token: &SecretString) -> String {
    format!("Bearer {}", token.expose_secret())
}

/// Typed REST client bound to one account's token and one host.
#[derive(Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base: Url,
    token: SecretString,
}

impl RestClient {
    pub fn new(http: reqwest::Client, base: Url, token: SecretString) -> Self {
        Self { http, base, token }
    }

    fn url(&self, path: &str) -> Result<Url, ClientError> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|source| ClientError::Path {
                path: path.to_string(),
                source,
            })
    }

    pub async fn get(
        &self,
        ctx: &CallContext,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<HttpSnapshot, ClientError> {
        let request = self
            .http
            .get(self.url(path)?)
            .query(query)
            .header(AUTHORIZATION, bearer(&self.token))
            .header(ACCEPT, JSON_ACCEPT);
        run_cancellable(ctx, request).await
    }

    pub async fn send(
        &self,
        ctx: &CallContext,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<HttpSnapshot, ClientError> {
        let mut request = self
            .http
            .request(method, self.url(path)?)
            .header(AUTHORIZATION, bearer(&self.token))
            .header(ACCEPT, JSON_ACCEPT);
        if let Some(body) = body {
            request = request.json(body);
        }
        run_cancellable(ctx, request).await
    }

    pub async fn post(
        &self,
        ctx: &CallContext,
        path: &str,
        body: &Value,
    ) -> Result<HttpSnapshot, ClientError> {
        self.send(ctx, Method::POST, path, Some(body)).await
    }

    pub async fn patch(
        &self,
        ctx: &CallContext,
        path: &str,
        body: &Value,
    ) -> Result<HttpSnapshot, ClientError> {
        self.send(ctx, Method::PATCH, path, Some(body)).await
    }

    pub async fn put(
        &self,
        ctx: &CallContext,
        path: &str,
        body: &Value,
    ) -> Result<HttpSnapshot, ClientError> {
        self.send(ctx, Method::PUT, path, Some(body)).await
    }
}

/// Result of a GraphQL call that reached the upstream.
#[derive(Error, Debug)]
pub enum GraphqlFailure {
    /// HTTP-level failure; the snapshot preserves the response.
    #[error("GraphQL endpoint returned status {}", .0.status)]
    Status(HttpSnapshot),

    /// HTTP 200 with an `errors` array.
    #[error("GraphQL errors: {}", .0.join("; "))]
    Errors(Vec<String>),
}

/// GraphQL v4 client bound to one account's token.
#[derive(Clone)]
pub struct GraphqlClient {
    http: reqwest::Client,
    endpoint: Url,
    token: SecretString,
}

impl GraphqlClient {
    pub fn new(http: reqwest::Client, endpoint: Url, token: SecretString) -> Self {
        Self {
            http,
            endpoint,
            token,
        }
    }

    /// Run a query; returns the `data` payload, or the upstream error chain.
    pub async fn query(
        &self,
        ctx: &CallContext,
        query: &str,
        variables: Value,
    ) -> Result<Result<Value, GraphqlFailure>, ClientError> {
        let request = self
            .http
            .post(self.endpoint.clone())
            .header(AUTHORIZATION, bearer(&self.token))
            .json(&serde_json::json!({ "query": query, "variables": variables }));
        let snapshot = run_cancellable(ctx, request).await?;

        if !snapshot.ok() {
            return Ok(Err(GraphqlFailure::Status(snapshot)));
        }
        let body: Value = match snapshot.json() {
            Ok(body) => body,
            Err(_) => return Ok(Err(GraphqlFailure::Status(snapshot))),
        };
        if let Some(errors) = body.get("errors").and_then(Value::as_array)
            && !errors.is_empty()
        {
            let messages = errors
                .iter()
                .map(|e| {
                    e.get("message")
                        .and_then(Value::as_str)
                        .unwrap_or("unknown error")
                        .to_string()
                })
                .collect();
            return Ok(Err(GraphqlFailure::Errors(messages)));
        }
        Ok(Ok(body.get("data").cloned().unwrap_or(Value::Null)))
    }
}

/// Raw-HTTP client for endpoints returning non-JSON bodies (diffs, file
/// contents).
#[derive(Clone)]
pub struct RawClient {
    http: reqwest::Client,
    base: Url,
    token: SecretString,
}

impl RawClient {
    pub fn new(http: reqwest::Client, base: Url, token: SecretString) -> Self {
        Self { http, base, token }
    }

    pub async fn get(
        &self,
        ctx: &CallContext,
        path: &str,
        accept: &str,
    ) -> Result<HttpSnapshot, ClientError> {
        let url = self
            .base
            .join(path.trim_start_matches('/'))
            .map_err(|source| ClientError::Path {
                path: path.to_string(),
                source,
            })?;
        let request = self
            .http
            .get(url)
            .header(AUTHORIZATION, bearer(&self.token))
            .header(ACCEPT, HeaderValue::from_str(accept).unwrap_or(HeaderValue::from_static("*/*")));
        run_cancellable(ctx, request).await
    }
}

/// The per-dispatch bundle: one of each client flavor, all bound to the
/// same account token and host.
#[derive(Clone)]
pub struct ApiClients {
    pub rest: RestClient,
    pub graphql: GraphqlClient,
    pub raw: RawClient,
}

impl ApiClients {
    pub fn new(http: &reqwest::Client, host: &ApiHost, token: &SecretString) -> Self {
        Self {
            rest: RestClient::new(http.clone(), host.rest_base().clone(), token.clone()),
            graphql: GraphqlClient::new(http.clone(), host.graphql().clone(), token.clone()),
            raw: RawClient::new(http.clone(), host.rest_base().clone(), token.clone()),
        }
    }
}
