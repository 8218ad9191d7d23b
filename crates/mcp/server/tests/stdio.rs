//! End-to-end transport tests over an in-memory duplex stream.

use octomcp_core::schema::args;
use octomcp_core::{CallToolResult, InputSchema, Registry, ToolDeclaration, ToolFn, ToolsetMeta};
use octomcp_server::{
    Dispatcher, Notifier, ServerInfo, SharedRegistry, dynamic_tool_declarations,
    dynamic_toolset_meta, serve,
};
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, ReadHalf, WriteHalf};
use tokio_util::sync::CancellationToken;

struct TestClient {
    write: WriteHalf<DuplexStream>,
    read: BufReader<ReadHalf<DuplexStream>>,
    next_id: i64,
    /// Server-originated notifications skipped while waiting for responses.
    notifications: Vec<Value>,
}

impl TestClient {
    async fn send_raw(&mut self, line: &str) {
        self.write.write_all(line.as_bytes()).await.unwrap();
        self.write.write_all(b"\n").await.unwrap();
    }

    async fn request(&mut self, method: &str, params: Value) -> Value {
        self.next_id += 1;
        let id = self.next_id;
        self.send_raw(
            &json!({"jsonrpc": "2.0", "id": id, "method": method, "params": params}).to_string(),
        )
        .await;
        self.wait_for_response(json!(id)).await
    }

    async fn notify(&mut self, method: &str) {
        self.send_raw(&json!({"jsonrpc": "2.0", "method": method}).to_string())
            .await;
    }

    async fn next_message(&mut self) -> Value {
        let mut line = String::new();
        let n = self.read.read_line(&mut line).await.unwrap();
        assert!(n > 0, "server closed the stream unexpectedly");
        serde_json::from_str(&line).unwrap()
    }

    /// Skip (and record) notifications until the response with the given id
    /// arrives.
    async fn wait_for_response(&mut self, id: Value) -> Value {
        loop {
            let message = self.next_message().await;
            if message.get("id") == Some(&id) {
                return message;
            }
            assert!(
                message.get("method").is_some(),
                "unexpected interleaved message: {message}"
            );
            self.notifications.push(message);
        }
    }
}

struct Fixture {
    client: TestClient,
    calls: Arc<AtomicUsize>,
}

fn counting_tool(name: &str, toolset: &str, calls: &Arc<AtomicUsize>) -> ToolDeclaration<()> {
    let calls = Arc::clone(calls);
    ToolDeclaration::new(
        name,
        format!("{name} test tool"),
        InputSchema::new().number("issue_number", "Issue number", true),
        move |_deps: &()| {
            let calls = Arc::clone(&calls);
            let handler: ToolFn = Arc::new(move |_ctx, arguments| {
                let calls = Arc::clone(&calls);
                Box::pin(async move {
                    let number = match args::required_u64(&arguments, "issue_number") {
                        Ok(v) => v,
                        Err(e) => return Ok(CallToolResult::error(e.to_string())),
                    };
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(CallToolResult::success(format!("handled #{number}")))
                })
            });
            handler
        },
    )
    .in_toolset(toolset)
    .read_only(true)
}

fn failing_tool(name: &str, toolset: &str) -> ToolDeclaration<()> {
    ToolDeclaration::new(
        name,
        "always fails internally",
        InputSchema::new(),
        |_deps: &()| {
            let handler: ToolFn = Arc::new(|_ctx, _arguments| {
                Box::pin(async { Err(anyhow::anyhow!("serialization exploded")) })
            });
            handler
        },
    )
    .in_toolset(toolset)
}

fn write_tool(name: &str, toolset: &str) -> ToolDeclaration<()> {
    ToolDeclaration::new(name, "writes things", InputSchema::new(), |_deps: &()| {
        let handler: ToolFn =
            Arc::new(|_ctx, _arguments| Box::pin(async { Ok(CallToolResult::success("wrote")) }));
        handler
    })
    .in_toolset(toolset)
}

/// Spin up a server over a duplex pipe with the standard test catalog.
async fn start(configure: impl FnOnce(Registry<()>) -> Registry<()>, dynamic: bool) -> Fixture {
    let calls = Arc::new(AtomicUsize::new(0));

    let shared = SharedRegistry::new(Registry::empty());
    let notifier = Notifier::new();

    let mut builder = Registry::builder()
        .toolset(ToolsetMeta::new("issues", "Issue tools").default_enabled())
        .toolset(ToolsetMeta::new("repos", "Repository tools").default_enabled())
        .tool(counting_tool("issue_comment_write", "issues", &calls))
        .tool(counting_tool("get_issue", "issues", &calls))
        .tool(write_tool("create_issue", "issues"))
        .tool(counting_tool("list_branches", "repos", &calls))
        .tool(failing_tool("broken_tool", "repos"))
        .alias("add_issue_comment", "issue_comment_write");
    if dynamic {
        builder = builder.toolset(dynamic_toolset_meta());
        builder = builder.tools(dynamic_tool_declarations(&shared, &notifier));
    }
    let registry = configure(builder.build().unwrap());
    shared.replace(registry).await;

    let (client_io, server_io) = tokio::io::duplex(64 * 1024);
    let (server_read, server_write) = tokio::io::split(server_io);
    let (client_read, client_write) = tokio::io::split(client_io);

    let dispatcher = Arc::new(Dispatcher::new(
        shared,
        (),
        ServerInfo {
            name: "octomcp-test".to_string(),
            version: "0.0.0".to_string(),
        },
        200,
    ));

    tokio::spawn(async move {
        let _ = serve(
            dispatcher,
            notifier,
            server_read,
            server_write,
            CancellationToken::new(),
        )
        .await;
    });

    Fixture {
        client: TestClient {
            write: client_write,
            read: BufReader::new(client_read),
            next_id: 0,
            notifications: Vec::new(),
        },
        calls,
    }
}

#[tokio::test]
async fn initialize_reports_protocol_and_capabilities() {
    let mut fx = start(|r| r, false).await;
    let response = fx.client.request("initialize", json!({})).await;
    assert_eq!(response["result"]["protocolVersion"], "2024-11-05");
    assert_eq!(
        response["result"]["capabilities"]["tools"]["listChanged"],
        true
    );
    assert_eq!(response["result"]["serverInfo"]["name"], "octomcp-test");
}

// Read-only + issues toolset leaves exactly the read-only issue tools.
#[tokio::test]
async fn tools_list_applies_filters() {
    let mut fx = start(|r| r.with_read_only(true).with_toolsets(&["issues"]), false).await;
    let response = fx.client.request("tools/list", json!({})).await;
    let names: Vec<&str> = response["result"]["tools"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["get_issue", "issue_comment_write"]);
}

#[tokio::test]
async fn call_through_deprecated_alias_reaches_canonical_handler() {
    let mut fx = start(|r| r, false).await;
    let response = fx
        .client
        .request(
            "tools/call",
            json!({"name": "add_issue_comment", "arguments": {"issue_number": 9}}),
        )
        .await;
    assert_eq!(response["result"]["content"][0]["text"], "handled #9");
    assert_eq!(fx.calls.load(Ordering::SeqCst), 1);

    // A second aliased call still resolves to the same canonical handler.
    fx.client
        .request(
            "tools/call",
            json!({"name": "add_issue_comment", "arguments": {"issue_number": 10}}),
        )
        .await;
    assert_eq!(fx.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn missing_required_parameter_is_a_tool_error_not_a_transport_error() {
    let mut fx = start(|r| r, false).await;
    let response = fx
        .client
        .request("tools/call", json!({"name": "get_issue", "arguments": {}}))
        .await;
    assert!(response.get("error").is_none());
    assert_eq!(response["result"]["isError"], true);
    let text = response["result"]["content"][0]["text"].as_str().unwrap();
    assert!(text.starts_with("missing required parameter: issue_number"));
    // The handler never ran.
    assert_eq!(fx.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unknown_tool_is_method_not_found_shaped() {
    let mut fx = start(|r| r, false).await;
    let response = fx
        .client
        .request("tools/call", json!({"name": "no_such_tool", "arguments": {}}))
        .await;
    assert_eq!(response["error"]["code"], -32601);
}

#[tokio::test]
async fn filtered_out_tool_cannot_be_called() {
    let mut fx = start(|r| r.with_read_only(true), false).await;
    let response = fx
        .client
        .request("tools/call", json!({"name": "create_issue", "arguments": {}}))
        .await;
    assert_eq!(response["error"]["code"], -32601);
}

#[tokio::test]
async fn internal_handler_failure_is_a_jsonrpc_error() {
    let mut fx = start(|r| r, false).await;
    let response = fx
        .client
        .request("tools/call", json!({"name": "broken_tool", "arguments": {}}))
        .await;
    assert_eq!(response["error"]["code"], -32603);
    assert!(
        response["error"]["message"]
            .as_str()
            .unwrap()
            .contains("serialization exploded")
    );
}

#[tokio::test]
async fn malformed_json_yields_parse_error_and_server_survives() {
    let mut fx = start(|r| r, false).await;
    fx.client.send_raw("{this is not json").await;
    let message = fx.client.next_message().await;
    assert_eq!(message["error"]["code"], -32700);
    assert_eq!(message["id"], Value::Null);

    // The server keeps serving.
    let response = fx.client.request("ping", json!({})).await;
    assert!(response.get("result").is_some());
}

#[tokio::test]
async fn missing_jsonrpc_version_is_invalid_request() {
    let mut fx = start(|r| r, false).await;
    fx.client
        .send_raw(r#"{"id": 5, "method": "tools/list"}"#)
        .await;
    let message = fx.client.next_message().await;
    assert_eq!(message["error"]["code"], -32600);
    assert_eq!(message["id"], 5);
}

#[tokio::test]
async fn unknown_method_is_method_not_found() {
    let mut fx = start(|r| r, false).await;
    let response = fx.client.request("bogus/method", json!({})).await;
    assert_eq!(response["error"]["code"], -32601);
}

#[tokio::test]
async fn client_notifications_get_no_response() {
    let mut fx = start(|r| r, false).await;
    fx.client.notify("notifications/initialized").await;
    // The next message on the wire is the ping response, not anything
    // triggered by the notification.
    let response = fx.client.request("ping", json!({})).await;
    assert!(response.get("result").is_some());
    assert!(fx.client.notifications.is_empty());
}

#[tokio::test]
async fn dynamic_mode_enables_toolsets_and_notifies() {
    let mut fx = start(
        |r| {
            r.with_toolsets(&[] as &[&str])
                .with_toolset_enabled("dynamic")
        },
        true,
    )
    .await;

    // Only the dynamic meta tools are visible at first.
    let response = fx.client.request("tools/list", json!({})).await;
    let names: Vec<&str> = response["result"]["tools"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        vec![
            "enable_toolset",
            "get_toolset_tools",
            "list_available_toolsets"
        ]
    );

    let response = fx
        .client
        .request(
            "tools/call",
            json!({"name": "enable_toolset", "arguments": {"toolset": "issues"}}),
        )
        .await;
    assert_eq!(
        response["result"]["content"][0]["text"],
        "enabled toolset issues"
    );

    // The list_changed notification was emitted before the response.
    assert!(
        fx.client
            .notifications
            .iter()
            .any(|n| n["method"] == "notifications/tools/list_changed")
    );

    let response = fx.client.request("tools/list", json!({})).await;
    let names: Vec<&str> = response["result"]["tools"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"get_issue"));
    assert!(names.contains(&"enable_toolset"));
}
