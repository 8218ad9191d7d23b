//! The line-delimited stdio framer.
//!
//! One task reads stdin line by line and spawns a task per request; one
//! task owns the write side and serializes every response and notification
//! onto stdout, so concurrent completions never interleave bytes. Responses
//! go out in completion order; the JSON-RPC id correlates them. EOF on
//! stdin cancels the root token, which aborts all in-flight handlers.

use crate::dispatch::{Dispatcher, Notifier};
use crate::jsonrpc::{FramingError, Incoming, Outgoing, Response, code, parse_line};
use octomcp_core::CallContext;
use serde_json::Value;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

const OUTBOUND_BUFFER: usize = 64;

/// Serve over arbitrary transports. Tests drive this with an in-memory
/// duplex; production uses [`serve_stdio`].
pub async fn serve<D, R, W>(
    dispatcher: Arc<Dispatcher<D>>,
    notifier: Notifier,
    reader: R,
    writer: W,
    shutdown: CancellationToken,
) -> anyhow::Result<()>
where
    D: Send + Sync + 'static,
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel::<Outgoing>(OUTBOUND_BUFFER);
    notifier.install(tx.clone());
    let writer_task = tokio::spawn(write_loop(writer, rx));

    let mut lines = BufReader::new(reader).lines();
    loop {
        let line = tokio::select! {
            () = shutdown.cancelled() => break,
            line = lines.next_line() => line?,
        };
        let Some(line) = line else {
            // EOF: the client went away.
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        match parse_line(&line) {
            Ok(Incoming::Request(req)) => {
                let dispatcher = Arc::clone(&dispatcher);
                let tx = tx.clone();
                let ctx = CallContext::new(shutdown.child_token());
                tokio::spawn(async move {
                    let response = dispatcher.handle(req, ctx).await;
                    let _ = tx.send(Outgoing::Response(response)).await;
                });
            }
            Ok(Incoming::Notification { method, params }) => {
                dispatcher.handle_notification(&method, &params);
            }
            Ok(Incoming::Response { id }) => {
                tracing::debug!(?id, "skipping unexpected response message");
            }
            Err(FramingError::Parse(e)) => {
                tracing::warn!(error = %e, "discarding unparseable line");
                let _ = tx
                    .send(Outgoing::Response(Response::error(
                        Value::Null,
                        code::PARSE_ERROR,
                        "parse error",
                    )))
                    .await;
            }
            Err(FramingError::InvalidRequest { id, reason }) => {
                let _ = tx
                    .send(Outgoing::Response(Response::error(
                        id,
                        code::INVALID_REQUEST,
                        reason,
                    )))
                    .await;
            }
        }
    }

    // Abort in-flight handlers, then let the writer drain.
    shutdown.cancel();
    drop(tx);
    writer_task.await??;
    Ok(())
}

async fn write_loop<W: AsyncWrite + Unpin>(
    mut writer: W,
    mut rx: mpsc::Receiver<Outgoing>,
) -> anyhow::Result<()> {
    while let Some(message) = rx.recv().await {
        let mut line = serde_json::to_string(&message)?;
        line.push('\n');
        writer.write_all(line.as_bytes()).await?;
        writer.flush().await?;
    }
    Ok(())
}

/// Serve over stdin/stdout until the client disconnects.
pub async fn serve_stdio<D: Send + Sync + 'static>(
    dispatcher: Arc<Dispatcher<D>>,
    notifier: Notifier,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    serve(
        dispatcher,
        notifier,
        tokio::io::stdin(),
        tokio::io::stdout(),
        shutdown,
    )
    .await
}
