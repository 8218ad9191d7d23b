//! Line-delimited JSON-RPC 2.0 server over stdio.
//!
//! The framer owns the byte streams: a single-threaded read loop spawns a
//! task per request, and a single writer task serializes responses and
//! server-originated notifications. The [`Dispatcher`] routes MCP methods
//! through per-request views of the shared registry.

pub mod dispatch;
pub mod dynamic;
pub mod framer;
pub mod jsonrpc;

pub use dispatch::{Dispatcher, Notifier, ServerInfo, SharedRegistry};
pub use dynamic::{DYNAMIC_TOOLSET_ID, dynamic_tool_declarations, dynamic_toolset_meta};
pub use framer::{serve, serve_stdio};
pub use jsonrpc::PROTOCOL_VERSION;
