//! Protocol-generic tool catalog: declarations, input schemas, and the
//! immutable filtered [`Registry`].
//!
//! This crate knows nothing about GitHub. Tools are declared as data (name,
//! schema, toolset, hints) plus a handler *generator* that receives a
//! dependency bundle and returns the invocation-ready callable. The registry
//! is built once and only ever transformed into narrower views, which makes
//! it safe to share across concurrently dispatched requests without locking.

pub mod error;
pub mod prompt;
pub mod registry;
pub mod resource;
pub mod result;
pub mod schema;
pub mod tool;
pub mod toolset;

pub use error::RegistryError;
pub use prompt::{GetPromptResult, PromptArgument, PromptDeclaration, PromptMessage};
pub use registry::{FeatureChecker, Registry, RegistryBuilder};
pub use resource::{ResourceContents, ResourceRequest, ResourceTemplate};
pub use result::{CallToolResult, Content};
pub use schema::{InputSchema, ParamError, ParamType};
pub use tool::{CallContext, HandlerFactory, ToolDeclaration, ToolFn, ToolFuture};
pub use toolset::ToolsetMeta;
