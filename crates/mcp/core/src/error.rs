//! Registry construction errors.

use thiserror::Error;

/// Fatal configuration errors raised while building a registry.
///
/// These abort startup: a catalog with duplicate names or dangling toolset
/// references would make dispatch ambiguous.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// Two tool declarations share a name.
    #[error("duplicate tool name: {0}")]
    DuplicateTool(String),

    /// Two toolsets share an id.
    #[error("duplicate toolset id: {0}")]
    DuplicateToolset(String),

    /// A tool references a toolset that was never declared.
    #[error("tool {tool} references undeclared toolset {toolset}")]
    UndeclaredToolset { tool: String, toolset: String },

    /// A deprecated alias points at a tool that does not exist.
    #[error("alias {alias} points at unknown tool {target}")]
    DanglingAlias { alias: String, target: String },

    /// Two prompts share a name.
    #[error("duplicate prompt name: {0}")]
    DuplicatePrompt(String),

    /// Two resource templates share a URI template.
    #[error("duplicate resource template: {0}")]
    DuplicateResourceTemplate(String),
}
