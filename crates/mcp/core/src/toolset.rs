//! Toolset metadata.

use serde::Serialize;

/// Identity of a logical grouping of tools.
///
/// Immutable once declared; tools reference a toolset by id. Toolsets with
/// the `default` flag participate in the implicit `default` selection.
#[derive(Debug, Clone, Serialize)]
pub struct ToolsetMeta {
    /// Stable unique id, e.g. `issues`.
    pub id: String,
    /// Human description shown in listings.
    pub description: String,
    /// Whether this toolset is part of the implicit default set.
    pub default: bool,
    /// Display icon token for generated documentation.
    pub icon: String,
}

impl ToolsetMeta {
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            default: false,
            icon: String::new(),
        }
    }

    /// Mark this toolset as part of the implicit default set.
    #[must_use]
    pub fn default_enabled(mut self) -> Self {
        self.default = true;
        self
    }

    #[must_use]
    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }
}
