//! Resource templates and URI matching.
//!
//! Templates use a small subset of RFC 6570: `{var}` matches exactly one
//! path segment, and a trailing `{/var*}` swallows the rest of the path
//! (possibly empty). That covers the repository-content URIs this server
//! exposes without pulling in a full template engine.

use crate::tool::CallContext;
use futures::future::BoxFuture;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// One content block returned by `resources/read`.
#[derive(Debug, Clone, Serialize)]
pub struct ResourceContents {
    pub uri: String,
    #[serde(rename = "mimeType", skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blob: Option<String>,
}

/// A matched `resources/read` request: the literal URI plus the variables
/// bound by the template.
#[derive(Debug, Clone)]
pub struct ResourceRequest {
    pub uri: String,
    pub vars: BTreeMap<String, String>,
}

impl ResourceRequest {
    pub fn var(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }
}

pub type ResourceFuture = BoxFuture<'static, Result<Vec<ResourceContents>, anyhow::Error>>;
pub type ResourceFn = Arc<dyn Fn(CallContext, ResourceRequest) -> ResourceFuture + Send + Sync>;
pub type ResourceFactory<D> = Arc<dyn Fn(&D) -> ResourceFn + Send + Sync>;

/// A resource template exposed through `resources/templates/list`.
pub struct ResourceTemplate<D> {
    pub uri_template: String,
    pub name: String,
    pub description: String,
    pub mime_type: Option<String>,
    pub handler: ResourceFactory<D>,
}

impl<D> std::fmt::Debug for ResourceTemplate<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceTemplate")
            .field("uri_template", &self.uri_template)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl<D> Clone for ResourceTemplate<D> {
    fn clone(&self) -> Self {
        Self {
            uri_template: self.uri_template.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            mime_type: self.mime_type.clone(),
            handler: Arc::clone(&self.handler),
        }
    }
}

impl<D> ResourceTemplate<D> {
    pub fn new(
        uri_template: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        handler: impl Fn(&D) -> ResourceFn + Send + Sync + 'static,
    ) -> Self {
        Self {
            uri_template: uri_template.into(),
            name: name.into(),
            description: description.into(),
            mime_type: None,
            handler: Arc::new(handler),
        }
    }

    #[must_use]
    pub fn mime_type(mut self, mime: impl Into<String>) -> Self {
        self.mime_type = Some(mime.into());
        self
    }

    /// Match a literal URI against this template, binding variables.
    pub fn matches(&self, uri: &str) -> Option<BTreeMap<String, String>> {
        match_template(&self.uri_template, uri)
    }

    /// The `resources/templates/list` entry for this declaration.
    pub fn descriptor(&self) -> Value {
        serde_json::json!({
            "uriTemplate": self.uri_template,
            "name": self.name,
            "description": self.description,
            "mimeType": self.mime_type,
        })
    }
}

fn split_scheme(s: &str) -> Option<(&str, &str)> {
    s.split_once("://")
}

fn match_template(template: &str, uri: &str) -> Option<BTreeMap<String, String>> {
    let (t_scheme, t_rest) = split_scheme(template)?;
    let (u_scheme, u_rest) = split_scheme(uri)?;
    if t_scheme != u_scheme {
        return None;
    }

    // A trailing {/var*} captures the remaining path, slashes included.
    let (t_segments_part, rest_var) = match t_rest.find("{/") {
        Some(idx) => {
            let var = t_rest[idx + 2..].strip_suffix("*}")?;
            (&t_rest[..idx], Some(var))
        }
        None => (t_rest, None),
    };

    let mut vars = BTreeMap::new();
    let t_segments: Vec<&str> = t_segments_part.split('/').collect();
    let u_segments: Vec<&str> = u_rest.split('/').collect();
    if u_segments.len() < t_segments.len() {
        return None;
    }

    for (t_seg, u_seg) in t_segments.iter().zip(&u_segments) {
        if let Some(var) = t_seg.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            if u_seg.is_empty() {
                return None;
            }
            vars.insert(var.to_string(), (*u_seg).to_string());
        } else if t_seg != u_seg {
            return None;
        }
    }

    let remainder = &u_segments[t_segments.len()..];
    match rest_var {
        Some(var) => {
            vars.insert(var.to_string(), remainder.join("/"));
        }
        None if !remainder.is_empty() => return None,
        None => {}
    }
    Some(vars)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_fixed_and_variable_segments() {
        let vars = match_template(
            "repo://{owner}/{repo}/contents{/path*}",
            "repo://acme/widget/contents/src/main.rs",
        )
        .unwrap();
        assert_eq!(vars["owner"], "acme");
        assert_eq!(vars["repo"], "widget");
        assert_eq!(vars["path"], "src/main.rs");
    }

    #[test]
    fn rest_variable_may_be_empty() {
        let vars = match_template(
            "repo://{owner}/{repo}/contents{/path*}",
            "repo://acme/widget/contents",
        )
        .unwrap();
        assert_eq!(vars["path"], "");
    }

    #[test]
    fn branch_template_binds_branch() {
        let vars = match_template(
            "repo://{owner}/{repo}/refs/heads/{branch}/contents{/path*}",
            "repo://acme/widget/refs/heads/main/contents/README.md",
        )
        .unwrap();
        assert_eq!(vars["branch"], "main");
        assert_eq!(vars["path"], "README.md");
    }

    #[test]
    fn mismatched_literal_segment_fails() {
        assert!(match_template("repo://{owner}/{repo}/contents{/path*}", "repo://acme/widget/issues").is_none());
        assert!(match_template("repo://{owner}/{repo}/contents{/path*}", "gist://acme/widget/contents").is_none());
    }

    #[test]
    fn too_short_uri_fails() {
        assert!(match_template("repo://{owner}/{repo}/contents{/path*}", "repo://acme").is_none());
    }
}
