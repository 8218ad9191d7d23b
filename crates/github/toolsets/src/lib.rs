//! The GitHub tool catalog.
//!
//! Each tool is a thin wrapper over one GitHub endpoint; the interesting
//! machinery (filtering, dispatch, account routing, error taxonomy) lives in
//! the framework crates. [`default_registry`] assembles the full catalog:
//! toolset metadata, every declaration, the deprecated-alias table, resource
//! templates, and prompts.

use octomcp_core::{Registry, RegistryError, ToolsetMeta};
use octomcp_github::GitHubDeps;

pub mod context;
pub mod discussions;
pub mod experiments;
pub mod issues;
pub mod prompts;
pub mod pulls;
pub mod repos;
pub mod resources;
pub mod users;

pub const TOOLSET_CONTEXT: &str = "context";
pub const TOOLSET_REPOS: &str = "repos";
pub const TOOLSET_ISSUES: &str = "issues";
pub const TOOLSET_PULL_REQUESTS: &str = "pull_requests";
pub const TOOLSET_DISCUSSIONS: &str = "discussions";
pub const TOOLSET_USERS: &str = "users";
pub const TOOLSET_EXPERIMENTS: &str = "experiments";

/// Feature flag gating content lockdown checks.
pub const FLAG_LOCKDOWN: &str = "lockdown";

/// Return a validation-error tool result on failed argument extraction.
macro_rules! require {
    ($expr:expr) => {
        match $expr {
            Ok(value) => value,
            Err(e) => return Ok(octomcp_github::validation_error_result(e.to_string())),
        }
    };
}
pub(crate) use require;

pub fn toolset_metadata() -> Vec<ToolsetMeta> {
    vec![
        ToolsetMeta::new(TOOLSET_CONTEXT, "Current user and authentication context")
            .default_enabled()
            .icon("person"),
        ToolsetMeta::new(TOOLSET_REPOS, "Repository contents, branches, and commits")
            .default_enabled()
            .icon("repo"),
        ToolsetMeta::new(TOOLSET_ISSUES, "Issues and issue comments")
            .default_enabled()
            .icon("issue-opened"),
        ToolsetMeta::new(TOOLSET_PULL_REQUESTS, "Pull requests and reviews")
            .default_enabled()
            .icon("git-pull-request"),
        ToolsetMeta::new(TOOLSET_DISCUSSIONS, "Repository discussions")
            .default_enabled()
            .icon("comment-discussion"),
        ToolsetMeta::new(TOOLSET_USERS, "User search")
            .default_enabled()
            .icon("people"),
        ToolsetMeta::new(TOOLSET_EXPERIMENTS, "Preview-API tools, off by default")
            .icon("beaker"),
    ]
}

/// Old tool name → canonical replacement.
pub fn deprecated_aliases() -> Vec<(&'static str, &'static str)> {
    vec![
        ("create_issue_comment", "add_issue_comment"),
        ("get_pull_request_patch", "get_pull_request_diff"),
    ]
}

/// The complete catalog as an unfiltered registry. Front-ends layer
/// read-only, toolset, tool, and feature-flag views on top.
pub fn default_registry() -> Result<Registry<GitHubDeps>, RegistryError> {
    default_registry_builder().build()
}

/// The catalog as a builder, for front-ends that add declarations (e.g.
/// the dynamic-toolset meta tools) before building.
pub fn default_registry_builder() -> octomcp_core::registry::RegistryBuilder<GitHubDeps> {
    let mut builder = Registry::builder();
    for meta in toolset_metadata() {
        builder = builder.toolset(meta);
    }
    builder = builder
        .tools(context::declarations())
        .tools(repos::declarations())
        .tools(issues::declarations())
        .tools(pulls::declarations())
        .tools(discussions::declarations())
        .tools(users::declarations())
        .tools(experiments::declarations());
    for (old, new) in deprecated_aliases() {
        builder = builder.alias(old, new);
    }
    for template in resources::templates() {
        builder = builder.resource_template(template);
    }
    builder = builder.prompt(prompts::issue_triage());
    builder
}
