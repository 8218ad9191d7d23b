//! Repository-content resource templates.

use crate::FLAG_LOCKDOWN;
use anyhow::bail;
use octomcp_core::resource::{ResourceContents, ResourceFn, ResourceTemplate};
use octomcp_github::cache::viewer_can_push;
use octomcp_github::GitHubDeps;
use std::sync::Arc;

const RAW_CONTENT_ACCEPT: &str = "application/vnd.github.raw+json";

pub fn templates() -> Vec<ResourceTemplate<GitHubDeps>> {
    vec![
        ResourceTemplate::new(
            "repo://{owner}/{repo}/contents{/path*}",
            "Repository content",
            "File or directory content at the default branch",
            content_handler(None),
        )
        .mime_type("text/plain"),
        ResourceTemplate::new(
            "repo://{owner}/{repo}/refs/heads/{branch}/contents{/path*}",
            "Repository content (branch)",
            "File or directory content at a branch",
            content_handler(Some("branch")),
        )
        .mime_type("text/plain"),
    ]
}

/// Shared read handler; `ref_var` names the template variable carrying the
/// ref, when the template has one.
fn content_handler(
    ref_var: Option<&'static str>,
) -> impl Fn(&GitHubDeps) -> ResourceFn + Send + Sync + 'static {
    move |deps: &GitHubDeps| {
        let deps = deps.clone();
        let handler: ResourceFn = Arc::new(move |ctx, request| {
            let deps = deps.clone();
            Box::pin(async move {
                let Some(owner) = request.var("owner").map(str::to_string) else {
                    bail!("resource uri is missing the owner segment");
                };
                let Some(repo) = request.var("repo").map(str::to_string) else {
                    bail!("resource uri is missing the repo segment");
                };
                let path = request.var("path").unwrap_or_default().to_string();

                let clients = deps.clients_for(&owner, &repo);
                if deps.flag_enabled(FLAG_LOCKDOWN)
                    && !viewer_can_push(&clients, deps.cache(), &ctx, &owner, &repo).await?
                {
                    bail!(
                        "content lockdown is enabled and the viewer cannot push to {owner}/{repo}"
                    );
                }

                let mut url = format!("repos/{owner}/{repo}/contents/{path}");
                if let Some(var) = ref_var
                    && let Some(git_ref) = request.var(var)
                {
                    url.push_str(&format!("?ref={git_ref}"));
                }

                let resp = clients.raw.get(&ctx, &url, RAW_CONTENT_ACCEPT).await?;
                if !resp.ok() {
                    bail!(
                        "failed to read {}: {} (status {})",
                        request.uri,
                        resp.message(),
                        resp.status
                    );
                }
                Ok(vec![ResourceContents {
                    uri: request.uri,
                    mime_type: Some("text/plain".to_string()),
                    text: Some(resp.body),
                    blob: None,
                }])
            })
        });
        handler
    }
}
