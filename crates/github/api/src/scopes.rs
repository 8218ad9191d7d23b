//! OAuth scope model: the fixed hierarchy, satisfaction, and comparison.
//!
//! GitHub's classic OAuth scopes form a partial order: holding a parent
//! scope implicitly grants its children (`repo` covers `public_repo`,
//! `admin:org` covers `write:org` covers `read:org`). Fine-grained tokens
//! expose no scope header and are reported as unknown rather than failing.

use crate::client::{ClientError, RestClient};
use octomcp_core::CallContext;
use std::collections::BTreeSet;

/// Parent scope → directly implied child scopes.
const HIERARCHY: &[(&str, &[&str])] = &[
    (
        "repo",
        &[
            "repo:status",
            "repo_deployment",
            "public_repo",
            "repo:invite",
            "security_events",
        ],
    ),
    ("admin:org", &["write:org"]),
    ("write:org", &["read:org"]),
    ("admin:public_key", &["write:public_key"]),
    ("write:public_key", &["read:public_key"]),
    ("admin:repo_hook", &["write:repo_hook"]),
    ("write:repo_hook", &["read:repo_hook"]),
    ("user", &["read:user", "user:email", "user:follow"]),
    ("write:packages", &["read:packages"]),
    ("write:discussion", &["read:discussion"]),
    ("project", &["read:project"]),
    ("admin:gpg_key", &["write:gpg_key"]),
    ("write:gpg_key", &["read:gpg_key"]),
];

fn children(scope: &str) -> &'static [&'static str] {
    HIERARCHY
        .iter()
        .find(|(parent, _)| *parent == scope)
        .map_or(&[], |(_, kids)| kids)
}

/// True when `held` equals `required` or is a (transitive) ancestor of it.
pub fn satisfies(held: &str, required: &str) -> bool {
    if held == required {
        return true;
    }
    children(held)
        .iter()
        .any(|child| satisfies(child, required))
}

/// True when `held` and `required` are the same scope or related in either
/// direction of the hierarchy.
fn related(a: &str, b: &str) -> bool {
    satisfies(a, b) || satisfies(b, a)
}

/// Every required scope must be satisfied by some held scope.
pub fn has_required_scopes<H, R>(held: &[H], required: &[R]) -> bool
where
    H: AsRef<str>,
    R: AsRef<str>,
{
    required
        .iter()
        .all(|r| held.iter().any(|h| satisfies(h.as_ref(), r.as_ref())))
}

/// Held-vs-required comparison for the CLI tooling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeComparison {
    /// Required scopes no held scope satisfies. Sorted.
    pub missing: Vec<String>,
    /// Held scopes unrelated to every required scope. Sorted.
    pub extra: Vec<String>,
    pub has_all: bool,
}

pub fn compare_scopes<H, R>(held: &[H], required: &[R]) -> ScopeComparison
where
    H: AsRef<str>,
    R: AsRef<str>,
{
    let missing: BTreeSet<String> = required
        .iter()
        .filter(|r| !held.iter().any(|h| satisfies(h.as_ref(), r.as_ref())))
        .map(|r| r.as_ref().to_string())
        .collect();

    let extra: BTreeSet<String> = held
        .iter()
        .filter(|h| !required.iter().any(|r| related(h.as_ref(), r.as_ref())))
        .map(|h| h.as_ref().to_string())
        .collect();

    ScopeComparison {
        has_all: missing.is_empty(),
        missing: missing.into_iter().collect(),
        extra: extra.into_iter().collect(),
    }
}

/// Fetch the scopes granted to the client's token.
///
/// Issues a lightweight authenticated request and reads the
/// `X-OAuth-Scopes` response header. Fine-grained tokens return no header
/// and yield `Ok(None)` — unknown, not an error.
pub async fn fetch_held_scopes(
    rest: &RestClient,
    ctx: &CallContext,
) -> Result<Option<Vec<String>>, ClientError> {
    let snapshot = rest.get(ctx, "", &[]).await?;
    let Some(header) = snapshot.header("x-oauth-scopes") else {
        return Ok(None);
    };
    let scopes: Vec<String> = header
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if scopes.is_empty() {
        return Ok(None);
    }
    Ok(Some(scopes))
}
