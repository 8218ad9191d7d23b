//! The dependency bundle handed to tool handler generators.

use crate::accounts::Account;
use crate::cache::RepoAccessCache;
use crate::client::{ApiClients, ClientError, build_http_client};
use crate::host::ApiHost;
use crate::router::AccountRouter;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Everything a GitHub tool handler can reach: the account router, the
/// resolved host, the repo-access cache, enabled feature flags, and the
/// content window for log truncation.
///
/// The bundle itself is cheap to clone and lives for the process; the
/// [`ApiClients`] it hands out are constructed per dispatch, bound to
/// whichever account the router selects.
#[derive(Clone)]
pub struct GitHubDeps {
    router: Arc<AccountRouter>,
    host: ApiHost,
    cache: Arc<RepoAccessCache>,
    flags: Arc<BTreeSet<String>>,
    content_window: usize,
    http: reqwest::Client,
}

impl GitHubDeps {
    pub fn new(
        router: Arc<AccountRouter>,
        host: ApiHost,
        cache: Arc<RepoAccessCache>,
        flags: BTreeSet<String>,
        content_window: usize,
    ) -> Result<Self, ClientError> {
        let http = build_http_client(concat!("octomcp/", env!("CARGO_PKG_VERSION")))?;
        Ok(Self {
            router,
            host,
            cache,
            flags: Arc::new(flags),
            content_window,
            http,
        })
    }

    /// Clients authorized for the account that owns `owner/repo`.
    pub fn clients_for(&self, owner: &str, repo: &str) -> ApiClients {
        let account = self.router.select(owner, repo);
        ApiClients::new(&self.http, &self.host, &account.token)
    }

    /// Clients for requests with no repository context (viewer queries,
    /// scope inspection).
    pub fn clients(&self) -> ApiClients {
        ApiClients::new(&self.http, &self.host, &self.router.fallback().token)
    }

    pub fn clients_for_account(&self, account: &Account) -> ApiClients {
        ApiClients::new(&self.http, &self.host, &account.token)
    }

    pub fn router(&self) -> &AccountRouter {
        &self.router
    }

    pub fn cache(&self) -> &RepoAccessCache {
        &self.cache
    }

    pub fn flag_enabled(&self, name: &str) -> bool {
        self.flags.contains(name)
    }

    pub fn flags(&self) -> &BTreeSet<String> {
        &self.flags
    }

    pub fn content_window(&self) -> usize {
        self.content_window
    }
}
