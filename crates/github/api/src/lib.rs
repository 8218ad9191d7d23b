//! GitHub-facing half of the server: account configuration and routing,
//! host resolution, the per-dispatch API client bundle, the typed error
//! taxonomy, the OAuth scope model, and the repo-access cache.

pub mod accounts;
pub mod cache;
pub mod client;
pub mod deps;
pub mod errors;
pub mod host;
pub mod router;
pub mod scopes;

pub use accounts::{Account, ConfigError, Matcher, load_accounts_file, single_token_account};
pub use cache::RepoAccessCache;
pub use client::{ApiClients, ClientError, GraphqlClient, HttpSnapshot, RawClient, RestClient};
pub use deps::GitHubDeps;
pub use errors::{
    ApiError, ErrorKind, GraphqlError, RawApiError, ValidationError, api_error_result,
    graphql_error_result, raw_api_error_result, validation_error_result,
};
pub use host::ApiHost;
pub use router::AccountRouter;
pub use scopes::{ScopeComparison, compare_scopes, has_required_scopes};
