//! GitHub host resolution.
//!
//! github.com and api.github.com both resolve to the public API endpoints.
//! Any other host is treated as a GitHub Enterprise Server installation and
//! gets `/api/v3` (REST) and `/api/graphql` appended.

use thiserror::Error;
use url::Url;

pub const PUBLIC_API: &str = "https://api.github.com";

#[derive(Error, Debug)]
pub enum HostError {
    #[error("invalid GitHub host {host}: {source}")]
    Invalid {
        host: String,
        #[source]
        source: url::ParseError,
    },

    #[error("GitHub host {0} has no host component")]
    NoHost(String),
}

/// Resolved REST and GraphQL endpoints for a GitHub host.
#[derive(Debug, Clone)]
pub struct ApiHost {
    rest_base: Url,
    graphql: Url,
}

impl ApiHost {
    /// Resolve a user-supplied host URL into concrete API endpoints.
    pub fn resolve(raw: &str) -> Result<Self, HostError> {
        let url = Url::parse(raw.trim_end_matches('/')).map_err(|source| HostError::Invalid {
            host: raw.to_string(),
            source,
        })?;
        let host = url
            .host_str()
            .ok_or_else(|| HostError::NoHost(raw.to_string()))?;

        let (rest, graphql) = if host == "github.com" || host.ends_with(".github.com") {
            (
                format!("{PUBLIC_API}/"),
                format!("{PUBLIC_API}/graphql"),
            )
        } else {
            let scheme = url.scheme();
            let authority = match url.port() {
                Some(port) => format!("{host}:{port}"),
                None => host.to_string(),
            };
            (
                format!("{scheme}://{authority}/api/v3/"),
                format!("{scheme}://{authority}/api/graphql"),
            )
        };

        Ok(Self {
            rest_base: Url::parse(&rest).map_err(|source| HostError::Invalid {
                host: rest.clone(),
                source,
            })?,
            graphql: Url::parse(&graphql).map_err(|source| HostError::Invalid {
                host: graphql.clone(),
                source,
            })?,
        })
    }

    /// Construct from explicit endpoints. Used by tests pointing at a mock
    /// server.
    pub fn with_endpoints(rest_base: Url, graphql: Url) -> Self {
        let mut rest_base = rest_base;
        if !rest_base.path().ends_with('/') {
            rest_base.set_path(&format!("{}/", rest_base.path()));
        }
        Self { rest_base, graphql }
    }

    /// Base URL for REST requests, with a trailing slash so relative paths
    /// join cleanly.
    pub fn rest_base(&self) -> &Url {
        &self.rest_base
    }

    pub fn graphql(&self) -> &Url {
        &self.graphql
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_hosts_map_to_api_subdomain() {
        for raw in ["https://github.com", "https://api.github.com", "https://api.github.com/"] {
            let host = ApiHost::resolve(raw).unwrap();
            assert_eq!(host.rest_base().as_str(), "https://api.github.com/");
            assert_eq!(host.graphql().as_str(), "https://api.github.com/graphql");
        }
    }

    #[test]
    fn enterprise_host_gets_api_v3() {
        let host = ApiHost::resolve("https://github.mycorp.com").unwrap();
        assert_eq!(host.rest_base().as_str(), "https://github.mycorp.com/api/v3/");
        assert_eq!(
            host.graphql().as_str(),
            "https://github.mycorp.com/api/graphql"
        );
    }

    #[test]
    fn enterprise_host_keeps_port() {
        let host = ApiHost::resolve("http://ghe.local:8443").unwrap();
        assert_eq!(host.rest_base().as_str(), "http://ghe.local:8443/api/v3/");
    }

    #[test]
    fn garbage_host_is_an_error() {
        assert!(ApiHost::resolve("not a url").is_err());
    }

    #[test]
    fn rest_paths_join_relative() {
        let host = ApiHost::resolve("https://github.mycorp.com").unwrap();
        let joined = host.rest_base().join("repos/acme/widget").unwrap();
        assert_eq!(
            joined.as_str(),
            "https://github.mycorp.com/api/v3/repos/acme/widget"
        );
    }
}
