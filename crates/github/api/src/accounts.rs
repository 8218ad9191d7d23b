//! Account configuration: the accounts file, validation, and token
//! expansion.
//!
//! The accounts file is a JSON document:
//!
//! ```json
//! {
//!   "accounts": [
//!     {
//!       "name": "work",
//!       "token": "${WORK_GITHUB_TOKEN}",
//!       "matcher": { "type": "org", "values": ["acme"] },
//!       "default": false
//!     }
//!   ]
//! }
//! ```
//!
//! `${NAME}` references in tokens are expanded exactly once, at load.

use secrecy::SecretString;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read accounts file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse accounts file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("accounts file declares no accounts")]
    NoAccounts,

    #[error("account #{0} has an empty name")]
    EmptyName(usize),

    #[error("account {0} has an empty token")]
    EmptyToken(String),

    #[error("account {0} uses a {1} matcher but declares no values")]
    MissingMatcherValues(String, &'static str),

    #[error("accounts {0} and {1} both carry the default flag")]
    MultipleDefaults(String, String),
}

/// How an account claims ownership of an `owner/repo` pair.
#[derive(Debug, Clone)]
pub enum Matcher {
    /// Owner equals one of the names, case-insensitive.
    Org(Vec<String>),
    /// `owner/repo` matches one of the glob patterns (`*` is unrestricted).
    RepoPattern(Vec<String>),
    /// Always matches.
    All,
}

/// A configured credential plus its matcher.
#[derive(Debug, Clone)]
pub struct Account {
    pub name: String,
    pub token: SecretString,
    pub matcher: Matcher,
    pub default: bool,
}

#[derive(Debug, Deserialize)]
struct AccountsFile {
    accounts: Vec<AccountEntry>,
}

#[derive(Debug, Deserialize)]
struct AccountEntry {
    name: String,
    token: String,
    matcher: MatcherEntry,
    #[serde(default)]
    default: bool,
}

#[derive(Debug, Deserialize)]
struct MatcherEntry {
    #[serde(rename = "type")]
    kind: MatcherKind,
    #[serde(default)]
    values: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum MatcherKind {
    Org,
    RepoPattern,
    All,
}

/// Load and validate an accounts file, expanding `${NAME}` token
/// references from the process environment.
pub fn load_accounts_file(path: &Path) -> Result<Vec<Account>, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    parse_accounts(&raw, |name| std::env::var(name).ok())
}

/// Parse an accounts document with an injectable environment lookup.
pub fn parse_accounts(
    raw: &str,
    env: impl Fn(&str) -> Option<String>,
) -> Result<Vec<Account>, ConfigError> {
    let file: AccountsFile = serde_json::from_str(raw)?;
    if file.accounts.is_empty() {
        return Err(ConfigError::NoAccounts);
    }

    let mut accounts = Vec::with_capacity(file.accounts.len());
    let mut default_seen: Option<String> = None;
    for (i, entry) in file.accounts.into_iter().enumerate() {
        if entry.name.trim().is_empty() {
            return Err(ConfigError::EmptyName(i));
        }
        let token = expand_token(&entry.token, &env);
        if token.trim().is_empty() {
            return Err(ConfigError::EmptyToken(entry.name));
        }
        let matcher = match entry.matcher.kind {
            MatcherKind::All => Matcher::All,
            MatcherKind::Org => {
                if entry.matcher.values.is_empty() {
                    return Err(ConfigError::MissingMatcherValues(entry.name, "org"));
                }
                Matcher::Org(entry.matcher.values)
            }
            MatcherKind::RepoPattern => {
                if entry.matcher.values.is_empty() {
                    return Err(ConfigError::MissingMatcherValues(entry.name, "repo_pattern"));
                }
                Matcher::RepoPattern(entry.matcher.values)
            }
        };
        if entry.default {
            if let Some(first) = &default_seen {
                return Err(ConfigError::MultipleDefaults(
                    first.clone(),
                    entry.name.clone(),
                ));
            }
            default_seen = Some(entry.name.clone());
        }
        accounts.push(Account {
            name: entry.name,
            token: SecretString::from(token),
            matcher,
            default: entry.default,
        });
    }
    Ok(accounts)
}

/// The single-account configuration a bare personal access token implies.
pub fn single_token_account(token: SecretString) -> Vec<Account> {
    vec![Account {
        name: "default".to_string(),
        token,
        matcher: Matcher::All,
        default: true,
    }]
}

fn expand_token(raw: &str, env: impl Fn(&str) -> Option<String>) -> String {
    shellexpand::env_with_context_no_errors(raw, |name| env(name)).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    const SAMPLE: &str = r#"{
        "accounts": [
            {
                "name": "work",
                "token": "${WORK_TOKEN}",
                "matcher": { "type": "org", "values": ["acme"] }
            },
            {
                "name": "personal",
                "token": "ghp_plain",
                "matcher": { "type": "all" },
                "default": true
            }
        ]
    }"#;

    fn fake_env(name: &str) -> Option<String> {
        (name == "WORK_TOKEN").then(|| "ghp_expanded".to_string())
    }

    #[test]
    fn parses_and_expands_tokens() {
        let accounts = parse_accounts(SAMPLE, fake_env).unwrap();
        assert_eq!(accounts.len(), 2);
        assert_eq!(accounts[0].token.expose_secret(), "ghp_expanded");
        assert_eq!(accounts[1].token.expose_secret(), "ghp_plain");
        assert!(accounts[1].default);
        assert!(matches!(accounts[0].matcher, Matcher::Org(_)));
    }

    #[test]
    fn unresolved_reference_is_left_verbatim_then_rejected_if_empty() {
        // A reference to an unset variable stays in place; it is not an
        // empty token, so validation accepts it and the API call will fail
        // loudly instead.
        let raw = r#"{"accounts":[{"name":"a","token":"${UNSET_VAR}","matcher":{"type":"all"}}]}"#;
        let accounts = parse_accounts(raw, |_| None).unwrap();
        assert_eq!(accounts[0].token.expose_secret(), "${UNSET_VAR}");
    }

    #[test]
    fn empty_accounts_list_is_rejected() {
        let err = parse_accounts(r#"{"accounts":[]}"#, fake_env).unwrap_err();
        assert!(matches!(err, ConfigError::NoAccounts));
    }

    #[test]
    fn empty_token_is_rejected() {
        let raw = r#"{"accounts":[{"name":"a","token":"","matcher":{"type":"all"}}]}"#;
        let err = parse_accounts(raw, fake_env).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyToken(name) if name == "a"));
    }

    #[test]
    fn org_matcher_without_values_is_rejected() {
        let raw = r#"{"accounts":[{"name":"a","token":"t","matcher":{"type":"org"}}]}"#;
        let err = parse_accounts(raw, fake_env).unwrap_err();
        assert!(matches!(err, ConfigError::MissingMatcherValues(_, "org")));
    }

    #[test]
    fn two_defaults_are_rejected() {
        let raw = r#"{"accounts":[
            {"name":"a","token":"t","matcher":{"type":"all"},"default":true},
            {"name":"b","token":"t","matcher":{"type":"all"},"default":true}
        ]}"#;
        let err = parse_accounts(raw, fake_env).unwrap_err();
        assert!(matches!(err, ConfigError::MultipleDefaults(a, b) if a == "a" && b == "b"));
    }

    #[test]
    fn load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("accounts.json");
        std::fs::write(&path, r#"{"accounts":[{"name":"a","token":"t","matcher":{"type":"all"}}]}"#)
            .unwrap();
        let accounts = load_accounts_file(&path).unwrap();
        assert_eq!(accounts[0].name, "a");
    }
}
