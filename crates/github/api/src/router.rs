//! Multi-account router: selects which credential owns an `owner/repo`.

use crate::accounts::{Account, Matcher};

/// Read-only after construction; safe to share across dispatches without
/// locking.
#[derive(Debug, Clone)]
pub struct AccountRouter {
    accounts: Vec<Account>,
}

impl AccountRouter {
    /// Accounts are kept in declaration order; the caller has already
    /// validated them (non-empty, at most one default).
    pub fn new(accounts: Vec<Account>) -> Self {
        Self { accounts }
    }

    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    /// First matcher hit in declaration order wins; otherwise the default
    /// account; otherwise the first. Total for any validated configuration.
    pub fn select(&self, owner: &str, repo: &str) -> &Account {
        self.accounts
            .iter()
            .find(|a| matches(&a.matcher, owner, repo))
            .or_else(|| self.accounts.iter().find(|a| a.default))
            .unwrap_or(&self.accounts[0])
    }

    /// The account used when no repository context exists (e.g. `get_me`,
    /// scope inspection): the default account, else the first.
    pub fn fallback(&self) -> &Account {
        self.accounts
            .iter()
            .find(|a| a.default)
            .unwrap_or(&self.accounts[0])
    }
}

fn matches(matcher: &Matcher, owner: &str, repo: &str) -> bool {
    match matcher {
        Matcher::All => true,
        Matcher::Org(orgs) => orgs.iter().any(|o| o.eq_ignore_ascii_case(owner)),
        Matcher::RepoPattern(patterns) => {
            let full = format!("{owner}/{repo}");
            patterns.iter().any(|p| wildcard_match(p, &full))
        }
    }
}

/// Anchored, case-insensitive match where `*` spans any run of characters.
fn wildcard_match(pattern: &str, input: &str) -> bool {
    let p: Vec<char> = pattern.to_lowercase().chars().collect();
    let s: Vec<char> = input.to_lowercase().chars().collect();

    // Iterative backtracking over the most recent star.
    let (mut pi, mut si) = (0usize, 0usize);
    let mut star: Option<(usize, usize)> = None;
    while si < s.len() {
        if pi < p.len() && (p[pi] == s[si]) {
            pi += 1;
            si += 1;
        } else if pi < p.len() && p[pi] == '*' {
            star = Some((pi, si));
            pi += 1;
        } else if let Some((star_pi, star_si)) = star {
            pi = star_pi + 1;
            si = star_si + 1;
            star = Some((star_pi, star_si + 1));
        } else {
            return false;
        }
    }
    while pi < p.len() && p[pi] == '*' {
        pi += 1;
    }
    pi == p.len()
}
