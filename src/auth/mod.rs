//
//  bb-cloud
//  auth/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Authentication Module
//!
//! Decides which bearer token the CLI sends, and where it came from.
//!
//! ## Token Resolution
//!
//! The first match wins:
//!
//! 1. `BB_TOKEN`
//! 2. `BITBUCKET_TOKEN`
//! 3. The system keyring entry for the host's active user. The user comes from
//!    `BB_USERNAME` or, failing that, `hosts.yml`.
//!
//! Empty environment values are ignored.
//!
//! ## Module Structure
//!
//! - [`keyring`]: Secure credential storage using system keyring
//! - [`token`]: Reading, validating and verifying tokens
//!
//! ## Example
//!
//! ```rust,no_run
//! use bb_cloud::auth::{resolve_token, KeyringStore};
//! use bb_cloud::config::{HostsConfig, BITBUCKET_CLOUD};
//!
//! # fn demo() -> anyhow::Result<()> {
//! let hosts = HostsConfig::load()?;
//! if let Some(resolved) = resolve_token(BITBUCKET_CLOUD, &hosts, &KeyringStore::new())? {
//!     println!("Using token from {}", resolved.source);
//! }
//! # Ok(())
//! # }
//! ```

mod keyring;
mod token;

pub use keyring::*;
pub use token::*;

use std::fmt;

use anyhow::Result;

use crate::config::HostsConfig;

/// Environment variables checked for a token, in order.
pub const ENV_TOKEN_VARS: &[&str] = &["BB_TOKEN", "BITBUCKET_TOKEN"];

/// Environment variable that overrides the active user from `hosts.yml`.
pub const ENV_USERNAME: &str = "BB_USERNAME";

/// Somewhere tokens can be kept between runs.
pub trait CredentialStore {
    fn store(&self, host: &str, user: &str, token: &str) -> Result<()>;

    /// Returns `None` when nothing is stored for the account.
    fn get(&self, host: &str, user: &str) -> Result<Option<String>>;

    /// Succeeds when nothing is stored for the account.
    fn delete(&self, host: &str, user: &str) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenSource {
    /// An environment variable, by name.
    Env(&'static str),
    /// The keyring entry for this user.
    Keyring { user: String },
}

impl fmt::Display for TokenSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenSource::Env(name) => write!(f, "{}", name),
            TokenSource::Keyring { user } => write!(f, "keyring ({})", user),
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedToken {
    pub token: String,
    pub source: TokenSource,
}

impl fmt::Debug for ResolvedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedToken")
            .field("token", &"<redacted>")
            .field("source", &self.source)
            .finish()
    }
}

/// Returns the first non-empty token from [`ENV_TOKEN_VARS`].
pub fn env_token_from<F>(lookup: F) -> Option<ResolvedToken>
where
    F: Fn(&str) -> Option<String>,
{
    ENV_TOKEN_VARS.iter().find_map(|&name| {
        lookup(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(|token| ResolvedToken {
                token,
                source: TokenSource::Env(name),
            })
    })
}

/// Returns the account to use for `host`: `BB_USERNAME`, else the active user.
pub fn active_user_from<F>(lookup: F, host: &str, hosts: &HostsConfig) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(ENV_USERNAME)
        .filter(|v| !v.is_empty())
        .or_else(|| hosts.active_user(host).map(str::to_string))
}

/// Resolves a token for `host` using the process environment.
pub fn resolve_token(
    host: &str,
    hosts: &HostsConfig,
    store: &dyn CredentialStore,
) -> Result<Option<ResolvedToken>> {
    resolve_token_from(|key| std::env::var(key).ok(), host, hosts, store)
}

/// Resolves a token for `host` from an environment lookup, `hosts` and `store`.
pub fn resolve_token_from<F>(
    lookup: F,
    host: &str,
    hosts: &HostsConfig,
    store: &dyn CredentialStore,
) -> Result<Option<ResolvedToken>>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(resolved) = env_token_from(&lookup) {
        tracing::debug!("Using token from {}", resolved.source);
        return Ok(Some(resolved));
    }

    let Some(user) = active_user_from(&lookup, host, hosts) else {
        tracing::debug!("No active user for {}", host);
        return Ok(None);
    };

    let resolved = store.get(host, &user)?.map(|token| ResolvedToken {
        token,
        source: TokenSource::Keyring { user },
    });

    match &resolved {
        Some(r) => tracing::debug!("Using token from {}", r.source),
        None => tracing::debug!("No stored token for {}", host),
    }
    Ok(resolved)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// In-memory [`CredentialStore`] for tests.
    #[derive(Default)]
    pub(crate) struct MemoryStore {
        entries: RefCell<HashMap<String, String>>,
    }

    impl CredentialStore for MemoryStore {
        fn store(&self, host: &str, user: &str, token: &str) -> Result<()> {
            self.entries
                .borrow_mut()
                .insert(keyring_key(host, user), token.to_string());
            Ok(())
        }

        fn get(&self, host: &str, user: &str) -> Result<Option<String>> {
            Ok(self.entries.borrow().get(&keyring_key(host, user)).cloned())
        }

        fn delete(&self, host: &str, user: &str) -> Result<()> {
            self.entries.borrow_mut().remove(&keyring_key(host, user));
            Ok(())
        }
    }

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    fn hosts_with(user: &str) -> HostsConfig {
        let mut hosts = HostsConfig::default();
        hosts.set_active_user("bitbucket.org", user);
        hosts
    }

    #[test]
    fn test_env_token_order() {
        let resolved =
            env_token_from(lookup(&[("BB_TOKEN", "first"), ("BITBUCKET_TOKEN", "second")])).unwrap();
        assert_eq!(resolved.token, "first");
        assert_eq!(resolved.source, TokenSource::Env("BB_TOKEN"));

        let resolved =
            env_token_from(lookup(&[("BB_TOKEN", ""), ("BITBUCKET_TOKEN", "second")])).unwrap();
        assert_eq!(resolved.source, TokenSource::Env("BITBUCKET_TOKEN"));

        assert!(env_token_from(lookup(&[])).is_none());
    }

    #[test]
    fn test_env_beats_keyring() {
        let store = MemoryStore::default();
        store.store("bitbucket.org", "jdoe", "stored").unwrap();

        let resolved = resolve_token_from(
            lookup(&[("BB_TOKEN", "from-env")]),
            "bitbucket.org",
            &hosts_with("jdoe"),
            &store,
        )
        .unwrap()
        .unwrap();

        assert_eq!(resolved.token, "from-env");
    }

    #[test]
    fn test_keyring_for_active_user() {
        let store = MemoryStore::default();
        store.store("bitbucket.org", "jdoe", "stored").unwrap();

        let resolved = resolve_token_from(lookup(&[]), "bitbucket.org", &hosts_with("jdoe"), &store)
            .unwrap()
            .unwrap();

        assert_eq!(resolved.token, "stored");
        assert_eq!(
            resolved.source,
            TokenSource::Keyring {
                user: "jdoe".to_string()
            }
        );
    }

    #[test]
    fn test_username_env_overrides_active_user() {
        let store = MemoryStore::default();
        store.store("bitbucket.org", "jdoe", "personal").unwrap();
        store.store("bitbucket.org", "jdoe-work", "work").unwrap();

        let resolved = resolve_token_from(
            lookup(&[("BB_USERNAME", "jdoe-work")]),
            "bitbucket.org",
            &hosts_with("jdoe"),
            &store,
        )
        .unwrap()
        .unwrap();

        assert_eq!(resolved.token, "work");
    }

    #[test]
    fn test_no_user_or_no_entry_gives_none() {
        let store = MemoryStore::default();
        let resolved =
            resolve_token_from(lookup(&[]), "bitbucket.org", &HostsConfig::default(), &store).unwrap();
        assert!(resolved.is_none());

        let resolved = resolve_token_from(lookup(&[]), "bitbucket.org", &hosts_with("jdoe"), &store).unwrap();
        assert!(resolved.is_none());
    }

    #[test]
    fn test_debug_redacts_token() {
        let resolved = ResolvedToken {
            token: "secret".to_string(),
            source: TokenSource::Env("BB_TOKEN"),
        };
        assert!(!format!("{:?}", resolved).contains("secret"));
        assert_eq!(resolved.source.to_string(), "BB_TOKEN");
    }
}
