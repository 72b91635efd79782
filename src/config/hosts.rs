//
//  bb-cloud
//  config/hosts.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Host Configuration Module
//!
//! Tracks which accounts have logged in to which Bitbucket host, and which of
//! them is active. Tokens themselves live in the system keyring; this file
//! only records user names.
//!
//! ## File Format
//!
//! ```yaml
//! bitbucket.org:
//!   users:
//!     jdoe: {}
//!     jdoe-work: {}
//!   user: jdoe
//!   git_protocol: ssh
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use bb_cloud::config::{HostsConfig, BITBUCKET_CLOUD};
//!
//! let mut hosts = HostsConfig::default();
//! hosts.set_active_user(BITBUCKET_CLOUD, "jdoe");
//!
//! assert_eq!(hosts.active_user(BITBUCKET_CLOUD), Some("jdoe"));
//! assert_eq!(hosts.git_protocol(BITBUCKET_CLOUD), "ssh");
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::{config_dir, read_yaml_file, write_yaml_file, HOSTS_FILE};

pub const BITBUCKET_CLOUD: &str = "bitbucket.org";

const DEFAULT_GIT_PROTOCOL: &str = "ssh";

/// Per-user settings. Currently empty; kept as a map so entries round-trip as `{}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserConfig {}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostConfig {
    #[serde(default)]
    pub users: BTreeMap<String, UserConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_protocol: Option<String>,
}

/// Contents of `hosts.yml`: host name to [`HostConfig`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HostsConfig {
    hosts: BTreeMap<String, HostConfig>,
}

impl HostsConfig {
    pub fn load() -> Result<Self> {
        Self::load_from(&config_dir()?)
    }

    pub fn load_from(dir: &Path) -> Result<Self> {
        let path = dir.join(HOSTS_FILE);
        tracing::debug!("Loading hosts from {}", path.display());
        read_yaml_file(&path)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&config_dir()?)
    }

    pub fn save_to(&self, dir: &Path) -> Result<()> {
        write_yaml_file(&dir.join(HOSTS_FILE), self)
    }

    pub fn host(&self, host: &str) -> Option<&HostConfig> {
        self.hosts.get(host)
    }

    /// Records `user` on `host` and makes it the active account.
    ///
    /// Creates the host entry if needed and leaves its other settings alone.
    pub fn set_active_user(&mut self, host: &str, user: &str) {
        let entry = self.hosts.entry(host.to_string()).or_default();
        entry.users.entry(user.to_string()).or_default();
        entry.user = Some(user.to_string());
    }

    /// Returns the active account for `host`.
    pub fn active_user(&self, host: &str) -> Option<&str> {
        self.hosts
            .get(host)
            .and_then(|h| h.user.as_deref())
            .filter(|u| !u.is_empty())
    }

    /// Returns every account recorded for `host`.
    pub fn users(&self, host: &str) -> Vec<&str> {
        self.hosts
            .get(host)
            .map(|h| h.users.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Removes `user` from `host`. If it was active, another recorded user
    /// (if any) becomes active. Hosts left without users are dropped.
    pub fn remove_user(&mut self, host: &str, user: &str) {
        let Some(entry) = self.hosts.get_mut(host) else {
            return;
        };

        entry.users.remove(user);
        if entry.user.as_deref() == Some(user) {
            entry.user = entry.users.keys().next().cloned();
        }

        if entry.users.is_empty() && entry.git_protocol.is_none() {
            self.hosts.remove(host);
        }
    }

    /// Returns the git protocol for `host`, defaulting to `ssh`.
    pub fn git_protocol(&self, host: &str) -> &str {
        self.hosts
            .get(host)
            .and_then(|h| h.git_protocol.as_deref())
            .filter(|p| !p.is_empty())
            .unwrap_or(DEFAULT_GIT_PROTOCOL)
    }

    pub fn set_git_protocol(&mut self, host: &str, protocol: &str) {
        self.hosts.entry(host.to_string()).or_default().git_protocol = Some(protocol.to_string());
    }

    /// Returns the hosts that have an active user.
    pub fn authenticated_hosts(&self) -> Vec<&str> {
        self.hosts
            .iter()
            .filter(|(_, h)| h.user.as_deref().is_some_and(|u| !u.is_empty()))
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

/// Normalizes a host for use as a key: lower-case, no scheme, no trailing slash.
pub fn normalize_host(host: &str) -> String {
    let host = host.trim();
    let host = host.strip_prefix("https://").unwrap_or(host);
    let host = host.strip_prefix("http://").unwrap_or(host);
    let host = host.strip_suffix('/').unwrap_or(host);
    host.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_active_user_creates_host() {
        let mut hosts = HostsConfig::default();
        hosts.set_active_user("bitbucket.org", "jdoe");

        assert_eq!(hosts.active_user("bitbucket.org"), Some("jdoe"));
        assert_eq!(hosts.users("bitbucket.org"), vec!["jdoe"]);
    }

    #[test]
    fn test_set_active_user_keeps_git_protocol() {
        let mut hosts = HostsConfig::default();
        hosts.set_git_protocol("bitbucket.org", "https");
        hosts.set_active_user("bitbucket.org", "jdoe");
        hosts.set_active_user("bitbucket.org", "jdoe-work");

        assert_eq!(hosts.git_protocol("bitbucket.org"), "https");
        assert_eq!(hosts.active_user("bitbucket.org"), Some("jdoe-work"));
        assert_eq!(hosts.users("bitbucket.org").len(), 2);
    }

    #[test]
    fn test_unknown_host_defaults() {
        let hosts = HostsConfig::default();
        assert_eq!(hosts.active_user("example.com"), None);
        assert_eq!(hosts.git_protocol("example.com"), "ssh");
        assert!(hosts.authenticated_hosts().is_empty());
    }

    #[test]
    fn test_empty_git_protocol_falls_back() {
        let mut hosts = HostsConfig::default();
        hosts.set_git_protocol("bitbucket.org", "");
        assert_eq!(hosts.git_protocol("bitbucket.org"), "ssh");
    }

    #[test]
    fn test_authenticated_hosts() {
        let mut hosts = HostsConfig::default();
        hosts.set_active_user("bitbucket.org", "jdoe");
        hosts.set_git_protocol("example.com", "https");

        assert_eq!(hosts.authenticated_hosts(), vec!["bitbucket.org"]);
    }

    #[test]
    fn test_remove_user_promotes_remaining_user() {
        let mut hosts = HostsConfig::default();
        hosts.set_active_user("bitbucket.org", "alpha");
        hosts.set_active_user("bitbucket.org", "beta");

        hosts.remove_user("bitbucket.org", "beta");
        assert_eq!(hosts.active_user("bitbucket.org"), Some("alpha"));

        hosts.remove_user("bitbucket.org", "alpha");
        assert!(hosts.host("bitbucket.org").is_none());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut hosts = HostsConfig::default();
        hosts.set_active_user("bitbucket.org", "jdoe");
        hosts.save_to(dir.path()).unwrap();

        let raw = std::fs::read_to_string(dir.path().join(HOSTS_FILE)).unwrap();
        assert!(raw.contains("bitbucket.org:"));
        assert!(raw.contains("user: jdoe"));

        assert_eq!(HostsConfig::load_from(dir.path()).unwrap(), hosts);
    }

    #[test]
    fn test_normalize_host() {
        assert_eq!(normalize_host("https://BITBUCKET.ORG/"), "bitbucket.org");
        assert_eq!(normalize_host("bitbucket.org"), "bitbucket.org");
    }
}
