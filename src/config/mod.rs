//
//  bb-cloud
//  config/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Configuration Module
//!
//! This module manages the two YAML files that make up the CLI's local state:
//!
//! - **`config.yml`**: General settings ([`Config`])
//! - **`hosts.yml`**: Per-host accounts and the active user ([`HostsConfig`])
//!
//! ## Configuration Directory
//!
//! The first match wins:
//!
//! 1. `$BB_CONFIG_DIR`
//! 2. `$XDG_CONFIG_HOME/bb`
//! 3. `~/.config/bb`
//!
//! Empty environment values are ignored.
//!
//! ## Example Configuration File
//!
//! ```yaml
//! git_protocol: ssh
//! editor: vim
//! prompt: enabled
//! http_timeout: 30
//! default_workspace: acme
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use bb_cloud::config::Config;
//!
//! # fn demo() -> anyhow::Result<()> {
//! let mut config = Config::load()?;
//! config.set("editor", "nvim")?;
//! config.save()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Submodules
//!
//! - [`file`]: Low-level YAML file I/O
//! - [`hosts`]: Host accounts and active-user tracking

mod file;
mod hosts;

pub use file::*;
pub use hosts::*;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use directories::BaseDirs;
use serde::{Deserialize, Serialize};

/// Name of the general settings file.
pub const CONFIG_FILE: &str = "config.yml";

/// Name of the hosts file.
pub const HOSTS_FILE: &str = "hosts.yml";

/// Keys accepted by [`Config::get`] and [`Config::set`].
pub const CONFIG_KEYS: &[&str] = &[
    "git_protocol",
    "editor",
    "pager",
    "browser",
    "prompt",
    "http_timeout",
    "default_workspace",
];

/// Returns the configuration directory for the current process.
pub fn config_dir() -> Result<PathBuf> {
    let home = BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf());
    config_dir_from(|key| std::env::var(key).ok(), home)
}

/// Resolves the configuration directory from an environment lookup and a home directory.
pub fn config_dir_from<F>(lookup: F, home: Option<PathBuf>) -> Result<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(dir) = lookup("BB_CONFIG_DIR").filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }

    if let Some(xdg) = lookup("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(xdg).join("bb"));
    }

    match home {
        Some(home) => Ok(home.join(".config").join("bb")),
        None => bail!("Could not determine the home directory; set BB_CONFIG_DIR"),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_git_protocol")]
    pub git_protocol: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editor: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pager: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub browser: Option<String>,

    #[serde(default = "default_prompt")]
    pub prompt: String,

    /// Request timeout in seconds.
    #[serde(default = "default_http_timeout")]
    pub http_timeout: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_workspace: Option<String>,
}

fn default_git_protocol() -> String {
    "ssh".to_string()
}

fn default_prompt() -> String {
    "enabled".to_string()
}

fn default_http_timeout() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            git_protocol: default_git_protocol(),
            editor: None,
            pager: None,
            browser: None,
            prompt: default_prompt(),
            http_timeout: default_http_timeout(),
            default_workspace: None,
        }
    }
}

impl Config {
    /// Loads `config.yml` from [`config_dir`].
    pub fn load() -> Result<Self> {
        Self::load_from(&config_dir()?)
    }

    /// Loads `config.yml` from `dir`, returning defaults if it does not exist.
    pub fn load_from(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE);
        tracing::debug!("Loading config from {}", path.display());
        read_yaml_file(&path)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&config_dir()?)
    }

    pub fn save_to(&self, dir: &Path) -> Result<()> {
        write_yaml_file(&dir.join(CONFIG_FILE), self)
    }

    pub fn timeout(&self) -> Option<Duration> {
        (self.http_timeout > 0).then(|| Duration::from_secs(self.http_timeout))
    }

    /// Returns the value of a setting, or `None` if it is unset.
    ///
    /// # Errors
    ///
    /// Fails for keys not listed in [`CONFIG_KEYS`].
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let value = match key {
            "git_protocol" => Some(self.git_protocol.clone()),
            "editor" => self.editor.clone(),
            "pager" => self.pager.clone(),
            "browser" => self.browser.clone(),
            "prompt" => Some(self.prompt.clone()),
            "http_timeout" => Some(self.http_timeout.to_string()),
            "default_workspace" => self.default_workspace.clone(),
            _ => bail!(unknown_key(key)),
        };
        Ok(value)
    }

    /// Updates a setting. An empty value clears optional settings.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let optional = || (!value.is_empty()).then(|| value.to_string());

        match key {
            "git_protocol" => match value {
                "ssh" | "https" => self.git_protocol = value.to_string(),
                _ => bail!("git_protocol must be 'ssh' or 'https'"),
            },
            "editor" => self.editor = optional(),
            "pager" => self.pager = optional(),
            "browser" => self.browser = optional(),
            "prompt" => match value {
                "enabled" | "disabled" => self.prompt = value.to_string(),
                _ => bail!("prompt must be 'enabled' or 'disabled'"),
            },
            "http_timeout" => {
                self.http_timeout = value
                    .parse()
                    .with_context(|| format!("http_timeout must be a number of seconds, got '{}'", value))?;
            }
            "default_workspace" => self.default_workspace = optional(),
            _ => bail!(unknown_key(key)),
        }
        Ok(())
    }

    pub fn prompts_enabled(&self) -> bool {
        self.prompt != "disabled"
    }
}

fn unknown_key(key: &str) -> String {
    format!(
        "Unknown config key '{}'. Valid keys: {}",
        key,
        CONFIG_KEYS.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_config_dir_prefers_bb_config_dir() {
        let dir = config_dir_from(
            lookup(&[("BB_CONFIG_DIR", "/tmp/bb-test"), ("XDG_CONFIG_HOME", "/xdg")]),
            Some(PathBuf::from("/home/jane")),
        )
        .unwrap();
        assert_eq!(dir, PathBuf::from("/tmp/bb-test"));
    }

    #[test]
    fn test_config_dir_uses_xdg_then_home() {
        let dir = config_dir_from(lookup(&[("XDG_CONFIG_HOME", "/xdg")]), None).unwrap();
        assert_eq!(dir, PathBuf::from("/xdg/bb"));

        let dir = config_dir_from(
            lookup(&[("BB_CONFIG_DIR", ""), ("XDG_CONFIG_HOME", "")]),
            Some(PathBuf::from("/home/jane")),
        )
        .unwrap();
        assert_eq!(dir, PathBuf::from("/home/jane/.config/bb"));
    }

    #[test]
    fn test_config_dir_without_home_fails() {
        assert!(config_dir_from(lookup(&[]), None).is_err());
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.git_protocol, "ssh");
        assert_eq!(config.prompt, "enabled");
        assert_eq!(config.http_timeout, 30);
        assert_eq!(config.timeout(), Some(Duration::from_secs(30)));
        assert!(config.editor.is_none());
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(Config::load_from(dir.path()).unwrap(), Config::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "editor: vim\n").unwrap();

        let config = Config::load_from(dir.path()).unwrap();
        assert_eq!(config.editor.as_deref(), Some("vim"));
        assert_eq!(config.git_protocol, "ssh");
        assert_eq!(config.http_timeout, 30);
    }

    #[test]
    fn test_set_get_save_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.set("http_timeout", "5").unwrap();
        config.set("default_workspace", "acme").unwrap();
        config.save_to(dir.path()).unwrap();

        let loaded = Config::load_from(dir.path()).unwrap();
        assert_eq!(loaded.get("http_timeout").unwrap().as_deref(), Some("5"));
        assert_eq!(loaded.get("default_workspace").unwrap().as_deref(), Some("acme"));
    }

    #[test]
    fn test_set_rejects_bad_values_and_keys() {
        let mut config = Config::default();
        assert!(config.set("git_protocol", "ftp").is_err());
        assert!(config.set("http_timeout", "soon").is_err());
        assert!(config.set("colour", "always").is_err());
        assert!(config.get("colour").is_err());

        config.set("editor", "vim").unwrap();
        config.set("editor", "").unwrap();
        assert_eq!(config.get("editor").unwrap(), None);
    }
}
