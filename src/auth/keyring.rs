//
//  bb-cloud
//  auth/keyring.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Secure Credential Storage Module
//!
//! This module stores API tokens in the system's native keyring/keychain.
//!
//! ## Platform Support
//!
//! - **macOS**: Keychain Services
//! - **Linux**: Secret Service API (GNOME Keyring, KWallet)
//! - **Windows**: Windows Credential Manager
//!
//! ## Storage Model
//!
//! - **Service**: `bb:bb-cloud`
//! - **Account**: `{host}:{user}` (e.g. `bitbucket.org:jdoe`)
//! - **Secret**: The API token
//!
//! One host can hold several accounts; `hosts.yml` records which one is active.
//!
//! ## Example
//!
//! ```rust,no_run
//! use bb_cloud::auth::{CredentialStore, KeyringStore};
//!
//! fn manage_credentials() -> anyhow::Result<()> {
//!     let store = KeyringStore::new();
//!
//!     store.store("bitbucket.org", "jdoe", "token_here")?;
//!
//!     if let Some(_token) = store.get("bitbucket.org", "jdoe")? {
//!         println!("Found stored credential");
//!     }
//!
//!     store.delete("bitbucket.org", "jdoe")?;
//!     Ok(())
//! }
//! ```

use anyhow::{Context, Result};
use keyring::Entry;

use super::CredentialStore;

/// Keyring service name shared by every entry.
pub const SERVICE_NAME: &str = "bb:bb-cloud";

/// Returns the keyring account name for `user` on `host`.
pub fn keyring_key(host: &str, user: &str) -> String {
    format!("{}:{}", host, user)
}

pub struct KeyringStore {
    service: String,
}

impl Default for KeyringStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyringStore {
    pub fn new() -> Self {
        Self {
            service: SERVICE_NAME.to_string(),
        }
    }

    fn entry(&self, host: &str, user: &str) -> Result<Entry> {
        Entry::new(&self.service, &keyring_key(host, user))
            .with_context(|| format!("Failed to open keyring entry for {}", keyring_key(host, user)))
    }
}

impl CredentialStore for KeyringStore {
    fn store(&self, host: &str, user: &str, token: &str) -> Result<()> {
        self.entry(host, user)?
            .set_password(token)
            .context("Failed to store token in the system keyring")
    }

    fn get(&self, host: &str, user: &str) -> Result<Option<String>> {
        match self.entry(host, user)?.get_password() {
            Ok(token) => Ok(Some(token)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Failed to read token from the system keyring"),
        }
    }

    fn delete(&self, host: &str, user: &str) -> Result<()> {
        match self.entry(host, user)?.delete_credential() {
            Ok(()) => Ok(()),
            Err(keyring::Error::NoEntry) => Ok(()), // Already deleted
            Err(e) => Err(e).context("Failed to delete token from the system keyring"),
        }
    }
}
