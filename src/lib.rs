//
//  bb-cloud
//  lib.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # bb-cloud
//!
//! A command-line client and typed API library for Bitbucket Cloud.
//!
//! ## Overview
//!
//! At the core is [`api::BitbucketClient`], a small HTTP client for the
//! Bitbucket Cloud REST API v2.0 with bearer-token authentication,
//! page-at-a-time pagination and structured errors. The `bb` binary builds on
//! it to manage repositories, pull requests, issues, pipelines and snippets
//! from the terminal.
//!
//! ## Module Structure
//!
//! - [`api`]: HTTP client and resource accessors
//! - [`auth`]: Token resolution and keychain storage
//! - [`cli`]: Command-line interface definitions using clap
//! - [`config`]: YAML settings and logged-in accounts
//! - [`context`]: Repository and workspace resolution
//! - [`interactive`]: Terminal prompts
//! - [`output`]: Table and JSON output
//! - [`util`]: Formatting helpers
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use bb_cloud::api::BitbucketClient;
//! use bb_cloud::api::cloud::repositories::RepositoryListOptions;
//!
//! # async fn demo() -> Result<(), bb_cloud::api::ClientError> {
//! let client = BitbucketClient::cloud()?.with_token("my-token");
//! let page = client
//!     .list_repositories("acme", &RepositoryListOptions::default())
//!     .await?;
//! for repo in &page.values {
//!     println!("{}", repo.full_name);
//! }
//! # Ok(())
//! # }
//! ```

/// Command-line interface definitions.
///
/// Contains all CLI commands, arguments, and subcommands defined using the clap derive API.
/// Each command module handles parsing and execution of its respective functionality.
pub mod cli;

/// Typed client for the Bitbucket Cloud API v2.0.
///
/// The client handles authentication, request building, pagination, and error handling.
pub mod api;

/// Token resolution and credential storage.
///
/// Tokens come from `BB_TOKEN` / `BITBUCKET_TOKEN` or the system keychain,
/// keyed by host and account.
pub mod auth;

/// Configuration file management.
///
/// Settings live in `config.yml` and logged-in accounts in `hosts.yml`, under
/// `$BB_CONFIG_DIR`, `$XDG_CONFIG_HOME/bb` or `~/.config/bb`.
pub mod config;

/// Repository and workspace resolution.
///
/// Parses `WORKSPACE/REPO` and clone URLs and applies the default workspace.
pub mod context;

/// Output formatting: tables for people, JSON for scripts.
pub mod output;

/// Interactive terminal prompts.
pub mod interactive;

/// Utility functions and helpers.
///
/// Relative times, durations, display names and identifier parsing.
pub mod util;

/// Re-export of the main CLI struct for convenient access.
///
/// # Example
///
/// ```rust,no_run
/// use clap::Parser;
/// use bb_cloud::Cli;
///
/// let cli = Cli::parse();
/// // Handle cli.command...
/// ```
pub use cli::Cli;

/// Re-export of the configuration struct.
///
/// # Example
///
/// ```rust,no_run
/// use bb_cloud::Config;
///
/// let config = Config::load().expect("Failed to load config");
/// if let Ok(Some(workspace)) = config.get("default_workspace") {
///     println!("Default workspace: {}", workspace);
/// }
/// ```
pub use config::Config;

/// Re-export of the repository reference.
pub use context::RepoRef;

/// Application name constant.
///
/// The name of the CLI binary, used for display purposes and configuration paths.
pub const APP_NAME: &str = "bb";

/// Application version constant, taken from Cargo.toml at compile time.
///
/// # Example
///
/// ```rust
/// use bb_cloud::VERSION;
///
/// println!("bb version {}", VERSION);
/// ```
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Exit codes for the CLI.
///
/// Standardized exit codes following Unix conventions, allowing scripts
/// to programmatically detect the outcome of CLI operations.
///
/// # Exit Code Ranges
///
/// - `0`: Success
/// - `1-3`: General errors and usage issues
/// - `4-7`: Authentication-related issues
/// - `8-15`: Resource-related issues
/// - `16-31`: Operation-related issues
/// - `32+`: External service issues
///
/// # Example
///
/// ```rust,no_run
/// use bb_cloud::exit_codes;
/// use std::process;
///
/// // Exit with authentication error
/// process::exit(exit_codes::AUTH_ERROR);
/// ```
pub mod exit_codes {
    /// Successful execution.
    pub const SUCCESS: i32 = 0;

    /// General error.
    ///
    /// An unspecified error occurred during execution.
    /// Check stderr for details.
    pub const ERROR: i32 = 1;

    /// Invalid usage or arguments.
    ///
    /// Clap exits with this code on its own when parsing fails.
    pub const USAGE: i32 = 2;

    /// Authentication required or failed.
    ///
    /// No token is available, or the API answered 401.
    /// Run `bb auth login` to authenticate.
    pub const AUTH_ERROR: i32 = 4;

    /// Resource not found.
    ///
    /// The API answered 404. Bitbucket also answers 404 for private
    /// resources the account cannot see.
    pub const NOT_FOUND: i32 = 8;

    /// Operation cancelled by user.
    ///
    /// The user declined a confirmation prompt.
    pub const CANCELLED: i32 = 16;

    /// API rate limit exceeded.
    ///
    /// The API answered 429. Wait before retrying.
    pub const RATE_LIMIT: i32 = 32;
}
