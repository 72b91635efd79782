//
//  bb-cloud
//  cli/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! CLI command definitions using clap derive macros

mod api;
mod auth;
mod config;
mod issue;
mod pipeline;
mod pr;
mod repo;
mod snippet;
mod workspace;

pub use api::ApiCommand;
pub use auth::AuthCommand;
pub use config::ConfigCommand;
pub use issue::IssueCommand;
pub use pipeline::PipelineCommand;
pub use pr::PrCommand;
pub use repo::RepoCommand;
pub use snippet::SnippetCommand;
pub use workspace::WorkspaceCommand;

use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use thiserror::Error;

use crate::api::{BitbucketClient, ClientError, ClientOption, Paginated};
use crate::auth::{resolve_token, KeyringStore, ResolvedToken};
use crate::config::{Config, HostsConfig, BITBUCKET_CLOUD};
use crate::context::{ContextResolver, RepoRef};
use crate::exit_codes;
use crate::interactive::{
    is_interactive, prompt_confirm_with_default, prompt_editor, prompt_input_optional,
};
use crate::output::OutputWriter;

#[derive(Parser, Debug)]
#[command(
    name = "bb",
    version,
    about = "Work with Bitbucket Cloud from the command line",
    long_about = "bb is a CLI for Bitbucket Cloud.\n\n\
                  It brings pull requests, issues, pipelines, and more to your terminal.",
    propagate_version = true,
    after_help = "Use 'bb <command> --help' for more information about a command."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOptions,
}

/// Options accepted by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalOptions {
    /// Target repository as WORKSPACE/REPO or a clone URL
    #[arg(long, short = 'R', global = true, env = "BB_REPO")]
    pub repo: Option<String>,

    /// Target workspace
    #[arg(long, short = 'w', global = true, env = "BB_WORKSPACE")]
    pub workspace: Option<String>,

    /// Print JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    /// Never prompt; fail instead
    #[arg(long, global = true, env = "BB_NO_PROMPT")]
    pub no_prompt: bool,

    /// API base URL
    #[arg(long, global = true, env = "BB_API_URL", hide = true)]
    pub base_url: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Authenticate bb with Bitbucket
    Auth(AuthCommand),

    /// Manage repositories
    #[command(visible_alias = "r")]
    Repo(RepoCommand),

    /// Manage pull requests
    Pr(PrCommand),

    /// Manage issues
    Issue(IssueCommand),

    /// Run and inspect pipelines
    Pipeline(PipelineCommand),

    /// Inspect workspaces
    #[command(visible_alias = "ws")]
    Workspace(WorkspaceCommand),

    /// Manage snippets
    Snippet(SnippetCommand),

    /// Make an authenticated API request
    Api(ApiCommand),

    /// Read and write settings
    Config(ConfigCommand),

    /// Print the version
    Version,
}

/// Failures that map to their own exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("not logged in to {host}. Run `bb auth login` or set BB_TOKEN")]
    NotAuthenticated { host: String },

    #[error("cancelled")]
    Cancelled,
}

/// Maps a command failure to its process exit code.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    if let Some(cli_error) = err.downcast_ref::<CliError>() {
        return match cli_error {
            CliError::NotAuthenticated { .. } => exit_codes::AUTH_ERROR,
            CliError::Cancelled => exit_codes::CANCELLED,
        };
    }

    match err.downcast_ref::<ClientError>().and_then(ClientError::api_error) {
        Some(api) if api.is_unauthorized() => exit_codes::AUTH_ERROR,
        Some(api) if api.is_not_found() => exit_codes::NOT_FOUND,
        Some(api) if api.is_rate_limited() => exit_codes::RATE_LIMIT,
        _ => exit_codes::ERROR,
    }
}

/// A follow-up line for errors the user can act on.
pub fn error_hint(err: &anyhow::Error) -> Option<&'static str> {
    let client_error = err.downcast_ref::<ClientError>()?;
    if client_error.is_timeout() {
        return Some("The request timed out. Raise http_timeout with `bb config set http_timeout <secs>`");
    }

    let api = client_error.api_error()?;
    if api.is_unauthorized() {
        Some("Your token was rejected. Run `bb auth login` to sign in again")
    } else if api.is_forbidden() {
        Some("Your token lacks the permission (scope) this request needs")
    } else if api.is_rate_limited() {
        Some("Bitbucket is rate limiting requests. Slow down and try again later")
    } else {
        None
    }
}

/// Builds the client options shared by every command.
pub(crate) fn client_options(
    global: &GlobalOptions,
    config: &Config,
    token: Option<String>,
) -> Vec<ClientOption> {
    let mut options = Vec::new();
    if let Some(base_url) = global.base_url.as_deref().filter(|u| !u.is_empty()) {
        options.push(ClientOption::BaseUrl(base_url.to_string()));
    }
    if let Some(token) = token {
        options.push(ClientOption::Token(token));
    }
    if let Some(timeout) = config.timeout() {
        options.push(ClientOption::Timeout(timeout));
    }
    options
}

/// Everything a command needs: settings, an authenticated client and output.
pub(crate) struct Session<'a> {
    pub global: &'a GlobalOptions,
    pub config: Config,
    pub client: BitbucketClient,
    pub output: OutputWriter,
    resolver: ContextResolver,
}

impl<'a> Session<'a> {
    /// Loads config, resolves a token and builds the client.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::NotAuthenticated`] when no token is available.
    pub fn new(global: &'a GlobalOptions) -> Result<Self> {
        let config = Config::load()?;
        let hosts = HostsConfig::load()?;

        let ResolvedToken { token, .. } = resolve_token(BITBUCKET_CLOUD, &hosts, &KeyringStore::new())?
            .ok_or_else(|| CliError::NotAuthenticated {
                host: BITBUCKET_CLOUD.to_string(),
            })?;

        let client = BitbucketClient::new(client_options(global, &config, Some(token)))?;
        tracing::debug!("Using API at {}", client.base_url());

        Ok(Self {
            global,
            resolver: ContextResolver::new(&config),
            output: OutputWriter::from_flag(global.json),
            config,
            client,
        })
    }

    pub fn repo(&self) -> Result<RepoRef> {
        self.repo_or(None)
    }

    /// Resolves a positional repository argument, falling back to `--repo`.
    pub fn repo_or(&self, repo: Option<&str>) -> Result<RepoRef> {
        self.resolver.resolve_repo(
            repo.or(self.global.repo.as_deref()),
            self.global.workspace.as_deref(),
        )
    }

    pub fn workspace(&self) -> Result<String> {
        self.resolver
            .resolve_workspace(self.global.workspace.as_deref(), self.global.repo.as_deref())
    }

    pub fn can_prompt(&self) -> bool {
        can_prompt(self.global, &self.config)
    }

    /// Asks for an optional description, in the configured editor when one is set.
    pub fn prompt_description(&self) -> Result<Option<String>> {
        match self.config.editor.as_deref().filter(|e| !e.is_empty()) {
            Some(editor) => Ok(prompt_editor(Some(editor), "")?
                .map(|text| text.trim().to_string())
                .filter(|text| !text.is_empty())),
            None => prompt_input_optional("Description (optional)"),
        }
    }

    /// Asks before a destructive action unless `yes` is set.
    pub fn confirm(&self, message: &str, yes: bool) -> Result<()> {
        confirm(self.global, &self.config, message, yes)
    }
}

pub(crate) fn can_prompt(global: &GlobalOptions, config: &Config) -> bool {
    !global.no_prompt && config.prompts_enabled() && is_interactive()
}

pub(crate) fn confirm(global: &GlobalOptions, config: &Config, message: &str, yes: bool) -> Result<()> {
    if yes {
        return Ok(());
    }

    if !can_prompt(global, config) {
        bail!("{} Pass --yes to confirm when not running interactively", message);
    }

    if prompt_confirm_with_default(message, false)? {
        Ok(())
    } else {
        Err(CliError::Cancelled.into())
    }
}

/// Returns the text of `--body`, or the contents of `--body-file` (`-` is stdin).
pub(crate) fn read_body(body: Option<&str>, body_file: Option<&Path>) -> Result<Option<String>> {
    if let Some(path) = body_file {
        if path == Path::new("-") {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read body from standard input")?;
            return Ok(Some(text));
        }

        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        return Ok(Some(text));
    }

    Ok(body.map(str::to_string))
}

/// Tells the user how to fetch the next page of a list.
pub(crate) fn print_page_hint<T>(output: &OutputWriter, page: &Paginated<T>, noun: &str) {
    if output.is_json() || !page.has_next() {
        return;
    }

    let next = page.page.max(1) + 1;
    if page.size > 0 {
        println!(
            "Showing {} of {} {}. Use --page {} for more.",
            page.values.len(),
            page.size,
            noun,
            next
        );
    } else {
        println!("Showing {} {}. Use --page {} for more.", page.values.len(), noun, next);
    }
}
