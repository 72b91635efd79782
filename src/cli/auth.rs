//
//  bb-cloud
//  cli/auth.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Authentication commands for the Bitbucket CLI.
//!
//! Tokens are verified against `GET /user` before they are stored in the
//! system keyring. `hosts.yml` records which account is active.

use anyhow::{anyhow, bail, Result};
use clap::{Args, Subcommand};
use console::style;
use serde::Serialize;

use crate::api::BitbucketClient;
use crate::auth::{
    account_name, env_token_from, read_token_from_stdin, resolve_token, validate_token,
    verify_token, CredentialStore, KeyringStore,
};
use crate::config::{Config, HostsConfig, BITBUCKET_CLOUD};
use crate::interactive::prompt_password;
use crate::output::{print_field, OutputWriter, TableOutput};

use super::{can_prompt, client_options, CliError, GlobalOptions};

#[derive(Args, Debug)]
pub struct AuthCommand {
    #[command(subcommand)]
    pub command: AuthSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum AuthSubcommand {
    /// Log in with an API token
    Login(LoginArgs),

    /// Remove a stored token
    Logout(LogoutArgs),

    /// Show which account is in use
    Status(StatusArgs),

    /// Print the token in use
    Token,
}

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Read the token from standard input
    #[arg(long)]
    pub with_token: bool,
}

#[derive(Args, Debug)]
pub struct LogoutArgs {
    /// Account to log out (defaults to the active one)
    #[arg(long, short = 'u')]
    pub user: Option<String>,
}

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Include the token in the output
    #[arg(long, short = 't')]
    pub show_token: bool,
}

#[derive(Debug, Serialize)]
struct AuthStatus {
    host: String,
    user: String,
    display_name: String,
    token_source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    token: Option<String>,
}

impl TableOutput for AuthStatus {
    fn print_table(&self, color: bool) {
        let mark = if color {
            style("✓").green().bold().to_string()
        } else {
            "✓".to_string()
        };
        println!("{}", self.host);
        println!(
            "  {} Logged in as {} ({})",
            mark, self.display_name, self.user
        );
        print_field("  Token source", &self.token_source, color);
        if let Some(token) = &self.token {
            print_field("  Token", token, color);
        }
    }
}

impl AuthCommand {
    pub async fn run(&self, global: &GlobalOptions) -> Result<()> {
        match &self.command {
            AuthSubcommand::Login(args) => login(args, global).await,
            AuthSubcommand::Logout(args) => logout(args, global),
            AuthSubcommand::Status(args) => status(args, global).await,
            AuthSubcommand::Token => token(),
        }
    }
}

async fn login(args: &LoginArgs, global: &GlobalOptions) -> Result<()> {
    let config = Config::load()?;
    let mut hosts = HostsConfig::load()?;
    let output = OutputWriter::from_flag(global.json);

    let token = if args.with_token {
        read_token_from_stdin()?
    } else if can_prompt(global, &config) {
        println!(
            "Create an access token at https://{}/account/settings/ or in your workspace settings.",
            BITBUCKET_CLOUD
        );
        prompt_password("Paste your token")?.trim().to_string()
    } else {
        bail!("No terminal to prompt for a token. Use `bb auth login --with-token < token.txt`");
    };

    if !validate_token(&token) {
        bail!("The token is empty or contains whitespace");
    }

    let client = BitbucketClient::new(client_options(global, &config, Some(token.clone())))?;
    let user = verify_token(&client).await?;
    let name = account_name(&user)
        .ok_or_else(|| anyhow!("Bitbucket did not report a username for this token"))?
        .to_string();

    KeyringStore::new().store(BITBUCKET_CLOUD, &name, &token)?;
    hosts.set_active_user(BITBUCKET_CLOUD, &name);
    hosts.save()?;
    tracing::debug!("Stored token for {} on {}", name, BITBUCKET_CLOUD);

    output.write_success(&format!(
        "Logged in to {} as {} ({})",
        BITBUCKET_CLOUD, user.display_name, name
    ));
    Ok(())
}

fn logout(args: &LogoutArgs, global: &GlobalOptions) -> Result<()> {
    let mut hosts = HostsConfig::load()?;
    let output = OutputWriter::from_flag(global.json);

    let user = match args.user.as_deref().or(hosts.active_user(BITBUCKET_CLOUD)) {
        Some(user) => user.to_string(),
        None => bail!("Not logged in to {}", BITBUCKET_CLOUD),
    };

    KeyringStore::new().delete(BITBUCKET_CLOUD, &user)?;
    hosts.remove_user(BITBUCKET_CLOUD, &user);
    hosts.save()?;

    output.write_success(&format!("Logged out of {} ({})", BITBUCKET_CLOUD, user));

    if let Some(env) = env_token_from(|key| std::env::var(key).ok()) {
        output.write_warning(&format!(
            "{} is still set and will keep being used",
            env.source
        ));
    }
    Ok(())
}

async fn status(args: &StatusArgs, global: &GlobalOptions) -> Result<()> {
    let config = Config::load()?;
    let hosts = HostsConfig::load()?;
    let output = OutputWriter::from_flag(global.json);

    let resolved = resolve_token(BITBUCKET_CLOUD, &hosts, &KeyringStore::new())?.ok_or_else(|| {
        CliError::NotAuthenticated {
            host: BITBUCKET_CLOUD.to_string(),
        }
    })?;

    let client = BitbucketClient::new(client_options(global, &config, Some(resolved.token.clone())))?;
    let user = verify_token(&client).await?;

    let status = AuthStatus {
        host: BITBUCKET_CLOUD.to_string(),
        user: account_name(&user).unwrap_or("-").to_string(),
        display_name: user.display_name.clone(),
        token_source: resolved.source.to_string(),
        token: args.show_token.then(|| resolved.token.clone()),
    };
    output.write(&status)
}

fn token() -> Result<()> {
    let hosts = HostsConfig::load()?;
    let resolved = resolve_token(BITBUCKET_CLOUD, &hosts, &KeyringStore::new())?.ok_or_else(|| {
        CliError::NotAuthenticated {
            host: BITBUCKET_CLOUD.to_string(),
        }
    })?;

    println!("{}", resolved.token);
    Ok(())
}
