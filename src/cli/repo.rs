//
//  bb-cloud
//  cli/repo.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Repository commands
//!
//! Commands that take an optional REPOSITORY argument accept
//! `WORKSPACE/REPO`, a clone URL, or a bare slug with `--workspace`. Without
//! one they fall back to `--repo` / `BB_REPO`.

use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use console::style;

use crate::api::cloud::branches::{Branch, BranchListOptions};
use crate::api::cloud::repositories::{
    Repository, RepositoryCreateOptions, RepositoryForkOptions, RepositoryListOptions,
};
use crate::output::{print_field, print_optional_field, TableOutput, TableRow};
use crate::util::{short_hash, time_ago_opt, truncate};

use super::{print_page_hint, GlobalOptions, Session};

#[derive(Args, Debug)]
pub struct RepoCommand {
    #[command(subcommand)]
    pub command: RepoSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum RepoSubcommand {
    /// List repositories in a workspace
    #[command(visible_alias = "ls")]
    List(ListArgs),

    /// View repository details
    View(RepoArgs),

    /// Create a new repository
    Create(CreateArgs),

    /// Fork a repository
    Fork(ForkArgs),

    /// Delete a repository
    Delete(DeleteArgs),

    /// List branches
    Branches(BranchesArgs),
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only repositories where you have this role
    #[arg(long, value_parser = ["member", "contributor", "admin", "owner"])]
    pub role: Option<String>,

    /// Filter using Bitbucket query syntax, e.g. 'language="rust"'
    #[arg(long, short = 'q')]
    pub query: Option<String>,

    #[arg(long, default_value = "-updated_on")]
    pub sort: String,

    #[arg(long)]
    pub page: Option<u32>,

    /// Maximum number of repositories to list
    #[arg(long, short = 'L', default_value = "30")]
    pub limit: u32,
}

#[derive(Args, Debug)]
pub struct RepoArgs {
    /// WORKSPACE/REPO or a clone URL
    pub repo: Option<String>,
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Repository name; the slug is derived from it
    pub name: String,

    #[arg(long, short = 'd')]
    pub description: Option<String>,

    /// Make the repository public (default is private)
    #[arg(long)]
    pub public: bool,

    /// Key of the project to create the repository in
    #[arg(long, short = 'p')]
    pub project: Option<String>,

    #[arg(long)]
    pub language: Option<String>,
}

#[derive(Args, Debug)]
pub struct ForkArgs {
    pub repo: Option<String>,

    /// Name of the fork
    #[arg(long)]
    pub name: Option<String>,

    /// Workspace to create the fork in
    #[arg(long)]
    pub to: Option<String>,
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    pub repo: Option<String>,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

#[derive(Args, Debug)]
pub struct BranchesArgs {
    pub repo: Option<String>,

    /// Filter using Bitbucket query syntax, e.g. 'name ~ "feature"'
    #[arg(long, short = 'q')]
    pub query: Option<String>,

    #[arg(long)]
    pub sort: Option<String>,

    #[arg(long)]
    pub page: Option<u32>,

    #[arg(long, short = 'L', default_value = "30")]
    pub limit: u32,
}

fn visibility(is_private: bool) -> &'static str {
    if is_private {
        "private"
    } else {
        "public"
    }
}

impl TableRow for Repository {
    fn headers() -> Vec<&'static str> {
        vec!["NAME", "DESCRIPTION", "VISIBILITY", "LANGUAGE", "UPDATED"]
    }

    fn row(&self, _color: bool) -> Vec<String> {
        vec![
            self.full_name.clone(),
            truncate(&self.description, 50),
            visibility(self.is_private).to_string(),
            self.language.clone(),
            time_ago_opt(self.updated_on.as_deref()),
        ]
    }

    fn empty_message() -> &'static str {
        "No repositories found"
    }
}

impl TableOutput for Repository {
    fn print_table(&self, color: bool) {
        let name = if color {
            style(&self.full_name).bold().to_string()
        } else {
            self.full_name.clone()
        };
        println!("{}", name);
        if !self.description.is_empty() {
            println!("{}", self.description);
        }
        println!();

        print_field("Visibility", visibility(self.is_private), color);
        print_optional_field(
            "Language",
            Some(self.language.as_str()).filter(|l| !l.is_empty()),
            color,
        );
        print_optional_field("Main branch", self.main_branch(), color);
        print_optional_field(
            "Project",
            self.project.as_ref().map(|p| p.name.as_str()),
            color,
        );
        print_optional_field(
            "Fork of",
            self.parent.as_ref().map(|p| p.full_name.as_str()),
            color,
        );
        print_field("Created", &time_ago_opt(self.created_on.as_deref()), color);
        print_field("Updated", &time_ago_opt(self.updated_on.as_deref()), color);
        print_optional_field("HTTPS", self.clone_url("https"), color);
        print_optional_field("SSH", self.clone_url("ssh"), color);
        print_optional_field(
            "URL",
            self.links.as_ref().and_then(|l| l.html_url()),
            color,
        );
    }
}

impl TableRow for Branch {
    fn headers() -> Vec<&'static str> {
        vec!["NAME", "COMMIT", "MESSAGE", "DATE"]
    }

    fn row(&self, _color: bool) -> Vec<String> {
        let target = self.target.as_ref();
        vec![
            self.name.clone(),
            target.map(|c| short_hash(&c.hash).to_string()).unwrap_or_default(),
            target
                .and_then(|c| c.message.as_deref())
                .and_then(|m| m.lines().next())
                .map(|m| truncate(m, 60))
                .unwrap_or_default(),
            target
                .and_then(|c| c.date)
                .map(crate::util::time_ago)
                .unwrap_or_else(|| "-".to_string()),
        ]
    }

    fn empty_message() -> &'static str {
        "No branches found"
    }
}

/// Turns a repository name into the slug Bitbucket expects.
fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.trim().chars() {
        if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_matches('-').to_string()
}

impl RepoCommand {
    pub async fn run(&self, global: &GlobalOptions) -> Result<()> {
        let session = Session::new(global)?;
        match &self.command {
            RepoSubcommand::List(args) => list(&session, args).await,
            RepoSubcommand::View(args) => view(&session, args).await,
            RepoSubcommand::Create(args) => create(&session, args).await,
            RepoSubcommand::Fork(args) => fork(&session, args).await,
            RepoSubcommand::Delete(args) => delete(&session, args).await,
            RepoSubcommand::Branches(args) => branches(&session, args).await,
        }
    }
}

async fn list(session: &Session<'_>, args: &ListArgs) -> Result<()> {
    let workspace = session.workspace()?;
    let options = RepositoryListOptions {
        role: args.role.clone(),
        q: args.query.clone(),
        sort: Some(args.sort.clone()),
        page: args.page,
        pagelen: Some(args.limit),
    };

    let page = session.client.list_repositories(&workspace, &options).await?;
    session.output.write_list(&page.values)?;
    print_page_hint(&session.output, &page, "repositories");
    Ok(())
}

async fn view(session: &Session<'_>, args: &RepoArgs) -> Result<()> {
    let repo = session.repo_or(args.repo.as_deref())?;
    let repository = session
        .client
        .get_repository(&repo.workspace, &repo.repo_slug)
        .await?;
    session.output.write(&repository)
}

async fn create(session: &Session<'_>, args: &CreateArgs) -> Result<()> {
    let workspace = session.workspace()?;
    let slug = slugify(&args.name);
    if slug.is_empty() {
        bail!("'{}' is not a usable repository name", args.name);
    }

    let options = RepositoryCreateOptions {
        description: args.description.clone(),
        is_private: Some(!args.public),
        project_key: args.project.clone(),
        language: args.language.clone(),
        fork_policy: None,
    };

    let repository = session
        .client
        .create_repository(&workspace, &slug, &options)
        .await?;

    if session.output.is_json() {
        return session.output.write(&repository);
    }
    session
        .output
        .write_success(&format!("Created repository {}", repository.full_name));
    if let Some(url) = repository.clone_url(&session.config.git_protocol) {
        println!("{}", url);
    }
    Ok(())
}

async fn fork(session: &Session<'_>, args: &ForkArgs) -> Result<()> {
    let repo = session.repo_or(args.repo.as_deref())?;
    let options = RepositoryForkOptions {
        name: args.name.clone(),
        workspace: args.to.clone(),
        is_private: None,
    };

    let fork = session
        .client
        .fork_repository(&repo.workspace, &repo.repo_slug, &options)
        .await?;

    if session.output.is_json() {
        return session.output.write(&fork);
    }
    session.output.write_success(&format!(
        "Forked {} to {}",
        repo.full_name(),
        fork.full_name
    ));
    if let Some(url) = fork.clone_url(&session.config.git_protocol) {
        println!("{}", url);
    }
    Ok(())
}

async fn delete(session: &Session<'_>, args: &DeleteArgs) -> Result<()> {
    let repo = session.repo_or(args.repo.as_deref())?;
    session.confirm(
        &format!("Delete {} permanently? This cannot be undone.", repo.full_name()),
        args.yes,
    )?;

    session
        .client
        .delete_repository(&repo.workspace, &repo.repo_slug)
        .await?;
    session
        .output
        .write_success(&format!("Deleted repository {}", repo.full_name()));
    Ok(())
}

async fn branches(session: &Session<'_>, args: &BranchesArgs) -> Result<()> {
    let repo = session.repo_or(args.repo.as_deref())?;
    let options = BranchListOptions {
        q: args.query.clone(),
        sort: args.sort.clone(),
        page: args.page,
        pagelen: Some(args.limit),
    };

    let page = session
        .client
        .list_branches(&repo.workspace, &repo.repo_slug, &options)
        .await?;
    session.output.write_list(&page.values)?;
    print_page_hint(&session.output, &page, "branches");
    Ok(())
}
