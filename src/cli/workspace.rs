//
//  bb-cloud
//  cli/workspace.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Workspace commands

use anyhow::Result;
use clap::{Args, Subcommand};
use console::style;

use crate::api::cloud::projects::{Project, ProjectListOptions};
use crate::api::cloud::workspaces::{Workspace, WorkspaceListOptions, WorkspaceMembership};
use crate::output::{print_field, print_optional_field, TableOutput, TableRow};
use crate::util::{time_ago_opt, truncate, user_display_name};

use super::{print_page_hint, GlobalOptions, Session};

#[derive(Args, Debug)]
pub struct WorkspaceCommand {
    #[command(subcommand)]
    pub command: WorkspaceSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum WorkspaceSubcommand {
    /// List workspaces you belong to
    #[command(visible_alias = "ls")]
    List(ListArgs),

    /// View workspace details
    View(WorkspaceArgs),

    /// List workspace members
    Members(PagedWorkspaceArgs),

    /// List projects in a workspace
    Projects(ProjectsArgs),
}

#[derive(Args, Debug)]
pub struct ListArgs {
    #[arg(long, value_parser = ["member", "collaborator", "owner"])]
    pub role: Option<String>,

    #[arg(long)]
    pub page: Option<u32>,

    #[arg(long, short = 'L', default_value = "30")]
    pub limit: u32,
}

#[derive(Args, Debug)]
pub struct WorkspaceArgs {
    /// Workspace slug; defaults to --workspace or the configured default
    pub workspace: Option<String>,
}

#[derive(Args, Debug)]
pub struct PagedWorkspaceArgs {
    pub workspace: Option<String>,

    #[arg(long)]
    pub page: Option<u32>,

    #[arg(long, short = 'L', default_value = "50")]
    pub limit: u32,
}

#[derive(Args, Debug)]
pub struct ProjectsArgs {
    pub workspace: Option<String>,

    /// Filter using Bitbucket query syntax
    #[arg(long, short = 'q')]
    pub query: Option<String>,

    #[arg(long)]
    pub page: Option<u32>,

    #[arg(long, short = 'L', default_value = "30")]
    pub limit: u32,
}

impl TableRow for Workspace {
    fn headers() -> Vec<&'static str> {
        vec!["SLUG", "NAME", "VISIBILITY"]
    }

    fn row(&self, _color: bool) -> Vec<String> {
        vec![
            self.slug.clone(),
            self.name.clone(),
            if self.is_private { "private" } else { "public" }.to_string(),
        ]
    }

    fn empty_message() -> &'static str {
        "You are not a member of any workspace"
    }
}

impl TableOutput for Workspace {
    fn print_table(&self, color: bool) {
        let name = if color {
            style(&self.name).bold().to_string()
        } else {
            self.name.clone()
        };
        println!("{} ({})", name, self.slug);
        println!();
        print_field("UUID", &self.uuid, color);
        print_field(
            "Visibility",
            if self.is_private { "private" } else { "public" },
            color,
        );
        print_field("Created", &time_ago_opt(self.created_on.as_deref()), color);
        print_optional_field(
            "URL",
            self.links.as_ref().and_then(|l| l.html_url()),
            color,
        );
    }
}

impl TableRow for WorkspaceMembership {
    fn headers() -> Vec<&'static str> {
        vec!["NAME", "NICKNAME", "ACCOUNT ID"]
    }

    fn row(&self, _color: bool) -> Vec<String> {
        let user = self.user.as_ref();
        vec![
            user_display_name(user),
            user.and_then(|u| u.nickname.clone()).unwrap_or_default(),
            user.and_then(|u| u.account_id.clone()).unwrap_or_default(),
        ]
    }

    fn empty_message() -> &'static str {
        "No members found"
    }
}

impl TableRow for Project {
    fn headers() -> Vec<&'static str> {
        vec!["KEY", "NAME", "DESCRIPTION", "VISIBILITY"]
    }

    fn row(&self, _color: bool) -> Vec<String> {
        vec![
            self.key.clone(),
            self.name.clone(),
            truncate(&self.description, 50),
            if self.is_private { "private" } else { "public" }.to_string(),
        ]
    }

    fn empty_message() -> &'static str {
        "No projects found"
    }
}

impl WorkspaceCommand {
    pub async fn run(&self, global: &GlobalOptions) -> Result<()> {
        let session = Session::new(global)?;
        match &self.command {
            WorkspaceSubcommand::List(args) => list(&session, args).await,
            WorkspaceSubcommand::View(args) => view(&session, args).await,
            WorkspaceSubcommand::Members(args) => members(&session, args).await,
            WorkspaceSubcommand::Projects(args) => projects(&session, args).await,
        }
    }
}

/// A positional workspace wins over `--workspace` and the repository context.
fn workspace_arg(session: &Session<'_>, workspace: Option<&str>) -> Result<String> {
    match workspace.filter(|w| !w.is_empty()) {
        Some(w) => Ok(w.to_string()),
        None => session.workspace(),
    }
}

async fn list(session: &Session<'_>, args: &ListArgs) -> Result<()> {
    let options = WorkspaceListOptions {
        role: args.role.clone(),
        page: args.page,
        pagelen: Some(args.limit),
        ..Default::default()
    };

    let page = session.client.list_workspaces(&options).await?;
    session.output.write_list(&page.values)?;
    print_page_hint(&session.output, &page, "workspaces");
    Ok(())
}

async fn view(session: &Session<'_>, args: &WorkspaceArgs) -> Result<()> {
    let workspace = workspace_arg(session, args.workspace.as_deref())?;
    let ws = session.client.get_workspace(&workspace).await?;
    session.output.write(&ws)
}

async fn members(session: &Session<'_>, args: &PagedWorkspaceArgs) -> Result<()> {
    let workspace = workspace_arg(session, args.workspace.as_deref())?;
    let page = session
        .client
        .list_workspace_members(&workspace, args.page, Some(args.limit))
        .await?;

    session.output.write_list(&page.values)?;
    print_page_hint(&session.output, &page, "members");
    Ok(())
}

async fn projects(session: &Session<'_>, args: &ProjectsArgs) -> Result<()> {
    let workspace = workspace_arg(session, args.workspace.as_deref())?;
    let options = ProjectListOptions {
        q: args.query.clone(),
        page: args.page,
        pagelen: Some(args.limit),
        ..Default::default()
    };

    let page = session.client.list_projects(&workspace, &options).await?;
    session.output.write_list(&page.values)?;
    print_page_hint(&session.output, &page, "projects");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_membership_row() {
        let member: WorkspaceMembership = serde_json::from_value(serde_json::json!({
            "user": {"display_name": "Jane Doe", "nickname": "jdoe", "account_id": "557058:1"}
        }))
        .unwrap();

        assert_eq!(member.row(false), vec!["Jane Doe", "jdoe", "557058:1"]);
    }

    #[test]
    fn test_project_row() {
        let project: Project = serde_json::from_value(serde_json::json!({
            "key": "WEB",
            "name": "Website",
            "is_private": true
        }))
        .unwrap();

        assert_eq!(project.row(false), vec!["WEB", "Website", "", "private"]);
    }
}
