//
//  bb-cloud
//  cli/snippet.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Snippet commands

use anyhow::Result;
use clap::{Args, Subcommand};
use console::style;

use crate::api::cloud::snippets::{Snippet, SnippetListOptions};
use crate::output::{print_field, print_optional_field, TableOutput, TableRow};
use crate::util::{time_ago_opt, truncate, user_display_name};

use super::{print_page_hint, GlobalOptions, Session};

#[derive(Args, Debug)]
pub struct SnippetCommand {
    #[command(subcommand)]
    pub command: SnippetSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum SnippetSubcommand {
    /// List snippets in a workspace, or across workspaces by role
    #[command(visible_alias = "ls")]
    List(ListArgs),

    /// View a snippet
    View(SnippetArgs),

    /// Delete a snippet
    Delete(DeleteArgs),
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Used when no workspace is given
    #[arg(long, value_parser = ["owner", "contributor", "member"], default_value = "owner")]
    pub role: String,

    #[arg(long)]
    pub page: Option<u32>,

    #[arg(long, short = 'L', default_value = "30")]
    pub limit: u32,
}

#[derive(Args, Debug)]
pub struct SnippetArgs {
    /// Encoded snippet id, as shown by `bb snippet list`
    pub id: String,
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    pub id: String,

    #[arg(long, short = 'y')]
    pub yes: bool,
}

impl TableRow for Snippet {
    fn headers() -> Vec<&'static str> {
        vec!["ID", "TITLE", "OWNER", "VISIBILITY", "UPDATED"]
    }

    fn row(&self, _color: bool) -> Vec<String> {
        vec![
            self.id.clone(),
            truncate(&self.title, 50),
            user_display_name(self.owner.as_ref()),
            if self.is_private { "private" } else { "public" }.to_string(),
            time_ago_opt(self.updated_on.as_deref()),
        ]
    }

    fn empty_message() -> &'static str {
        "No snippets found"
    }
}

impl TableOutput for Snippet {
    fn print_table(&self, color: bool) {
        let title = if self.title.is_empty() { "(untitled)" } else { &self.title };
        if color {
            println!("{} {}", style(title).bold(), style(&self.id).dim());
        } else {
            println!("{} {}", title, self.id);
        }
        println!();
        print_field("Owner", &user_display_name(self.owner.as_ref()), color);
        print_field("Creator", &user_display_name(self.creator.as_ref()), color);
        print_field(
            "Visibility",
            if self.is_private { "private" } else { "public" },
            color,
        );
        print_field("Created", &time_ago_opt(self.created_on.as_deref()), color);
        print_field("Updated", &time_ago_opt(self.updated_on.as_deref()), color);
        print_optional_field(
            "URL",
            self.links.as_ref().and_then(|l| l.html_url()),
            color,
        );
    }
}

impl SnippetCommand {
    pub async fn run(&self, global: &GlobalOptions) -> Result<()> {
        let session = Session::new(global)?;
        match &self.command {
            SnippetSubcommand::List(args) => list(&session, args).await,
            SnippetSubcommand::View(args) => view(&session, args).await,
            SnippetSubcommand::Delete(args) => delete(&session, args).await,
        }
    }
}

async fn list(session: &Session<'_>, args: &ListArgs) -> Result<()> {
    // Listing is the one place a missing workspace is fine.
    let options = SnippetListOptions {
        workspace: session.workspace().ok(),
        role: Some(args.role.clone()),
        page: args.page,
        pagelen: Some(args.limit),
    };

    let page = session.client.list_snippets(&options).await?;
    session.output.write_list(&page.values)?;
    print_page_hint(&session.output, &page, "snippets");
    Ok(())
}

async fn view(session: &Session<'_>, args: &SnippetArgs) -> Result<()> {
    let workspace = session.workspace()?;
    let snippet = session.client.get_snippet(&workspace, &args.id).await?;
    session.output.write(&snippet)
}

async fn delete(session: &Session<'_>, args: &DeleteArgs) -> Result<()> {
    let workspace = session.workspace()?;
    session.confirm(&format!("Delete snippet {}?", args.id), args.yes)?;

    session.client.delete_snippet(&workspace, &args.id).await?;
    session
        .output
        .write_success(&format!("Deleted snippet {}", args.id));
    Ok(())
}
