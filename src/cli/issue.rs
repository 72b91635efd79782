//
//  bb-cloud
//  cli/issue.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Issue commands
//!
//! Commands for the issue tracker of a Bitbucket Cloud repository. The
//! repository must have its issue tracker enabled.

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use console::style;
use serde::Serialize;

use crate::api::cloud::issues::{
    Issue, IssueComment, IssueCreateOptions, IssueListOptions, IssueUpdateOptions,
};
use crate::interactive::prompt_input;
use crate::output::{format_status, print_field, TableOutput, TableRow};
use crate::util::{time_ago_opt, truncate, user_display_name};

use super::{print_page_hint, read_body, GlobalOptions, Session};

const STATES: [&str; 8] = [
    "new", "open", "resolved", "on hold", "invalid", "duplicate", "wontfix", "closed",
];
const KINDS: [&str; 4] = ["bug", "enhancement", "proposal", "task"];
const PRIORITIES: [&str; 5] = ["trivial", "minor", "major", "critical", "blocker"];

#[derive(Args, Debug)]
pub struct IssueCommand {
    #[command(subcommand)]
    pub command: IssueSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum IssueSubcommand {
    /// List issues
    #[command(visible_alias = "ls")]
    List(ListArgs),

    /// Show an issue
    View(ViewArgs),

    /// Create an issue
    Create(CreateArgs),

    /// Change fields of an issue
    Edit(EditArgs),

    /// Mark an issue as resolved
    Close(IdArgs),

    /// Mark an issue as open
    Reopen(IdArgs),

    /// Delete an issue
    Delete(DeleteArgs),

    /// Add a comment to an issue
    Comment(CommentArgs),
}

#[derive(Args, Debug)]
pub struct ListArgs {
    #[arg(long, short = 's', value_parser = STATES)]
    pub state: Option<String>,

    #[arg(long, short = 'k', value_parser = KINDS)]
    pub kind: Option<String>,

    #[arg(long, short = 'p', value_parser = PRIORITIES)]
    pub priority: Option<String>,

    /// Assignee username
    #[arg(long, short = 'a')]
    pub assignee: Option<String>,

    /// Raw Bitbucket filter expression; overrides the other filters
    #[arg(long, short = 'q')]
    pub query: Option<String>,

    #[arg(long, default_value = "-updated_on")]
    pub sort: String,

    #[arg(long)]
    pub page: Option<u32>,

    #[arg(long, short = 'L', default_value = "30")]
    pub limit: u32,
}

#[derive(Args, Debug)]
pub struct IdArgs {
    pub id: u64,
}

#[derive(Args, Debug)]
pub struct ViewArgs {
    pub id: u64,

    /// Also show comments
    #[arg(long, short = 'c')]
    pub comments: bool,
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    #[arg(long, short = 't')]
    pub title: Option<String>,

    #[arg(long, short = 'b')]
    pub body: Option<String>,

    /// Read the body from a file (`-` for stdin)
    #[arg(long, short = 'F')]
    pub body_file: Option<PathBuf>,

    #[arg(long, short = 'k', value_parser = KINDS)]
    pub kind: Option<String>,

    #[arg(long, short = 'p', value_parser = PRIORITIES)]
    pub priority: Option<String>,

    /// Assignee account UUID
    #[arg(long, short = 'a')]
    pub assignee: Option<String>,
}

#[derive(Args, Debug)]
pub struct EditArgs {
    pub id: u64,

    #[arg(long, short = 't')]
    pub title: Option<String>,

    #[arg(long, short = 'b')]
    pub body: Option<String>,

    #[arg(long, short = 'F')]
    pub body_file: Option<PathBuf>,

    #[arg(long, short = 's', value_parser = STATES)]
    pub state: Option<String>,

    #[arg(long, short = 'k', value_parser = KINDS)]
    pub kind: Option<String>,

    #[arg(long, short = 'p', value_parser = PRIORITIES)]
    pub priority: Option<String>,

    /// Assignee account UUID
    #[arg(long, short = 'a')]
    pub assignee: Option<String>,
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    pub id: u64,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

#[derive(Args, Debug)]
pub struct CommentArgs {
    pub id: u64,

    #[arg(long, short = 'b')]
    pub body: Option<String>,

    #[arg(long, short = 'F')]
    pub body_file: Option<PathBuf>,
}

impl TableRow for Issue {
    fn headers() -> Vec<&'static str> {
        vec!["ID", "TITLE", "STATE", "KIND", "PRIORITY", "ASSIGNEE", "UPDATED"]
    }

    fn row(&self, color: bool) -> Vec<String> {
        vec![
            format!("#{}", self.id),
            truncate(&self.title, 60),
            format_status(&self.state, color),
            self.kind.clone(),
            self.priority.clone(),
            self.assignee
                .as_ref()
                .map(|u| user_display_name(Some(u)))
                .unwrap_or_else(|| "-".to_string()),
            time_ago_opt(self.updated_on.as_deref()),
        ]
    }

    fn empty_message() -> &'static str {
        "No issues match your search"
    }
}

impl TableOutput for Issue {
    fn print_table(&self, color: bool) {
        let title = if color {
            style(&self.title).bold().to_string()
        } else {
            self.title.clone()
        };
        println!("{} #{}", title, self.id);
        println!();
        print_field("State", &format_status(&self.state, color), color);
        print_field("Kind", &self.kind, color);
        print_field("Priority", &self.priority, color);
        print_field("Reporter", &user_display_name(self.reporter.as_ref()), color);
        print_field(
            "Assignee",
            &self
                .assignee
                .as_ref()
                .map(|u| user_display_name(Some(u)))
                .unwrap_or_else(|| "Unassigned".to_string()),
            color,
        );
        print_field("Votes", &self.votes.to_string(), color);
        print_field("Created", &time_ago_opt(self.created_on.as_deref()), color);
        print_field("Updated", &time_ago_opt(self.updated_on.as_deref()), color);

        if let Some(content) = self.content.as_ref().filter(|c| !c.raw.is_empty()) {
            println!();
            println!("{}", content.raw);
        }

        if let Some(url) = self.links.as_ref().and_then(|l| l.html_url()) {
            println!();
            print_field("URL", url, color);
        }
    }
}

impl TableOutput for IssueComment {
    fn print_table(&self, color: bool) {
        let author = user_display_name(self.user.as_ref());
        let author = if color {
            style(author).cyan().bold().to_string()
        } else {
            author
        };
        println!(
            "{} commented {}",
            author,
            time_ago_opt(self.created_on.as_deref())
        );
        if let Some(content) = &self.content {
            for line in content.raw.lines() {
                println!("  {}", line);
            }
        }
        println!();
    }
}

#[derive(Debug, Serialize)]
struct IssueWithComments<'a> {
    #[serde(flatten)]
    issue: &'a Issue,
    comments: &'a [IssueComment],
}

impl IssueCommand {
    pub async fn run(&self, global: &GlobalOptions) -> Result<()> {
        let session = Session::new(global)?;
        match &self.command {
            IssueSubcommand::List(args) => list(&session, args).await,
            IssueSubcommand::View(args) => view(&session, args).await,
            IssueSubcommand::Create(args) => create(&session, args).await,
            IssueSubcommand::Edit(args) => edit(&session, args).await,
            IssueSubcommand::Close(args) => set_state(&session, args.id, "resolved").await,
            IssueSubcommand::Reopen(args) => set_state(&session, args.id, "open").await,
            IssueSubcommand::Delete(args) => delete(&session, args).await,
            IssueSubcommand::Comment(args) => comment(&session, args).await,
        }
    }
}

async fn list(session: &Session<'_>, args: &ListArgs) -> Result<()> {
    let repo = session.repo()?;
    let options = IssueListOptions {
        state: args.state.clone(),
        kind: args.kind.clone(),
        priority: args.priority.clone(),
        assignee: args.assignee.clone(),
        q: args.query.clone(),
        sort: Some(args.sort.clone()),
        page: args.page,
        pagelen: Some(args.limit),
    };

    let page = session
        .client
        .list_issues(&repo.workspace, &repo.repo_slug, &options)
        .await?;

    session.output.write_list(&page.values)?;
    print_page_hint(&session.output, &page, "issues");
    Ok(())
}

async fn view(session: &Session<'_>, args: &ViewArgs) -> Result<()> {
    let repo = session.repo()?;
    let issue = session
        .client
        .get_issue(&repo.workspace, &repo.repo_slug, args.id)
        .await?;

    if !args.comments {
        return session.output.write(&issue);
    }

    let comments = session
        .client
        .list_issue_comments(&repo.workspace, &repo.repo_slug, args.id)
        .await?
        .values;

    if session.output.is_json() {
        return crate::output::write_json(&IssueWithComments {
            issue: &issue,
            comments: &comments,
        });
    }

    issue.print_table(session.output.color_enabled());
    println!();
    println!("{} comment(s)", comments.len());
    println!();
    for comment in &comments {
        comment.print_table(session.output.color_enabled());
    }
    Ok(())
}

async fn create(session: &Session<'_>, args: &CreateArgs) -> Result<()> {
    let repo = session.repo()?;

    let title = match &args.title {
        Some(title) => title.clone(),
        None if session.can_prompt() => prompt_input("Title")?,
        None => bail!("--title is required when not running interactively"),
    };
    if title.trim().is_empty() {
        bail!("Issue title cannot be empty");
    }

    let content = match read_body(args.body.as_deref(), args.body_file.as_deref())? {
        Some(body) => Some(body),
        None if session.can_prompt() => session.prompt_description()?,
        None => None,
    };

    let options = IssueCreateOptions {
        title,
        content,
        kind: args.kind.clone(),
        priority: args.priority.clone(),
        assignee: args.assignee.clone(),
    };

    let issue = session
        .client
        .create_issue(&repo.workspace, &repo.repo_slug, &options)
        .await?;

    if session.output.is_json() {
        return session.output.write(&issue);
    }
    session
        .output
        .write_success(&format!("Created issue #{} in {}", issue.id, repo));
    if let Some(url) = issue.links.as_ref().and_then(|l| l.html_url()) {
        println!("{}", url);
    }
    Ok(())
}

async fn edit(session: &Session<'_>, args: &EditArgs) -> Result<()> {
    let repo = session.repo()?;
    let options = IssueUpdateOptions {
        title: args.title.clone(),
        content: read_body(args.body.as_deref(), args.body_file.as_deref())?,
        state: args.state.clone(),
        kind: args.kind.clone(),
        priority: args.priority.clone(),
        assignee: args.assignee.clone(),
    };

    if options.is_empty() {
        bail!("Nothing to change. Pass at least one of --title, --body, --state, --kind, --priority or --assignee");
    }

    let issue = session
        .client
        .update_issue(&repo.workspace, &repo.repo_slug, args.id, &options)
        .await?;

    if session.output.is_json() {
        return session.output.write(&issue);
    }
    session
        .output
        .write_success(&format!("Updated issue #{}", issue.id));
    Ok(())
}

async fn set_state(session: &Session<'_>, id: u64, state: &str) -> Result<()> {
    let repo = session.repo()?;
    let options = IssueUpdateOptions {
        state: Some(state.to_string()),
        ..Default::default()
    };

    let issue = session
        .client
        .update_issue(&repo.workspace, &repo.repo_slug, id, &options)
        .await?;

    if session.output.is_json() {
        return session.output.write(&issue);
    }
    session
        .output
        .write_success(&format!("Issue #{} is now {}", issue.id, issue.state));
    Ok(())
}

async fn delete(session: &Session<'_>, args: &DeleteArgs) -> Result<()> {
    let repo = session.repo()?;
    session.confirm(
        &format!("Delete issue #{} from {}?", args.id, repo),
        args.yes,
    )?;

    session
        .client
        .delete_issue(&repo.workspace, &repo.repo_slug, args.id)
        .await?;
    session
        .output
        .write_success(&format!("Deleted issue #{}", args.id));
    Ok(())
}

async fn comment(session: &Session<'_>, args: &CommentArgs) -> Result<()> {
    let repo = session.repo()?;

    let body = match read_body(args.body.as_deref(), args.body_file.as_deref())? {
        Some(body) => body,
        None if session.can_prompt() => prompt_input("Comment")?,
        None => bail!("--body or --body-file is required when not running interactively"),
    };
    if body.trim().is_empty() {
        bail!("Comment cannot be empty");
    }

    let comment = session
        .client
        .create_issue_comment(&repo.workspace, &repo.repo_slug, args.id, &body)
        .await?;

    if session.output.is_json() {
        return session.output.write(&comment);
    }
    session
        .output
        .write_success(&format!("Commented on issue #{}", args.id));
    Ok(())
}
