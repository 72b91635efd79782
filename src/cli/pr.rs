//
//  bb-cloud
//  cli/pr.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Pull request commands
//!
//! Create, review and merge pull requests. Reviewers are given as account
//! UUIDs (`{...}`), which `bb api /workspaces/<ws>/members` lists.

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use console::style;
use serde::Serialize;

use crate::api::cloud::pullrequests::{
    PullRequest, PullRequestComment, PullRequestCreateOptions, PullRequestListOptions,
    PullRequestMergeOptions, PullRequestUpdateOptions,
};
use crate::interactive::prompt_input;
use crate::output::{format_status, print_field, print_optional_field, TableOutput, TableRow};
use crate::util::{time_ago_opt, truncate, user_display_name};

use super::{print_page_hint, read_body, GlobalOptions, Session};

const STATES: [&str; 4] = ["open", "merged", "declined", "superseded"];
const MERGE_STRATEGIES: [&str; 3] = ["merge_commit", "squash", "fast_forward"];

#[derive(Args, Debug)]
pub struct PrCommand {
    #[command(subcommand)]
    pub command: PrSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum PrSubcommand {
    /// List pull requests
    #[command(visible_alias = "ls")]
    List(ListArgs),

    /// Show a pull request
    View(ViewArgs),

    /// Open a pull request
    Create(CreateArgs),

    /// Change the title, description, destination or reviewers
    Edit(EditArgs),

    /// Merge a pull request
    Merge(MergeArgs),

    /// Approve a pull request
    Approve(IdArgs),

    /// Withdraw your approval
    Unapprove(IdArgs),

    /// Decline a pull request
    Decline(IdArgs),

    /// Add a comment
    Comment(CommentArgs),

    /// Print the diff
    Diff(IdArgs),
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// States to include (repeatable); defaults to open
    #[arg(long, short = 's', value_parser = STATES)]
    pub state: Vec<String>,

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

    /// Read the description from a file (`-` for stdin)
    #[arg(long, short = 'F')]
    pub body_file: Option<PathBuf>,

    /// Branch with the changes
    #[arg(long, short = 'H', visible_alias = "head")]
    pub source: String,

    /// Branch to merge into (defaults to the main branch)
    #[arg(long, short = 'B', visible_alias = "base")]
    pub destination: Option<String>,

    /// Reviewer account UUID (repeatable)
    #[arg(long, short = 'r')]
    pub reviewer: Vec<String>,

    /// Delete the source branch after merging
    #[arg(long)]
    pub close_source_branch: bool,
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

    #[arg(long, short = 'B', visible_alias = "base")]
    pub destination: Option<String>,

    /// Replace the reviewers (repeatable)
    #[arg(long, short = 'r')]
    pub reviewer: Vec<String>,
}

#[derive(Args, Debug)]
pub struct MergeArgs {
    pub id: u64,

    #[arg(long, short = 's', value_parser = MERGE_STRATEGIES)]
    pub strategy: Option<String>,

    /// Merge commit message
    #[arg(long, short = 'm')]
    pub message: Option<String>,

    /// Delete the source branch after merging
    #[arg(long, short = 'd')]
    pub delete_branch: bool,
}

#[derive(Args, Debug)]
pub struct CommentArgs {
    pub id: u64,

    #[arg(long, short = 'b')]
    pub body: Option<String>,

    #[arg(long, short = 'F')]
    pub body_file: Option<PathBuf>,
}

impl TableRow for PullRequest {
    fn headers() -> Vec<&'static str> {
        vec!["ID", "TITLE", "BRANCH", "AUTHOR", "STATE", "UPDATED"]
    }

    fn row(&self, color: bool) -> Vec<String> {
        vec![
            format!("#{}", self.id),
            truncate(&self.title, 60),
            format!("{} → {}", self.source_branch(), self.destination_branch()),
            user_display_name(self.author.as_ref()),
            format_status(&self.state, color),
            time_ago_opt(self.updated_on.as_deref()),
        ]
    }

    fn empty_message() -> &'static str {
        "No pull requests match your search"
    }
}

impl TableOutput for PullRequest {
    fn print_table(&self, color: bool) {
        let title = if color {
            style(&self.title).bold().to_string()
        } else {
            self.title.clone()
        };
        println!("{} #{}", title, self.id);
        println!();
        print_field("State", &format_status(&self.state, color), color);
        print_field("Author", &user_display_name(self.author.as_ref()), color);
        print_field(
            "Branches",
            &format!("{} → {}", self.source_branch(), self.destination_branch()),
            color,
        );

        let reviewers: Vec<String> = self
            .reviewers
            .iter()
            .map(|r| user_display_name(Some(r)))
            .collect();
        if !reviewers.is_empty() {
            print_field("Reviewers", &reviewers.join(", "), color);
        }
        print_field("Approvals", &self.approvals().to_string(), color);
        print_field("Comments", &self.comment_count.to_string(), color);
        print_optional_field(
            "Merge commit",
            self.merge_commit.as_ref().map(|c| c.hash.as_str()),
            color,
        );
        print_field("Created", &time_ago_opt(self.created_on.as_deref()), color);
        print_field("Updated", &time_ago_opt(self.updated_on.as_deref()), color);

        if !self.description.is_empty() {
            println!();
            println!("{}", self.description);
        }

        if let Some(url) = self.links.as_ref().and_then(|l| l.html_url()) {
            println!();
            print_field("URL", url, color);
        }
    }
}

impl TableOutput for PullRequestComment {
    fn print_table(&self, color: bool) {
        if self.deleted {
            return;
        }

        let author = user_display_name(self.user.as_ref());
        let author = if color {
            style(author).cyan().bold().to_string()
        } else {
            author
        };
        println!("{} commented {}", author, time_ago_opt(self.created_on.as_deref()));
        if let Some(content) = &self.content {
            for line in content.raw.lines() {
                println!("  {}", line);
            }
        }
        println!();
    }
}

#[derive(Debug, Serialize)]
struct PullRequestWithComments<'a> {
    #[serde(flatten)]
    pull_request: &'a PullRequest,
    comments: &'a [PullRequestComment],
}

impl PrCommand {
    pub async fn run(&self, global: &GlobalOptions) -> Result<()> {
        let session = Session::new(global)?;
        match &self.command {
            PrSubcommand::List(args) => list(&session, args).await,
            PrSubcommand::View(args) => view(&session, args).await,
            PrSubcommand::Create(args) => create(&session, args).await,
            PrSubcommand::Edit(args) => edit(&session, args).await,
            PrSubcommand::Merge(args) => merge(&session, args).await,
            PrSubcommand::Approve(args) => approve(&session, args).await,
            PrSubcommand::Unapprove(args) => unapprove(&session, args).await,
            PrSubcommand::Decline(args) => decline(&session, args).await,
            PrSubcommand::Comment(args) => comment(&session, args).await,
            PrSubcommand::Diff(args) => diff(&session, args).await,
        }
    }
}

async fn list(session: &Session<'_>, args: &ListArgs) -> Result<()> {
    let repo = session.repo()?;
    let options = PullRequestListOptions {
        states: args.state.clone(),
        page: args.page,
        pagelen: Some(args.limit),
    };

    let page = session
        .client
        .list_pull_requests(&repo.workspace, &repo.repo_slug, &options)
        .await?;

    session.output.write_list(&page.values)?;
    print_page_hint(&session.output, &page, "pull requests");
    Ok(())
}

async fn view(session: &Session<'_>, args: &ViewArgs) -> Result<()> {
    let repo = session.repo()?;
    let pr = session
        .client
        .get_pull_request(&repo.workspace, &repo.repo_slug, args.id)
        .await?;

    if !args.comments {
        return session.output.write(&pr);
    }

    let comments = session
        .client
        .list_pull_request_comments(&repo.workspace, &repo.repo_slug, args.id)
        .await?
        .values;

    if session.output.is_json() {
        return crate::output::write_json(&PullRequestWithComments {
            pull_request: &pr,
            comments: &comments,
        });
    }

    let color = session.output.color_enabled();
    pr.print_table(color);
    println!();
    for comment in &comments {
        comment.print_table(color);
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
        bail!("Pull request title cannot be empty");
    }

    let description = match read_body(args.body.as_deref(), args.body_file.as_deref())? {
        Some(body) => Some(body),
        None if session.can_prompt() => session.prompt_description()?,
        None => None,
    };

    let options = PullRequestCreateOptions {
        title,
        description,
        source_branch: args.source.clone(),
        destination_branch: args.destination.clone(),
        reviewers: args.reviewer.clone(),
        close_source_branch: args.close_source_branch.then_some(true),
    };

    let pr = session
        .client
        .create_pull_request(&repo.workspace, &repo.repo_slug, &options)
        .await?;

    if session.output.is_json() {
        return session.output.write(&pr);
    }
    session.output.write_success(&format!(
        "Created pull request #{} ({} → {})",
        pr.id,
        pr.source_branch(),
        pr.destination_branch()
    ));
    if let Some(url) = pr.links.as_ref().and_then(|l| l.html_url()) {
        println!("{}", url);
    }
    Ok(())
}

async fn edit(session: &Session<'_>, args: &EditArgs) -> Result<()> {
    let repo = session.repo()?;
    let options = PullRequestUpdateOptions {
        title: args.title.clone(),
        description: read_body(args.body.as_deref(), args.body_file.as_deref())?,
        destination_branch: args.destination.clone(),
        reviewers: (!args.reviewer.is_empty()).then(|| args.reviewer.clone()),
    };

    if options.is_empty() {
        bail!("Nothing to change. Pass at least one of --title, --body, --destination or --reviewer");
    }

    let pr = session
        .client
        .update_pull_request(&repo.workspace, &repo.repo_slug, args.id, &options)
        .await?;

    if session.output.is_json() {
        return session.output.write(&pr);
    }
    session
        .output
        .write_success(&format!("Updated pull request #{}", pr.id));
    Ok(())
}

async fn merge(session: &Session<'_>, args: &MergeArgs) -> Result<()> {
    let repo = session.repo()?;
    let options = PullRequestMergeOptions {
        message: args.message.clone(),
        close_source_branch: args.delete_branch.then_some(true),
        merge_strategy: args.strategy.clone(),
    };

    let pr = session
        .client
        .merge_pull_request(&repo.workspace, &repo.repo_slug, args.id, &options)
        .await?;

    if session.output.is_json() {
        return session.output.write(&pr);
    }
    session
        .output
        .write_success(&format!("Merged pull request #{} ({})", pr.id, pr.state));
    Ok(())
}

async fn approve(session: &Session<'_>, args: &IdArgs) -> Result<()> {
    let repo = session.repo()?;
    let participant = session
        .client
        .approve_pull_request(&repo.workspace, &repo.repo_slug, args.id)
        .await?;

    if session.output.is_json() {
        return crate::output::write_json(&participant);
    }
    session
        .output
        .write_success(&format!("Approved pull request #{}", args.id));
    Ok(())
}

async fn unapprove(session: &Session<'_>, args: &IdArgs) -> Result<()> {
    let repo = session.repo()?;
    session
        .client
        .unapprove_pull_request(&repo.workspace, &repo.repo_slug, args.id)
        .await?;
    session
        .output
        .write_success(&format!("Removed your approval from pull request #{}", args.id));
    Ok(())
}

async fn decline(session: &Session<'_>, args: &IdArgs) -> Result<()> {
    let repo = session.repo()?;
    let pr = session
        .client
        .decline_pull_request(&repo.workspace, &repo.repo_slug, args.id)
        .await?;

    if session.output.is_json() {
        return session.output.write(&pr);
    }
    session
        .output
        .write_success(&format!("Declined pull request #{}", pr.id));
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
        .create_pull_request_comment(&repo.workspace, &repo.repo_slug, args.id, &body)
        .await?;

    if session.output.is_json() {
        return session.output.write(&comment);
    }
    session
        .output
        .write_success(&format!("Commented on pull request #{}", args.id));
    Ok(())
}

async fn diff(session: &Session<'_>, args: &IdArgs) -> Result<()> {
    let repo = session.repo()?;
    let text = session
        .client
        .get_pull_request_diff(&repo.workspace, &repo.repo_slug, args.id)
        .await?;

    let color = session.output.color_enabled();
    for line in text.lines() {
        println!("{}", colorize_diff_line(line, color));
    }
    Ok(())
}

fn colorize_diff_line(line: &str, color: bool) -> String {
    if !color {
        return line.to_string();
    }

    if line.starts_with("+++") || line.starts_with("---") || line.starts_with("diff ") {
        style(line).bold().to_string()
    } else if line.starts_with('+') {
        style(line).green().to_string()
    } else if line.starts_with('-') {
        style(line).red().to_string()
    } else if line.starts_with("@@") {
        style(line).cyan().to_string()
    } else {
        line.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diff_lines_plain_without_color() {
        assert_eq!(colorize_diff_line("+added", false), "+added");
        assert_eq!(colorize_diff_line("-removed", false), "-removed");
    }

    #[test]
    fn test_row_shows_branches() {
        let pr: PullRequest = serde_json::from_value(serde_json::json!({
            "id": 7,
            "title": "Add widgets",
            "state": "OPEN",
            "source": {"branch": {"name": "feature"}},
            "destination": {"branch": {"name": "main"}}
        }))
        .unwrap();

        let row = pr.row(false);
        assert_eq!(row[0], "#7");
        assert_eq!(row[2], "feature → main");
        assert_eq!(row[4], "OPEN");
    }
}
