//
//  bb-cloud
//  cli/pipeline.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Pipeline commands
//!
//! Run, inspect and stop Bitbucket Pipelines. Pipelines are addressed by
//! build number (`42`) or UUID.

use anyhow::{anyhow, bail, Result};
use clap::{Args, Subcommand};
use console::style;

use crate::api::cloud::pipelines::{
    Pipeline, PipelineListOptions, PipelineRunOptions, PipelineState, PipelineStep,
};
use crate::api::BitbucketClient;
use crate::context::RepoRef;
use crate::output::{format_status, print_field, print_optional_field, TableOutput, TableRow};
use crate::util::{format_duration, parse_pipeline_identifier, short_hash, time_ago_opt, user_display_name};

use super::{print_page_hint, GlobalOptions, Session};

#[derive(Args, Debug)]
pub struct PipelineCommand {
    #[command(subcommand)]
    pub command: PipelineSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum PipelineSubcommand {
    /// List recent pipeline runs
    #[command(visible_alias = "ls")]
    List(ListArgs),

    /// Show a pipeline run
    View(PipelineArgs),

    /// Start a pipeline
    Run(RunArgs),

    /// Stop a running pipeline
    Stop(PipelineArgs),

    /// List the steps of a pipeline run
    Steps(PipelineArgs),

    /// Print step logs
    Log(LogArgs),
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Filter by status, e.g. SUCCESSFUL, FAILED, IN_PROGRESS
    #[arg(long, short = 's')]
    pub status: Option<String>,

    #[arg(long)]
    pub page: Option<u32>,

    #[arg(long, short = 'L', default_value = "20")]
    pub limit: u32,
}

#[derive(Args, Debug)]
pub struct PipelineArgs {
    /// Build number or UUID
    pub pipeline: String,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Branch to run on (defaults to the main branch)
    #[arg(long, short = 'b')]
    pub branch: Option<String>,

    /// Name of a custom pipeline
    #[arg(long, short = 'c')]
    pub custom: Option<String>,

    /// Pipeline variable as KEY=VALUE
    #[arg(long = "var", value_parser = parse_variable)]
    pub variables: Vec<(String, String)>,

    /// Secured pipeline variable as KEY=VALUE
    #[arg(long = "secure-var", value_parser = parse_variable)]
    pub secure_variables: Vec<(String, String)>,
}

#[derive(Args, Debug)]
pub struct LogArgs {
    /// Build number or UUID
    pub pipeline: String,

    /// Step UUID; all steps when omitted
    #[arg(long, short = 's')]
    pub step: Option<String>,
}

fn parse_variable(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{}'", s)),
    }
}

fn state_label(state: Option<&PipelineState>) -> &str {
    state.map(|s| s.label()).unwrap_or("UNKNOWN")
}

impl TableRow for Pipeline {
    fn headers() -> Vec<&'static str> {
        vec!["#", "STATUS", "BRANCH", "COMMIT", "TRIGGER", "DURATION", "STARTED"]
    }

    fn row(&self, color: bool) -> Vec<String> {
        let target = self.target.as_ref();
        vec![
            self.build_number.to_string(),
            format_status(state_label(self.state.as_ref()), color),
            target
                .and_then(|t| t.ref_name.clone())
                .unwrap_or_else(|| "-".to_string()),
            target
                .and_then(|t| t.commit.as_ref())
                .map(|c| short_hash(&c.hash).to_string())
                .unwrap_or_else(|| "-".to_string()),
            trigger_name(self),
            format_duration(self.duration_in_seconds.unwrap_or_default() as i64),
            time_ago_opt(self.created_on.as_deref()),
        ]
    }

    fn empty_message() -> &'static str {
        "No pipelines found"
    }
}

impl TableOutput for Pipeline {
    fn print_table(&self, color: bool) {
        let heading = format!("Pipeline #{}", self.build_number);
        if color {
            println!("{}", style(heading).bold());
        } else {
            println!("{}", heading);
        }
        println!();
        print_field("Status", &format_status(state_label(self.state.as_ref()), color), color);
        if let Some(target) = &self.target {
            print_optional_field("Branch", target.ref_name.as_deref(), color);
            print_optional_field(
                "Commit",
                target.commit.as_ref().map(|c| short_hash(&c.hash)),
                color,
            );
            print_optional_field(
                "Pipeline",
                target.selector.as_ref().and_then(|s| s.pattern.as_deref()),
                color,
            );
        }
        print_field("Trigger", &trigger_name(self), color);
        print_field("Creator", &user_display_name(self.creator.as_ref()), color);
        print_field("Started", &time_ago_opt(self.created_on.as_deref()), color);
        print_field(
            "Duration",
            &format_duration(self.duration_in_seconds.unwrap_or_default() as i64),
            color,
        );
        print_field("UUID", &self.uuid, color);
    }
}

impl TableRow for PipelineStep {
    fn headers() -> Vec<&'static str> {
        vec!["STEP", "STATUS", "IMAGE", "DURATION", "UUID"]
    }

    fn row(&self, color: bool) -> Vec<String> {
        vec![
            self.name.clone().unwrap_or_else(|| "-".to_string()),
            format_status(state_label(self.state.as_ref()), color),
            self.image
                .as_ref()
                .map(|i| i.name.clone())
                .unwrap_or_else(|| "-".to_string()),
            format_duration(self.duration_in_seconds.unwrap_or_default() as i64),
            self.uuid.clone(),
        ]
    }

    fn empty_message() -> &'static str {
        "This pipeline has no steps"
    }
}

/// Short trigger label: `push`, `pr`, `manual`, `schedule`, ...
fn trigger_name(pipeline: &Pipeline) -> String {
    let Some(trigger) = &pipeline.trigger else {
        return "unknown".to_string();
    };

    match trigger.trigger_type.as_str() {
        "pipeline_trigger_pull_request" => "pr".to_string(),
        other => other
            .strip_prefix("pipeline_trigger_")
            .unwrap_or(other)
            .to_string(),
    }
}

/// Resolves a build number or UUID to the pipeline's `{uuid}`.
async fn resolve_pipeline_uuid(
    client: &BitbucketClient,
    repo: &RepoRef,
    identifier: &str,
) -> Result<String> {
    let identifier = parse_pipeline_identifier(identifier);
    let Ok(build_number) = identifier.parse::<u64>() else {
        return Ok(identifier);
    };

    let options = PipelineListOptions {
        sort: Some("-created_on".to_string()),
        pagelen: Some(100),
        ..Default::default()
    };
    let page = client
        .list_pipelines(&repo.workspace, &repo.repo_slug, &options)
        .await?;

    page.values
        .into_iter()
        .find(|p| p.build_number == build_number)
        .map(|p| p.uuid)
        .ok_or_else(|| anyhow!("Pipeline #{} not found in the 100 most recent runs", build_number))
}

impl PipelineCommand {
    pub async fn run(&self, global: &GlobalOptions) -> Result<()> {
        let session = Session::new(global)?;
        match &self.command {
            PipelineSubcommand::List(args) => list(&session, args).await,
            PipelineSubcommand::View(args) => view(&session, args).await,
            PipelineSubcommand::Run(args) => run(&session, args).await,
            PipelineSubcommand::Stop(args) => stop(&session, args).await,
            PipelineSubcommand::Steps(args) => steps(&session, args).await,
            PipelineSubcommand::Log(args) => log(&session, args).await,
        }
    }
}

async fn list(session: &Session<'_>, args: &ListArgs) -> Result<()> {
    let repo = session.repo()?;
    let options = PipelineListOptions {
        status: args.status.as_ref().map(|s| s.to_uppercase()),
        sort: Some("-created_on".to_string()),
        page: args.page,
        pagelen: Some(args.limit),
    };

    let page = session
        .client
        .list_pipelines(&repo.workspace, &repo.repo_slug, &options)
        .await?;

    session.output.write_list(&page.values)?;
    print_page_hint(&session.output, &page, "pipelines");
    Ok(())
}

async fn view(session: &Session<'_>, args: &PipelineArgs) -> Result<()> {
    let repo = session.repo()?;
    let pipeline = session
        .client
        .get_pipeline(
            &repo.workspace,
            &repo.repo_slug,
            &parse_pipeline_identifier(&args.pipeline),
        )
        .await?;

    session.output.write(&pipeline)
}

async fn run(session: &Session<'_>, args: &RunArgs) -> Result<()> {
    let repo = session.repo()?;

    let branch = match &args.branch {
        Some(branch) => branch.clone(),
        None => session
            .client
            .get_repository(&repo.workspace, &repo.repo_slug)
            .await?
            .main_branch()
            .map(str::to_string)
            .ok_or_else(|| anyhow!("{} has no main branch; pass --branch", repo))?,
    };

    let mut options = PipelineRunOptions::for_branch(&branch);
    if let Some(custom) = &args.custom {
        options = options.with_custom_pipeline(custom);
    }
    for (key, value) in &args.variables {
        options = options.with_variable(key, value, false);
    }
    for (key, value) in &args.secure_variables {
        options = options.with_variable(key, value, true);
    }

    let pipeline = session
        .client
        .run_pipeline(&repo.workspace, &repo.repo_slug, &options)
        .await?;

    if session.output.is_json() {
        return session.output.write(&pipeline);
    }
    session.output.write_success(&format!(
        "Started pipeline #{} on {}",
        pipeline.build_number, branch
    ));
    println!(
        "{}/pipelines/results/{}",
        repo.web_url(),
        pipeline.build_number
    );
    Ok(())
}

async fn stop(session: &Session<'_>, args: &PipelineArgs) -> Result<()> {
    let repo = session.repo()?;
    let uuid = resolve_pipeline_uuid(&session.client, &repo, &args.pipeline).await?;

    session
        .client
        .stop_pipeline(&repo.workspace, &repo.repo_slug, &uuid)
        .await?;
    session
        .output
        .write_success(&format!("Stopping pipeline {}", args.pipeline));
    Ok(())
}

async fn steps(session: &Session<'_>, args: &PipelineArgs) -> Result<()> {
    let repo = session.repo()?;
    let uuid = resolve_pipeline_uuid(&session.client, &repo, &args.pipeline).await?;

    let page = session
        .client
        .list_pipeline_steps(&repo.workspace, &repo.repo_slug, &uuid)
        .await?;
    session.output.write_list(&page.values)
}

async fn log(session: &Session<'_>, args: &LogArgs) -> Result<()> {
    let repo = session.repo()?;
    let uuid = resolve_pipeline_uuid(&session.client, &repo, &args.pipeline).await?;

    let steps: Vec<PipelineStep> = match &args.step {
        Some(step) => vec![PipelineStep {
            uuid: parse_pipeline_identifier(step),
            name: None,
            state: None,
            started_on: None,
            completed_on: None,
            duration_in_seconds: None,
            image: None,
        }],
        None => {
            session
                .client
                .list_pipeline_steps(&repo.workspace, &repo.repo_slug, &uuid)
                .await?
                .values
        }
    };

    if steps.is_empty() {
        bail!("Pipeline {} has no steps", args.pipeline);
    }

    let color = session.output.color_enabled();
    let show_headers = steps.len() > 1;
    for step in &steps {
        if show_headers {
            let name = step.name.as_deref().unwrap_or(step.uuid.as_str());
            let heading = format!("==> {}", name);
            if color {
                println!("{}", style(heading).cyan().bold());
            } else {
                println!("{}", heading);
            }
        }

        let text = session
            .client
            .get_pipeline_step_log(&repo.workspace, &repo.repo_slug, &uuid, &step.uuid)
            .await?;
        print!("{}", text);
        if !text.ends_with('\n') {
            println!();
        }
    }
    Ok(())
}
