//
//  bb-cloud
//  api/cloud/pipelines.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Cloud pipelines API.
//!
//! This module provides types and calls for Bitbucket Pipelines, the built-in
//! CI/CD service of Bitbucket Cloud.
//!
//! # Pipeline Lifecycle
//!
//! ```text
//! PENDING -> IN_PROGRESS -> COMPLETED (SUCCESSFUL/FAILED/STOPPED)
//!                       \-> PAUSED -> IN_PROGRESS -> ...
//! ```
//!
//! # Identifiers
//!
//! Pipeline and step paths accept either a build number (`42`) or a UUID in
//! braces (`{0f4c...}`). See [`parse_pipeline_identifier`](crate::util::parse_pipeline_identifier).
//!
//! # Example
//!
//! ```rust,no_run
//! use bb_cloud::api::BitbucketClient;
//! use bb_cloud::api::cloud::pipelines::PipelineRunOptions;
//!
//! # async fn demo(client: BitbucketClient) -> Result<(), bb_cloud::api::ClientError> {
//! let options = PipelineRunOptions::for_branch("main").with_custom_pipeline("deploy");
//! let pipeline = client.run_pipeline("acme", "widgets", &options).await?;
//! println!("Started build #{}", pipeline.build_number);
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};

use super::{non_empty, repo_path};
use crate::api::client::{parse_response, BitbucketClient, Query, Request};
use crate::api::common::{null_as_default, ClientError, CommitRef, Paginated, ResourceLinks, User};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pipeline {
    #[serde(default, deserialize_with = "null_as_default")]
    pub uuid: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub build_number: u64,

    #[serde(default)]
    pub creator: Option<User>,

    #[serde(default)]
    pub state: Option<PipelineState>,

    #[serde(default)]
    pub target: Option<PipelineTarget>,

    #[serde(default)]
    pub trigger: Option<PipelineTrigger>,

    #[serde(default)]
    pub created_on: Option<String>,

    #[serde(default)]
    pub completed_on: Option<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub build_seconds_used: u64,

    #[serde(default)]
    pub duration_in_seconds: Option<u64>,

    #[serde(default)]
    pub links: Option<ResourceLinks>,
}

/// Pipeline or step state, e.g. `{"name": "COMPLETED", "result": {"name": "SUCCESSFUL"}}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineState {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,

    #[serde(rename = "type", default)]
    pub state_type: String,

    #[serde(default)]
    pub result: Option<PipelineResult>,

    #[serde(default)]
    pub stage: Option<PipelineResult>,
}

impl PipelineState {
    /// Returns the most specific label: the result for completed runs, the
    /// stage for running ones, otherwise the state name.
    pub fn label(&self) -> &str {
        self.result
            .as_ref()
            .or(self.stage.as_ref())
            .map(|r| r.name.as_str())
            .unwrap_or(self.name.as_str())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineResult {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,

    #[serde(rename = "type", default)]
    pub result_type: String,
}

/// What a pipeline runs against. Also used as the body of a run request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineTarget {
    #[serde(rename = "type", default)]
    pub target_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ref_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ref_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit: Option<CommitRef>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<PipelineSelector>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSelector {
    #[serde(rename = "type")]
    pub selector_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineTrigger {
    #[serde(rename = "type", default)]
    pub trigger_type: String,

    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineStep {
    #[serde(default, deserialize_with = "null_as_default")]
    pub uuid: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub state: Option<PipelineState>,

    #[serde(default)]
    pub started_on: Option<String>,

    #[serde(default)]
    pub completed_on: Option<String>,

    #[serde(default)]
    pub duration_in_seconds: Option<u64>,

    #[serde(default)]
    pub image: Option<PipelineImage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineImage {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineVariable {
    pub key: String,

    pub value: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub secured: bool,
}

/// Filters for [`BitbucketClient::list_pipelines`].
#[derive(Debug, Clone, Default)]
pub struct PipelineListOptions {
    /// Pipeline status filter, e.g. `SUCCESSFUL`, `FAILED`, `IN_PROGRESS`.
    pub status: Option<String>,
    pub sort: Option<String>,
    pub page: Option<u32>,
    pub pagelen: Option<u32>,
}

impl PipelineListOptions {
    pub fn to_query(&self) -> Query {
        let mut query = Query::new();
        query.append_opt("status", non_empty(&self.status));
        query.append_opt("sort", non_empty(&self.sort));
        query.append_opt("page", self.page.filter(|p| *p > 0));
        query.append_opt("pagelen", self.pagelen.filter(|p| *p > 0));
        query
    }
}

/// Body for [`BitbucketClient::run_pipeline`].
#[derive(Debug, Clone, Serialize)]
pub struct PipelineRunOptions {
    pub target: PipelineTarget,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub variables: Vec<PipelineVariable>,
}

impl PipelineRunOptions {
    /// Runs the default pipeline for a branch.
    pub fn for_branch(branch: impl Into<String>) -> Self {
        Self {
            target: PipelineTarget {
                target_type: "pipeline_ref_target".to_string(),
                ref_type: Some("branch".to_string()),
                ref_name: Some(branch.into()),
                commit: None,
                selector: None,
            },
            variables: Vec::new(),
        }
    }

    /// Selects a custom pipeline defined under `pipelines.custom`.
    pub fn with_custom_pipeline(mut self, pattern: impl Into<String>) -> Self {
        self.target.selector = Some(PipelineSelector {
            selector_type: "custom".to_string(),
            pattern: Some(pattern.into()),
        });
        self
    }

    pub fn with_variable(mut self, key: impl Into<String>, value: impl Into<String>, secured: bool) -> Self {
        self.variables.push(PipelineVariable {
            key: key.into(),
            value: value.into(),
            secured,
        });
        self
    }
}

impl BitbucketClient {
    /// Lists pipeline runs for a repository.
    pub async fn list_pipelines(
        &self,
        workspace: &str,
        repo_slug: &str,
        options: &PipelineListOptions,
    ) -> Result<Paginated<Pipeline>, ClientError> {
        let path = format!("{}/pipelines", repo_path(workspace, repo_slug));
        let response = self.get(&path, Some(options.to_query())).await?;
        parse_response(&response)
    }

    /// Gets a pipeline by build number or `{uuid}`.
    pub async fn get_pipeline(
        &self,
        workspace: &str,
        repo_slug: &str,
        pipeline: &str,
    ) -> Result<Pipeline, ClientError> {
        let path = format!("{}/pipelines/{}", repo_path(workspace, repo_slug), pipeline);
        let response = self.get(&path, None).await?;
        parse_response(&response)
    }

    /// Triggers a new pipeline run.
    pub async fn run_pipeline(
        &self,
        workspace: &str,
        repo_slug: &str,
        options: &PipelineRunOptions,
    ) -> Result<Pipeline, ClientError> {
        let path = format!("{}/pipelines", repo_path(workspace, repo_slug));
        let response = self.post(&path, options).await?;
        parse_response(&response)
    }

    /// Stops a running pipeline. The request carries no body.
    pub async fn stop_pipeline(
        &self,
        workspace: &str,
        repo_slug: &str,
        pipeline: &str,
    ) -> Result<(), ClientError> {
        let path = format!(
            "{}/pipelines/{}/stopPipeline",
            repo_path(workspace, repo_slug),
            pipeline
        );
        self.execute(Request::post(path)).await?;
        Ok(())
    }

    pub async fn list_pipeline_steps(
        &self,
        workspace: &str,
        repo_slug: &str,
        pipeline: &str,
    ) -> Result<Paginated<PipelineStep>, ClientError> {
        let path = format!(
            "{}/pipelines/{}/steps",
            repo_path(workspace, repo_slug),
            pipeline
        );
        let response = self.get(&path, None).await?;
        parse_response(&response)
    }

    /// Fetches the plain-text log of a pipeline step.
    pub async fn get_pipeline_step_log(
        &self,
        workspace: &str,
        repo_slug: &str,
        pipeline: &str,
        step_uuid: &str,
    ) -> Result<String, ClientError> {
        let path = format!(
            "{}/pipelines/{}/steps/{}/log",
            repo_path(workspace, repo_slug),
            pipeline,
            step_uuid
        );
        let response = self
            .execute(Request::get(path).header("Accept", "text/plain"))
            .await?;
        Ok(response.text())
    }
}
