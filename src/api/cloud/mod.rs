//
//  bb-cloud
//  api/cloud/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Bitbucket Cloud API v2.0 resource accessors.
//!
//! Each submodule holds the data structures for one resource family and an
//! `impl BitbucketClient` block with the calls for it. Every accessor builds a
//! path and query, goes through [`BitbucketClient::execute`], and decodes the
//! body into a typed value or a [`Paginated`](crate::api::Paginated) page.
//!
//! # Module Organization
//!
//! - [`issues`] - Issue tracker (list, create, update, comments)
//! - [`pipelines`] - CI/CD pipeline runs, steps and logs
//! - [`pullrequests`] - Pull request operations (create, merge, review)
//! - [`repositories`] - Repository management and forks
//! - [`branches`] - Branch refs
//! - [`projects`] - Workspace projects
//! - [`snippets`] - Snippets
//! - [`workspaces`] - Workspaces, members and the current user
//!
//! # Example
//!
//! ```rust,no_run
//! use bb_cloud::api::BitbucketClient;
//! use bb_cloud::api::cloud::issues::IssueListOptions;
//!
//! # async fn demo() -> Result<(), bb_cloud::api::ClientError> {
//! let client = BitbucketClient::cloud()?.with_token("my-token");
//! let options = IssueListOptions {
//!     state: Some("open".to_string()),
//!     ..Default::default()
//! };
//! let page = client.list_issues("acme", "widgets", &options).await?;
//! for issue in page.values {
//!     println!("#{} {}", issue.id, issue.title);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Notes
//!
//! - Timestamps are kept as the ISO 8601 strings the API returns
//! - UUIDs are returned with curly braces (e.g., `{123e4567-e89b-...}`)
//!
//! [`BitbucketClient::execute`]: crate::api::BitbucketClient::execute

pub mod branches;
pub mod issues;
pub mod pipelines;
pub mod projects;
pub mod pullrequests;
pub mod repositories;
pub mod snippets;
pub mod workspaces;

pub use branches::Branch;
pub use issues::{Issue, IssueComment};
pub use pipelines::{Pipeline, PipelineStep};
pub use projects::Project;
pub use pullrequests::{PullRequest, PullRequestComment};
pub use repositories::Repository;
pub use snippets::Snippet;
pub use workspaces::{Workspace, WorkspaceMembership};

/// `/repositories/{workspace}/{repo_slug}`
pub(crate) fn repo_path(workspace: &str, repo_slug: &str) -> String {
    format!("/repositories/{}/{}", workspace, repo_slug)
}

/// Treats `Some("")` the same as `None`.
pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
