//
//  bb-cloud
//  context/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Repository Context Module
//!
//! Works out which workspace and repository a command targets.
//!
//! ## Sources
//!
//! - `--repo/-R` (or `BB_REPO`): `WORKSPACE/REPO` or a Bitbucket clone URL
//! - `--workspace/-w` (or `BB_WORKSPACE`)
//! - `default_workspace` from `config.yml`
//!
//! ## Example
//!
//! ```rust
//! use bb_cloud::context::RepoRef;
//!
//! let repo = RepoRef::parse("git@bitbucket.org:acme/widgets.git").unwrap();
//! assert_eq!(repo.full_name(), "acme/widgets");
//! assert_eq!(repo.web_url(), "https://bitbucket.org/acme/widgets");
//! ```

mod resolver;

pub use resolver::*;

use std::fmt;

use crate::config::BITBUCKET_CLOUD;

/// A repository on a Bitbucket host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    /// Host (e.g., "bitbucket.org")
    pub host: String,
    pub workspace: String,
    pub repo_slug: String,
}

impl RepoRef {
    /// Creates a reference to a repository on Bitbucket Cloud.
    pub fn new(workspace: impl Into<String>, repo_slug: impl Into<String>) -> Self {
        Self {
            host: BITBUCKET_CLOUD.to_string(),
            workspace: workspace.into(),
            repo_slug: repo_slug.into(),
        }
    }

    /// Returns `workspace/repo`.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.workspace, self.repo_slug)
    }

    pub fn web_url(&self) -> String {
        format!("https://{}/{}/{}", self.host, self.workspace, self.repo_slug)
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.workspace, self.repo_slug)
    }
}
