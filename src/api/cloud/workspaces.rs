//
//  bb-cloud
//  api/cloud/workspaces.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Cloud workspace API.
//!
//! Workspaces are the top-level containers for repositories and projects in
//! Bitbucket Cloud. This module also exposes `GET /user`, the account the
//! configured token belongs to, which `bb auth login` uses to verify tokens.
//!
//! # Membership Roles
//!
//! * `owner` - Full administrative access
//! * `collaborator` - Can contribute to repositories
//! * `member` - Basic membership

use serde::{Deserialize, Serialize};

use super::non_empty;
use crate::api::client::{parse_response, BitbucketClient, Query};
use crate::api::common::{null_as_default, ClientError, Paginated, ResourceLinks, User};

use super::repositories::WorkspaceRef;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workspace {
    #[serde(default, deserialize_with = "null_as_default")]
    pub uuid: String,

    pub slug: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub is_private: bool,

    #[serde(default)]
    pub created_on: Option<String>,

    #[serde(default)]
    pub links: Option<ResourceLinks>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceMembership {
    #[serde(default)]
    pub user: Option<User>,

    #[serde(default)]
    pub workspace: Option<WorkspaceRef>,
}

#[derive(Debug, Clone, Default)]
pub struct WorkspaceListOptions {
    /// `owner`, `collaborator` or `member`.
    pub role: Option<String>,
    pub q: Option<String>,
    pub sort: Option<String>,
    pub page: Option<u32>,
    pub pagelen: Option<u32>,
}

impl WorkspaceListOptions {
    pub fn to_query(&self) -> Query {
        let mut query = Query::new();
        query.append_opt("role", non_empty(&self.role));
        query.append_opt("q", non_empty(&self.q));
        query.append_opt("sort", non_empty(&self.sort));
        query.append_opt("page", self.page.filter(|p| *p > 0));
        query.append_opt("pagelen", self.pagelen.filter(|p| *p > 0));
        query
    }
}

impl BitbucketClient {
    pub async fn list_workspaces(
        &self,
        options: &WorkspaceListOptions,
    ) -> Result<Paginated<Workspace>, ClientError> {
        let response = self.get("/workspaces", Some(options.to_query())).await?;
        parse_response(&response)
    }

    pub async fn get_workspace(&self, workspace: &str) -> Result<Workspace, ClientError> {
        let path = format!("/workspaces/{}", workspace);
        let response = self.get(&path, None).await?;
        parse_response(&response)
    }

    pub async fn list_workspace_members(
        &self,
        workspace: &str,
        page: Option<u32>,
        pagelen: Option<u32>,
    ) -> Result<Paginated<WorkspaceMembership>, ClientError> {
        let path = format!("/workspaces/{}/members", workspace);
        let mut query = Query::new();
        query.append_opt("page", page.filter(|p| *p > 0));
        query.append_opt("pagelen", pagelen.filter(|p| *p > 0));
        let response = self.get(&path, Some(query)).await?;
        parse_response(&response)
    }

    /// Returns the account that owns the configured token.
    pub async fn current_user(&self) -> Result<User, ClientError> {
        let response = self.get("/user", None).await?;
        parse_response(&response)
    }
}
