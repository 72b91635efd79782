//
//  bb-cloud
//  api/cloud/projects.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Cloud projects API.
//!
//! Projects group repositories inside a workspace and are addressed by a
//! short upper-case key (e.g. `WID`).

use serde::{Deserialize, Serialize};

use super::non_empty;
use crate::api::client::{parse_response, BitbucketClient, Query};
use crate::api::common::{null_as_default, ClientError, Paginated, ResourceLinks};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    #[serde(default, deserialize_with = "null_as_default")]
    pub uuid: String,

    pub key: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub is_private: bool,

    #[serde(default)]
    pub created_on: Option<String>,

    #[serde(default)]
    pub updated_on: Option<String>,

    #[serde(default)]
    pub links: Option<ResourceLinks>,
}

#[derive(Debug, Clone, Default)]
pub struct ProjectListOptions {
    pub q: Option<String>,
    pub sort: Option<String>,
    pub page: Option<u32>,
    pub pagelen: Option<u32>,
}

impl ProjectListOptions {
    pub fn to_query(&self) -> Query {
        let mut query = Query::new();
        query.append_opt("q", non_empty(&self.q));
        query.append_opt("sort", non_empty(&self.sort));
        query.append_opt("page", self.page.filter(|p| *p > 0));
        query.append_opt("pagelen", self.pagelen.filter(|p| *p > 0));
        query
    }
}

/// Fields for [`BitbucketClient::create_project`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProjectCreateOptions {
    pub name: String,

    pub key: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_private: Option<bool>,
}

impl BitbucketClient {
    pub async fn list_projects(
        &self,
        workspace: &str,
        options: &ProjectListOptions,
    ) -> Result<Paginated<Project>, ClientError> {
        let path = format!("/workspaces/{}/projects", workspace);
        let response = self.get(&path, Some(options.to_query())).await?;
        parse_response(&response)
    }

    pub async fn get_project(&self, workspace: &str, key: &str) -> Result<Project, ClientError> {
        let path = format!("/workspaces/{}/projects/{}", workspace, key);
        let response = self.get(&path, None).await?;
        parse_response(&response)
    }

    pub async fn create_project(
        &self,
        workspace: &str,
        options: &ProjectCreateOptions,
    ) -> Result<Project, ClientError> {
        let path = format!("/workspaces/{}/projects", workspace);
        let response = self.post(&path, options).await?;
        parse_response(&response)
    }
}
