//
//  bb-cloud
//  api/cloud/branches.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Cloud branch refs API (`/repositories/{workspace}/{repo_slug}/refs/branches`).

use serde::{Deserialize, Serialize};

use super::{non_empty, repo_path};
use crate::api::client::{parse_response, BitbucketClient, Query};
use crate::api::common::{ClientError, CommitRef, Paginated, ResourceLinks};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Branch {
    pub name: String,

    #[serde(default)]
    pub target: Option<CommitRef>,

    #[serde(default)]
    pub default_merge_strategy: Option<String>,

    #[serde(default)]
    pub links: Option<ResourceLinks>,
}

#[derive(Debug, Clone, Default)]
pub struct BranchListOptions {
    pub q: Option<String>,
    pub sort: Option<String>,
    pub page: Option<u32>,
    pub pagelen: Option<u32>,
}

impl BranchListOptions {
    pub fn to_query(&self) -> Query {
        let mut query = Query::new();
        query.append_opt("q", non_empty(&self.q));
        query.append_opt("sort", non_empty(&self.sort));
        query.append_opt("page", self.page.filter(|p| *p > 0));
        query.append_opt("pagelen", self.pagelen.filter(|p| *p > 0));
        query
    }
}

#[derive(Debug, Serialize)]
struct HashRef<'a> {
    hash: &'a str,
}

#[derive(Debug, Serialize)]
struct CreateBranchBody<'a> {
    name: &'a str,
    target: HashRef<'a>,
}

impl BitbucketClient {
    pub async fn list_branches(
        &self,
        workspace: &str,
        repo_slug: &str,
        options: &BranchListOptions,
    ) -> Result<Paginated<Branch>, ClientError> {
        let path = format!("{}/refs/branches", repo_path(workspace, repo_slug));
        let response = self.get(&path, Some(options.to_query())).await?;
        parse_response(&response)
    }

    pub async fn get_branch(
        &self,
        workspace: &str,
        repo_slug: &str,
        name: &str,
    ) -> Result<Branch, ClientError> {
        let path = format!("{}/refs/branches/{}", repo_path(workspace, repo_slug), name);
        let response = self.get(&path, None).await?;
        parse_response(&response)
    }

    /// Creates `name` pointing at `target`, a commit hash or another branch name.
    pub async fn create_branch(
        &self,
        workspace: &str,
        repo_slug: &str,
        name: &str,
        target: &str,
    ) -> Result<Branch, ClientError> {
        let path = format!("{}/refs/branches", repo_path(workspace, repo_slug));
        let body = CreateBranchBody {
            name,
            target: HashRef { hash: target },
        };
        let response = self.post(&path, &body).await?;
        parse_response(&response)
    }

    pub async fn delete_branch(
        &self,
        workspace: &str,
        repo_slug: &str,
        name: &str,
    ) -> Result<(), ClientError> {
        let path = format!("{}/refs/branches/{}", repo_path(workspace, repo_slug), name);
        self.delete(&path).await?;
        Ok(())
    }
}
