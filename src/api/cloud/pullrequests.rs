//
//  bb-cloud
//  api/cloud/pullrequests.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Cloud pull request API.
//!
//! Pull requests live under
//! `/repositories/{workspace}/{repo_slug}/pullrequests`.
//!
//! # Pull Request States
//!
//! * `OPEN` - Open for review
//! * `MERGED` - Merged into the destination branch
//! * `DECLINED` - Closed without merging
//! * `SUPERSEDED` - Replaced by another pull request
//!
//! The list endpoint accepts `state` several times to match more than one
//! state; [`PullRequestListOptions::states`] keeps them in order.
//!
//! # Merge Strategies
//!
//! `merge_commit`, `squash`, `fast_forward`

use serde::{Deserialize, Serialize};

use super::repo_path;
use crate::api::client::{parse_response, BitbucketClient, Query, Request};
use crate::api::common::{
    null_as_default, ClientError, CommitRef, Content, NamedRef, Paginated, RawContent,
    ResourceLinks, User, UuidRef,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequest {
    pub id: u64,

    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub state: String,

    #[serde(default)]
    pub author: Option<User>,

    #[serde(default)]
    pub source: Option<PullRequestEndpoint>,

    #[serde(default)]
    pub destination: Option<PullRequestEndpoint>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub reviewers: Vec<User>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub participants: Vec<Participant>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub close_source_branch: bool,

    #[serde(default, deserialize_with = "null_as_default")]
    pub comment_count: u32,

    #[serde(default, deserialize_with = "null_as_default")]
    pub task_count: u32,

    #[serde(default)]
    pub merge_commit: Option<CommitRef>,

    #[serde(default)]
    pub created_on: Option<String>,

    #[serde(default)]
    pub updated_on: Option<String>,

    #[serde(default)]
    pub links: Option<ResourceLinks>,
}

impl PullRequest {
    pub fn source_branch(&self) -> &str {
        endpoint_branch(self.source.as_ref())
    }

    pub fn destination_branch(&self) -> &str {
        endpoint_branch(self.destination.as_ref())
    }

    /// Number of participants who approved.
    pub fn approvals(&self) -> usize {
        self.participants.iter().filter(|p| p.approved).count()
    }
}

fn endpoint_branch(endpoint: Option<&PullRequestEndpoint>) -> &str {
    endpoint
        .and_then(|e| e.branch.as_ref())
        .map(|b| b.name.as_str())
        .unwrap_or("")
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PullRequestEndpoint {
    #[serde(default)]
    pub branch: Option<NamedRef>,

    #[serde(default)]
    pub commit: Option<CommitRef>,

    #[serde(default)]
    pub repository: Option<RepositoryRef>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepositoryRef {
    #[serde(default, deserialize_with = "null_as_default")]
    pub full_name: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,

    #[serde(default)]
    pub uuid: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    #[serde(default)]
    pub user: Option<User>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub role: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub approved: bool,

    #[serde(default)]
    pub state: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequestComment {
    pub id: u64,

    #[serde(default)]
    pub content: Option<Content>,

    #[serde(default)]
    pub user: Option<User>,

    #[serde(default)]
    pub created_on: Option<String>,

    #[serde(default)]
    pub updated_on: Option<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub deleted: bool,
}

/// Filters for [`BitbucketClient::list_pull_requests`].
#[derive(Debug, Clone, Default)]
pub struct PullRequestListOptions {
    /// States to include; each becomes a separate `state` parameter.
    pub states: Vec<String>,
    pub page: Option<u32>,
    pub pagelen: Option<u32>,
}

impl PullRequestListOptions {
    pub fn to_query(&self) -> Query {
        let mut query = Query::new();
        for state in self.states.iter().filter(|s| !s.is_empty()) {
            query.append("state", state.to_uppercase());
        }
        query.append_opt("page", self.page.filter(|p| *p > 0));
        query.append_opt("pagelen", self.pagelen.filter(|p| *p > 0));
        query
    }
}

/// Fields for [`BitbucketClient::create_pull_request`].
#[derive(Debug, Clone, Default)]
pub struct PullRequestCreateOptions {
    pub title: String,
    pub description: Option<String>,
    pub source_branch: String,
    /// Defaults to the repository's main branch when `None`.
    pub destination_branch: Option<String>,
    /// Reviewer account UUIDs.
    pub reviewers: Vec<String>,
    pub close_source_branch: Option<bool>,
}

#[derive(Debug, Serialize)]
struct BranchEndpoint<'a> {
    branch: BranchName<'a>,
}

#[derive(Debug, Serialize)]
struct BranchName<'a> {
    name: &'a str,
}

impl<'a> BranchEndpoint<'a> {
    fn new(name: &'a str) -> Self {
        Self {
            branch: BranchName { name },
        }
    }
}

#[derive(Debug, Serialize)]
struct CreatePullRequestBody<'a> {
    title: &'a str,

    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,

    source: BranchEndpoint<'a>,

    #[serde(skip_serializing_if = "Option::is_none")]
    destination: Option<BranchEndpoint<'a>>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    reviewers: Vec<UuidRef>,

    #[serde(skip_serializing_if = "Option::is_none")]
    close_source_branch: Option<bool>,
}

impl<'a> From<&'a PullRequestCreateOptions> for CreatePullRequestBody<'a> {
    fn from(options: &'a PullRequestCreateOptions) -> Self {
        Self {
            title: &options.title,
            description: options.description.as_deref(),
            source: BranchEndpoint::new(&options.source_branch),
            destination: options
                .destination_branch
                .as_deref()
                .filter(|b| !b.is_empty())
                .map(BranchEndpoint::new),
            reviewers: options.reviewers.iter().map(UuidRef::new).collect(),
            close_source_branch: options.close_source_branch,
        }
    }
}

/// Partial update for [`BitbucketClient::update_pull_request`].
#[derive(Debug, Clone, Default)]
pub struct PullRequestUpdateOptions {
    pub title: Option<String>,
    pub description: Option<String>,
    pub destination_branch: Option<String>,
    /// Replaces the reviewer list when set.
    pub reviewers: Option<Vec<String>>,
}

impl PullRequestUpdateOptions {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.destination_branch.is_none()
            && self.reviewers.is_none()
    }
}

#[derive(Debug, Serialize)]
struct UpdatePullRequestBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    destination: Option<BranchEndpoint<'a>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    reviewers: Option<Vec<UuidRef>>,
}

impl<'a> From<&'a PullRequestUpdateOptions> for UpdatePullRequestBody<'a> {
    fn from(options: &'a PullRequestUpdateOptions) -> Self {
        Self {
            title: options.title.as_deref(),
            description: options.description.as_deref(),
            destination: options.destination_branch.as_deref().map(BranchEndpoint::new),
            reviewers: options
                .reviewers
                .as_ref()
                .map(|uuids| uuids.iter().map(UuidRef::new).collect()),
        }
    }
}

/// Body for [`BitbucketClient::merge_pull_request`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct PullRequestMergeOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub close_source_branch: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub merge_strategy: Option<String>,
}

#[derive(Debug, Serialize)]
struct CommentBody {
    content: RawContent,
}

impl BitbucketClient {
    fn pull_request_path(workspace: &str, repo_slug: &str, id: u64) -> String {
        format!("{}/pullrequests/{}", repo_path(workspace, repo_slug), id)
    }

    pub async fn list_pull_requests(
        &self,
        workspace: &str,
        repo_slug: &str,
        options: &PullRequestListOptions,
    ) -> Result<Paginated<PullRequest>, ClientError> {
        let path = format!("{}/pullrequests", repo_path(workspace, repo_slug));
        let response = self.get(&path, Some(options.to_query())).await?;
        parse_response(&response)
    }

    pub async fn get_pull_request(
        &self,
        workspace: &str,
        repo_slug: &str,
        id: u64,
    ) -> Result<PullRequest, ClientError> {
        let path = Self::pull_request_path(workspace, repo_slug, id);
        let response = self.get(&path, None).await?;
        parse_response(&response)
    }

    pub async fn create_pull_request(
        &self,
        workspace: &str,
        repo_slug: &str,
        options: &PullRequestCreateOptions,
    ) -> Result<PullRequest, ClientError> {
        let path = format!("{}/pullrequests", repo_path(workspace, repo_slug));
        let response = self
            .post(&path, &CreatePullRequestBody::from(options))
            .await?;
        parse_response(&response)
    }

    /// Updates only the fields set in `options`.
    pub async fn update_pull_request(
        &self,
        workspace: &str,
        repo_slug: &str,
        id: u64,
        options: &PullRequestUpdateOptions,
    ) -> Result<PullRequest, ClientError> {
        let path = Self::pull_request_path(workspace, repo_slug, id);
        let response = self
            .put(&path, &UpdatePullRequestBody::from(options))
            .await?;
        parse_response(&response)
    }

    pub async fn merge_pull_request(
        &self,
        workspace: &str,
        repo_slug: &str,
        id: u64,
        options: &PullRequestMergeOptions,
    ) -> Result<PullRequest, ClientError> {
        let path = format!("{}/merge", Self::pull_request_path(workspace, repo_slug, id));
        let response = self.post(&path, options).await?;
        parse_response(&response)
    }

    pub async fn approve_pull_request(
        &self,
        workspace: &str,
        repo_slug: &str,
        id: u64,
    ) -> Result<Participant, ClientError> {
        let path = format!("{}/approve", Self::pull_request_path(workspace, repo_slug, id));
        let response = self.execute(Request::post(path)).await?;
        parse_response(&response)
    }

    pub async fn unapprove_pull_request(
        &self,
        workspace: &str,
        repo_slug: &str,
        id: u64,
    ) -> Result<(), ClientError> {
        let path = format!("{}/approve", Self::pull_request_path(workspace, repo_slug, id));
        self.delete(&path).await?;
        Ok(())
    }

    pub async fn decline_pull_request(
        &self,
        workspace: &str,
        repo_slug: &str,
        id: u64,
    ) -> Result<PullRequest, ClientError> {
        let path = format!("{}/decline", Self::pull_request_path(workspace, repo_slug, id));
        let response = self.execute(Request::post(path)).await?;
        parse_response(&response)
    }

    pub async fn list_pull_request_comments(
        &self,
        workspace: &str,
        repo_slug: &str,
        id: u64,
    ) -> Result<Paginated<PullRequestComment>, ClientError> {
        let path = format!("{}/comments", Self::pull_request_path(workspace, repo_slug, id));
        let response = self.get(&path, None).await?;
        parse_response(&response)
    }

    pub async fn create_pull_request_comment(
        &self,
        workspace: &str,
        repo_slug: &str,
        id: u64,
        body: &str,
    ) -> Result<PullRequestComment, ClientError> {
        let path = format!("{}/comments", Self::pull_request_path(workspace, repo_slug, id));
        let payload = CommentBody {
            content: RawContent::new(body),
        };
        let response = self.post(&path, &payload).await?;
        parse_response(&response)
    }

    /// Fetches the unified diff of a pull request as text.
    pub async fn get_pull_request_diff(
        &self,
        workspace: &str,
        repo_slug: &str,
        id: u64,
    ) -> Result<String, ClientError> {
        let path = format!("{}/diff", Self::pull_request_path(workspace, repo_slug, id));
        let response = self
            .execute(Request::get(path).header("Accept", "text/plain"))
            .await?;
        Ok(response.text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::client::ClientOption;
    use mockito::Matcher;
    use serde_json::json;

    fn client_for(server: &mockito::ServerGuard) -> BitbucketClient {
        BitbucketClient::new([
            ClientOption::BaseUrl(server.url()),
            ClientOption::Token("token".to_string()),
        ])
        .unwrap()
    }

    #[tokio::test]
    async fn test_list_pull_requests_with_several_states() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/repositories/acme/widgets/pullrequests")
            .match_query(Matcher::Exact("state=OPEN&state=MERGED&pagelen=20".into()))
            .with_status(200)
            .with_body(
                json!({
                    "size": 1,
                    "values": [{
                        "id": 3,
                        "title": "Add widgets",
                        "state": "OPEN",
                        "source": {"branch": {"name": "feature/widgets"}},
                        "destination": {"branch": {"name": "main"}},
                        "participants": [
                            {"role": "REVIEWER", "approved": true},
                            {"role": "REVIEWER", "approved": false}
                        ]
                    }]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let options = PullRequestListOptions {
            states: vec!["open".to_string(), "merged".to_string()],
            pagelen: Some(20),
            ..Default::default()
        };
        let page = client_for(&server)
            .list_pull_requests("acme", "widgets", &options)
            .await
            .unwrap();

        let pr = &page.values[0];
        assert_eq!(pr.source_branch(), "feature/widgets");
        assert_eq!(pr.destination_branch(), "main");
        assert_eq!(pr.approvals(), 1);
        mock.assert_async().await;
    }

    #[test]
    fn test_pull_request_with_null_description() {
        let pr: PullRequest = serde_json::from_value(json!({
            "id": 9,
            "title": "Fix build",
            "description": null,
            "reviewers": null
        }))
        .unwrap();

        assert_eq!(pr.description, "");
        assert!(pr.reviewers.is_empty());
    }

    #[tokio::test]
    async fn test_create_pull_request_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/repositories/acme/widgets/pullrequests")
            .match_body(Matcher::Json(json!({
                "title": "Add widgets",
                "source": {"branch": {"name": "feature/widgets"}},
                "destination": {"branch": {"name": "develop"}},
                "reviewers": [{"uuid": "{r1}"}],
                "close_source_branch": true
            })))
            .with_status(201)
            .with_body(r#"{"id": 4, "title": "Add widgets", "state": "OPEN"}"#)
            .create_async()
            .await;

        let options = PullRequestCreateOptions {
            title: "Add widgets".to_string(),
            source_branch: "feature/widgets".to_string(),
            destination_branch: Some("develop".to_string()),
            reviewers: vec!["{r1}".to_string()],
            close_source_branch: Some(true),
            ..Default::default()
        };
        let pr = client_for(&server)
            .create_pull_request("acme", "widgets", &options)
            .await
            .unwrap();

        assert_eq!(pr.id, 4);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_update_pull_request_is_partial() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", "/repositories/acme/widgets/pullrequests/4")
            .match_body(Matcher::Json(json!({"title": "Renamed"})))
            .with_status(200)
            .with_body(r#"{"id": 4, "title": "Renamed"}"#)
            .create_async()
            .await;

        let options = PullRequestUpdateOptions {
            title: Some("Renamed".to_string()),
            ..Default::default()
        };
        client_for(&server)
            .update_pull_request("acme", "widgets", 4, &options)
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_merge_pull_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/repositories/acme/widgets/pullrequests/4/merge")
            .match_body(Matcher::Json(json!({"merge_strategy": "squash"})))
            .with_status(200)
            .with_body(r#"{"id": 4, "state": "MERGED", "merge_commit": {"hash": "abc123"}}"#)
            .create_async()
            .await;

        let options = PullRequestMergeOptions {
            merge_strategy: Some("squash".to_string()),
            ..Default::default()
        };
        let pr = client_for(&server)
            .merge_pull_request("acme", "widgets", 4, &options)
            .await
            .unwrap();

        assert_eq!(pr.state, "MERGED");
        assert_eq!(pr.merge_commit.unwrap().hash, "abc123");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_approve_and_unapprove() {
        let mut server = mockito::Server::new_async().await;
        let approve = server
            .mock("POST", "/repositories/acme/widgets/pullrequests/4/approve")
            .with_status(200)
            .with_body(r#"{"role": "REVIEWER", "approved": true, "user": {"display_name": "Jane"}}"#)
            .create_async()
            .await;
        let unapprove = server
            .mock("DELETE", "/repositories/acme/widgets/pullrequests/4/approve")
            .with_status(204)
            .create_async()
            .await;

        let client = client_for(&server);
        let participant = client
            .approve_pull_request("acme", "widgets", 4)
            .await
            .unwrap();
        assert!(participant.approved);

        client
            .unapprove_pull_request("acme", "widgets", 4)
            .await
            .unwrap();

        approve.assert_async().await;
        unapprove.assert_async().await;
    }

    #[tokio::test]
    async fn test_diff_is_plain_text() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/repositories/acme/widgets/pullrequests/4/diff")
            .match_header("accept", "text/plain")
            .with_status(200)
            .with_body("diff --git a/README.md b/README.md\n")
            .create_async()
            .await;

        let diff = client_for(&server)
            .get_pull_request_diff("acme", "widgets", 4)
            .await
            .unwrap();

        assert!(diff.starts_with("diff --git"));
    }

    #[tokio::test]
    async fn test_decline_conflict_surfaces_api_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/repositories/acme/widgets/pullrequests/4/decline")
            .with_status(409)
            .with_body(r#"{"error": {"message": "Pull request is already merged", "detail": "Cannot decline"}}"#)
            .create_async()
            .await;

        let err = client_for(&server)
            .decline_pull_request("acme", "widgets", 4)
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "API error 409: Pull request is already merged - Cannot decline"
        );
    }
}
