//
//  bb-cloud
//  api/cloud/issues.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Cloud issue tracker API.
//!
//! Issues live under `/repositories/{workspace}/{repo_slug}/issues` and are
//! only available on repositories with the issue tracker enabled.
//!
//! # Filtering
//!
//! Bitbucket filters collections with the `q` query parameter. When
//! [`IssueListOptions::q`] is set it is sent verbatim; otherwise the
//! structured filters are combined as
//! `state="open" AND kind="bug" AND priority="major" AND assignee.username="jdoe"`
//! (only the filters that are set, in that order).
//!
//! # Issue Kinds
//!
//! * `bug` - Something is broken
//! * `enhancement` - Improvement to existing functionality
//! * `proposal` - Suggestion for new functionality
//! * `task` - General work item
//!
//! # Priorities
//!
//! `trivial`, `minor`, `major`, `critical`, `blocker`

use serde::{Deserialize, Serialize};

use super::{non_empty, repo_path};
use crate::api::client::{parse_response, BitbucketClient, Query};
use crate::api::common::{
    null_as_default, ClientError, Content, Paginated, RawContent, ResourceLinks, User, UuidRef,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub id: u64,

    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,

    #[serde(default)]
    pub content: Option<Content>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub state: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub kind: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub priority: String,

    #[serde(default)]
    pub reporter: Option<User>,

    #[serde(default)]
    pub assignee: Option<User>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub votes: u32,

    #[serde(default)]
    pub created_on: Option<String>,

    #[serde(default)]
    pub updated_on: Option<String>,

    #[serde(default)]
    pub links: Option<ResourceLinks>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueComment {
    pub id: u64,

    #[serde(default)]
    pub content: Option<Content>,

    #[serde(default)]
    pub user: Option<User>,

    #[serde(default)]
    pub created_on: Option<String>,

    #[serde(default)]
    pub updated_on: Option<String>,

    #[serde(default)]
    pub links: Option<ResourceLinks>,
}

/// Filters for [`BitbucketClient::list_issues`].
#[derive(Debug, Clone, Default)]
pub struct IssueListOptions {
    pub state: Option<String>,
    pub kind: Option<String>,
    pub priority: Option<String>,
    /// Matched against `assignee.username`.
    pub assignee: Option<String>,
    /// Raw filter expression; overrides the structured filters above.
    pub q: Option<String>,
    pub sort: Option<String>,
    pub page: Option<u32>,
    pub pagelen: Option<u32>,
}

impl IssueListOptions {
    /// Returns the `q` expression these options produce, if any.
    pub fn filter_expression(&self) -> Option<String> {
        if let Some(q) = non_empty(&self.q) {
            return Some(q.to_string());
        }

        let clauses: Vec<String> = [
            ("state", &self.state),
            ("kind", &self.kind),
            ("priority", &self.priority),
            ("assignee.username", &self.assignee),
        ]
        .into_iter()
        .filter_map(|(field, value)| non_empty(value).map(|v| format!("{}=\"{}\"", field, v)))
        .collect();

        if clauses.is_empty() {
            None
        } else {
            Some(clauses.join(" AND "))
        }
    }

    pub fn to_query(&self) -> Query {
        let mut query = Query::new();
        query.append_opt("q", self.filter_expression());
        query.append_opt("sort", non_empty(&self.sort));
        query.append_opt("page", self.page.filter(|p| *p > 0));
        query.append_opt("pagelen", self.pagelen.filter(|p| *p > 0));
        query
    }
}

/// Fields for [`BitbucketClient::create_issue`].
#[derive(Debug, Clone, Default)]
pub struct IssueCreateOptions {
    pub title: String,
    pub content: Option<String>,
    pub kind: Option<String>,
    pub priority: Option<String>,
    /// Assignee account UUID.
    pub assignee: Option<String>,
}

#[derive(Debug, Serialize)]
struct CreateIssueBody<'a> {
    title: &'a str,

    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<RawContent>,

    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<&'a str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    priority: Option<&'a str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    assignee: Option<UuidRef>,
}

impl<'a> From<&'a IssueCreateOptions> for CreateIssueBody<'a> {
    fn from(options: &'a IssueCreateOptions) -> Self {
        Self {
            title: &options.title,
            content: non_empty(&options.content).map(RawContent::new),
            kind: non_empty(&options.kind),
            priority: non_empty(&options.priority),
            assignee: non_empty(&options.assignee).map(UuidRef::new),
        }
    }
}

/// Partial update for [`BitbucketClient::update_issue`].
///
/// Only fields that are `Some` are sent. `Some(String::new())` is sent as an
/// empty value.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IssueUpdateOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "serialize_raw")]
    pub content: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,

    /// Assignee account UUID.
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "serialize_uuid")]
    pub assignee: Option<String>,
}

impl IssueUpdateOptions {
    /// Returns true if no field would be sent.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.state.is_none()
            && self.kind.is_none()
            && self.priority.is_none()
            && self.assignee.is_none()
    }
}

fn serialize_raw<S: serde::Serializer>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error> {
    value.as_ref().map(RawContent::new).serialize(serializer)
}

fn serialize_uuid<S: serde::Serializer>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error> {
    value.as_ref().map(UuidRef::new).serialize(serializer)
}

#[derive(Debug, Serialize)]
struct CommentBody {
    content: RawContent,
}

impl BitbucketClient {
    /// Lists issues in a repository.
    ///
    /// # Parameters
    ///
    /// * `workspace` - Workspace slug
    /// * `repo_slug` - Repository slug
    /// * `options` - Filters, sort order and paging
    pub async fn list_issues(
        &self,
        workspace: &str,
        repo_slug: &str,
        options: &IssueListOptions,
    ) -> Result<Paginated<Issue>, ClientError> {
        let path = format!("{}/issues", repo_path(workspace, repo_slug));
        let response = self.get(&path, Some(options.to_query())).await?;
        parse_response(&response)
    }

    pub async fn get_issue(
        &self,
        workspace: &str,
        repo_slug: &str,
        issue_id: u64,
    ) -> Result<Issue, ClientError> {
        let path = format!("{}/issues/{}", repo_path(workspace, repo_slug), issue_id);
        let response = self.get(&path, None).await?;
        parse_response(&response)
    }

    /// Creates an issue. Empty optional fields are left out of the request.
    pub async fn create_issue(
        &self,
        workspace: &str,
        repo_slug: &str,
        options: &IssueCreateOptions,
    ) -> Result<Issue, ClientError> {
        let path = format!("{}/issues", repo_path(workspace, repo_slug));
        let response = self.post(&path, &CreateIssueBody::from(options)).await?;
        parse_response(&response)
    }

    /// Updates the fields of an issue that are set in `options`.
    pub async fn update_issue(
        &self,
        workspace: &str,
        repo_slug: &str,
        issue_id: u64,
        options: &IssueUpdateOptions,
    ) -> Result<Issue, ClientError> {
        let path = format!("{}/issues/{}", repo_path(workspace, repo_slug), issue_id);
        let response = self.put(&path, options).await?;
        parse_response(&response)
    }

    pub async fn delete_issue(
        &self,
        workspace: &str,
        repo_slug: &str,
        issue_id: u64,
    ) -> Result<(), ClientError> {
        let path = format!("{}/issues/{}", repo_path(workspace, repo_slug), issue_id);
        self.delete(&path).await?;
        Ok(())
    }

    pub async fn list_issue_comments(
        &self,
        workspace: &str,
        repo_slug: &str,
        issue_id: u64,
    ) -> Result<Paginated<IssueComment>, ClientError> {
        let path = format!(
            "{}/issues/{}/comments",
            repo_path(workspace, repo_slug),
            issue_id
        );
        let response = self.get(&path, None).await?;
        parse_response(&response)
    }

    pub async fn create_issue_comment(
        &self,
        workspace: &str,
        repo_slug: &str,
        issue_id: u64,
        body: &str,
    ) -> Result<IssueComment, ClientError> {
        let path = format!(
            "{}/issues/{}/comments",
            repo_path(workspace, repo_slug),
            issue_id
        );
        let payload = CommentBody {
            content: RawContent::new(body),
        };
        let response = self.post(&path, &payload).await?;
        parse_response(&response)
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

    #[test]
    fn test_filter_expression_joins_structured_filters() {
        let options = IssueListOptions {
            state: Some("open".to_string()),
            kind: Some("bug".to_string()),
            assignee: Some("jdoe".to_string()),
            ..Default::default()
        };

        assert_eq!(
            options.filter_expression().as_deref(),
            Some(r#"state="open" AND kind="bug" AND assignee.username="jdoe""#)
        );
    }

    #[test]
    fn test_raw_query_wins() {
        let options = IssueListOptions {
            state: Some("open".to_string()),
            q: Some(r#"title ~ "crash""#.to_string()),
            ..Default::default()
        };

        assert_eq!(options.filter_expression().as_deref(), Some(r#"title ~ "crash""#));
    }

    #[test]
    fn test_empty_options_produce_empty_query() {
        let options = IssueListOptions {
            state: Some(String::new()),
            page: Some(0),
            ..Default::default()
        };

        assert_eq!(options.filter_expression(), None);
        assert!(options.to_query().is_empty());
    }

    #[test]
    fn test_update_serializes_only_present_fields() {
        let options = IssueUpdateOptions {
            state: Some("resolved".to_string()),
            content: Some(String::new()),
            ..Default::default()
        };

        assert_eq!(
            serde_json::to_value(&options).unwrap(),
            json!({"state": "resolved", "content": {"raw": ""}})
        );
        assert!(IssueUpdateOptions::default().is_empty());
    }

    #[tokio::test]
    async fn test_list_issues() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/repositories/acme/widgets/issues")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("q".into(), r#"state="open" AND priority="major""#.into()),
                Matcher::UrlEncoded("sort".into(), "-updated_on".into()),
                Matcher::UrlEncoded("pagelen".into(), "5".into()),
            ]))
            .with_status(200)
            .with_body(
                json!({
                    "size": 1,
                    "page": 1,
                    "pagelen": 5,
                    "values": [{
                        "id": 7,
                        "title": "Crash on start",
                        "state": "open",
                        "kind": "bug",
                        "priority": "major",
                        "reporter": {"display_name": "Jane Doe"},
                        "created_on": "2024-01-01T00:00:00+00:00"
                    }]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let options = IssueListOptions {
            state: Some("open".to_string()),
            priority: Some("major".to_string()),
            sort: Some("-updated_on".to_string()),
            pagelen: Some(5),
            ..Default::default()
        };
        let page = client_for(&server)
            .list_issues("acme", "widgets", &options)
            .await
            .unwrap();

        assert_eq!(page.size, 1);
        assert!(!page.has_next());
        assert_eq!(page.values[0].id, 7);
        assert_eq!(page.values[0].reporter.as_ref().unwrap().display_name, "Jane Doe");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_create_issue_omits_empty_fields() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/repositories/acme/widgets/issues")
            .match_body(Matcher::Json(json!({
                "title": "Crash on start",
                "kind": "bug",
                "assignee": {"uuid": "{abc}"}
            })))
            .with_status(201)
            .with_body(r#"{"id": 8, "title": "Crash on start", "kind": "bug"}"#)
            .create_async()
            .await;

        let options = IssueCreateOptions {
            title: "Crash on start".to_string(),
            content: Some(String::new()),
            kind: Some("bug".to_string()),
            assignee: Some("{abc}".to_string()),
            ..Default::default()
        };
        let issue = client_for(&server)
            .create_issue("acme", "widgets", &options)
            .await
            .unwrap();

        assert_eq!(issue.id, 8);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_update_issue_sends_partial_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", "/repositories/acme/widgets/issues/8")
            .match_body(Matcher::Json(json!({"state": "closed"})))
            .with_status(200)
            .with_body(r#"{"id": 8, "state": "closed"}"#)
            .create_async()
            .await;

        let options = IssueUpdateOptions {
            state: Some("closed".to_string()),
            ..Default::default()
        };
        let issue = client_for(&server)
            .update_issue("acme", "widgets", 8, &options)
            .await
            .unwrap();

        assert_eq!(issue.state, "closed");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_create_issue_comment() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/repositories/acme/widgets/issues/8/comments")
            .match_body(Matcher::Json(json!({"content": {"raw": "Fixed in main"}})))
            .with_status(201)
            .with_body(r#"{"id": 100, "content": {"raw": "Fixed in main"}}"#)
            .create_async()
            .await;

        let comment = client_for(&server)
            .create_issue_comment("acme", "widgets", 8, "Fixed in main")
            .await
            .unwrap();

        assert_eq!(comment.content.unwrap().raw, "Fixed in main");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_delete_issue_not_found() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("DELETE", "/repositories/acme/widgets/issues/99")
            .with_status(404)
            .with_body(r#"{"type": "error", "error": {"message": "Issue not found"}}"#)
            .create_async()
            .await;

        let err = client_for(&server)
            .delete_issue("acme", "widgets", 99)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "API error 404: Issue not found");
    }
}
