//
//  bb-cloud
//  api/cloud/repositories.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Cloud repository API.
//!
//! Repositories are addressed as `{workspace}/{repo_slug}`. The slug is the
//! URL-safe form of the repository name.
//!
//! # Example
//!
//! ```rust,no_run
//! use bb_cloud::api::BitbucketClient;
//! use bb_cloud::api::cloud::repositories::RepositoryCreateOptions;
//!
//! # async fn demo(client: BitbucketClient) -> Result<(), bb_cloud::api::ClientError> {
//! let options = RepositoryCreateOptions {
//!     is_private: Some(true),
//!     description: Some("Widget factory".to_string()),
//!     ..Default::default()
//! };
//! let repo = client.create_repository("acme", "widgets", &options).await?;
//! println!("Created {}", repo.full_name);
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};

use super::{non_empty, repo_path};
use crate::api::client::{parse_response, BitbucketClient, Query};
use crate::api::common::{null_as_default, ClientError, NamedRef, Paginated, ResourceLinks, User};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    #[serde(default, deserialize_with = "null_as_default")]
    pub uuid: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub full_name: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub slug: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub is_private: bool,

    #[serde(default, deserialize_with = "null_as_default")]
    pub scm: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub language: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub size: u64,

    #[serde(default)]
    pub fork_policy: Option<String>,

    #[serde(default)]
    pub mainbranch: Option<NamedRef>,

    #[serde(default)]
    pub owner: Option<User>,

    #[serde(default)]
    pub project: Option<ProjectRef>,

    #[serde(default)]
    pub workspace: Option<WorkspaceRef>,

    #[serde(default)]
    pub parent: Option<Box<Repository>>,

    #[serde(default)]
    pub created_on: Option<String>,

    #[serde(default)]
    pub updated_on: Option<String>,

    #[serde(default)]
    pub links: Option<ResourceLinks>,
}

impl Repository {
    /// Returns the clone URL for `protocol` (`https` or `ssh`).
    pub fn clone_url(&self, protocol: &str) -> Option<&str> {
        self.links
            .as_ref()?
            .clone
            .iter()
            .find(|link| link.name.as_deref() == Some(protocol))
            .map(|link| link.href.as_str())
    }

    pub fn main_branch(&self) -> Option<&str> {
        self.mainbranch.as_ref().map(|b| b.name.as_str())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectRef {
    #[serde(default, deserialize_with = "null_as_default")]
    pub key: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkspaceRef {
    #[serde(default, deserialize_with = "null_as_default")]
    pub slug: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

/// Filters for [`BitbucketClient::list_repositories`].
#[derive(Debug, Clone, Default)]
pub struct RepositoryListOptions {
    /// `owner`, `admin`, `contributor` or `member`.
    pub role: Option<String>,
    pub q: Option<String>,
    pub sort: Option<String>,
    pub page: Option<u32>,
    pub pagelen: Option<u32>,
}

impl RepositoryListOptions {
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

/// Fields for [`BitbucketClient::create_repository`].
#[derive(Debug, Clone, Default)]
pub struct RepositoryCreateOptions {
    pub description: Option<String>,
    pub is_private: Option<bool>,
    pub project_key: Option<String>,
    pub language: Option<String>,
    pub fork_policy: Option<String>,
}

#[derive(Debug, Serialize)]
struct KeyRef<'a> {
    key: &'a str,
}

#[derive(Debug, Serialize)]
struct CreateRepositoryBody<'a> {
    scm: &'static str,

    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    is_private: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    project: Option<KeyRef<'a>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    language: Option<&'a str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    fork_policy: Option<&'a str>,
}

/// Fields for [`BitbucketClient::fork_repository`].
#[derive(Debug, Clone, Default)]
pub struct RepositoryForkOptions {
    /// Name of the fork; defaults to the source name.
    pub name: Option<String>,
    /// Destination workspace; defaults to the caller's own workspace.
    pub workspace: Option<String>,
    pub is_private: Option<bool>,
}

#[derive(Debug, Serialize)]
struct SlugRef<'a> {
    slug: &'a str,
}

#[derive(Debug, Serialize)]
struct ForkRepositoryBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    workspace: Option<SlugRef<'a>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    is_private: Option<bool>,
}

impl BitbucketClient {
    /// Lists repositories in a workspace.
    pub async fn list_repositories(
        &self,
        workspace: &str,
        options: &RepositoryListOptions,
    ) -> Result<Paginated<Repository>, ClientError> {
        let path = format!("/repositories/{}", workspace);
        let response = self.get(&path, Some(options.to_query())).await?;
        parse_response(&response)
    }

    pub async fn get_repository(
        &self,
        workspace: &str,
        repo_slug: &str,
    ) -> Result<Repository, ClientError> {
        let response = self.get(&repo_path(workspace, repo_slug), None).await?;
        parse_response(&response)
    }

    /// Creates a git repository at `{workspace}/{repo_slug}`.
    pub async fn create_repository(
        &self,
        workspace: &str,
        repo_slug: &str,
        options: &RepositoryCreateOptions,
    ) -> Result<Repository, ClientError> {
        let body = CreateRepositoryBody {
            scm: "git",
            description: options.description.as_deref(),
            is_private: options.is_private,
            project: non_empty(&options.project_key).map(|key| KeyRef { key }),
            language: non_empty(&options.language),
            fork_policy: non_empty(&options.fork_policy),
        };
        let response = self.post(&repo_path(workspace, repo_slug), &body).await?;
        parse_response(&response)
    }

    /// Forks a repository and returns the new fork.
    pub async fn fork_repository(
        &self,
        workspace: &str,
        repo_slug: &str,
        options: &RepositoryForkOptions,
    ) -> Result<Repository, ClientError> {
        let path = format!("{}/forks", repo_path(workspace, repo_slug));
        let body = ForkRepositoryBody {
            name: non_empty(&options.name),
            workspace: non_empty(&options.workspace).map(|slug| SlugRef { slug }),
            is_private: options.is_private,
        };
        let response = self.post(&path, &body).await?;
        parse_response(&response)
    }

    pub async fn delete_repository(&self, workspace: &str, repo_slug: &str) -> Result<(), ClientError> {
        self.delete(&repo_path(workspace, repo_slug)).await?;
        Ok(())
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
    async fn test_list_repositories_follows_next_page() {
        let mut server = mockito::Server::new_async().await;
        let next = format!("{}/repositories/acme?page=2", server.url());

        let first = server
            .mock("GET", "/repositories/acme")
            .match_query(Matcher::UrlEncoded("role".into(), "member".into()))
            .with_status(200)
            .with_body(
                json!({
                    "size": 3,
                    "page": 1,
                    "pagelen": 2,
                    "next": next.clone(),
                    "values": [{"slug": "a", "full_name": "acme/a"}, {"slug": "b", "full_name": "acme/b"}]
                })
                .to_string(),
            )
            .create_async()
            .await;
        let second = server
            .mock("GET", "/repositories/acme")
            .match_query(Matcher::UrlEncoded("page".into(), "2".into()))
            .with_status(200)
            .with_body(
                json!({
                    "size": 3,
                    "page": 2,
                    "pagelen": 2,
                    "values": [{"slug": "c", "full_name": "acme/c"}]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = client_for(&server);
        let options = RepositoryListOptions {
            role: Some("member".to_string()),
            ..Default::default()
        };
        let page = client.list_repositories("acme", &options).await.unwrap();

        assert_eq!(page.size, 3);
        assert_eq!(page.values.len(), 2);
        assert_eq!(page.next_url(), Some(next.as_str()));

        let response = client.get(page.next_url().unwrap(), None).await.unwrap();
        let last: Paginated<Repository> = parse_response(&response).unwrap();

        assert_eq!(last.values.len(), 1);
        assert_eq!(last.values[0].slug, "c");
        assert!(!last.has_next());

        first.assert_async().await;
        second.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_repository() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/repositories/acme/widgets")
            .with_status(200)
            .with_body(
                json!({
                    "full_name": "acme/widgets",
                    "is_private": true,
                    "mainbranch": {"name": "main"},
                    "links": {
                        "html": {"href": "https://bitbucket.org/acme/widgets"},
                        "clone": [
                            {"name": "https", "href": "https://bitbucket.org/acme/widgets.git"},
                            {"name": "ssh", "href": "git@bitbucket.org:acme/widgets.git"}
                        ]
                    }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let repo = client_for(&server)
            .get_repository("acme", "widgets")
            .await
            .unwrap();

        assert!(repo.is_private);
        assert_eq!(repo.main_branch(), Some("main"));
        assert_eq!(repo.clone_url("ssh"), Some("git@bitbucket.org:acme/widgets.git"));
        assert_eq!(
            repo.links.as_ref().and_then(|l| l.html_url()),
            Some("https://bitbucket.org/acme/widgets")
        );
    }

    #[tokio::test]
    async fn test_list_repositories_tolerates_null_text() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/repositories/acme")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(
                json!({
                    "values": [{
                        "slug": "widgets",
                        "full_name": "acme/widgets",
                        "description": null,
                        "scm": null,
                        "language": null
                    }]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let page = client_for(&server)
            .list_repositories("acme", &Default::default())
            .await
            .unwrap();

        let repo = &page.values[0];
        assert_eq!(repo.full_name, "acme/widgets");
        assert_eq!(repo.description, "");
        assert_eq!(repo.scm, "");
        assert_eq!(repo.language, "");
    }

    #[tokio::test]
    async fn test_create_repository_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/repositories/acme/widgets")
            .match_body(Matcher::Json(json!({
                "scm": "git",
                "is_private": true,
                "project": {"key": "WID"}
            })))
            .with_status(200)
            .with_body(r#"{"full_name": "acme/widgets", "is_private": true}"#)
            .create_async()
            .await;

        let options = RepositoryCreateOptions {
            is_private: Some(true),
            project_key: Some("WID".to_string()),
            ..Default::default()
        };
        client_for(&server)
            .create_repository("acme", "widgets", &options)
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fork_repository() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/repositories/acme/widgets/forks")
            .match_body(Matcher::Json(json!({"workspace": {"slug": "jdoe"}})))
            .with_status(201)
            .with_body(r#"{"full_name": "jdoe/widgets", "parent": {"full_name": "acme/widgets"}}"#)
            .create_async()
            .await;

        let options = RepositoryForkOptions {
            workspace: Some("jdoe".to_string()),
            ..Default::default()
        };
        let fork = client_for(&server)
            .fork_repository("acme", "widgets", &options)
            .await
            .unwrap();

        assert_eq!(fork.full_name, "jdoe/widgets");
        assert_eq!(fork.parent.unwrap().full_name, "acme/widgets");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_delete_repository() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("DELETE", "/repositories/acme/widgets")
            .with_status(204)
            .create_async()
            .await;

        client_for(&server)
            .delete_repository("acme", "widgets")
            .await
            .unwrap();
        mock.assert_async().await;
    }
}
