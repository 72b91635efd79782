//
//  bb-cloud
//  api/cloud/snippets.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Cloud snippets API.
//!
//! Snippets are listed either per workspace (`/snippets/{workspace}`) or
//! across every workspace the caller can see (`/snippets?role=...`).
//! Individual snippets are addressed by their encoded id.

use serde::{Deserialize, Deserializer, Serialize};

use super::non_empty;
use crate::api::client::{parse_response, BitbucketClient, Query};
use crate::api::common::{null_as_default, ClientError, Paginated, ResourceLinks, User};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snippet {
    /// Encoded id used in snippet URLs; older payloads carry a number.
    #[serde(default, deserialize_with = "id_as_string")]
    pub id: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub scm: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub is_private: bool,

    #[serde(default)]
    pub owner: Option<User>,

    #[serde(default)]
    pub creator: Option<User>,

    #[serde(default)]
    pub created_on: Option<String>,

    #[serde(default)]
    pub updated_on: Option<String>,

    #[serde(default)]
    pub links: Option<ResourceLinks>,
}

#[derive(Debug, Clone, Default)]
pub struct SnippetListOptions {
    /// Limits the listing to one workspace.
    pub workspace: Option<String>,
    /// `owner`, `contributor` or `member`; only used without a workspace.
    pub role: Option<String>,
    pub page: Option<u32>,
    pub pagelen: Option<u32>,
}

fn id_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}

impl SnippetListOptions {
    fn path(&self) -> String {
        match non_empty(&self.workspace) {
            Some(workspace) => format!("/snippets/{}", workspace),
            None => "/snippets".to_string(),
        }
    }

    pub fn to_query(&self) -> Query {
        let mut query = Query::new();
        if non_empty(&self.workspace).is_none() {
            query.append_opt("role", non_empty(&self.role));
        }
        query.append_opt("page", self.page.filter(|p| *p > 0));
        query.append_opt("pagelen", self.pagelen.filter(|p| *p > 0));
        query
    }
}

impl BitbucketClient {
    pub async fn list_snippets(
        &self,
        options: &SnippetListOptions,
    ) -> Result<Paginated<Snippet>, ClientError> {
        let response = self.get(&options.path(), Some(options.to_query())).await?;
        parse_response(&response)
    }

    pub async fn get_snippet(&self, workspace: &str, encoded_id: &str) -> Result<Snippet, ClientError> {
        let path = format!("/snippets/{}/{}", workspace, encoded_id);
        let response = self.get(&path, None).await?;
        parse_response(&response)
    }

    pub async fn delete_snippet(&self, workspace: &str, encoded_id: &str) -> Result<(), ClientError> {
        let path = format!("/snippets/{}/{}", workspace, encoded_id);
        self.delete(&path).await?;
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
        BitbucketClient::new([ClientOption::BaseUrl(server.url())]).unwrap()
    }

    #[tokio::test]
    async fn test_list_snippets_by_role() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/snippets")
            .match_query(Matcher::UrlEncoded("role".into(), "owner".into()))
            .with_status(200)
            .with_body(json!({"values": [{"id": 1, "title": "notes"}]}).to_string())
            .create_async()
            .await;

        let options = SnippetListOptions {
            role: Some("owner".to_string()),
            ..Default::default()
        };
        let page = client_for(&server).list_snippets(&options).await.unwrap();

        assert_eq!(page.values[0].title, "notes");
        assert_eq!(page.values[0].id, "1");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_list_snippets_in_workspace_ignores_role() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/snippets/acme")
            .with_status(200)
            .with_body(r#"{"values": []}"#)
            .create_async()
            .await;

        let options = SnippetListOptions {
            workspace: Some("acme".to_string()),
            role: Some("owner".to_string()),
            ..Default::default()
        };
        assert!(options.to_query().is_empty());

        let page = client_for(&server).list_snippets(&options).await.unwrap();

        assert!(page.is_empty());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_delete_snippet() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("DELETE", "/snippets/acme/kypj")
            .with_status(204)
            .create_async()
            .await;

        client_for(&server).delete_snippet("acme", "kypj").await.unwrap();
        mock.assert_async().await;
    }
}
