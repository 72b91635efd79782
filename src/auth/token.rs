//
//  bb-cloud
//  auth/token.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Token Handling
//!
//! Helpers for accepting a Bitbucket API token from the user and checking it
//! against the API before it is stored.
//!
//! ## Creating a Token
//!
//! Bitbucket Cloud accepts workspace, project and repository access tokens as
//! well as OAuth access tokens as bearer credentials. Create one under
//! *Workspace settings > Access tokens* (or the equivalent repository page)
//! and pass it to `bb auth login --with-token`.

use std::io::BufRead;

use anyhow::{bail, Context, Result};

use crate::api::common::User;
use crate::api::BitbucketClient;

/// Reads a token from the first line of `reader`.
pub fn read_token<R: BufRead>(mut reader: R) -> Result<String> {
    let mut line = String::new();
    reader
        .read_line(&mut line)
        .context("Failed to read token from standard input")?;
    Ok(line.trim().to_string())
}

pub fn read_token_from_stdin() -> Result<String> {
    read_token(std::io::stdin().lock())
}

/// Returns true if the token is non-empty and has no whitespace.
pub fn validate_token(token: &str) -> bool {
    !token.is_empty() && !token.chars().any(char::is_whitespace)
}

/// Calls `GET /user` with `client` and returns the account the token belongs to.
pub async fn verify_token(client: &BitbucketClient) -> Result<User> {
    if !client.has_token() {
        bail!("No token to verify");
    }

    let user = match client.current_user().await {
        Ok(user) => user,
        Err(e) if matches!(e.status_code(), Some(401 | 403)) => {
            return Err(anyhow::Error::new(e).context("The token was rejected by Bitbucket"));
        }
        Err(e) => return Err(e.into()),
    };
    tracing::debug!("Token belongs to {}", user.display_name);
    Ok(user)
}

/// Picks the name under which a verified account is stored.
pub fn account_name(user: &User) -> Option<&str> {
    [&user.username, &user.nickname, &user.account_id]
        .into_iter()
        .find_map(|v| v.as_deref().filter(|s| !s.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::common::ClientError;
    use crate::api::ClientOption;

    #[test]
    fn test_read_token_trims() {
        let token = read_token(std::io::Cursor::new("  abc123 \nignored\n")).unwrap();
        assert_eq!(token, "abc123");
    }

    #[test]
    fn test_validate_token() {
        assert!(validate_token("abc123"));
        assert!(!validate_token(""));
        assert!(!validate_token("abc 123"));
    }

    #[test]
    fn test_account_name_prefers_username() {
        let user = User {
            username: Some("jdoe".to_string()),
            nickname: Some("Jane".to_string()),
            ..Default::default()
        };
        assert_eq!(account_name(&user), Some("jdoe"));

        let user = User {
            nickname: Some("Jane".to_string()),
            ..Default::default()
        };
        assert_eq!(account_name(&user), Some("Jane"));
        assert_eq!(account_name(&User::default()), None);
    }

    #[tokio::test]
    async fn test_verify_token() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/user")
            .match_header("authorization", "Bearer good")
            .with_status(200)
            .with_body(r#"{"display_name": "Jane Doe", "username": "jdoe"}"#)
            .create_async()
            .await;

        let client = BitbucketClient::new([
            ClientOption::BaseUrl(server.url()),
            ClientOption::Token("good".to_string()),
        ])
        .unwrap();
        let user = verify_token(&client).await.unwrap();

        assert_eq!(user.username.as_deref(), Some("jdoe"));
    }

    #[tokio::test]
    async fn test_verify_rejected_token() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/user")
            .with_status(401)
            .create_async()
            .await;

        let client = BitbucketClient::new([
            ClientOption::BaseUrl(server.url()),
            ClientOption::Token("bad".to_string()),
        ])
        .unwrap();
        let err = verify_token(&client).await.unwrap_err();

        assert!(err.to_string().contains("rejected"));
        let cause = err.downcast_ref::<ClientError>().unwrap();
        assert_eq!(cause.status_code(), Some(401));
    }

    #[tokio::test]
    async fn test_verify_unreachable_is_not_a_rejection() {
        let client = BitbucketClient::new([
            ClientOption::BaseUrl("http://127.0.0.1:1".to_string()),
            ClientOption::Token("good".to_string()),
        ])
        .unwrap();
        let err = verify_token(&client).await.unwrap_err();

        assert!(!format!("{err:#}").contains("rejected"));
        assert!(matches!(
            err.downcast_ref::<ClientError>(),
            Some(ClientError::Transport(_))
        ));
    }

    #[tokio::test]
    async fn test_verify_without_token_fails() {
        let client = BitbucketClient::cloud().unwrap();
        assert!(verify_token(&client).await.is_err());
    }
}
