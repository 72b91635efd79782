//
//  bb-cloud
//  api/common/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Common API Types for Bitbucket Cloud
//!
//! This module provides the types shared by every resource accessor: the
//! structured remote error ([`ApiError`]), the client error taxonomy
//! ([`ClientError`]), and the small data structures that appear inside most
//! Bitbucket payloads.
//!
//! # Overview
//!
//! - [`ApiError`] - A request the server rejected (status 400 and above)
//! - [`ClientError`] - Everything a call through the client can fail with
//! - [`User`] - Account reference embedded in issues, pull requests and pipelines
//! - [`Link`] / [`ResourceLinks`] - HATEOAS-style links
//! - [`Content`] - Rendered text blocks (`raw`, `markup`, `html`)
//! - Pagination types (re-exported from [`pagination`] submodule)
//!
//! # Error Tiers
//!
//! | Variant | Meaning | Carries response |
//! |---------|---------|------------------|
//! | [`ClientError::Api`] | The server answered with an error status | Yes |
//! | [`ClientError::Transport`] | The call never produced a response | No |
//! | [`ClientError::Encode`] | The request body could not be serialized | No |
//! | [`ClientError::InvalidRequest`] | The request could not be built | No |
//! | [`ClientError::Decode`] | A successful body did not match the expected shape | No |
//!
//! # Example
//!
//! ```rust,ignore
//! use bb_cloud::api::common::ClientError;
//!
//! match client.get_issue("acme", "widgets", 42).await {
//!     Ok(issue) => println!("{}", issue.title),
//!     Err(ClientError::Api { error, .. }) if error.status_code == 404 => {
//!         println!("No such issue");
//!     }
//!     Err(e) => return Err(e.into()),
//! }
//! ```

use std::collections::HashMap;
use std::fmt;

use reqwest::StatusCode;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::api::client::Response;

mod pagination;

pub use pagination::*;

/// A structured error returned by the Bitbucket API.
///
/// Built from the standard Bitbucket error envelope:
///
/// ```json
/// {"type": "error", "error": {"message": "...", "detail": "...", "fields": {"name": "..."}}}
/// ```
///
/// When the body is not JSON or carries no message, [`message`](Self::message)
/// falls back to the canonical reason phrase of the status code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// HTTP status code of the response (always 400 or above).
    pub status_code: u16,

    /// Human-readable message.
    pub message: String,

    /// Optional longer explanation supplied by the server.
    pub detail: Option<String>,

    /// Optional per-field validation messages.
    pub fields: Option<HashMap<String, String>>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorBody>,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,

    #[serde(default)]
    detail: Option<String>,

    // Any shape; only objects are flattened.
    #[serde(default)]
    fields: Option<serde_json::Value>,
}

impl ApiError {
    /// Creates an error with only a status code and message.
    pub fn new(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            status_code,
            message: message.into(),
            detail: None,
            fields: None,
        }
    }

    /// Builds an error from a response status and raw body.
    ///
    /// # Parameters
    ///
    /// * `status_code` - The HTTP status code of the response
    /// * `body` - The raw response body, which may or may not be JSON
    ///
    /// # Returns
    ///
    /// An [`ApiError`] whose message comes from `error.message` when present,
    /// and from the status reason phrase otherwise.
    pub fn from_response(status_code: u16, body: &[u8]) -> Self {
        let parsed = serde_json::from_slice::<ErrorEnvelope>(body)
            .ok()
            .and_then(|envelope| envelope.error)
            .filter(|error| error.message.as_deref().is_some_and(|m| !m.is_empty()));

        match parsed {
            Some(error) => Self {
                status_code,
                message: error.message.unwrap_or_default(),
                detail: error.detail.filter(|d| !d.is_empty()),
                fields: error.fields.and_then(flatten_fields),
            },
            None => Self::new(status_code, reason_phrase(status_code)),
        }
    }

    /// Returns true for 401 Unauthorized.
    pub fn is_unauthorized(&self) -> bool {
        self.status_code == StatusCode::UNAUTHORIZED.as_u16()
    }

    /// Returns true for 403 Forbidden.
    pub fn is_forbidden(&self) -> bool {
        self.status_code == StatusCode::FORBIDDEN.as_u16()
    }

    /// Returns true for 404 Not Found.
    pub fn is_not_found(&self) -> bool {
        self.status_code == StatusCode::NOT_FOUND.as_u16()
    }

    /// Returns true for 429 Too Many Requests.
    pub fn is_rate_limited(&self) -> bool {
        self.status_code == StatusCode::TOO_MANY_REQUESTS.as_u16()
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "API error {}: {}", self.status_code, self.message)?;
        if let Some(detail) = &self.detail {
            write!(f, " - {}", detail)?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {}

/// Returns the canonical reason phrase for a status code.
fn reason_phrase(status_code: u16) -> String {
    StatusCode::from_u16(status_code)
        .ok()
        .and_then(|status| status.canonical_reason())
        .unwrap_or("Unknown Status")
        .to_string()
}

// Bitbucket reports field errors either as plain strings or as arrays of strings.
fn flatten_fields(fields: serde_json::Value) -> Option<HashMap<String, String>> {
    let serde_json::Value::Object(fields) = fields else {
        return None;
    };

    let flattened = fields
        .into_iter()
        .map(|(name, value)| {
            let text = match value {
                serde_json::Value::String(s) => s,
                serde_json::Value::Array(items) => items
                    .iter()
                    .map(|item| match item {
                        serde_json::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join("; "),
                other => other.to_string(),
            };
            (name, text)
        })
        .collect();
    Some(flattened)
}

/// Deserializes `null` the same way as a missing key.
///
/// Bitbucket sends `null` for unset text such as descriptions, which plain
/// `#[serde(default)]` rejects. Use together with `default`:
///
/// ```rust,ignore
/// #[serde(default, deserialize_with = "null_as_default")]
/// pub description: String,
/// ```
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Errors produced by [`BitbucketClient`](crate::api::BitbucketClient) calls.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The server answered with a status of 400 or above.
    #[error("{error}")]
    Api {
        error: ApiError,
        response: Box<Response>,
    },

    /// Connection, DNS, TLS, timeout or body-read failure.
    #[error("could not reach the Bitbucket API: {0}")]
    Transport(#[from] reqwest::Error),

    /// The request body could not be serialized.
    #[error("could not encode the request body: {0}")]
    Encode(#[source] serde_json::Error),

    /// The request could not be built (empty path, malformed header).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A successful response did not decode into the expected type.
    #[error("unexpected response from the Bitbucket API: {0}")]
    Decode(#[source] serde_json::Error),
}

impl ClientError {
    /// Returns the structured API error, if the server rejected the request.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Api { error, .. } => Some(error),
            _ => None,
        }
    }

    /// Returns the raw response that accompanied an API error.
    pub fn response(&self) -> Option<&Response> {
        match self {
            Self::Api { response, .. } => Some(response),
            _ => None,
        }
    }

    /// Returns the HTTP status code of an API error.
    pub fn status_code(&self) -> Option<u16> {
        self.api_error().map(|e| e.status_code)
    }

    /// Returns true if the request timed out.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_timeout())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Link {
    pub href: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// The `links` object carried by most Bitbucket resources.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceLinks {
    #[serde(default, rename = "self", skip_serializing_if = "Option::is_none")]
    pub self_link: Option<Link>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<Link>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub clone: Vec<Link>,
}

impl ResourceLinks {
    /// Returns the browser URL of the resource.
    pub fn html_url(&self) -> Option<&str> {
        self.html.as_ref().map(|l| l.href.as_str())
    }
}

/// A Bitbucket account reference.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub display_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<ResourceLinks>,
}

/// A rendered text block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, deserialize_with = "null_as_default")]
    pub raw: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markup: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
}

/// Request-side text block: `{"raw": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawContent {
    pub raw: String,
}

impl RawContent {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }
}

/// Request-side account reference: `{"uuid": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UuidRef {
    pub uuid: String,
}

impl UuidRef {
    pub fn new(uuid: impl Into<String>) -> Self {
        Self { uuid: uuid.into() }
    }
}

/// A commit reference (`{"hash": "..."}` plus optional metadata).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommitRef {
    #[serde(default, deserialize_with = "null_as_default")]
    pub hash: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<chrono::DateTime<chrono::Utc>>,
}

/// A named reference such as a branch: `{"name": "..."}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NamedRef {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_from_envelope() {
        let body = br#"{"type":"error","error":{"message":"Repository not found","detail":"No repo named widgets"}}"#;
        let err = ApiError::from_response(404, body);

        assert_eq!(err.status_code, 404);
        assert_eq!(err.message, "Repository not found");
        assert_eq!(err.detail.as_deref(), Some("No repo named widgets"));
        assert!(err.is_not_found());
    }

    #[test]
    fn test_api_error_falls_back_to_reason_phrase() {
        let err = ApiError::from_response(500, b"<html>Internal Server Error</html>");
        assert_eq!(err.message, "Internal Server Error");
        assert_eq!(err.detail, None);
        assert_eq!(err.fields, None);

        let err = ApiError::from_response(403, br#"{"error":{"detail":"no message here"}}"#);
        assert_eq!(err.message, "Forbidden");
        assert_eq!(err.detail, None);
    }

    #[test]
    fn test_api_error_fields() {
        let body = br#"{"error":{"message":"Bad request","fields":{"name":["is required","is too short"],"key":"taken"}}}"#;
        let err = ApiError::from_response(400, body);
        let fields = err.fields.expect("fields should be parsed");

        assert_eq!(fields["name"], "is required; is too short");
        assert_eq!(fields["key"], "taken");
    }

    #[test]
    fn test_api_error_keeps_message_with_unexpected_fields() {
        let body = br#"{"error":{"message":"Bad name","fields":["name"]}}"#;
        let err = ApiError::from_response(400, body);

        assert_eq!(err.message, "Bad name");
        assert_eq!(err.fields, None);
    }

    #[test]
    fn test_api_error_display() {
        let err = ApiError::new(404, "Not Found");
        assert_eq!(err.to_string(), "API error 404: Not Found");

        let err = ApiError {
            detail: Some("The repository does not exist".to_string()),
            ..ApiError::new(404, "Not Found")
        };
        assert_eq!(
            err.to_string(),
            "API error 404: Not Found - The repository does not exist"
        );
    }

    #[test]
    fn test_api_error_unknown_status() {
        let err = ApiError::from_response(599, b"");
        assert_eq!(err.message, "Unknown Status");
    }

    #[test]
    fn test_user_deserialize_partial() {
        let user: User = serde_json::from_str(r#"{"display_name":"Jane Doe","nickname":"jdoe"}"#).unwrap();
        assert_eq!(user.display_name, "Jane Doe");
        assert_eq!(user.nickname.as_deref(), Some("jdoe"));
        assert!(user.uuid.is_none());
    }

    #[test]
    fn test_null_text_reads_as_empty() {
        let user: User = serde_json::from_str(r#"{"display_name":null,"nickname":"jdoe"}"#).unwrap();
        assert_eq!(user.display_name, "");

        let content: Content = serde_json::from_str(r#"{"raw":null}"#).unwrap();
        assert_eq!(content.raw, "");
    }
}
