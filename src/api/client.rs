//
//  bb-cloud
//  api/client.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # HTTP Client Wrapper for Bitbucket API
//!
//! This module provides the core HTTP client for the Bitbucket Cloud REST API.
//! Every command goes through [`BitbucketClient::execute`], which performs one
//! round trip, injects authentication and identification headers, and
//! classifies the outcome as either a [`Response`] or a [`ClientError`].
//!
//! ## Features
//!
//! - Bearer token injection (anonymous when no token is configured)
//! - Fixed `bb/<version>` User-Agent on every request
//! - Ordered, multi-valued query parameters ([`Query`])
//! - Structured API errors that keep the raw response
//! - Generic JSON decoding via [`parse_response`]
//!
//! ## Example
//!
//! ```rust,no_run
//! use bb_cloud::api::{parse_response, BitbucketClient, Query};
//!
//! # async fn demo() -> Result<(), bb_cloud::api::ClientError> {
//! let client = BitbucketClient::cloud()?.with_token("my-token");
//! let response = client
//!     .get("/repositories/acme", Some(Query::new().with("pagelen", "10")))
//!     .await?;
//! let body: serde_json::Value = parse_response(&response)?;
//! println!("{}", body["size"]);
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::time::Duration;

use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE, USER_AGENT,
};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::common::{ApiError, ClientError};

/// Base URL of the Bitbucket Cloud REST API.
pub const DEFAULT_BASE_URL: &str = "https://api.bitbucket.org/2.0";

/// User-Agent sent with every request.
pub const USER_AGENT_VALUE: &str = concat!("bb/", env!("CARGO_PKG_VERSION"));

const JSON: &str = "application/json";

/// HTTP methods supported by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Method {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "DELETE" => Ok(Self::Delete),
            other => Err(ClientError::InvalidRequest(format!(
                "unsupported HTTP method: {other}"
            ))),
        }
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Ordered query parameters.
///
/// A key may appear several times; pairs are sent in the order they were
/// added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pairs: Vec<(String, String)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a pair and returns the query (builder style).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.append(key, value);
        self
    }

    /// Adds a pair after any existing pairs.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.pairs.push((key.into(), value.into()));
        self
    }

    /// Adds a pair only when a value is present.
    pub fn append_opt<V: ToString>(&mut self, key: &str, value: Option<V>) -> &mut Self {
        if let Some(value) = value {
            self.pairs.push((key.to_string(), value.to_string()));
        }
        self
    }

    /// Returns the first value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Returns every value for `key`, in insertion order.
    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.pairs
            .iter()
            .filter(move |(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Query {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            pairs: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// A single API call.
///
/// `path` is either relative to the client's base URL (`/repositories/acme`)
/// or an absolute URL such as a pagination `next` link.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub query: Query,
    pub body: Option<serde_json::Value>,
    pub headers: Vec<(String, String)>,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Query::new(),
            body: None,
            headers: Vec::new(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    pub fn query(mut self, query: Query) -> Self {
        self.query = query;
        self
    }

    /// Sets a JSON body from any serializable value.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Encode`] if `body` cannot be represented as JSON.
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ClientError> {
        self.body = Some(serde_json::to_value(body).map_err(ClientError::Encode)?);
        Ok(self)
    }

    pub fn body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Adds a header that overrides the client default of the same name.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// The result of a round trip that reached the server.
#[derive(Debug, Clone)]
pub struct Response {
    pub status_code: u16,
    pub body: Vec<u8>,
    pub headers: HeaderMap,
}

impl Response {
    /// Returns the body as text, replacing invalid UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn is_success(&self) -> bool {
        (200..400).contains(&self.status_code)
    }
}

/// Client construction options.
#[derive(Debug, Clone)]
pub enum ClientOption {
    /// API root; a single trailing slash is stripped.
    BaseUrl(String),
    /// Bearer token; empty means anonymous.
    Token(String),
    /// Per-request timeout covering connect, send and body read.
    Timeout(Duration),
}

/// The Bitbucket Cloud API client.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct BitbucketClient {
    http: Client,
    base_url: String,
    token: String,
}

impl fmt::Debug for BitbucketClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BitbucketClient")
            .field("base_url", &self.base_url)
            .field("token", &if self.token.is_empty() { "<none>" } else { "<redacted>" })
            .finish()
    }
}

impl BitbucketClient {
    /// Creates a client from a set of options.
    ///
    /// # Parameters
    ///
    /// * `options` - Any mix of [`ClientOption`]s; later options win
    ///
    /// # Returns
    ///
    /// A client pointed at [`DEFAULT_BASE_URL`] unless a base URL is given.
    /// No network activity happens here.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Transport`] if the underlying HTTP client cannot
    /// be initialized (for example, no TLS backend).
    pub fn new<I>(options: I) -> Result<Self, ClientError>
    where
        I: IntoIterator<Item = ClientOption>,
    {
        let mut base_url = DEFAULT_BASE_URL.to_string();
        let mut token = String::new();
        let mut timeout = None;

        for option in options {
            match option {
                ClientOption::BaseUrl(url) => base_url = normalize_base_url(&url),
                ClientOption::Token(t) => token = t,
                ClientOption::Timeout(d) => timeout = Some(d),
            }
        }

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            base_url,
            token,
        })
    }

    /// Creates an anonymous client for Bitbucket Cloud.
    pub fn cloud() -> Result<Self, ClientError> {
        Self::new([])
    }

    pub fn with_base_url(mut self, base_url: impl AsRef<str>) -> Self {
        self.base_url = normalize_base_url(base_url.as_ref());
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = token.into();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn has_token(&self) -> bool {
        !self.token.is_empty()
    }

    /// Resolves a request path against the base URL.
    pub fn url_for(&self, path: &str) -> String {
        if is_absolute_url(path) {
            path.to_string()
        } else if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Performs one HTTP round trip.
    ///
    /// Headers are applied in this order, each replacing earlier values of the
    /// same name: `Accept` and `Authorization` defaults, `Content-Type` when a
    /// body is present, the caller's headers, then `User-Agent`.
    ///
    /// # Returns
    ///
    /// The full response for any status in 200..400.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Api`] for status 400 and above, with the response attached
    /// - [`ClientError::Transport`] when no response was received
    /// - [`ClientError::Encode`] / [`ClientError::InvalidRequest`] when the
    ///   request could not be built
    pub async fn execute(&self, request: Request) -> Result<Response, ClientError> {
        if request.path.is_empty() {
            return Err(ClientError::InvalidRequest("request path is empty".to_string()));
        }

        let url = self.url_for(&request.path);

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(JSON));

        if !self.token.is_empty() {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", self.token))
                .map_err(|_| {
                    ClientError::InvalidRequest("token contains invalid header characters".to_string())
                })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let body = match &request.body {
            Some(body) => {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON));
                Some(serde_json::to_vec(body).map_err(ClientError::Encode)?)
            }
            None => None,
        };

        for (name, value) in &request.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| ClientError::InvalidRequest(format!("invalid header name: {name}")))?;
            let value = HeaderValue::from_str(value).map_err(|_| {
                ClientError::InvalidRequest(format!("invalid value for header {name}"))
            })?;
            headers.insert(name, value);
        }

        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        let mut builder = self
            .http
            .request(request.method.into(), &url)
            .headers(headers);

        if !request.query.is_empty() {
            builder = builder.query(request.query.pairs());
        }

        if let Some(body) = body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status_code = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.bytes().await?.to_vec();

        let response = Response {
            status_code,
            body,
            headers,
        };

        if status_code >= 400 {
            let error = ApiError::from_response(status_code, &response.body);
            return Err(ClientError::Api {
                error,
                response: Box::new(response),
            });
        }

        Ok(response)
    }

    /// GET `path` with optional query parameters.
    pub async fn get(&self, path: &str, query: Option<Query>) -> Result<Response, ClientError> {
        let mut request = Request::get(path);
        if let Some(query) = query {
            request = request.query(query);
        }
        self.execute(request).await
    }

    /// POST a JSON body to `path`.
    pub async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Response, ClientError> {
        self.execute(Request::post(path).json(body)?).await
    }

    /// PUT a JSON body to `path`.
    pub async fn put<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Response, ClientError> {
        self.execute(Request::put(path).json(body)?).await
    }

    /// DELETE `path`.
    pub async fn delete(&self, path: &str) -> Result<Response, ClientError> {
        self.execute(Request::delete(path)).await
    }
}

/// Decodes a response body as JSON.
///
/// The status code is not inspected; [`BitbucketClient::execute`] has already
/// turned error statuses into [`ClientError::Api`].
///
/// # Errors
///
/// Returns [`ClientError::Decode`] if the body is not valid JSON for `T`.
pub fn parse_response<T: DeserializeOwned>(response: &Response) -> Result<T, ClientError> {
    serde_json::from_slice(&response.body).map_err(ClientError::Decode)
}

fn normalize_base_url(url: &str) -> String {
    url.strip_suffix('/').unwrap_or(url).to_string()
}

fn is_absolute_url(path: &str) -> bool {
    url::Url::parse(path).is_ok()
}
