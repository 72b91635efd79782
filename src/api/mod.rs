//
//  bb-cloud
//  api/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # API Client Layer
//!
//! This module provides the typed HTTP client for the Bitbucket Cloud REST
//! API v2.0 (`https://api.bitbucket.org/2.0`).
//!
//! ## Architecture
//!
//! - [`client`]: Core HTTP client with authentication and request handling
//! - [`cloud`]: Resource accessors (issues, pipelines, pull requests, ...)
//! - [`common`]: Shared types (pagination, errors, user references)
//!
//! ## Usage
//!
//! ```rust,no_run
//! use bb_cloud::api::{BitbucketClient, ClientOption};
//!
//! let client = BitbucketClient::new([
//!     ClientOption::Token("your-token".to_string()),
//! ])
//! .expect("Failed to create client");
//! ```
//!
//! ## Error Handling
//!
//! Calls return [`ClientError`]. A rejected request is
//! [`ClientError::Api`], carrying an [`ApiError`] with the status code,
//! message and the raw response. Transport and decoding failures are separate
//! variants so callers can tell "the server said no" apart from "the server
//! could not be reached".

pub mod client;

pub mod cloud;

pub mod common;

pub use client::{
    parse_response, BitbucketClient, ClientOption, Method, Query, Request, Response,
    DEFAULT_BASE_URL,
};
pub use common::{ApiError, ClientError, Paginated};
