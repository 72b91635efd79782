//
//  bb-cloud
//  api/common/pagination.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Pagination Types for Bitbucket API Responses
//!
//! Bitbucket Cloud wraps every collection in the same envelope:
//!
//! ```json
//! {"size": 42, "page": 1, "pagelen": 10, "next": "https://...", "previous": null, "values": [...]}
//! ```
//!
//! # Iterating
//!
//! Pagination is driven by the caller. Either follow [`Paginated::next`] by
//! passing the absolute URL back to [`BitbucketClient::get`](crate::api::BitbucketClient::get),
//! or request the next page number explicitly.
//!
//! ```rust,ignore
//! use bb_cloud::api::{parse_response, Paginated};
//!
//! let mut page: Paginated<Repository> = client.list_repositories("acme", &Default::default()).await?;
//! let mut all = std::mem::take(&mut page.values);
//!
//! while let Some(next) = page.next_url() {
//!     let response = client.get(next, None).await?;
//!     page = parse_response(&response)?;
//!     all.append(&mut page.values);
//! }
//! ```
//!
//! # Notes
//!
//! - Counters default to 0 when the server omits them
//! - The `values` field is always present, even if empty

use serde::{Deserialize, Serialize};

use super::null_as_default;

/// One page of a Bitbucket collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Paginated<T> {
    /// Total number of items across all pages (0 when not reported).
    #[serde(default, deserialize_with = "null_as_default")]
    pub size: u32,

    /// 1-based page number (0 when not reported).
    #[serde(default, deserialize_with = "null_as_default")]
    pub page: u32,

    /// Requested page length (0 when not reported).
    #[serde(default, deserialize_with = "null_as_default")]
    pub pagelen: u32,

    /// Absolute URL of the next page, `None` on the last page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,

    /// Absolute URL of the previous page, `None` on the first page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous: Option<String>,

    /// Items on this page, in server order.
    #[serde(default, deserialize_with = "null_as_default")]
    pub values: Vec<T>,
}

impl<T> Paginated<T> {
    /// Returns true if there are more pages.
    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }

    /// Returns the URL of the next page.
    pub fn next_url(&self) -> Option<&str> {
        self.next.as_deref()
    }

    /// Returns true if there is a page before this one.
    pub fn has_previous(&self) -> bool {
        self.previous.is_some()
    }

    /// Returns true if this page carries no items.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<T> Default for Paginated<T> {
    fn default() -> Self {
        Self {
            size: 0,
            page: 0,
            pagelen: 0,
            next: None,
            previous: None,
            values: Vec::new(),
        }
    }
}

impl<T> IntoIterator for Paginated<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_counters_absent() {
        let page: Paginated<u32> = serde_json::from_str(r#"{"values":[1,2,3]}"#).unwrap();

        assert_eq!(page.size, 0);
        assert_eq!(page.page, 0);
        assert_eq!(page.pagelen, 0);
        assert!(!page.has_next());
        assert!(!page.has_previous());
        assert_eq!(page.values, vec![1, 2, 3]);
    }

    #[test]
    fn test_values_default_to_empty() {
        let page: Paginated<String> = serde_json::from_str(r#"{"size":0}"#).unwrap();
        assert!(page.is_empty());
    }

    #[test]
    fn test_null_values_read_as_empty() {
        let page: Paginated<String> =
            serde_json::from_str(r#"{"size":null,"next":null,"values":null}"#).unwrap();

        assert_eq!(page.size, 0);
        assert!(page.is_empty());
        assert!(!page.has_next());
    }

    #[test]
    fn test_next_url() {
        let page: Paginated<String> = serde_json::from_str(
            r#"{"size":3,"page":1,"pagelen":2,"next":"https://api.bitbucket.org/2.0/x?page=2","values":["a","b"]}"#,
        )
        .unwrap();

        assert!(page.has_next());
        assert_eq!(page.next_url(), Some("https://api.bitbucket.org/2.0/x?page=2"));
        assert_eq!(page.into_iter().collect::<Vec<_>>(), vec!["a", "b"]);
    }
}
