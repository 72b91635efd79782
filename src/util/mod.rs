//
//  bb-cloud
//  util/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Utility Module
//!
//! Small formatting helpers shared by the command implementations.
//!
//! ## Categories
//!
//! - **Time Utilities**: [`time_ago`], [`time_ago_from_str`], [`format_duration`]
//! - **Display Utilities**: [`user_display_name`], [`truncate`], [`short_hash`]
//! - **Identifiers**: [`parse_pipeline_identifier`]
//!
//! ## Example
//!
//! ```rust
//! use bb_cloud::util::{format_duration, parse_pipeline_identifier};
//!
//! assert_eq!(format_duration(3723), "1h 2m 3s");
//! assert_eq!(parse_pipeline_identifier("0f4c-11aa"), "{0f4c-11aa}");
//! ```

use chrono::{DateTime, Utc};

use crate::api::common::User;

/// Formats a timestamp as a relative time string such as "3 hours ago".
pub fn time_ago(t: DateTime<Utc>) -> String {
    time_ago_since(t, Utc::now())
}

/// Formats `t` relative to `now`.
///
/// # Notes
///
/// - Returns "just now" for anything under a minute, including future times.
/// - Months are 30 days and years are 365 days.
pub fn time_ago_since(t: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - t).num_seconds();

    let (count, unit) = match secs {
        s if s < 60 => return "just now".to_string(),
        s if s < 3_600 => (s / 60, "minute"),
        s if s < 86_400 => (s / 3_600, "hour"),
        s if s < 30 * 86_400 => (s / 86_400, "day"),
        s if s < 365 * 86_400 => (s / (30 * 86_400), "month"),
        s => (s / (365 * 86_400), "year"),
    };

    format!("{} {}{} ago", count, unit, if count == 1 { "" } else { "s" })
}

/// Parses an RFC 3339 timestamp and formats it with [`time_ago`].
///
/// Returns `-` for an empty string and the input unchanged if it does not parse.
pub fn time_ago_from_str(timestamp: &str) -> String {
    if timestamp.is_empty() {
        return "-".to_string();
    }

    match DateTime::parse_from_rfc3339(timestamp) {
        Ok(t) => time_ago(t.with_timezone(&Utc)),
        Err(_) => timestamp.to_string(),
    }
}

/// Same as [`time_ago_from_str`] for optional API fields.
pub fn time_ago_opt(timestamp: Option<&str>) -> String {
    time_ago_from_str(timestamp.unwrap_or_default())
}

/// Formats a number of seconds as `1h 2m 3s`, `2m 5s` or `45s`.
///
/// Returns `-` for zero or negative values.
pub fn format_duration(seconds: i64) -> String {
    if seconds <= 0 {
        return "-".to_string();
    }

    let hours = seconds / 3_600;
    let minutes = (seconds % 3_600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, secs)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}

/// Returns the best available name for a user.
///
/// `-` when there is no user, then the display name, nickname and username in
/// that order, falling back to `unknown`.
pub fn user_display_name(user: Option<&User>) -> String {
    let Some(user) = user else {
        return "-".to_string();
    };

    if !user.display_name.is_empty() {
        return user.display_name.clone();
    }

    [&user.nickname, &user.username]
        .into_iter()
        .find_map(|v| v.as_deref().filter(|s| !s.is_empty()))
        .unwrap_or("unknown")
        .to_string()
}

/// Normalizes a pipeline identifier for use in a request path.
///
/// Build numbers are kept as-is. Anything else is treated as a UUID and
/// wrapped in braces, which Bitbucket requires.
pub fn parse_pipeline_identifier(identifier: &str) -> String {
    let identifier = identifier.trim();
    if identifier.parse::<u64>().is_ok() {
        return identifier.to_string();
    }

    let uuid = identifier.trim_start_matches('{').trim_end_matches('}');
    format!("{{{}}}", uuid)
}

/// Returns the first seven characters of a commit hash.
pub fn short_hash(hash: &str) -> &str {
    hash.get(..7).unwrap_or(hash)
}

/// Truncates a string to `max_len` characters, adding "..." if it was cut.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }

    if max_len > 3 {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    } else {
        s.chars().take(max_len).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_time_ago_buckets() {
        let now = Utc::now();
        assert_eq!(time_ago_since(now - Duration::seconds(10), now), "just now");
        assert_eq!(time_ago_since(now - Duration::minutes(1), now), "1 minute ago");
        assert_eq!(time_ago_since(now - Duration::minutes(5), now), "5 minutes ago");
        assert_eq!(time_ago_since(now - Duration::hours(3), now), "3 hours ago");
        assert_eq!(time_ago_since(now - Duration::days(1), now), "1 day ago");
        assert_eq!(time_ago_since(now - Duration::days(65), now), "2 months ago");
        assert_eq!(time_ago_since(now - Duration::days(800), now), "2 years ago");
    }

    #[test]
    fn test_time_ago_future_is_just_now() {
        let now = Utc::now();
        assert_eq!(time_ago_since(now + Duration::hours(1), now), "just now");
    }

    #[test]
    fn test_time_ago_from_str() {
        assert_eq!(time_ago_from_str(""), "-");
        assert_eq!(time_ago_from_str("not a date"), "not a date");
        assert!(time_ago_from_str("2001-02-03T04:05:06.123456+00:00").ends_with("years ago"));
        assert_eq!(time_ago_opt(None), "-");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "-");
        assert_eq!(format_duration(-5), "-");
        assert_eq!(format_duration(45), "45s");
        assert_eq!(format_duration(125), "2m 5s");
        assert_eq!(format_duration(3723), "1h 2m 3s");
    }

    #[test]
    fn test_user_display_name() {
        assert_eq!(user_display_name(None), "-");

        let user = User {
            display_name: "Jane Doe".to_string(),
            nickname: Some("jane".to_string()),
            ..Default::default()
        };
        assert_eq!(user_display_name(Some(&user)), "Jane Doe");

        let user = User {
            nickname: Some("jane".to_string()),
            username: Some("jdoe".to_string()),
            ..Default::default()
        };
        assert_eq!(user_display_name(Some(&user)), "jane");

        assert_eq!(user_display_name(Some(&User::default())), "unknown");
    }

    #[test]
    fn test_parse_pipeline_identifier() {
        assert_eq!(parse_pipeline_identifier("42"), "42");
        assert_eq!(parse_pipeline_identifier("abc-123"), "{abc-123}");
        assert_eq!(parse_pipeline_identifier("{abc-123}"), "{abc-123}");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 8), "hello...");
        assert_eq!(truncate("héllo wörld", 8), "héllo...");
        assert_eq!(truncate("short", 3), "sho");
    }

    #[test]
    fn test_short_hash() {
        assert_eq!(short_hash("0123456789abcdef"), "0123456");
        assert_eq!(short_hash("abc"), "abc");
    }
}
