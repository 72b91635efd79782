//
//  bb-cloud
//  context/resolver.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Repository Context Resolver
//!
//! Parses repository arguments and fills in the workspace when only part of
//! the target was given.
//!
//! ## Supported Formats
//!
//! - Shorthand: `workspace/repo`
//! - SSH: `git@bitbucket.org:workspace/repo.git`
//! - SSH URL: `ssh://git@bitbucket.org/workspace/repo.git`
//! - HTTPS: `https://user@bitbucket.org/workspace/repo.git`
//!
//! A bare `repo` is accepted when a workspace is known from `--workspace` or
//! `default_workspace`.

use std::str::FromStr;

use anyhow::{bail, Result};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::RepoRef;
use crate::config::{Config, BITBUCKET_CLOUD};

static SHORTHAND_PATTERN: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^([\w.-]+)/([\w.-]+?)(?:\.git)?$").ok());

static SSH_PATTERN: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^[\w.-]+@([^:/]+):([\w.-]+)/([\w.-]+?)(?:\.git)?/?$").ok());

static SSH_URL_PATTERN: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"^ssh://(?:[\w.-]+@)?([^:/]+)(?::\d+)?/([\w.-]+)/([\w.-]+?)(?:\.git)?/?$").ok()
});

static HTTPS_PATTERN: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"^https?://(?:[^@/]+@)?([^/]+)/([\w.-]+)/([\w.-]+?)(?:\.git)?/?$").ok()
});

fn captures<'a>(pattern: &'a Lazy<Option<Regex>>, input: &'a str) -> Option<Captures<'a>> {
    pattern.as_ref().and_then(|re| re.captures(input))
}

impl RepoRef {
    /// Parses `workspace/repo` or a Bitbucket clone URL.
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();

        if let Some(caps) = captures(&SHORTHAND_PATTERN, input) {
            return Ok(RepoRef::new(&caps[1], &caps[2]));
        }

        for pattern in [&SSH_PATTERN, &SSH_URL_PATTERN, &HTTPS_PATTERN] {
            if let Some(caps) = captures(pattern, input) {
                return Ok(RepoRef {
                    host: caps[1].to_lowercase(),
                    workspace: caps[2].to_string(),
                    repo_slug: caps[3].to_string(),
                });
            }
        }

        bail!(
            "Invalid repository '{}'. Expected WORKSPACE/REPO or a Bitbucket clone URL",
            input
        )
    }

    pub fn is_cloud(&self) -> bool {
        self.host == BITBUCKET_CLOUD
    }
}

impl FromStr for RepoRef {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        RepoRef::parse(s)
    }
}

/// Resolves repository and workspace targets from CLI flags and config.
#[derive(Debug, Clone, Default)]
pub struct ContextResolver {
    default_workspace: Option<String>,
}

impl ContextResolver {
    pub fn new(config: &Config) -> Self {
        Self {
            default_workspace: config.default_workspace.clone(),
        }
    }

    /// Resolves the target repository.
    ///
    /// Priority: a full `--repo`, then a bare `--repo` slug in the
    /// `--workspace` or default workspace.
    pub fn resolve_repo(&self, repo: Option<&str>, workspace: Option<&str>) -> Result<RepoRef> {
        let Some(repo) = repo.map(str::trim).filter(|r| !r.is_empty()) else {
            bail!("Could not determine repository. Use --repo WORKSPACE/REPO or set BB_REPO");
        };

        if repo.contains('/') || repo.contains(':') {
            let parsed = RepoRef::parse(repo)?;
            if !parsed.is_cloud() {
                bail!("{} is not a Bitbucket Cloud repository", repo);
            }
            tracing::debug!("Resolved repository {}", parsed);
            return Ok(parsed);
        }

        match self.pick_workspace(workspace) {
            Some(ws) => Ok(RepoRef::new(ws, repo)),
            None => bail!(
                "Repository '{}' has no workspace. Use --repo WORKSPACE/REPO or --workspace",
                repo
            ),
        }
    }

    /// Resolves the target workspace.
    ///
    /// Priority: `--workspace`, then the workspace of `--repo`, then the
    /// default workspace.
    pub fn resolve_workspace(&self, workspace: Option<&str>, repo: Option<&str>) -> Result<String> {
        if let Some(ws) = workspace.map(str::trim).filter(|w| !w.is_empty()) {
            return Ok(ws.to_string());
        }

        if let Some(parsed) = repo
            .filter(|r| r.contains('/'))
            .and_then(|r| RepoRef::parse(r).ok())
        {
            return Ok(parsed.workspace);
        }

        match self.pick_workspace(None) {
            Some(ws) => Ok(ws.to_string()),
            None => bail!(
                "Could not determine workspace. Use --workspace, set BB_WORKSPACE, or run `bb config set default_workspace <name>`"
            ),
        }
    }

    fn pick_workspace<'a>(&'a self, workspace: Option<&'a str>) -> Option<&'a str> {
        workspace
            .map(str::trim)
            .filter(|w| !w.is_empty())
            .or(self.default_workspace.as_deref().filter(|w| !w.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver_with_default(ws: &str) -> ContextResolver {
        let mut config = Config::default();
        config.default_workspace = Some(ws.to_string());
        ContextResolver::new(&config)
    }

    #[test]
    fn test_parse_shorthand() {
        let repo = RepoRef::parse("acme/widgets").unwrap();
        assert_eq!(repo.host, "bitbucket.org");
        assert_eq!(repo.workspace, "acme");
        assert_eq!(repo.repo_slug, "widgets");
    }

    #[test]
    fn test_parse_ssh() {
        let repo = RepoRef::parse("git@bitbucket.org:acme/widgets.git").unwrap();
        assert_eq!(repo, RepoRef::new("acme", "widgets"));

        let repo = RepoRef::parse("ssh://git@bitbucket.org/acme/widgets.git").unwrap();
        assert_eq!(repo, RepoRef::new("acme", "widgets"));
    }

    #[test]
    fn test_parse_https() {
        let repo = RepoRef::parse("https://jdoe@bitbucket.org/acme/my.repo.git").unwrap();
        assert_eq!(repo.workspace, "acme");
        assert_eq!(repo.repo_slug, "my.repo");

        let repo = RepoRef::parse("https://bitbucket.org/acme/widgets/").unwrap();
        assert_eq!(repo.repo_slug, "widgets");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(RepoRef::parse("widgets").is_err());
        assert!(RepoRef::parse("a/b/c").is_err());
        assert!(RepoRef::parse("").is_err());
    }

    #[test]
    fn test_resolve_repo_bare_slug_uses_workspace() {
        let resolver = resolver_with_default("acme");
        assert_eq!(
            resolver.resolve_repo(Some("widgets"), None).unwrap(),
            RepoRef::new("acme", "widgets")
        );
        assert_eq!(
            resolver.resolve_repo(Some("widgets"), Some("other")).unwrap(),
            RepoRef::new("other", "widgets")
        );
        assert!(ContextResolver::default().resolve_repo(Some("widgets"), None).is_err());
        assert!(resolver.resolve_repo(None, None).is_err());
    }

    #[test]
    fn test_resolve_repo_rejects_other_hosts() {
        let resolver = ContextResolver::default();
        assert!(resolver
            .resolve_repo(Some("git@github.com:acme/widgets.git"), None)
            .is_err());
    }

    #[test]
    fn test_resolve_workspace_priority() {
        let resolver = resolver_with_default("fallback");
        assert_eq!(
            resolver.resolve_workspace(Some("flag"), Some("repo-ws/widgets")).unwrap(),
            "flag"
        );
        assert_eq!(
            resolver.resolve_workspace(None, Some("repo-ws/widgets")).unwrap(),
            "repo-ws"
        );
        assert_eq!(resolver.resolve_workspace(None, None).unwrap(), "fallback");
        assert!(ContextResolver::default().resolve_workspace(None, None).is_err());
    }
}
