//! GitHub access: the `CommitSource` seam, its `octocrab` implementation and
//! the caching decorator that wraps it.

pub mod cache;
pub mod client;
pub mod types;

#[cfg(test)]
pub(crate) mod fake;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use regex::Regex;
use std::sync::LazyLock;

use crate::error::{ChangelogError, Result};
use types::{RawCommit, RepoInfo, TagRef};

static GITHUB_URL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"github\.com/([^/]+)/([^/]+)").expect("Invalid regex"));

/// Owner/name pair identifying a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
}

impl RepoRef {
    pub fn html_url(&self) -> String {
        format!("https://github.com/{}/{}", self.owner, self.repo)
    }
}

/// Extract owner and repository from a `https://github.com/<owner>/<repo>[.git]` URL.
pub fn parse_github_url(url: &str) -> Result<RepoRef> {
    let caps = GITHUB_URL_REGEX
        .captures(url.trim())
        .ok_or_else(|| ChangelogError::InvalidUrl(url.to_string()))?;

    let owner = caps[1].to_string();
    let repo = caps[2].trim_end_matches(".git").to_string();
    if repo.is_empty() {
        return Err(ChangelogError::InvalidUrl(url.to_string()));
    }

    Ok(RepoRef { owner, repo })
}

/// Read-only view of a repository's refs and history.
#[async_trait]
pub trait CommitSource: Send + Sync {
    async fn get_repository(&self, owner: &str, repo: &str) -> Result<RepoInfo>;

    async fn list_tags(&self, owner: &str, repo: &str) -> Result<Vec<TagRef>>;

    /// Committer date of a single commit.
    async fn get_commit_date(&self, owner: &str, repo: &str, sha: &str) -> Result<DateTime<Utc>>;

    /// Full history reachable from `reference`, newest first.
    async fn list_commits(&self, owner: &str, repo: &str, reference: &str) -> Result<Vec<RawCommit>>;

    /// Commits in `base..head`, base exclusive and head inclusive.
    async fn compare_commits(
        &self,
        owner: &str,
        repo: &str,
        base: &str,
        head: &str,
    ) -> Result<Vec<RawCommit>>;
}
