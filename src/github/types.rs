use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Repository metadata, reduced to what range resolution needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoInfo {
    pub default_branch: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRef {
    pub name: String,
    pub commit: CommitRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRef {
    pub sha: String,
}

/// A commit as returned by the list and compare endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCommit {
    pub sha: String,
    pub html_url: String,
    pub commit: CommitPayload,
    #[serde(default)]
    pub author: Option<GitHubUser>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitPayload {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitHubUser {
    pub login: String,
    pub html_url: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CompareResponse {
    #[serde(default)]
    pub commits: Vec<RawCommit>,
}

/// Git commit object (`/git/commits/{sha}`); only the committer date is used.
#[derive(Debug, Deserialize)]
pub(crate) struct GitCommit {
    pub committer: GitActor,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GitActor {
    pub date: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub(crate) struct PageParams<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<&'a str>,
    pub per_page: u8,
    pub page: u32,
}
