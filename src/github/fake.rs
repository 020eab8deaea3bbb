//! In-memory `CommitSource` for unit tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

use super::types::{CommitPayload, CommitRef, GitHubUser, RawCommit, RepoInfo, TagRef};
use super::CommitSource;
use crate::error::{ChangelogError, Result};

pub(crate) struct FakeSource {
    default_branch: String,
    tags: Vec<TagRef>,
    dates: HashMap<String, DateTime<Utc>>,
    history: Vec<RawCommit>,
    compared: Vec<RawCommit>,
    missing_repo: bool,
    calls: Mutex<HashMap<&'static str, usize>>,
}

impl FakeSource {
    pub fn new(default_branch: &str) -> Self {
        Self {
            default_branch: default_branch.to_string(),
            tags: Vec::new(),
            dates: HashMap::new(),
            history: Vec::new(),
            compared: Vec::new(),
            missing_repo: false,
            calls: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_tag(mut self, name: &str, sha: &str, date: &str) -> Self {
        self.tags.push(TagRef {
            name: name.to_string(),
            commit: CommitRef {
                sha: sha.to_string(),
            },
        });
        self.dates.insert(
            sha.to_string(),
            date.parse().expect("RFC 3339 date in test fixture"),
        );
        self
    }

    pub fn with_history(mut self, commits: Vec<RawCommit>) -> Self {
        self.history = commits;
        self
    }

    pub fn with_compare(mut self, commits: Vec<RawCommit>) -> Self {
        self.compared = commits;
        self
    }

    pub fn missing(mut self) -> Self {
        self.missing_repo = true;
        self
    }

    pub fn calls(&self, operation: &str) -> usize {
        self.calls.lock().unwrap().get(operation).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }

    fn record(&self, operation: &'static str) {
        *self.calls.lock().unwrap().entry(operation).or_insert(0) += 1;
    }
}

pub(crate) fn raw_commit(sha: &str, message: &str, author: Option<&str>) -> RawCommit {
    RawCommit {
        sha: sha.to_string(),
        html_url: format!("https://github.com/x/y/commit/{}", sha),
        commit: CommitPayload {
            message: message.to_string(),
        },
        author: author.map(|login| GitHubUser {
            login: login.to_string(),
            html_url: format!("https://github.com/{}", login),
        }),
    }
}

#[async_trait]
impl CommitSource for FakeSource {
    async fn get_repository(&self, owner: &str, repo: &str) -> Result<RepoInfo> {
        self.record("get_repository");
        if self.missing_repo {
            return Err(ChangelogError::NotFound(format!("repository {}/{}", owner, repo)));
        }
        Ok(RepoInfo {
            default_branch: self.default_branch.clone(),
        })
    }

    async fn list_tags(&self, _owner: &str, _repo: &str) -> Result<Vec<TagRef>> {
        self.record("list_tags");
        Ok(self.tags.clone())
    }

    async fn get_commit_date(&self, _owner: &str, _repo: &str, sha: &str) -> Result<DateTime<Utc>> {
        self.record("get_commit_date");
        self.dates
            .get(sha)
            .copied()
            .ok_or_else(|| ChangelogError::NotFound(format!("commit {}", sha)))
    }

    async fn list_commits(&self, _owner: &str, _repo: &str, _reference: &str) -> Result<Vec<RawCommit>> {
        self.record("list_commits");
        Ok(self.history.clone())
    }

    async fn compare_commits(
        &self,
        _owner: &str,
        _repo: &str,
        _base: &str,
        _head: &str,
    ) -> Result<Vec<RawCommit>> {
        self.record("compare_commits");
        Ok(self.compared.clone())
    }
}
