use async_trait::async_trait;
use chrono::{DateTime, Utc};
use octocrab::Octocrab;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

use super::types::{CompareResponse, GitCommit, PageParams, RawCommit, RepoInfo, TagRef};
use super::CommitSource;
use crate::error::{ChangelogError, Result};

/// GitHub caps list endpoints at 100 items per page.
pub const PER_PAGE: u8 = 100;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub struct GitHubClient {
    client: Octocrab,
    timeout: Duration,
}

impl GitHubClient {
    /// Client against api.github.com. An empty or missing token means
    /// unauthenticated access.
    pub fn new(token: Option<String>) -> Result<Self> {
        Self::with_options(token, None, DEFAULT_TIMEOUT)
    }

    pub fn with_options(
        token: Option<String>,
        api_url: Option<&str>,
        timeout: Duration,
    ) -> Result<Self> {
        let mut builder = Octocrab::builder();
        if let Some(api_url) = api_url {
            builder = builder
                .base_uri(api_url)
                .map_err(|e| ChangelogError::Upstream(e.to_string()))?;
        }
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            builder = builder.personal_token(token);
        }
        let client = builder
            .build()
            .map_err(|e| ChangelogError::Upstream(e.to_string()))?;

        Ok(Self { client, timeout })
    }

    async fn get<R, P>(&self, route: &str, params: Option<&P>, what: &str) -> Result<R>
    where
        R: DeserializeOwned,
        P: Serialize + Sync + ?Sized,
    {
        debug!("GET {}", route);
        match tokio::time::timeout(self.timeout, self.client.get::<R, _, _>(route, params)).await {
            Ok(Ok(data)) => Ok(data),
            Ok(Err(e)) => Err(map_error(e, what)),
            Err(_) => Err(ChangelogError::Timeout(self.timeout)),
        }
    }

    /// Fetch pages of `PER_PAGE` until a short page comes back.
    async fn paginate<T>(&self, route: &str, sha: Option<&str>, what: &str) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let mut items = Vec::new();
        let mut page = 1;
        loop {
            let params = PageParams {
                sha,
                per_page: PER_PAGE,
                page,
            };
            let batch: Vec<T> = self.get(route, Some(&params), what).await?;
            let len = batch.len();
            items.extend(batch);
            if len < PER_PAGE as usize {
                break;
            }
            page += 1;
        }
        Ok(items)
    }
}

fn map_error(err: octocrab::Error, what: &str) -> ChangelogError {
    match err {
        octocrab::Error::GitHub { source, .. } if source.message.contains("Not Found") => {
            ChangelogError::NotFound(what.to_string())
        }
        octocrab::Error::GitHub { source, .. } => ChangelogError::Upstream(source.message),
        e => ChangelogError::Upstream(e.to_string()),
    }
}

#[async_trait]
impl CommitSource for GitHubClient {
    async fn get_repository(&self, owner: &str, repo: &str) -> Result<RepoInfo> {
        let route = format!("/repos/{}/{}", owner, repo);
        self.get(&route, None::<&()>, &format!("repository {}/{}", owner, repo))
            .await
    }

    async fn list_tags(&self, owner: &str, repo: &str) -> Result<Vec<TagRef>> {
        let route = format!("/repos/{}/{}/tags", owner, repo);
        let tags: Vec<TagRef> = self
            .paginate(&route, None, &format!("tags of {}/{}", owner, repo))
            .await?;
        debug!("{}/{}: {} tags", owner, repo, tags.len());
        Ok(tags)
    }

    async fn get_commit_date(&self, owner: &str, repo: &str, sha: &str) -> Result<DateTime<Utc>> {
        let route = format!("/repos/{}/{}/git/commits/{}", owner, repo, sha);
        let commit: GitCommit = self
            .get(&route, None::<&()>, &format!("commit {} in {}/{}", sha, owner, repo))
            .await?;
        Ok(commit.committer.date)
    }

    async fn list_commits(&self, owner: &str, repo: &str, reference: &str) -> Result<Vec<RawCommit>> {
        let route = format!("/repos/{}/{}/commits", owner, repo);
        let commits: Vec<RawCommit> = self
            .paginate(
                &route,
                Some(reference),
                &format!("ref {} in {}/{}", reference, owner, repo),
            )
            .await?;
        debug!("{}/{}@{}: {} commits", owner, repo, reference, commits.len());
        Ok(commits)
    }

    async fn compare_commits(
        &self,
        owner: &str,
        repo: &str,
        base: &str,
        head: &str,
    ) -> Result<Vec<RawCommit>> {
        let route = format!("/repos/{}/{}/compare/{}...{}", owner, repo, base, head);
        let what = format!("comparison {}...{} in {}/{}", base, head, owner, repo);

        let mut commits = Vec::new();
        let mut page = 1;
        loop {
            let params = PageParams {
                sha: None,
                per_page: PER_PAGE,
                page,
            };
            let response: CompareResponse = self.get(&route, Some(&params), &what).await?;
            let len = response.commits.len();
            commits.extend(response.commits);
            if len < PER_PAGE as usize {
                break;
            }
            page += 1;
        }

        commits.reverse();
        debug!("{}/{} {}...{}: {} commits", owner, repo, base, head, commits.len());
        Ok(commits)
    }
}
