use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use super::commit_parser::CommitParser;
use super::range_resolver::{RangeResolver, TagPair};
use super::renderer::ChangelogRenderer;
use crate::config::{ChangelogOptions, GithubConfig};
use crate::error::Result;
use crate::github::cache::{CachedSource, ResponseCache};
use crate::github::client::GitHubClient;
use crate::github::{parse_github_url, CommitSource, RepoRef};

pub const NO_CHANGES: &str = "No changes found between these versions.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedChangelog {
    pub changelog: String,
    pub from_tag: String,
    pub to_tag: String,
}

/// Fetches, classifies and renders a changelog. Every API response and every
/// finished changelog is cached for the lifetime of the generator.
pub struct ChangelogGenerator<S = GitHubClient> {
    source: CachedSource<S>,
    cache: Arc<ResponseCache>,
}

impl ChangelogGenerator<GitHubClient> {
    pub fn new(token: Option<String>) -> Result<Self> {
        Ok(Self::with_source(GitHubClient::new(token)?))
    }

    pub fn from_config(token: Option<String>, config: &GithubConfig) -> Result<Self> {
        let client = GitHubClient::with_options(
            token,
            config.api_url.as_deref(),
            Duration::from_secs(config.request_timeout_secs),
        )?;
        Ok(Self::with_source(client))
    }
}

impl<S: CommitSource> ChangelogGenerator<S> {
    pub fn with_source(source: S) -> Self {
        Self::with_cache(source, Arc::new(ResponseCache::new()))
    }

    pub fn with_cache(source: S, cache: Arc<ResponseCache>) -> Self {
        Self {
            source: CachedSource::new(source, cache.clone()),
            cache,
        }
    }

    pub fn source(&self) -> &S {
        self.source.inner()
    }

    /// The (base, head) pair `generate` would use for these options.
    pub async fn resolve_range(&self, options: &ChangelogOptions) -> Result<TagPair> {
        let repo = parse_github_url(&options.github_url)?;
        self.resolve(&repo, options).await
    }

    pub async fn generate(&self, options: &ChangelogOptions) -> Result<GeneratedChangelog> {
        let key = ResponseCache::key("generate", options)?;
        self.cache
            .memoize(&key, || self.generate_uncached(options))
            .await
    }

    async fn resolve(&self, repo: &RepoRef, options: &ChangelogOptions) -> Result<TagPair> {
        RangeResolver::new(&self.source)
            .resolve(
                &repo.owner,
                &repo.repo,
                options.from_tag.as_deref(),
                options.to_tag.as_deref(),
            )
            .await
    }

    async fn generate_uncached(&self, options: &ChangelogOptions) -> Result<GeneratedChangelog> {
        let repo = parse_github_url(&options.github_url)?;
        let tags = self.resolve(&repo, options).await?;

        // An empty base (untagged repository or explicit empty fromTag) means
        // the whole history of head.
        let commits = if tags.previous.is_empty() {
            self.source
                .list_commits(&repo.owner, &repo.repo, &tags.latest)
                .await?
        } else {
            self.source
                .compare_commits(&repo.owner, &repo.repo, &tags.previous, &tags.latest)
                .await?
        };

        info!(
            "{}/{}: {} commits in {}...{}",
            repo.owner,
            repo.repo,
            commits.len(),
            tags.previous,
            tags.latest
        );

        if commits.is_empty() {
            return Ok(GeneratedChangelog {
                changelog: NO_CHANGES.to_string(),
                from_tag: tags.previous,
                to_tag: tags.latest,
            });
        }

        let mut parsed = CommitParser::parse_commits(&commits);
        if !options.include_invalid_commits {
            parsed = CommitParser::retain_conventional(parsed);
        }

        Ok(GeneratedChangelog {
            changelog: ChangelogRenderer::render(&parsed, &tags, options),
            from_tag: tags.previous,
            to_tag: tags.latest,
        })
    }
}
