use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ChangelogError, Result};
use crate::github::types::TagRef;
use crate::github::CommitSource;

/// Only the first page of tags is ranked.
pub const MAX_RANKED_TAGS: usize = 100;

/// Tag commit-date lookups in flight at once.
const DATE_LOOKUP_CONCURRENCY: usize = 8;

/// Head (`latest`) and base (`previous`) of the compared range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagPair {
    pub latest: String,
    pub previous: String,
}

pub struct RangeResolver<'a, S> {
    source: &'a S,
}

impl<'a, S: CommitSource> RangeResolver<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self { source }
    }

    /// Resolve the range to compare. `latest` is the default branch and
    /// `previous` the most recently committed tag; explicit references win.
    /// An untagged repository yields an empty `previous`, meaning the whole
    /// history of `latest`.
    pub async fn resolve(
        &self,
        owner: &str,
        repo: &str,
        explicit_from: Option<&str>,
        explicit_to: Option<&str>,
    ) -> Result<TagPair> {
        let latest = match explicit_to {
            Some(to) => to.to_string(),
            None => self.source.get_repository(owner, repo).await?.default_branch,
        };

        let previous = match explicit_from {
            Some(from) => from.to_string(),
            None => {
                let tags = self.source.list_tags(owner, repo).await?;
                self.latest_tag(owner, repo, tags).await?.unwrap_or_else(|| {
                    debug!("{}/{} has no tags, using full history", owner, repo);
                    String::new()
                })
            }
        };

        let pair = TagPair { latest, previous };
        info!("{}/{}: range {}...{}", owner, repo, pair.previous, pair.latest);
        Ok(pair)
    }

    /// Name of the tag whose commit has the newest committer date.
    async fn latest_tag(&self, owner: &str, repo: &str, tags: Vec<TagRef>) -> Result<Option<String>> {
        let dated: Vec<(String, DateTime<Utc>)> = stream::iter(tags.into_iter().take(MAX_RANKED_TAGS))
            .map(|tag| async move {
                let date = self
                    .source
                    .get_commit_date(owner, repo, &tag.commit.sha)
                    .await?;
                Ok::<_, ChangelogError>((tag.name, date))
            })
            .buffered(DATE_LOOKUP_CONCURRENCY)
            .try_collect()
            .await?;

        Ok(newest(dated))
    }
}

/// Newest entry; on equal dates the earliest in input order wins.
fn newest(dated: Vec<(String, DateTime<Utc>)>) -> Option<String> {
    let mut best: Option<(String, DateTime<Utc>)> = None;
    for (name, date) in dated {
        match &best {
            Some((_, best_date)) if date <= *best_date => {}
            _ => best = Some((name, date)),
        }
    }
    best.map(|(name, _)| name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::fake::FakeSource;

    #[tokio::test]
    async fn test_picks_most_recently_committed_tag() {
        let source = FakeSource::new("main")
            .with_tag("v1", "sha1", "2024-01-01T00:00:00Z")
            .with_tag("v2", "sha2", "2024-03-01T00:00:00Z");

        let pair = RangeResolver::new(&source)
            .resolve("x", "y", None, None)
            .await
            .unwrap();

        assert_eq!(
            pair,
            TagPair {
                latest: "main".into(),
                previous: "v2".into()
            }
        );
    }

    #[tokio::test]
    async fn test_listing_order_does_not_matter() {
        let source = FakeSource::new("main")
            .with_tag("v0.3", "c", "2023-06-01T00:00:00Z")
            .with_tag("v0.9", "a", "2024-06-01T00:00:00Z")
            .with_tag("v0.5", "b", "2023-12-01T00:00:00Z");

        let pair = RangeResolver::new(&source)
            .resolve("x", "y", None, None)
            .await
            .unwrap();
        assert_eq!(pair.previous, "v0.9");
        assert_eq!(source.calls("get_commit_date"), 3);
    }

    #[tokio::test]
    async fn test_equal_dates_first_listed_wins() {
        let source = FakeSource::new("main")
            .with_tag("v1.0.0", "a", "2024-02-02T10:00:00Z")
            .with_tag("release-1.0.0", "b", "2024-02-02T10:00:00Z")
            .with_tag("v0.9.0", "c", "2024-01-01T00:00:00Z");

        let pair = RangeResolver::new(&source)
            .resolve("x", "y", None, None)
            .await
            .unwrap();
        assert_eq!(pair.previous, "v1.0.0");
    }

    #[tokio::test]
    async fn test_no_tags_means_full_history() {
        let source = FakeSource::new("develop");

        let pair = RangeResolver::new(&source)
            .resolve("x", "y", None, None)
            .await
            .unwrap();
        assert_eq!(pair.latest, "develop");
        assert_eq!(pair.previous, "");
    }

    #[tokio::test]
    async fn test_explicit_pair_skips_network() {
        let source = FakeSource::new("main").with_tag("v1", "a", "2024-01-01T00:00:00Z");

        let pair = RangeResolver::new(&source)
            .resolve("x", "y", Some("v0.1"), Some("v0.2"))
            .await
            .unwrap();
        assert_eq!(pair.previous, "v0.1");
        assert_eq!(pair.latest, "v0.2");
        assert_eq!(source.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_explicit_from_skips_tag_ranking() {
        let source = FakeSource::new("main").with_tag("v1", "a", "2024-01-01T00:00:00Z");

        let pair = RangeResolver::new(&source)
            .resolve("x", "y", Some("v0.1"), None)
            .await
            .unwrap();
        assert_eq!(pair.previous, "v0.1");
        assert_eq!(pair.latest, "main");
        assert_eq!(source.calls("get_repository"), 1);
        assert_eq!(source.calls("list_tags"), 0);
        assert_eq!(source.calls("get_commit_date"), 0);
    }

    #[tokio::test]
    async fn test_explicit_to_skips_default_branch_lookup() {
        let source = FakeSource::new("main").with_tag("v1", "a", "2024-01-01T00:00:00Z");

        let pair = RangeResolver::new(&source)
            .resolve("x", "y", None, Some("release"))
            .await
            .unwrap();
        assert_eq!(pair.previous, "v1");
        assert_eq!(pair.latest, "release");
        assert_eq!(source.calls("get_repository"), 0);
    }

    #[tokio::test]
    async fn test_missing_repository_is_not_found() {
        let source = FakeSource::new("main").missing();
        let err = RangeResolver::new(&source)
            .resolve("x", "y", None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ChangelogError::NotFound(_)));
    }

    #[test]
    fn test_newest_tie_break() {
        let d = |s: &str| s.parse::<DateTime<Utc>>().unwrap();
        let ranked = newest(vec![
            ("a".into(), d("2024-01-01T00:00:00Z")),
            ("b".into(), d("2024-05-01T00:00:00Z")),
            ("c".into(), d("2024-05-01T00:00:00Z")),
        ]);
        assert_eq!(ranked.as_deref(), Some("b"));
        assert_eq!(newest(Vec::new()), None);
    }
}
