//! Time-bounded response cache.
//!
//! Values are stored as `serde_json::Value` under `"<operation>:<params JSON>"`
//! keys so one cache can hold every response type. Entries older than the TTL
//! are treated as misses and overwritten on the next write; nothing is swept.
//! Only successful results are stored.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::debug;

use super::types::{RawCommit, RepoInfo, TagRef};
use super::CommitSource;
use crate::error::Result;

pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone)]
struct CacheEntry {
    data: serde_json::Value,
    timestamp: Instant,
}

#[derive(Debug)]
pub struct ResponseCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Deterministic key for an operation and its parameters.
    pub fn key<P: Serialize + ?Sized>(operation: &str, params: &P) -> Result<String> {
        Ok(format!("{}:{}", operation, serde_json::to_string(params)?))
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let data = {
            let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
            let entry = entries.get(key)?;
            if entry.timestamp.elapsed() >= self.ttl {
                return None;
            }
            entry.data.clone()
        };
        serde_json::from_value(data).ok()
    }

    pub fn put<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let data = serde_json::to_value(value)?;
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(
            key.to_string(),
            CacheEntry {
                data,
                timestamp: Instant::now(),
            },
        );
        Ok(())
    }

    /// Return the cached value for `key`, or run `producer` and cache its
    /// successful result.
    pub async fn memoize<T, F, Fut>(&self, key: &str, producer: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if let Some(hit) = self.get(key) {
            debug!("cache hit: {}", key);
            return Ok(hit);
        }

        let value = producer().await?;
        self.put(key, &value)?;
        Ok(value)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// `CommitSource` decorator that memoizes every call of the wrapped source.
pub struct CachedSource<S> {
    inner: S,
    cache: Arc<ResponseCache>,
}

impl<S: CommitSource> CachedSource<S> {
    pub fn new(inner: S, cache: Arc<ResponseCache>) -> Self {
        Self { inner, cache }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: CommitSource> CommitSource for CachedSource<S> {
    async fn get_repository(&self, owner: &str, repo: &str) -> Result<RepoInfo> {
        let key = ResponseCache::key("getRepository", &json!({ "owner": owner, "repo": repo }))?;
        self.cache
            .memoize(&key, || self.inner.get_repository(owner, repo))
            .await
    }

    async fn list_tags(&self, owner: &str, repo: &str) -> Result<Vec<TagRef>> {
        let key = ResponseCache::key("listTags", &json!({ "owner": owner, "repo": repo }))?;
        self.cache
            .memoize(&key, || self.inner.list_tags(owner, repo))
            .await
    }

    async fn get_commit_date(&self, owner: &str, repo: &str, sha: &str) -> Result<DateTime<Utc>> {
        let key = ResponseCache::key(
            "getCommit",
            &json!({ "owner": owner, "repo": repo, "commit_sha": sha }),
        )?;
        self.cache
            .memoize(&key, || self.inner.get_commit_date(owner, repo, sha))
            .await
    }

    async fn list_commits(&self, owner: &str, repo: &str, reference: &str) -> Result<Vec<RawCommit>> {
        let key = ResponseCache::key(
            "listCommits",
            &json!({ "owner": owner, "repo": repo, "sha": reference }),
        )?;
        self.cache
            .memoize(&key, || self.inner.list_commits(owner, repo, reference))
            .await
    }

    async fn compare_commits(
        &self,
        owner: &str,
        repo: &str,
        base: &str,
        head: &str,
    ) -> Result<Vec<RawCommit>> {
        let key = ResponseCache::key(
            "compareCommits",
            &json!({ "owner": owner, "repo": repo, "base": base, "head": head }),
        )?;
        self.cache
            .memoize(&key, || self.inner.compare_commits(owner, repo, base, head))
            .await
    }
}
