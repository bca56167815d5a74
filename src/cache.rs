//! Bounded string memoization for resolved URLs and image lookups.
//!
//! Two independent instances are created at startup and handed to their
//! owners: one keyed by the reference URL a caller asked to resolve, one keyed
//! by the original article URL whose image was looked up. An empty string is a
//! real value ("looked, found nothing") and is cached like any other.
//!
//! The store is backed by [`moka`], which gives a capacity bound, an optional
//! time-to-live and per-key coalescing: concurrent callers of
//! [`MemoCache::get_or_compute`] for the same missing key wait on a single
//! computation instead of each doing the network work.

use crate::config::CacheSettings;
use moka::future::Cache;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// A named, bounded `String -> String` memo table.
///
/// Cloning is cheap and every clone shares the same entries.
#[derive(Clone, Debug)]
pub struct MemoCache {
    name: &'static str,
    inner: Cache<String, String>,
}

impl MemoCache {
    /// Create an empty cache.
    ///
    /// # Arguments
    ///
    /// * `name` - Label used in log lines
    /// * `capacity` - Maximum number of entries before eviction starts
    /// * `ttl` - Optional time-to-live for every entry
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let images = MemoCache::new("article_images", 10_000, None);
    /// images.put("https://www.bbc.com/news/articles/c1", "").await;
    /// assert_eq!(images.get("https://www.bbc.com/news/articles/c1").await, Some(String::new()));
    /// ```
    pub fn new(name: &'static str, capacity: u64, ttl: Option<Duration>) -> Self {
        let mut builder = Cache::builder().name(name).max_capacity(capacity);
        if let Some(ttl) = ttl {
            builder = builder.time_to_live(ttl);
        }
        Self {
            name,
            inner: builder.build(),
        }
    }

    pub fn from_settings(name: &'static str, settings: &CacheSettings) -> Self {
        Self::new(name, settings.capacity, settings.ttl())
    }

    /// Look up `key`. `Some("")` means a lookup already ran and found nothing;
    /// `None` means it has not run yet.
    pub async fn get(&self, key: &str) -> Option<String> {
        let hit = self.inner.get(key).await;
        debug!(cache = self.name, key, hit = hit.is_some(), "Cache lookup");
        hit
    }

    /// Overwrites are harmless: values are deterministic for a key.
    pub async fn put(&self, key: impl Into<String>, value: impl Into<String>) {
        self.inner.insert(key.into(), value.into()).await;
    }

    /// Return the cached value for `key`, or run `compute` once and cache its
    /// result. Concurrent callers for the same key share that one run.
    pub async fn get_or_compute<F>(&self, key: &str, compute: F) -> String
    where
        F: Future<Output = String>,
    {
        self.inner.get_with(key.to_string(), compute).await
    }

    /// Approximate number of live entries.
    pub async fn len(&self) -> u64 {
        self.inner.run_pending_tasks().await;
        self.inner.entry_count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
