//! Page Metadata Cache
//!
//! Keeps listing results per query scope for a fixed TTL so that repeated
//! listings (and metadata lookups during export) don't hit the remote
//! service every time.
//!
//! An entry is stale once `ttl` has elapsed since it was stored, measured
//! on the injected [`TimeProvider`]. There is no manual invalidation.
//!
//! Failed fetches are never cached. Concurrent misses for the same key may
//! both fetch; the later write wins.

use crate::models::time::{SystemTimeProvider, TimeProvider};
use crate::models::PageProperties;
use crate::services::error::SyncError;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

struct CacheEntry {
    pages: Vec<PageProperties>,
    stored_at: DateTime<Utc>,
}

/// Snapshot of cache occupancy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub fresh_entries: usize,
}

/// TTL cache of page listings keyed by scope signature
pub struct MetadataCache {
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
    clock: Arc<dyn TimeProvider>,
    ttl: Duration,
}

impl MetadataCache {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemTimeProvider))
    }

    /// Cache reading time from `clock` (tests pass a manual clock)
    pub fn with_clock(ttl: Duration, clock: Arc<dyn TimeProvider>) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            clock,
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn is_fresh(&self, entry: &CacheEntry, now: DateTime<Utc>) -> bool {
        // A clock that went backwards counts as no time elapsed
        let elapsed = (now - entry.stored_at).to_std().unwrap_or(Duration::ZERO);
        elapsed < self.ttl
    }

    /// Fresh cached listing for `key`, if any
    pub async fn get(&self, key: &str) -> Option<Vec<PageProperties>> {
        let now = self.clock.now();
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|entry| self.is_fresh(entry, now))
            .map(|entry| entry.pages.clone())
    }

    /// Store a listing, dropping any entries that have already expired
    pub async fn insert(&self, key: impl Into<String>, pages: Vec<PageProperties>) {
        let now = self.clock.now();
        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| self.is_fresh(entry, now));
        entries.insert(
            key.into(),
            CacheEntry {
                pages,
                stored_at: now,
            },
        );
    }

    /// Cached listing for `key`, or the result of `fetch` (cached on success)
    pub async fn get_or_fetch<F, Fut>(
        &self,
        key: &str,
        fetch: F,
    ) -> Result<Vec<PageProperties>, SyncError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<PageProperties>, SyncError>>,
    {
        if let Some(pages) = self.get(key).await {
            tracing::debug!("Metadata cache hit for {}", key);
            return Ok(pages);
        }

        tracing::debug!("Metadata cache miss for {}", key);
        let pages = fetch().await?;
        self.insert(key, pages.clone()).await;
        Ok(pages)
    }

    pub async fn stats(&self) -> CacheStats {
        let now = self.clock.now();
        let entries = self.entries.read().await;
        CacheStats {
            entries: entries.len(),
            fresh_entries: entries
                .values()
                .filter(|entry| self.is_fresh(entry, now))
                .count(),
        }
    }
}
