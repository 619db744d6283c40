//! Per-query orchestration: freshness rules, enabled gating, observer
//! lifecycle.
//!
//! A [`QueryRunner`] decides, for one logical query, whether to trust the
//! cache, whether to fetch, and what the view should currently display. It
//! holds only a key and a handle to the shared [`QueryCache`] — never a
//! private copy of the data that could diverge.
//!
//! # Freshness rules
//!
//! On construction, on enabling, and on key change (while enabled):
//!
//! - absent entry, or entry that never completed a fetch → fetch now
//!   (status `Pending`);
//! - fresh entry → serve the cached value, no fetch;
//! - stale entry → serve the cached value immediately *and* refetch in the
//!   background. If that refetch fails, the previous value stays visible
//!   with the new error alongside it.
//!
//! There is no automatic retry or backoff; a manual
//! [`refetch()`](QueryRunner::refetch) is the only recovery path.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::cache::{FetchStatus, QueryCache};
use crate::error::{FetchError, RequeryError, Result};
use crate::key::QueryKey;
use crate::telemetry;
use crate::traits::Fetcher;

/// Per-runner tuning: freshness window, retention, and gating.
///
/// ```rust
/// # use requery::QueryOptions;
/// # use std::time::Duration;
/// let options = QueryOptions::new()
///     .stale_time(Duration::from_secs(60))
///     .gc_time(Duration::from_secs(30));
/// ```
#[derive(Debug, Clone)]
pub struct QueryOptions {
    /// How long a fetched value counts as fresh. Default: 60 seconds.
    pub stale_time: Duration,
    /// How long an unobserved entry is retained before it becomes eligible
    /// for eviction. Default: 5 minutes.
    pub gc_time: Duration,
    /// Whether the runner may fetch at all. Default: `true`.
    pub enabled: bool,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            stale_time: Duration::from_secs(60),
            gc_time: Duration::from_secs(300),
            enabled: true,
        }
    }
}

impl QueryOptions {
    /// Create options with the defaults above.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the freshness window.
    pub fn stale_time(mut self, stale_time: Duration) -> Self {
        self.stale_time = stale_time;
        self
    }

    /// Set the post-unobserved retention before eviction.
    pub fn gc_time(mut self, gc_time: Duration) -> Self {
        self.gc_time = gc_time;
        self
    }

    /// Set the `enabled` gate.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// What a view consumer sees for one query at one moment.
///
/// Produced by [`QueryRunner::snapshot()`]; reading it never triggers a
/// fetch. `value` and `error` can be present simultaneously (a failed
/// background refetch keeps the last good value), and the view should be
/// able to render both.
#[derive(Debug, Clone)]
pub struct QuerySnapshot<T> {
    pub value: Option<T>,
    pub status: FetchStatus,
    /// Whether the displayed value is past its freshness window.
    pub is_stale: bool,
    pub error: Option<FetchError>,
    /// When the displayed value was fetched.
    pub last_updated_at: Option<Instant>,
}

/// Orchestrates one logical query against the shared cache.
///
/// Construction registers the runner as an observer of its key (cancelling
/// any pending eviction); dropping it deregisters and, when no observers
/// remain, schedules eviction after `gc_time`.
pub struct QueryRunner<T> {
    cache: QueryCache<T>,
    fetcher: Arc<dyn Fetcher<T>>,
    key: QueryKey,
    options: QueryOptions,
}

impl<T: Clone + Send + 'static> QueryRunner<T> {
    /// Create a runner observing `key`.
    ///
    /// If enabled, the freshness rules are applied immediately, which may
    /// spawn a fetch.
    ///
    /// # Panics
    ///
    /// Requires a tokio runtime context.
    pub fn new(
        cache: QueryCache<T>,
        fetcher: Arc<dyn Fetcher<T>>,
        key: QueryKey,
        options: QueryOptions,
    ) -> Self {
        cache.add_observer(&key);
        let runner = Self {
            cache,
            fetcher,
            key,
            options,
        };
        if runner.options.enabled {
            runner.revalidate();
        }
        runner
    }

    /// The key this runner currently observes.
    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    /// The runner's configuration.
    pub fn options(&self) -> &QueryOptions {
        &self.options
    }

    /// Whether the `enabled` gate is open.
    pub fn is_enabled(&self) -> bool {
        self.options.enabled
    }

    /// Open or close the `enabled` gate.
    ///
    /// Enabling re-applies the freshness rules. Disabling stops all
    /// fetching but leaves the cache entry — including its timestamps —
    /// untouched; a previously cached value stays visible in snapshots.
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.options.enabled == enabled {
            return;
        }
        self.options.enabled = enabled;
        if enabled {
            self.revalidate();
        } else {
            debug!(key = %self.key, "query disabled");
        }
    }

    /// Switch to a new key, migrating observation from the old one.
    ///
    /// The old key's observer count is decremented (scheduling eviction if
    /// it reaches zero); the new key's entry — cold or warm — is then
    /// subject to the usual freshness rules.
    pub fn set_key(&mut self, key: QueryKey) {
        if self.key == key {
            return;
        }
        self.cache.add_observer(&key);
        self.cache.remove_observer(&self.key, self.options.gc_time);
        debug!(old = %self.key, new = %key, "query key changed");
        self.key = key;
        if self.options.enabled {
            self.revalidate();
        }
    }

    /// Force a fetch regardless of freshness and wait for it to settle.
    ///
    /// Follows the dedup rule: if a fetch for this key is already in
    /// flight, this joins it instead of issuing a duplicate. Returns
    /// [`RequeryError::DisabledQuery`] when called on a disabled runner —
    /// a disabled query never fetches.
    pub async fn refetch(&self) -> Result<()> {
        if !self.options.enabled {
            return Err(RequeryError::DisabledQuery(self.key.name().to_owned()));
        }
        let mut done = self.cache.spawn_fetch(
            self.key.clone(),
            Arc::clone(&self.fetcher),
            self.options.stale_time,
        );
        let _ = done.wait_for(|settled| *settled).await;
        Ok(())
    }

    /// Current view state. Pure read — never triggers a fetch.
    ///
    /// While disabled the status reads `Idle` regardless of entry state,
    /// but a previously cached value (and error) remains visible.
    pub fn snapshot(&self) -> QuerySnapshot<T> {
        let now = Instant::now();
        match self.cache.get(&self.key) {
            Some(view) => QuerySnapshot {
                is_stale: view.is_stale(now),
                status: if self.options.enabled {
                    view.status
                } else {
                    FetchStatus::Idle
                },
                value: view.value,
                error: view.error,
                last_updated_at: view.fetched_at,
            },
            None => QuerySnapshot {
                value: None,
                status: FetchStatus::Idle,
                is_stale: false,
                error: None,
                last_updated_at: None,
            },
        }
    }

    /// Apply the freshness rules for the current key. Only called while
    /// enabled.
    fn revalidate(&self) {
        let query = self.key.name().to_owned();
        let now = Instant::now();
        match self.cache.get(&self.key) {
            Some(view) if view.fetched_at.is_some() => {
                if view.is_stale(now) {
                    metrics::counter!(telemetry::CACHE_HITS_TOTAL,
                        "query" => query, "freshness" => "stale")
                    .increment(1);
                    debug!(key = %self.key, "serving stale value; refetching in background");
                    let _ = self.cache.spawn_fetch(
                        self.key.clone(),
                        Arc::clone(&self.fetcher),
                        self.options.stale_time,
                    );
                } else {
                    metrics::counter!(telemetry::CACHE_HITS_TOTAL,
                        "query" => query, "freshness" => "fresh")
                    .increment(1);
                    debug!(key = %self.key, "serving fresh value");
                }
            }
            _ => {
                metrics::counter!(telemetry::CACHE_MISSES_TOTAL, "query" => query).increment(1);
                let _ = self.cache.spawn_fetch(
                    self.key.clone(),
                    Arc::clone(&self.fetcher),
                    self.options.stale_time,
                );
            }
        }
    }
}

impl<T> Drop for QueryRunner<T> {
    fn drop(&mut self) {
        self.cache.remove_observer(&self.key, self.options.gc_time);
    }
}
