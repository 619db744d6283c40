//! Keyed query cache: fetch deduplication, staleness bookkeeping, eviction.
//!
//! [`QueryCache`] maps [`QueryKey`]s to entries holding the last fetched
//! value, the last error, freshness and eviction deadlines, and an observer
//! count. It is the single mutable shared resource of this crate: every
//! [`QueryRunner`](crate::QueryRunner) holds a cloned handle to the same
//! cache, injected explicitly at construction — there is no ambient global.
//!
//! # Eviction
//!
//! Eviction is purely time-and-observer driven: an entry becomes eligible
//! when its last observer leaves (which stamps `evict_at = now + gc_time`)
//! and is removed by the next [`sweep()`](QueryCache::sweep) after that
//! deadline. There is no size-based LRU. `sweep()` is cheap when nothing is
//! due and safe to call as often as the owner likes.
//!
//! # Locking
//!
//! All entry state lives behind one mutex, and the lock is never held
//! across an await point. Fetch completions re-acquire it on a spawned
//! task and apply their result only if the cache is still alive and the
//! entry's fetch generation still matches — a completion against a
//! torn-down or superseded entry is a no-op.

pub mod entry;

pub use entry::{EntryView, FetchStatus};

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use crate::key::QueryKey;
use crate::telemetry;
use crate::traits::Fetcher;
use entry::CacheEntry;

struct CacheInner<T> {
    entries: HashMap<QueryKey, CacheEntry<T>>,
    /// Monotonically increasing fetch issuance counter, cache-wide. Stamped
    /// into the entry per fetch so a completion issued against an earlier
    /// incarnation of a key can never match a re-created entry.
    issuances: u64,
}

/// Process-wide mapping from [`QueryKey`] to cache entry.
///
/// Cloning produces another handle to the same cache. Pass a handle to
/// every runner that should share entries.
pub struct QueryCache<T> {
    inner: Arc<Mutex<CacheInner<T>>>,
}

impl<T> Clone for QueryCache<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> QueryCache<T> {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(CacheInner {
                entries: HashMap::new(),
                issuances: 0,
            })),
        }
    }

    /// Remove an entry outright, discarding its value. A fetch still in
    /// flight for the key will complete as a no-op.
    pub fn remove(&self, key: &QueryKey) {
        self.inner.lock().entries.remove(key);
    }

    /// Remove every entry that is unobserved and past its eviction
    /// deadline. Returns the number of entries evicted.
    ///
    /// This is the only eviction path; observed entries and entries whose
    /// deadline has not passed are never touched.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut inner = self.inner.lock();
        let before = inner.entries.len();
        inner.entries.retain(|key, entry| {
            let due = entry.observer_count == 0 && entry.evict_at.is_some_and(|at| at <= now);
            if due {
                trace!(key = %key, "evicting unobserved entry");
            }
            !due
        });
        let evicted = before - inner.entries.len();
        if evicted > 0 {
            metrics::counter!(telemetry::EVICTIONS_TOTAL).increment(evicted as u64);
        }
        evicted
    }

    /// Number of entries currently in the cache.
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop all entries.
    pub fn clear(&self) {
        self.inner.lock().entries.clear();
    }

    /// Register a live consumer of `key`. Cancels any pending eviction.
    pub(crate) fn add_observer(&self, key: &QueryKey) {
        let mut inner = self.inner.lock();
        let entry = inner
            .entries
            .entry(key.clone())
            .or_insert_with(CacheEntry::new);
        entry.observer_count += 1;
        entry.evict_at = None;
    }

    /// Deregister a consumer of `key`. When the last one leaves, the entry
    /// is scheduled for eviction `gc_time` from now.
    pub(crate) fn remove_observer(&self, key: &QueryKey, gc_time: Duration) {
        let mut inner = self.inner.lock();
        if let Some(entry) = inner.entries.get_mut(key) {
            entry.observer_count = entry.observer_count.saturating_sub(1);
            if entry.observer_count == 0 {
                entry.evict_at = Some(Instant::now() + gc_time);
            }
        }
    }
}

impl<T: Clone> QueryCache<T> {
    /// Look up the entry for `key`.
    ///
    /// Returns a cloned-out view; never triggers a fetch.
    pub fn get(&self, key: &QueryKey) -> Option<EntryView<T>> {
        self.inner.lock().entries.get(key).map(CacheEntry::view)
    }

    /// Seed (or overwrite) a successful value for `key`, starting a fresh
    /// `stale_time` window. Observer state on an existing entry is kept.
    pub fn put(&self, key: QueryKey, value: T, stale_time: Duration) {
        let now = Instant::now();
        let mut inner = self.inner.lock();
        inner
            .entries
            .entry(key)
            .or_insert_with(CacheEntry::new)
            .apply_success(value, now, stale_time);
    }
}

impl<T: Clone + Send + 'static> QueryCache<T> {
    /// Issue a fetch for `key`, or join the one already in flight.
    ///
    /// Returns a receiver that resolves to `true` once the fetch settles
    /// (either way). At most one fetch is outstanding per key: concurrent
    /// callers get clones of the same receiver and the collaborator is
    /// invoked once.
    ///
    /// The completion is applied on a spawned task. It is discarded when
    /// the cache has been dropped, the entry removed, or a newer fetch
    /// generation issued in the meantime.
    ///
    /// # Panics
    ///
    /// Requires a tokio runtime context.
    pub(crate) fn spawn_fetch(
        &self,
        key: QueryKey,
        fetcher: Arc<dyn Fetcher<T>>,
        stale_time: Duration,
    ) -> watch::Receiver<bool> {
        let query = key.name().to_owned();
        let generation;
        let rx = {
            let mut inner = self.inner.lock();
            if let Some(rx) = inner
                .entries
                .get(&key)
                .and_then(|entry| entry.in_flight.clone())
            {
                metrics::counter!(telemetry::DEDUP_JOINS_TOTAL, "query" => query)
                    .increment(1);
                debug!(key = %key, "joining in-flight fetch");
                return rx;
            }
            inner.issuances += 1;
            generation = inner.issuances;
            let entry = inner
                .entries
                .entry(key.clone())
                .or_insert_with(CacheEntry::new);
            entry.generation = generation;
            if entry.value.is_none() {
                entry.status = FetchStatus::Pending;
            }
            let (tx, rx) = watch::channel(false);
            entry.in_flight = Some(rx.clone());

            let weak = Arc::downgrade(&self.inner);
            let key = key.clone();
            tokio::spawn(async move {
                let outcome = fetcher.fetch(&key).await;
                apply_completion(weak, &key, generation, outcome, stale_time);
                let _ = tx.send(true);
            });
            rx
        };

        metrics::counter!(telemetry::FETCHES_TOTAL, "query" => query).increment(1);
        debug!(key = %key, generation, "issuing fetch");
        rx
    }
}

impl<T> Default for QueryCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply a fetch completion to the entry it was issued for, if that entry
/// still exists and still expects this generation.
fn apply_completion<T>(
    weak: Weak<Mutex<CacheInner<T>>>,
    key: &QueryKey,
    generation: u64,
    outcome: Result<T, crate::error::FetchError>,
    stale_time: Duration,
) {
    let Some(inner) = weak.upgrade() else {
        return; // cache dropped while the fetch was in flight
    };
    let mut guard = inner.lock();
    let Some(entry) = guard.entries.get_mut(key) else {
        debug!(key = %key, "discarding completion for removed entry");
        return;
    };
    if entry.generation != generation {
        debug!(key = %key, generation, "discarding out-of-order completion");
        return;
    }
    entry.in_flight = None;
    let now = Instant::now();
    match outcome {
        Ok(value) => {
            debug!(key = %key, "fetch succeeded");
            entry.apply_success(value, now, stale_time);
        }
        Err(error) => {
            if entry.value.is_some() {
                warn!(key = %key, error = %error, "refetch failed; keeping last good value");
            } else {
                debug!(key = %key, error = %error, "fetch failed");
            }
            entry.apply_failure(error);
        }
    }
}
