//! Per-key cache entry state.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

use crate::error::FetchError;

/// Fetch lifecycle state of a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    /// No fetch has been issued (or the owning query is disabled).
    Idle,
    /// A fetch is in flight and no earlier value exists.
    Pending,
    /// The last completed fetch succeeded.
    Success,
    /// The last completed fetch failed. A value from an earlier success
    /// may still be present alongside the error.
    Error,
}

/// Read-only view of a cache entry, cloned out under the cache lock.
#[derive(Debug, Clone)]
pub struct EntryView<T> {
    pub value: Option<T>,
    pub error: Option<FetchError>,
    pub status: FetchStatus,
    /// When the last successful fetch completed.
    pub fetched_at: Option<Instant>,
    /// `fetched_at + stale_time`; before this the entry is fresh.
    pub stale_at: Option<Instant>,
    /// Eviction deadline, set only while the entry is unobserved.
    pub evict_at: Option<Instant>,
    pub observer_count: usize,
}

impl<T> EntryView<T> {
    /// Whether the entry is past its freshness window. An entry that has
    /// never completed a fetch is absent, not stale.
    pub fn is_stale(&self, now: Instant) -> bool {
        self.stale_at.is_some_and(|at| now >= at)
    }
}

/// Mutable entry record. Only the cache touches these, under its lock.
#[derive(Debug)]
pub(crate) struct CacheEntry<T> {
    pub(crate) value: Option<T>,
    pub(crate) error: Option<FetchError>,
    pub(crate) status: FetchStatus,
    pub(crate) fetched_at: Option<Instant>,
    pub(crate) stale_at: Option<Instant>,
    pub(crate) evict_at: Option<Instant>,
    pub(crate) observer_count: usize,
    /// Generation of the latest fetch issued for this key, stamped from the
    /// cache-wide issuance counter. Completions carrying a different
    /// generation are discarded, so a response that arrives after the entry
    /// was removed and re-created (or superseded) cannot overwrite newer
    /// state.
    pub(crate) generation: u64,
    /// Join handle for the in-flight fetch, if any. Present exactly while
    /// a fetch is outstanding; cloned by requests that dedup onto it.
    pub(crate) in_flight: Option<watch::Receiver<bool>>,
}

impl<T> CacheEntry<T> {
    pub(crate) fn new() -> Self {
        Self {
            value: None,
            error: None,
            status: FetchStatus::Idle,
            fetched_at: None,
            stale_at: None,
            evict_at: None,
            observer_count: 0,
            generation: 0,
            in_flight: None,
        }
    }

    /// Record a successful fetch completion: replace the value, clear any
    /// earlier error, and restart the freshness window.
    pub(crate) fn apply_success(&mut self, value: T, now: Instant, stale_time: Duration) {
        self.value = Some(value);
        self.error = None;
        self.status = FetchStatus::Success;
        self.fetched_at = Some(now);
        self.stale_at = Some(now + stale_time);
    }

    /// Record a failed fetch completion. The previous value and its
    /// timestamps are kept untouched (last-known-good semantics).
    pub(crate) fn apply_failure(&mut self, error: FetchError) {
        self.error = Some(error);
        self.status = FetchStatus::Error;
    }

    pub(crate) fn view(&self) -> EntryView<T>
    where
        T: Clone,
    {
        EntryView {
            value: self.value.clone(),
            error: self.error.clone(),
            status: self.status,
            fetched_at: self.fetched_at,
            stale_at: self.stale_at,
            evict_at: self.evict_at,
            observer_count: self.observer_count,
        }
    }
}
