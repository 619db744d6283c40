//! Dependent query link: a second query derived from an observed selection.
//!
//! [`DependentQuery`] wraps an optional inner [`QueryRunner`] whose key is a
//! pure function of an externally-set selection (e.g. "the repository the
//! user clicked" → that repository's issue list). The selection is set by
//! the consumer, not extracted from the upstream query's fetch result, so
//! any architecture driving the upstream query can drive this identically.
//!
//! Selection is a toggle: selecting the current selection again deselects.
//! Deselecting synchronously disables the inner runner and stops serving
//! its data — the cache entry itself survives for a later reselect, subject
//! to its own gc timer.

use std::sync::Arc;

use tracing::debug;

use crate::cache::QueryCache;
use crate::error::Result;
use crate::key::QueryKey;
use crate::runner::{QueryOptions, QueryRunner, QuerySnapshot};
use crate::traits::Fetcher;

/// A query gated on, and keyed by, an externally-observed selection.
pub struct DependentQuery<S, T> {
    cache: QueryCache<T>,
    fetcher: Arc<dyn Fetcher<T>>,
    options: QueryOptions,
    derive_key: Box<dyn Fn(&S) -> QueryKey + Send + Sync>,
    selection: Option<S>,
    runner: Option<QueryRunner<T>>,
}

impl<S: PartialEq, T: Clone + Send + 'static> DependentQuery<S, T> {
    /// Create an unselected (disabled) dependent query.
    ///
    /// `derive_key` maps a selection to the key of the query it enables.
    pub fn new(
        cache: QueryCache<T>,
        fetcher: Arc<dyn Fetcher<T>>,
        options: QueryOptions,
        derive_key: impl Fn(&S) -> QueryKey + Send + Sync + 'static,
    ) -> Self {
        Self {
            cache,
            fetcher,
            options,
            derive_key: Box::new(derive_key),
            selection: None,
            runner: None,
        }
    }

    /// Select `item`, or deselect if it is already the current selection.
    ///
    /// Selecting constructs the inner runner for the derived key, which
    /// applies the usual freshness rules (a warm entry within its gc window
    /// is served without a fetch). Deselecting drops the runner: disabled,
    /// no data served, eviction of the entry scheduled per `gc_time`.
    ///
    /// # Panics
    ///
    /// Selecting requires a tokio runtime context.
    pub fn select(&mut self, item: S) {
        if self.selection.as_ref() == Some(&item) {
            self.deselect();
            return;
        }
        let key = (self.derive_key)(&item);
        debug!(key = %key, "dependent query enabled");
        self.runner = Some(QueryRunner::new(
            self.cache.clone(),
            Arc::clone(&self.fetcher),
            key,
            self.options.clone(),
        ));
        self.selection = Some(item);
    }

    /// Clear the selection, synchronously disabling the inner runner.
    pub fn deselect(&mut self) {
        if self.runner.is_some() {
            debug!("dependent query disabled");
        }
        self.selection = None;
        self.runner = None;
    }

    /// The current selection, if any.
    pub fn selection(&self) -> Option<&S> {
        self.selection.as_ref()
    }

    /// Whether a selection is active (and the inner runner enabled).
    pub fn is_enabled(&self) -> bool {
        self.runner.is_some()
    }

    /// Snapshot of the inner query, or `None` while nothing is selected.
    ///
    /// A view must render no dependent data for a cleared selection, so a
    /// deselected link never exposes a stale snapshot.
    pub fn snapshot(&self) -> Option<QuerySnapshot<T>> {
        self.runner.as_ref().map(QueryRunner::snapshot)
    }

    /// Force a refetch of the inner query. No-op while nothing is selected.
    pub async fn refetch(&self) -> Result<()> {
        match &self.runner {
            Some(runner) => runner.refetch().await,
            None => Ok(()),
        }
    }
}
