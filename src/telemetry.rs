//! Telemetry metric name constants.
//!
//! Centralised metric names for requery operations. Consumers install
//! their own `metrics` recorder (e.g. prometheus, statsd); without a
//! recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `requery_`. Counters end in `_total`.
//!
//! # Common labels
//!
//! - `query` — logical resource name of the key (e.g. "repositories")
//! - `freshness` — cache hit kind: "fresh" or "stale"

/// Total fetches issued (dedup joins not included).
///
/// Labels: `query`.
pub const FETCHES_TOTAL: &str = "requery_fetches_total";

/// Total requests that joined an already in-flight fetch instead of
/// issuing their own.
///
/// Labels: `query`.
pub const DEDUP_JOINS_TOTAL: &str = "requery_dedup_joins_total";

/// Total cache hits observed by runners.
///
/// Labels: `query`, `freshness` ("fresh" | "stale").
pub const CACHE_HITS_TOTAL: &str = "requery_cache_hits_total";

/// Total cache misses observed by runners (absent entry or no data yet).
///
/// Labels: `query`.
pub const CACHE_MISSES_TOTAL: &str = "requery_cache_misses_total";

/// Total entries removed by eviction sweeps.
pub const EVICTIONS_TOTAL: &str = "requery_evictions_total";

/// Total settled values delivered to consumers by debounce coordinators.
/// Values whose receiving stream was already dropped are not counted.
pub const DEBOUNCE_EMISSIONS_TOTAL: &str = "requery_debounce_emissions_total";
