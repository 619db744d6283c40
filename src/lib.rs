//! Requery - keyed async query cache with staleness and dependency gating
//!
//! This crate provides the coordination core of a search-style UI: a shared
//! [`QueryCache`] keyed by structural [`QueryKey`]s, per-query
//! [`QueryRunner`]s that decide when to trust the cache and when to fetch,
//! a trailing-edge [`Debouncer`] that turns rapid input changes into
//! settled values, and a [`DependentQuery`] link whose execution is gated
//! on an observed selection. The actual I/O lives behind the [`Fetcher`]
//! trait; the core treats fetched values as opaque.
//!
//! Entries track freshness (`stale_time`) and eviction (`gc_time`)
//! independently: a stale value is still served while a background refetch
//! runs, and an unobserved entry is only removed by an explicit
//! [`sweep()`](QueryCache::sweep) after its retention expires. Concurrent
//! requests for the same key share a single fetch.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use async_trait::async_trait;
//! use requery::{Debouncer, Fetcher, FetchError, QueryCache, QueryKey, QueryOptions, QueryRunner};
//!
//! struct Search;
//!
//! #[async_trait]
//! impl Fetcher<Vec<String>> for Search {
//!     async fn fetch(&self, key: &QueryKey) -> Result<Vec<String>, FetchError> {
//!         // call the real backend here
//!         Ok(vec![format!("result for {key}")])
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> requery::Result<()> {
//!     let cache = QueryCache::new();
//!     let fetcher = Arc::new(Search);
//!
//!     // Debounce raw keystrokes into settled search terms.
//!     let (mut debouncer, mut settled) = Debouncer::new(Duration::from_millis(500));
//!     debouncer.notify("rea".to_owned());
//!     debouncer.notify("react".to_owned());
//!
//!     let mut runner = QueryRunner::new(
//!         cache.clone(),
//!         fetcher,
//!         QueryKey::new("repositories").param("react").param(""),
//!         QueryOptions::new()
//!             .stale_time(Duration::from_secs(60))
//!             .gc_time(Duration::from_secs(30)),
//!     );
//!
//!     while let Some(term) = settled.recv().await {
//!         runner.set_key(QueryKey::new("repositories").param(term).param(""));
//!         let snapshot = runner.snapshot();
//!         println!("{:?} stale={}", snapshot.status, snapshot.is_stale);
//!     }
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod debounce;
pub mod dependent;
pub mod error;
pub mod key;
pub mod runner;
#[cfg(feature = "github")]
pub mod sources;
pub mod telemetry;
pub mod traits;

// Re-export main types at crate root
pub use cache::{EntryView, FetchStatus, QueryCache};
pub use debounce::{Debouncer, Settled};
pub use dependent::DependentQuery;
pub use error::{FetchError, RequeryError, Result};
pub use key::{ParamValue, QueryKey};
pub use runner::{QueryOptions, QueryRunner, QuerySnapshot};
pub use traits::Fetcher;
