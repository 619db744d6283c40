//! Fetch collaborator boundary.

use async_trait::async_trait;

use crate::error::FetchError;
use crate::key::QueryKey;

/// Asynchronous fetch collaborator for one value type.
///
/// The cache core treats the output as an opaque, already-validated `T`:
/// request construction, transport, and response parsing live entirely
/// behind this trait. Failures carry only a human-readable message.
///
/// Implementations are shared across runners via `Arc<dyn Fetcher<T>>` and
/// may be called concurrently for different keys; the cache guarantees at
/// most one in-flight call per key.
#[async_trait]
pub trait Fetcher<T>: Send + Sync {
    /// Fetch the value identified by `key`.
    async fn fetch(&self, key: &QueryKey) -> std::result::Result<T, FetchError>;
}
