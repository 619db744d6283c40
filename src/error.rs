//! Requery error types

/// Failure signalled by a fetch collaborator.
///
/// Carries only a human-readable message — the core does not interpret
/// collaborator responses beyond trusting or rejecting them as a unit.
/// Fetch errors are captured into the owning cache entry and surfaced
/// through [`QuerySnapshot`](crate::QuerySnapshot), never propagated
/// across the cache/runner boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct FetchError {
    /// Human-readable failure description.
    pub message: String,
}

impl FetchError {
    /// Create a fetch error from any message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Requery error types
#[derive(Debug, thiserror::Error)]
pub enum RequeryError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// A fetch was requested for a query whose `enabled` gate is closed.
    ///
    /// Internal paths check the gate before issuing a fetch, so seeing this
    /// from anywhere but a manual `refetch()` on a disabled runner is a
    /// programming error in the caller.
    #[error("query '{0}' is disabled; fetch refused")]
    DisabledQuery(String),
}

/// Result type alias for Requery operations
pub type Result<T> = std::result::Result<T, RequeryError>;
