//! Concrete fetch collaborators.
//!
//! The cache core is collaborator-agnostic; the implementations here exist
//! so the crate ships working end-to-end examples of the [`Fetcher`]
//! boundary. Gated behind the `github` feature (on by default).
//!
//! [`Fetcher`]: crate::Fetcher

pub mod github;
