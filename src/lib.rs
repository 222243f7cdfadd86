//! # LearnHub Search
//!
//! Federated search over a curated learning-resource catalog, GitHub
//! repositories and arXiv preprints.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`models`]: Canonical results, queries, pagination and per-source sections
//! - [`sources`]: Source plugins behind the [`Source`] trait
//! - [`catalog`]: Read access to the curated catalog
//! - [`engine`]: Single-source, aggregate and trending dispatch
//! - [`api`]: axum routes, caller identity and error responses
//! - [`utils`]: HTTP client, retry and text helpers
//! - [`config`]: Configuration management

pub mod api;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod models;
pub mod sources;
pub mod utils;

// Re-export commonly used types
pub use engine::{AggregationEngine, EngineError, TrendingEngine};
pub use models::{AggregateResult, ProviderResult, SearchQuery, SearchResult, SourceType};
pub use sources::{Source, SourceError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
