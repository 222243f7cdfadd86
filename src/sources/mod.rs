//! Search sources with a shared trait-based interface.
//!
//! Every source implements [`Source`]: it builds its own query from the
//! shared [`SearchQuery`], performs the call, and maps the response into
//! canonical [`SearchResult`]s wrapped in a [`ProviderResult`].
//!
//! - [`LocalCatalogProvider`] searches the curated catalog (in-process)
//! - [`GitHubSource`] searches GitHub repositories
//! - [`ArxivSource`] searches the arXiv Atom API
//!
//! Sources report failures as [`SourceError`]. Whether a failure is isolated
//! or fails the request is decided by the engine, not by the source.

mod arxiv;
mod github;
mod local;
pub mod mock;

pub use arxiv::{ArxivSource, ARXIV_CATEGORY_FILTER};
pub use github::GitHubSource;
pub use local::LocalCatalogProvider;
pub use mock::MockSource;

use async_trait::async_trait;
use std::time::Duration;

use crate::models::{ProviderResult, SearchQuery, SearchResult, SourceType, TrendingWindow};

/// Upper bound on items kept from an external source, whatever the page size
pub const EXTERNAL_RESULT_CAP: usize = 10;

bitflags::bitflags! {
    /// Capabilities that a source can support
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SourceCapabilities: u32 {
        const SEARCH = 1 << 0;
        const TRENDING = 1 << 1;
    }
}

/// The interface shared by all search sources.
#[async_trait]
pub trait Source: Send + Sync + std::fmt::Debug {
    /// Which kind of results this source produces
    fn source_type(&self) -> SourceType;

    /// Identifier used in routes and aggregate keys
    fn id(&self) -> &'static str {
        self.source_type().id()
    }

    /// Human-readable name of this source
    fn name(&self) -> &'static str {
        self.source_type().name()
    }

    /// Describe the capabilities of this source
    fn capabilities(&self) -> SourceCapabilities {
        SourceCapabilities::SEARCH
    }

    /// Whether this source can answer trending queries
    fn supports_trending(&self) -> bool {
        self.capabilities().contains(SourceCapabilities::TRENDING)
    }

    /// Search for results matching the query
    async fn search(&self, query: &SearchQuery) -> Result<ProviderResult, SourceError>;

    /// Recent, topic-scoped results inside the window
    async fn trending(&self, _window: &TrendingWindow) -> Result<Vec<SearchResult>, SourceError> {
        Err(SourceError::NotImplemented)
    }
}

/// Errors that can occur when querying a source
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The requested operation is not implemented for this source
    #[error("Operation not implemented for this source")]
    NotImplemented,

    /// Connection or transport failure
    #[error("Network error: {0}")]
    Network(String),

    /// The call did not finish in time
    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimit,

    /// Credentials were rejected
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// The source answered with a non-success status
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The response could not be understood
    #[error("Parse error: {0}")]
    Parse(String),

    /// An in-process collaborator failed; not isolated by the engine
    #[error("Upstream failure: {0}")]
    Upstream(String),
}

impl SourceError {
    /// Whether this failure must fail the whole request
    pub fn is_fatal(&self) -> bool {
        matches!(self, SourceError::Upstream(_))
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SourceError::Network(format!("request timed out: {}", err))
        } else if err.is_decode() {
            SourceError::Parse(err.to_string())
        } else {
            SourceError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Parse(format!("JSON: {}", err))
    }
}

impl From<quick_xml::Error> for SourceError {
    fn from(err: quick_xml::Error) -> Self {
        SourceError::Parse(format!("XML: {}", err))
    }
}
