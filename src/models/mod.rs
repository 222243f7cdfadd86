//! Core data models for search requests and canonical results.

mod result;
mod search;

pub use result::{ResultMetadata, SearchResult, SourceType};
pub use search::{
    AggregateResult, Pagination, ProviderResult, SearchQuery, TrendingWindow, DEFAULT_PER_PAGE,
    DEFAULT_TRENDING_DAYS, MAX_PER_PAGE,
};
