//! Utility modules shared by the sources.
//!
//! - [`truncate_words`]: word-count truncation applied to every description
//! - [`HttpClient`]: the process-wide HTTP client handed to external sources
//! - [`RetryConfig`] / [`with_retry`]: exponential backoff for transient failures
//!
//! # Truncation
//!
//! ```rust
//! use learnhub_search::utils::truncate_words;
//!
//! assert_eq!(truncate_words("one two three", 2), "one two...");
//! assert_eq!(truncate_words("one two", 2), "one two");
//! ```

mod http;
mod retry;
mod text;

pub use http::{HttpClient, USER_AGENT};
pub use retry::{with_retry, RetryConfig, TransientError};
pub use text::{collapse_whitespace, truncate_words, DEFAULT_MAX_WORDS, ELLIPSIS};
