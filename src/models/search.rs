//! Search request and response models.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::SearchResult;

/// Page used when none is requested
pub const DEFAULT_PAGE: u32 = 1;
/// Page size used when none is requested
pub const DEFAULT_PER_PAGE: u32 = 20;
/// Largest page size a caller may ask for
pub const MAX_PER_PAGE: u32 = 100;
/// Trending window length, in days, when none is configured
pub const DEFAULT_TRENDING_DAYS: i64 = 7;

/// Offset/limit pagination parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// 1-based page number
    pub page: u32,

    /// Items per page
    pub per_page: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl Pagination {
    /// Create pagination, clamping out-of-range values
    pub fn new(page: u32, per_page: u32) -> Self {
        Self::clamped(Some(page), Some(per_page), DEFAULT_PER_PAGE, MAX_PER_PAGE)
    }

    /// Build pagination from optional caller input.
    ///
    /// A missing or zero page becomes 1; a missing or zero page size becomes
    /// `default_per_page`; page sizes above `max_per_page` are clamped.
    pub fn clamped(
        page: Option<u32>,
        per_page: Option<u32>,
        default_per_page: u32,
        max_per_page: u32,
    ) -> Self {
        let page = page.filter(|p| *p >= 1).unwrap_or(DEFAULT_PAGE);
        let per_page = per_page
            .filter(|p| *p >= 1)
            .unwrap_or(default_per_page)
            .clamp(1, max_per_page.max(1));

        Self { page, per_page }
    }

    /// A single page holding every match
    pub fn unbounded() -> Self {
        Self {
            page: DEFAULT_PAGE,
            per_page: u32::MAX,
        }
    }

    /// Number of items to skip
    pub fn offset(&self) -> usize {
        (self.page.saturating_sub(1) as usize).saturating_mul(self.per_page as usize)
    }

    /// Number of pages needed for `total` items
    pub fn page_count(&self, total: u64) -> u32 {
        total.div_ceil(self.per_page.max(1) as u64) as u32
    }
}

/// A keyword search shared verbatim across providers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Keyword text, possibly empty
    pub keyword: String,

    /// Requested page; each provider decides how far to honor it
    pub pagination: Pagination,
}

impl SearchQuery {
    /// Create a new search query with default pagination
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            pagination: Pagination::default(),
        }
    }

    /// Set pagination
    pub fn pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = pagination;
        self
    }

    /// Set page and page size
    pub fn page(mut self, page: u32, per_page: u32) -> Self {
        self.pagination = Pagination::new(page, per_page);
        self
    }

    /// The keyword with surrounding whitespace removed
    pub fn trimmed(&self) -> &str {
        self.keyword.trim()
    }

    /// Whether the keyword has no searchable content
    pub fn is_empty(&self) -> bool {
        self.trimmed().is_empty()
    }
}

/// A recency interval ending now, used to scope trending queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrendingWindow {
    /// Start of the window (inclusive)
    pub since: DateTime<Utc>,
}

impl TrendingWindow {
    /// The window covering the last `days` days
    pub fn last_days(days: i64) -> Self {
        Self::ending_at(Utc::now(), days)
    }

    /// The window of `days` days ending at `now`.
    ///
    /// Spans too long to represent fall back to [`DEFAULT_TRENDING_DAYS`].
    pub fn ending_at(now: DateTime<Utc>, days: i64) -> Self {
        let span = Duration::try_days(days.max(0))
            .filter(|span| now.checked_sub_signed(*span).is_some())
            .unwrap_or_else(|| Duration::days(DEFAULT_TRENDING_DAYS));
        Self { since: now - span }
    }

    /// Whether `timestamp` falls inside the window
    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        timestamp >= self.since
    }

    /// The window start as a `YYYY-MM-DD` date
    pub fn since_date(&self) -> String {
        self.since.format("%Y-%m-%d").to_string()
    }
}

/// One source's section of a search response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderResult {
    /// Results in source order
    pub items: Vec<SearchResult>,

    /// Total matches reported by the source (may exceed `items.len()`)
    pub total: u64,

    /// Number of pages available
    pub pages: u32,

    /// The page these items belong to
    pub current_page: u32,

    /// Whether the source could not be queried
    pub failed: bool,

    /// Diagnostic message when `failed`
    pub error_message: Option<String>,
}

impl ProviderResult {
    /// Create a successful result
    pub fn new(items: Vec<SearchResult>, total: u64, pages: u32, current_page: u32) -> Self {
        Self {
            items,
            total,
            pages,
            current_page: current_page.max(1),
            failed: false,
            error_message: None,
        }
    }

    /// An empty, successful result for the given page
    pub fn empty(current_page: u32) -> Self {
        Self::new(Vec::new(), 0, 0, current_page)
    }

    /// A failed result: no items, zero total, and the diagnostic
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            pages: 0,
            current_page: 1,
            failed: true,
            error_message: Some(message.into()),
        }
    }
}

/// Per-source results of an aggregate search. Every key is always present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    pub local: ProviderResult,
    pub github: ProviderResult,
    pub arxiv: ProviderResult,
}

impl AggregateResult {
    /// Whether any section is marked failed
    pub fn has_failures(&self) -> bool {
        self.local.failed || self.github.failed || self.arxiv.failed
    }
}
