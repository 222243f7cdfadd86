//! Mock source for testing purposes.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::models::{
    ProviderResult, ResultMetadata, SearchQuery, SearchResult, SourceType, TrendingWindow,
};
use crate::sources::{Source, SourceCapabilities, SourceError};

#[derive(Debug, Clone)]
enum MockOutcome {
    Respond(ProviderResult),
    Fail(String),
    Fatal(String),
}

/// A source that returns predefined responses and counts its calls.
#[derive(Debug)]
pub struct MockSource {
    source_type: SourceType,
    outcome: Mutex<MockOutcome>,
    trending: Mutex<Vec<SearchResult>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockSource {
    /// Create a mock that answers every search with an empty result.
    pub fn new(source_type: SourceType) -> Self {
        Self {
            source_type,
            outcome: Mutex::new(MockOutcome::Respond(ProviderResult::empty(1))),
            trending: Mutex::new(Vec::new()),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Answer searches with the given result
    pub fn with_response(self, response: ProviderResult) -> Self {
        self.set_outcome(MockOutcome::Respond(response));
        self
    }

    /// Fail every call with a 503 from the "remote" side
    pub fn failing(self, message: impl Into<String>) -> Self {
        self.set_outcome(MockOutcome::Fail(message.into()));
        self
    }

    /// Fail every call with an upstream error
    pub fn fatal(self, message: impl Into<String>) -> Self {
        self.set_outcome(MockOutcome::Fatal(message.into()));
        self
    }

    /// Sleep before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Items returned by `trending`
    pub fn with_trending(self, items: Vec<SearchResult>) -> Self {
        *self.trending.lock().unwrap_or_else(|e| e.into_inner()) = items;
        self
    }

    /// Number of `search` and `trending` calls received so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn set_outcome(&self, outcome: MockOutcome) {
        *self.outcome.lock().unwrap_or_else(|e| e.into_inner()) = outcome;
    }

    async fn begin_call(&self) -> MockOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.outcome
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl Source for MockSource {
    fn source_type(&self) -> SourceType {
        self.source_type
    }

    fn capabilities(&self) -> SourceCapabilities {
        SourceCapabilities::SEARCH | SourceCapabilities::TRENDING
    }

    async fn search(&self, _query: &SearchQuery) -> Result<ProviderResult, SourceError> {
        match self.begin_call().await {
            MockOutcome::Respond(result) => Ok(result),
            MockOutcome::Fail(message) => Err(SourceError::Api {
                status: 503,
                message,
            }),
            MockOutcome::Fatal(message) => Err(SourceError::Upstream(message)),
        }
    }

    async fn trending(&self, _window: &TrendingWindow) -> Result<Vec<SearchResult>, SourceError> {
        match self.begin_call().await {
            MockOutcome::Fail(message) => Err(SourceError::Api {
                status: 503,
                message,
            }),
            MockOutcome::Fatal(message) => Err(SourceError::Upstream(message)),
            MockOutcome::Respond(_) => Ok(self
                .trending
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .clone()),
        }
    }
}

/// Helper function to create a result of the given kind for testing.
pub fn make_result(id: &str, title: &str, source_type: SourceType) -> SearchResult {
    let now = Utc::now();
    let metadata = match source_type {
        SourceType::Local => ResultMetadata::Local {
            category: None,
            is_approved: true,
            submitter: None,
            created_at: now,
            updated_at: now,
        },
        SourceType::CodeRepo => ResultMetadata::CodeRepo {
            stars: 0,
            language: None,
            created_at: Some(now),
            updated_at: Some(now),
        },
        SourceType::Preprint => ResultMetadata::Preprint {
            authors: Vec::new(),
            published: Some(now),
        },
    };

    SearchResult::new(
        id.to_string(),
        title.to_string(),
        String::new(),
        format!("http://example.com/{}", id),
        metadata,
    )
}
