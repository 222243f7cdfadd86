use std::sync::Arc;
use std::time::Duration;

use crate::models::{SearchResult, SourceType, TrendingWindow, DEFAULT_TRENDING_DAYS};
use crate::sources::Source;

use super::DEFAULT_PROVIDER_TIMEOUT;

/// Default trending window, in days
pub const DEFAULT_WINDOW_DAYS: i64 = DEFAULT_TRENDING_DAYS;

/// Recent, topic-scoped results from the external sources.
///
/// Never fails: an unsupported source, an error or a timeout all give an
/// empty list and a log line.
#[derive(Debug, Clone)]
pub struct TrendingEngine {
    code_repo: Arc<dyn Source>,
    preprint: Arc<dyn Source>,
    window_days: i64,
    provider_timeout: Duration,
}

impl TrendingEngine {
    pub fn new(code_repo: Arc<dyn Source>, preprint: Arc<dyn Source>) -> Self {
        Self {
            code_repo,
            preprint,
            window_days: DEFAULT_WINDOW_DAYS,
            provider_timeout: DEFAULT_PROVIDER_TIMEOUT,
        }
    }

    pub fn with_window_days(mut self, days: i64) -> Self {
        self.window_days = days.max(1);
        self
    }

    pub fn with_provider_timeout(mut self, timeout: Duration) -> Self {
        self.provider_timeout = timeout;
        self
    }

    /// Trending results for one source, newest window ending now
    pub async fn trending(&self, source_type: SourceType) -> Vec<SearchResult> {
        let source = match source_type {
            SourceType::CodeRepo => &self.code_repo,
            SourceType::Preprint => &self.preprint,
            SourceType::Local => {
                tracing::warn!(source = "local", "Trending is not available for the catalog");
                return Vec::new();
            }
        };

        if !source.supports_trending() {
            tracing::warn!(source = source.id(), "Source does not support trending");
            return Vec::new();
        }

        let window = TrendingWindow::last_days(self.window_days);
        match tokio::time::timeout(self.provider_timeout, source.trending(&window)).await {
            Ok(Ok(items)) => {
                tracing::debug!(source = source.id(), count = items.len(), "Trending fetched");
                items
            }
            Ok(Err(e)) => {
                tracing::warn!(source = source.id(), error = %e, "Trending fetch failed");
                Vec::new()
            }
            Err(_) => {
                tracing::warn!(
                    source = source.id(),
                    timeout_ms = self.provider_timeout.as_millis() as u64,
                    "Trending fetch timed out"
                );
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::mock::make_result;
    use crate::sources::MockSource;

    #[tokio::test]
    async fn test_trending_returns_source_items() {
        let github = Arc::new(
            MockSource::new(SourceType::CodeRepo)
                .with_trending(vec![make_result("1", "fresh repo", SourceType::CodeRepo)]),
        );
        let engine = TrendingEngine::new(
            github.clone(),
            Arc::new(MockSource::new(SourceType::Preprint)),
        );

        let items = engine.trending(SourceType::CodeRepo).await;

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "fresh repo");
        assert_eq!(github.calls(), 1);
    }

    #[tokio::test]
    async fn test_failure_gives_empty_list() {
        let engine = TrendingEngine::new(
            Arc::new(MockSource::new(SourceType::CodeRepo).failing("rate limited")),
            Arc::new(MockSource::new(SourceType::Preprint)),
        );

        assert!(engine.trending(SourceType::CodeRepo).await.is_empty());
    }

    #[tokio::test]
    async fn test_timeout_gives_empty_list() {
        let engine = TrendingEngine::new(
            Arc::new(MockSource::new(SourceType::CodeRepo)),
            Arc::new(
                MockSource::new(SourceType::Preprint)
                    .with_trending(vec![make_result("1", "late", SourceType::Preprint)])
                    .with_delay(Duration::from_secs(5)),
            ),
        )
        .with_provider_timeout(Duration::from_millis(50));

        assert!(engine.trending(SourceType::Preprint).await.is_empty());
    }

    #[tokio::test]
    async fn test_oversized_window_still_answers() {
        let github = Arc::new(
            MockSource::new(SourceType::CodeRepo)
                .with_trending(vec![make_result("1", "fresh repo", SourceType::CodeRepo)]),
        );
        let engine = TrendingEngine::new(
            github.clone(),
            Arc::new(MockSource::new(SourceType::Preprint)),
        )
        .with_window_days(i64::MAX);

        assert_eq!(engine.trending(SourceType::CodeRepo).await.len(), 1);
        assert_eq!(github.calls(), 1);
    }

    #[tokio::test]
    async fn test_catalog_has_no_trending() {
        let engine = TrendingEngine::new(
            Arc::new(MockSource::new(SourceType::CodeRepo)),
            Arc::new(MockSource::new(SourceType::Preprint)),
        );

        assert!(engine.trending(SourceType::Local).await.is_empty());
    }
}
