//! Fan-out over the three sources.
//!
//! [`AggregationEngine`] answers single-source and aggregate searches;
//! [`TrendingEngine`] answers the recency-scoped trending queries.
//! External sources run under a per-call timeout and their failures are
//! isolated. The catalog is in-process and its failures are fatal.

mod trending;

pub use trending::TrendingEngine;

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::catalog::Catalog;
use crate::config::Config;
use crate::models::{AggregateResult, ProviderResult, SearchQuery, SourceType};
use crate::sources::{ArxivSource, GitHubSource, LocalCatalogProvider, Source, SourceError};
use crate::utils::{HttpClient, RetryConfig};

/// Default time allowed for one external source call
pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors that fail a whole search request
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A single-source search could not be answered
    #[error("{source_type} search failed: {error}")]
    Provider {
        source_type: SourceType,
        #[source]
        error: SourceError,
    },

    /// The catalog failed; never isolated
    #[error("Catalog search failed: {0}")]
    Catalog(#[source] SourceError),
}

impl EngineError {
    fn from_source(source_type: SourceType, error: SourceError) -> Self {
        if error.is_fatal() {
            EngineError::Catalog(error)
        } else {
            EngineError::Provider { source_type, error }
        }
    }
}

/// Dispatches searches to the catalog, GitHub and arXiv sources.
#[derive(Debug, Clone)]
pub struct AggregationEngine {
    local: Arc<dyn Source>,
    code_repo: Arc<dyn Source>,
    preprint: Arc<dyn Source>,
    provider_timeout: Duration,
}

impl AggregationEngine {
    pub fn new(
        local: Arc<dyn Source>,
        code_repo: Arc<dyn Source>,
        preprint: Arc<dyn Source>,
    ) -> Self {
        Self {
            local,
            code_repo,
            preprint,
            provider_timeout: DEFAULT_PROVIDER_TIMEOUT,
        }
    }

    /// Set the timeout applied to each external source call
    pub fn with_provider_timeout(mut self, timeout: Duration) -> Self {
        self.provider_timeout = timeout;
        self
    }

    /// Wire the real sources from configuration.
    ///
    /// One HTTP client is built here and shared by both external sources.
    pub fn from_config(config: &Config, catalog: Arc<dyn Catalog>) -> Result<Self, SourceError> {
        let client = Arc::new(HttpClient::with_config(&config.http)?);
        let retry = RetryConfig::from(&config.http.retry);

        let github = GitHubSource::new(Arc::clone(&client), config.api_keys.github.clone())
            .with_base_url(config.sources.github_api_url.clone())
            .with_retry(retry);
        let arxiv = ArxivSource::new(client)
            .with_base_url(config.sources.arxiv_api_url.clone())
            .with_retry(retry);

        Ok(Self::new(
            Arc::new(LocalCatalogProvider::new(catalog)),
            Arc::new(github),
            Arc::new(arxiv),
        )
        .with_provider_timeout(config.http.provider_timeout()))
    }

    /// The source answering for `source_type`
    pub fn source(&self, source_type: SourceType) -> &Arc<dyn Source> {
        match source_type {
            SourceType::Local => &self.local,
            SourceType::CodeRepo => &self.code_repo,
            SourceType::Preprint => &self.preprint,
        }
    }

    /// The configured per-call timeout
    pub fn provider_timeout(&self) -> Duration {
        self.provider_timeout
    }

    /// Build a trending engine over the same external sources
    pub fn trending_engine(&self, window_days: i64) -> TrendingEngine {
        TrendingEngine::new(Arc::clone(&self.code_repo), Arc::clone(&self.preprint))
            .with_window_days(window_days)
            .with_provider_timeout(self.provider_timeout)
    }

    /// Query one source. Any failure, including a timeout, is returned.
    pub async fn search_single(
        &self,
        source_type: SourceType,
        query: &SearchQuery,
    ) -> Result<ProviderResult, EngineError> {
        if query.is_empty() {
            return Ok(empty_section(source_type, query));
        }

        self.call(source_type, query)
            .await
            .map_err(|error| EngineError::from_source(source_type, error))
    }

    /// Query all three sources concurrently.
    ///
    /// External failures become `failed` sections; only a catalog failure
    /// fails the call.
    pub async fn search_all(&self, query: &SearchQuery) -> Result<AggregateResult, EngineError> {
        if query.is_empty() {
            return Ok(AggregateResult {
                local: empty_section(SourceType::Local, query),
                github: empty_section(SourceType::CodeRepo, query),
                arxiv: empty_section(SourceType::Preprint, query),
            });
        }

        let started = Instant::now();
        let (local, github, arxiv) = tokio::join!(
            self.call(SourceType::Local, query),
            self.call(SourceType::CodeRepo, query),
            self.call(SourceType::Preprint, query),
        );

        let local = local.map_err(|error| EngineError::from_source(SourceType::Local, error))?;
        let result = AggregateResult {
            local,
            github: isolate(SourceType::CodeRepo, github)?,
            arxiv: isolate(SourceType::Preprint, arxiv)?,
        };

        tracing::info!(
            query = query.trimmed(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            failures = result.has_failures(),
            "Aggregate search complete"
        );

        Ok(result)
    }

    async fn call(
        &self,
        source_type: SourceType,
        query: &SearchQuery,
    ) -> Result<ProviderResult, SourceError> {
        let source = self.source(source_type);
        let started = Instant::now();

        let result = if source_type == SourceType::Local {
            source.search(query).await
        } else {
            match tokio::time::timeout(self.provider_timeout, source.search(query)).await {
                Ok(result) => result,
                Err(_) => Err(SourceError::Timeout(self.provider_timeout)),
            }
        };

        match &result {
            Ok(r) => tracing::debug!(
                source = source.id(),
                total = r.total,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Source answered"
            ),
            Err(e) => tracing::warn!(
                source = source.id(),
                error = %e,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Source failed"
            ),
        }

        result
    }
}

/// The section answered for an empty keyword. External sources are never
/// paged, so theirs always reads as page 1 of 1.
fn empty_section(source_type: SourceType, query: &SearchQuery) -> ProviderResult {
    match source_type {
        SourceType::Local => ProviderResult::empty(query.pagination.page),
        SourceType::CodeRepo | SourceType::Preprint => ProviderResult::new(Vec::new(), 0, 1, 1),
    }
}

/// Turn an external failure into a `failed` section; fatal errors still propagate
fn isolate(
    source_type: SourceType,
    result: Result<ProviderResult, SourceError>,
) -> Result<ProviderResult, EngineError> {
    match result {
        Ok(result) => Ok(result),
        Err(error) if error.is_fatal() => Err(EngineError::Catalog(error)),
        Err(error) => Ok(ProviderResult::failed(format!(
            "{} unavailable: {}",
            source_type.name(),
            error
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::mock::make_result;
    use crate::sources::MockSource;

    fn engine(
        local: MockSource,
        github: MockSource,
        arxiv: MockSource,
    ) -> (AggregationEngine, Arc<MockSource>, Arc<MockSource>, Arc<MockSource>) {
        let (local, github, arxiv) = (Arc::new(local), Arc::new(github), Arc::new(arxiv));
        let engine = AggregationEngine::new(local.clone(), github.clone(), arxiv.clone())
            .with_provider_timeout(Duration::from_millis(200));
        (engine, local, github, arxiv)
    }

    fn answered(source_type: SourceType, count: usize, total: u64) -> MockSource {
        let items = (0..count)
            .map(|i| make_result(&i.to_string(), "result", source_type))
            .collect();
        MockSource::new(source_type).with_response(ProviderResult::new(items, total, 1, 1))
    }

    #[tokio::test]
    async fn test_aggregate_collects_every_section() {
        let (engine, ..) = engine(
            answered(SourceType::Local, 2, 2),
            answered(SourceType::CodeRepo, 10, 37),
            answered(SourceType::Preprint, 4, 4),
        );

        let result = engine
            .search_all(&SearchQuery::new("transformers"))
            .await
            .unwrap();

        assert_eq!(result.local.items.len(), 2);
        assert_eq!(result.github.total, 37);
        assert_eq!(result.github.items.len(), 10);
        assert_eq!(result.arxiv.items.len(), 4);
        assert!(!result.has_failures());
    }

    #[tokio::test]
    async fn test_external_failure_is_isolated() {
        let (engine, ..) = engine(
            answered(SourceType::Local, 1, 1),
            MockSource::new(SourceType::CodeRepo).failing("boom"),
            answered(SourceType::Preprint, 3, 3),
        );

        let result = engine.search_all(&SearchQuery::new("rust")).await.unwrap();

        assert!(result.github.failed);
        assert!(result.github.items.is_empty());
        assert_eq!(result.github.total, 0);
        assert!(result.github.error_message.is_some());
        assert!(!result.local.failed);
        assert_eq!(result.arxiv.items.len(), 3);
    }

    #[tokio::test]
    async fn test_slow_source_times_out_alone() {
        let (engine, ..) = engine(
            answered(SourceType::Local, 1, 1),
            answered(SourceType::CodeRepo, 2, 2),
            answered(SourceType::Preprint, 2, 2).with_delay(Duration::from_secs(5)),
        );

        let started = Instant::now();
        let result = engine.search_all(&SearchQuery::new("rust")).await.unwrap();

        assert!(started.elapsed() < Duration::from_secs(2));
        assert!(result.arxiv.failed);
        assert!(!result.github.failed);
        assert_eq!(result.github.items.len(), 2);
    }

    #[tokio::test]
    async fn test_aggregate_calls_run_concurrently() {
        let delay = Duration::from_millis(300);
        let (engine, local, github, arxiv) = engine(
            answered(SourceType::Local, 1, 1).with_delay(delay),
            answered(SourceType::CodeRepo, 1, 1).with_delay(delay),
            answered(SourceType::Preprint, 1, 1).with_delay(delay),
        );
        let engine = engine.with_provider_timeout(Duration::from_secs(2));

        let started = Instant::now();
        let result = engine.search_all(&SearchQuery::new("rust")).await.unwrap();
        let elapsed = started.elapsed();

        assert!(elapsed >= delay);
        assert!(elapsed < Duration::from_millis(600), "took {:?}", elapsed);
        assert!(!result.has_failures());
        assert_eq!(local.calls() + github.calls() + arxiv.calls(), 3);
    }

    #[tokio::test]
    async fn test_catalog_failure_fails_aggregate() {
        let (engine, ..) = engine(
            MockSource::new(SourceType::Local).fatal("catalog offline"),
            answered(SourceType::CodeRepo, 1, 1),
            answered(SourceType::Preprint, 1, 1),
        );

        let err = engine.search_all(&SearchQuery::new("rust")).await.unwrap_err();
        assert!(matches!(err, EngineError::Catalog(_)));
    }

    #[tokio::test]
    async fn test_empty_keyword_makes_no_calls() {
        let (engine, local, github, arxiv) = engine(
            answered(SourceType::Local, 1, 1),
            answered(SourceType::CodeRepo, 1, 1),
            answered(SourceType::Preprint, 1, 1),
        );

        let all = engine.search_all(&SearchQuery::new("   ")).await.unwrap();
        let single = engine
            .search_single(SourceType::CodeRepo, &SearchQuery::new(""))
            .await
            .unwrap();

        assert!(all.local.items.is_empty() && all.github.items.is_empty());
        assert!(all.arxiv.items.is_empty());
        assert!(single.items.is_empty());
        assert_eq!((single.pages, single.current_page), (1, 1));
        assert_eq!((all.github.pages, all.github.current_page), (1, 1));
        assert_eq!((all.arxiv.pages, all.arxiv.current_page), (1, 1));
        assert_eq!(local.calls() + github.calls() + arxiv.calls(), 0);
    }

    #[tokio::test]
    async fn test_single_source_failure_is_returned() {
        let (engine, local, _, arxiv) = engine(
            answered(SourceType::Local, 1, 1),
            MockSource::new(SourceType::CodeRepo).failing("rate limited"),
            answered(SourceType::Preprint, 1, 1),
        );

        let err = engine
            .search_single(SourceType::CodeRepo, &SearchQuery::new("rust"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            EngineError::Provider {
                source_type: SourceType::CodeRepo,
                ..
            }
        ));
        assert_eq!(local.calls() + arxiv.calls(), 0);
    }

    #[tokio::test]
    async fn test_single_source_timeout() {
        let (engine, ..) = engine(
            answered(SourceType::Local, 1, 1),
            answered(SourceType::CodeRepo, 1, 1).with_delay(Duration::from_secs(5)),
            answered(SourceType::Preprint, 1, 1),
        );

        let err = engine
            .search_single(SourceType::CodeRepo, &SearchQuery::new("rust"))
            .await
            .unwrap_err();

        match err {
            EngineError::Provider { error, .. } => {
                assert!(matches!(error, SourceError::Timeout(_)))
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
