//! GitHub repository search source.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;

use crate::models::{
    ProviderResult, ResultMetadata, SearchQuery, SearchResult, SourceType, TrendingWindow,
};
use crate::sources::{Source, SourceCapabilities, SourceError, EXTERNAL_RESULT_CAP};
use crate::utils::{truncate_words, with_retry, HttpClient, RetryConfig, DEFAULT_MAX_WORDS};

/// Base URL for the GitHub REST API
pub const GITHUB_API_URL: &str = "https://api.github.com";
const API_VERSION: &str = "2022-11-28";

/// Star floor for the default (keyword-less) query
const DEFAULT_STAR_FLOOR: u32 = 100;
/// Star floor for trending repositories
const TRENDING_STAR_FLOOR: u32 = 10;

const DEFAULT_TOPICS: &str =
    "topic:artificial-intelligence OR topic:deep-learning OR topic:machine-learning OR topic:ai";
const TRENDING_TERMS: &str = "(artificial-intelligence OR deep-learning OR machine-learning OR ai)";
const SEARCH_FIELDS: &str = "in:name,description,readme";

/// GitHub repository search.
///
/// Always asks for the ten most-starred matches and reports a single page,
/// whatever page size the caller requested; `total` is GitHub's full count.
#[derive(Debug, Clone)]
pub struct GitHubSource {
    client: Arc<HttpClient>,
    token: Option<String>,
    base_url: String,
    retry: RetryConfig,
}

impl GitHubSource {
    /// Create a source. Without a token GitHub's unauthenticated rate limit applies.
    pub fn new(client: Arc<HttpClient>, token: Option<String>) -> Self {
        let token = token.filter(|t| !t.trim().is_empty());
        if token.is_some() {
            tracing::debug!("GitHub token configured");
        } else {
            tracing::warn!("No GitHub token configured, using unauthenticated rate limits");
        }

        Self {
            client,
            token,
            base_url: GITHUB_API_URL.to_string(),
            retry: RetryConfig::default(),
        }
    }

    /// Point the source at a different API root
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the retry policy
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Build the `q` parameter for a keyword search
    pub fn build_search_query(keyword: &str) -> String {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            format!("stars:>{} {}", DEFAULT_STAR_FLOOR, DEFAULT_TOPICS)
        } else {
            format!("{} {}", keyword, SEARCH_FIELDS)
        }
    }

    /// Build the `q` parameter for repositories created inside the window
    pub fn build_trending_query(window: &TrendingWindow) -> String {
        format!(
            "created:>={} stars:>{} {} {}",
            window.since_date(),
            TRENDING_STAR_FLOOR,
            TRENDING_TERMS,
            SEARCH_FIELDS
        )
    }

    /// Run one repository search and map the items that can be mapped
    async fn search_repositories(&self, q: &str) -> Result<(u64, Vec<SearchResult>), SourceError> {
        let body = with_retry(self.retry, || self.fetch(q)).await?;

        let total = body.total_count;
        let items: Vec<SearchResult> = body
            .items
            .into_iter()
            .take(EXTERNAL_RESULT_CAP)
            .filter_map(|item| match Self::map_repo(item) {
                Ok(result) => Some(result),
                Err(e) => {
                    tracing::debug!(source = "github", error = %e, "Skipping malformed repository");
                    None
                }
            })
            .collect();

        Ok((total, items))
    }

    async fn fetch(&self, q: &str) -> Result<RepoSearchResponse, SourceError> {
        let url = format!("{}/search/repositories", self.base_url);
        let per_page = EXTERNAL_RESULT_CAP.to_string();

        let mut request = self
            .client
            .get(&url)
            .query(&[
                ("q", q),
                ("sort", "stars"),
                ("order", "desc"),
                ("per_page", per_page.as_str()),
                ("page", "1"),
            ])
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION);
        if let Some(ref token) = self.token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        let response = request
            .send()
            .await
            .map_err(|e| SourceError::Network(format!("Failed to reach GitHub: {}", e)))?;

        let status = response.status();
        match status.as_u16() {
            200..=299 => {
                let text = response.text().await?;
                serde_json::from_str(&text).map_err(|e| {
                    SourceError::Parse(format!("Unexpected GitHub response: {}", e))
                })
            }
            401 => Err(SourceError::Auth(extract_error_message(
                &response.text().await.unwrap_or_default(),
            ))),
            429 => Err(SourceError::RateLimit),
            403 => {
                let remaining = response
                    .headers()
                    .get("x-ratelimit-remaining")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok());
                if remaining == Some(0) {
                    Err(SourceError::RateLimit)
                } else {
                    Err(SourceError::Api {
                        status: 403,
                        message: extract_error_message(&response.text().await.unwrap_or_default()),
                    })
                }
            }
            code => Err(SourceError::Api {
                status: code,
                message: extract_error_message(
                    &response
                        .text()
                        .await
                        .unwrap_or_else(|_| format!("HTTP {}", status)),
                ),
            }),
        }
    }

    /// Map one raw repository record; a bad record fails only itself
    fn map_repo(item: serde_json::Value) -> Result<SearchResult, SourceError> {
        let repo: Repository = serde_json::from_value(item)?;

        let title = repo
            .full_name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(repo.name);
        if title.trim().is_empty() {
            return Err(SourceError::Parse(format!("repository {} has no name", repo.id)));
        }

        let description = repo
            .description
            .as_deref()
            .map(|d| truncate_words(d, DEFAULT_MAX_WORDS))
            .unwrap_or_default();

        Ok(SearchResult::new(
            repo.id.to_string(),
            title,
            description,
            repo.html_url,
            ResultMetadata::CodeRepo {
                stars: repo.stargazers_count,
                language: repo.language,
                created_at: repo.created_at,
                updated_at: repo.updated_at,
            },
        ))
    }
}

/// Pull GitHub's `message` field out of an error body
fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .map(|e| e.message)
        .unwrap_or_else(|_| body.chars().take(200).collect())
}

#[async_trait]
impl Source for GitHubSource {
    fn source_type(&self) -> SourceType {
        SourceType::CodeRepo
    }

    fn capabilities(&self) -> SourceCapabilities {
        SourceCapabilities::SEARCH | SourceCapabilities::TRENDING
    }

    async fn search(&self, query: &SearchQuery) -> Result<ProviderResult, SourceError> {
        let q = Self::build_search_query(&query.keyword);
        tracing::debug!(source = "github", %q, "Searching repositories");

        let (total, items) = self.search_repositories(&q).await?;
        tracing::info!(source = "github", total, returned = items.len(), "GitHub search complete");

        Ok(ProviderResult::new(items, total, 1, 1))
    }

    async fn trending(&self, window: &TrendingWindow) -> Result<Vec<SearchResult>, SourceError> {
        let q = Self::build_trending_query(window);
        tracing::debug!(source = "github", %q, "Fetching trending repositories");

        let (_, items) = self.search_repositories(&q).await?;
        Ok(items)
    }
}

#[derive(Debug, Deserialize)]
struct RepoSearchResponse {
    total_count: u64,
    #[serde(default)]
    items: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct Repository {
    id: u64,
    name: String,
    #[serde(default)]
    full_name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    html_url: String,
    #[serde(default)]
    stargazers_count: u64,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn repo_json(id: u64) -> serde_json::Value {
        json!({
            "id": id,
            "name": format!("repo-{}", id),
            "full_name": format!("owner/repo-{}", id),
            "description": "A library for transformers",
            "html_url": format!("https://github.com/owner/repo-{}", id),
            "stargazers_count": 1000 - id,
            "language": "Python",
            "created_at": "2023-06-01T12:00:00Z",
            "updated_at": "2024-02-01T08:30:00Z"
        })
    }

    fn source(server: &mockito::ServerGuard, token: Option<&str>) -> GitHubSource {
        GitHubSource::new(
            Arc::new(HttpClient::new().unwrap()),
            token.map(str::to_string),
        )
        .with_base_url(server.url())
        .with_retry(RetryConfig::none())
    }

    #[test]
    fn test_build_search_query() {
        assert_eq!(
            GitHubSource::build_search_query(" transformers "),
            "transformers in:name,description,readme"
        );

        let default = GitHubSource::build_search_query("");
        assert!(default.starts_with("stars:>100 "));
        assert!(default.contains("topic:machine-learning"));
    }

    #[test]
    fn test_build_trending_query() {
        let now = "2024-05-20T00:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let q = GitHubSource::build_trending_query(&TrendingWindow::ending_at(now, 7));
        assert!(q.starts_with("created:>=2024-05-13 stars:>10 "));
        assert!(q.ends_with("in:name,description,readme"));
    }

    #[tokio::test]
    async fn test_search_caps_items_and_reports_full_total() {
        let mut server = mockito::Server::new_async().await;
        let items: Vec<_> = (1..=12).map(repo_json).collect();
        let mock = server
            .mock("GET", "/search/repositories")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded(
                    "q".into(),
                    "transformers in:name,description,readme".into(),
                ),
                Matcher::UrlEncoded("sort".into(), "stars".into()),
                Matcher::UrlEncoded("order".into(), "desc".into()),
                Matcher::UrlEncoded("per_page".into(), "10".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({ "total_count": 37, "items": items }).to_string())
            .create_async()
            .await;

        let result = source(&server, None)
            .search(&SearchQuery::new("transformers").page(2, 50))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(result.total, 37);
        assert_eq!(result.items.len(), 10);
        assert_eq!(result.pages, 1);
        assert_eq!(result.current_page, 1);

        let first = &result.items[0];
        assert_eq!(first.title, "owner/repo-1");
        assert_eq!(first.source_type, SourceType::CodeRepo);
        assert_eq!(first.url, "https://github.com/owner/repo-1");
        match &first.metadata {
            ResultMetadata::CodeRepo {
                stars,
                language,
                created_at,
                ..
            } => {
                assert_eq!(*stars, 999);
                assert_eq!(language.as_deref(), Some("Python"));
                assert!(created_at.is_some());
            }
            other => panic!("unexpected metadata: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_record_is_skipped() {
        let mut server = mockito::Server::new_async().await;
        let body = json!({
            "total_count": 3,
            "items": [repo_json(1), { "id": "not-a-number" }, repo_json(3)]
        });
        server
            .mock("GET", "/search/repositories")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(body.to_string())
            .create_async()
            .await;

        let result = source(&server, None)
            .search(&SearchQuery::new("rust"))
            .await
            .unwrap();

        assert_eq!(result.total, 3);
        let ids: Vec<&str> = result.items.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
    }

    #[tokio::test]
    async fn test_token_is_sent_as_bearer() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/search/repositories")
            .match_query(Matcher::Any)
            .match_header("authorization", "Bearer ghp_secret")
            .with_status(200)
            .with_body(json!({ "total_count": 0, "items": [] }).to_string())
            .create_async()
            .await;

        let result = source(&server, Some("ghp_secret"))
            .search(&SearchQuery::new("rust"))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(result.total, 0);
        assert!(result.items.is_empty());
    }

    #[tokio::test]
    async fn test_rate_limit_is_reported() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/search/repositories")
            .match_query(Matcher::Any)
            .with_status(403)
            .with_header("x-ratelimit-remaining", "0")
            .with_body(r#"{"message": "API rate limit exceeded"}"#)
            .create_async()
            .await;

        let err = source(&server, None)
            .search(&SearchQuery::new("rust"))
            .await
            .unwrap_err();

        assert!(matches!(err, SourceError::RateLimit));
    }

    #[tokio::test]
    async fn test_server_error_carries_message() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/search/repositories")
            .match_query(Matcher::Any)
            .with_status(422)
            .with_body(r#"{"message": "Validation Failed"}"#)
            .create_async()
            .await;

        let err = source(&server, None)
            .search(&SearchQuery::new("rust"))
            .await
            .unwrap_err();

        match err {
            SourceError::Api { status, message } => {
                assert_eq!(status, 422);
                assert_eq!(message, "Validation Failed");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_invalid_json_is_a_parse_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/search/repositories")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("<html>maintenance</html>")
            .create_async()
            .await;

        let err = source(&server, None)
            .search(&SearchQuery::new("rust"))
            .await
            .unwrap_err();

        assert!(matches!(err, SourceError::Parse(_)));
    }
}
