use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::engine::EngineError;
use crate::models::{
    AggregateResult, Pagination, ProviderResult, SearchQuery, SearchResult, SourceType,
};

use super::auth::Caller;
use super::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api", search_routes())
        .with_state(state)
}

fn search_routes() -> Router<AppState> {
    Router::new()
        .route("/search", get(search_local))
        .route("/search/github", get(search_github))
        .route("/search/arxiv", get(search_arxiv))
        .route("/search/github/trending", get(github_trending))
        .route("/search/arxiv/trending", get(arxiv_trending))
        .route("/search/all", get(search_all))
}

/// Raw query parameters. Numbers stay strings so bad input falls back to defaults.
#[derive(Debug, Default, Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: Option<String>,
    #[serde(default)]
    page: Option<String>,
    #[serde(default)]
    per_page: Option<String>,
}

impl SearchParams {
    fn into_query(self, state: &AppState) -> SearchQuery {
        let pagination = Pagination::clamped(
            parse_number(self.page.as_deref()),
            parse_number(self.per_page.as_deref()),
            state.default_per_page,
            state.max_per_page,
        );
        SearchQuery::new(self.q.unwrap_or_default()).pagination(pagination)
    }

    /// Catalog query: every match on one page unless the caller asked for paging
    fn into_catalog_query(self, state: &AppState) -> SearchQuery {
        if self.page.is_some() || self.per_page.is_some() {
            return self.into_query(state);
        }
        SearchQuery::new(self.q.unwrap_or_default()).pagination(Pagination::unbounded())
    }
}

fn parse_number(value: Option<&str>) -> Option<u32> {
    value.and_then(|v| v.trim().parse().ok())
}

#[derive(Debug, Serialize)]
struct ResourcesResponse {
    resources: Vec<SearchResult>,
}

#[derive(Debug, Serialize)]
struct TrendingResponse {
    items: Vec<SearchResult>,
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn search_local(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<ResourcesResponse>, ApiError> {
    let query = params.into_catalog_query(&state);
    let result = state.engine.search_single(SourceType::Local, &query).await?;
    Ok(Json(ResourcesResponse {
        resources: result.items,
    }))
}

async fn search_github(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<ProviderResult>, ApiError> {
    let query = params.into_query(&state);
    let result = state.engine.search_single(SourceType::CodeRepo, &query).await?;
    Ok(Json(result))
}

async fn search_arxiv(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<ProviderResult>, ApiError> {
    let query = params.into_query(&state);
    let result = state.engine.search_single(SourceType::Preprint, &query).await?;
    Ok(Json(result))
}

async fn github_trending(State(state): State<AppState>) -> Json<TrendingResponse> {
    Json(TrendingResponse {
        items: state.trending.trending(SourceType::CodeRepo).await,
    })
}

async fn arxiv_trending(State(state): State<AppState>) -> Json<TrendingResponse> {
    Json(TrendingResponse {
        items: state.trending.trending(SourceType::Preprint).await,
    })
}

async fn search_all(
    caller: Caller,
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<AggregateResult>, ApiError> {
    let query = params.into_query(&state);
    tracing::debug!(caller = %caller.name, query = query.trimmed(), "Aggregate search requested");
    let result = state.engine.search_all(&query).await?;
    Ok(Json(result))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error_code: String,
    error: String,
    items: Vec<SearchResult>,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    error_code: String,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            error_code: error_code.into(),
            message: message.into(),
        }
    }

    pub fn unauthorized() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            "unauthorized",
            "A valid bearer token is required.",
        )
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match &err {
            EngineError::Catalog(_) => {
                tracing::error!(error = %err, "Catalog failure");
                ApiError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "catalog_unavailable",
                    err.to_string(),
                )
            }
            EngineError::Provider { .. } => {
                ApiError::new(StatusCode::BAD_GATEWAY, "provider_unavailable", err.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error_code: self.error_code,
            error: self.message,
            items: Vec::new(),
        };
        (self.status, Json(body)).into_response()
    }
}
