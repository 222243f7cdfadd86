use std::sync::Arc;

use crate::catalog::{Catalog, CatalogError, InMemoryCatalog};
use crate::config::Config;
use crate::engine::{AggregationEngine, TrendingEngine};
use crate::models::{DEFAULT_PER_PAGE, MAX_PER_PAGE};
use crate::sources::SourceError;

use super::auth::{IdentityProvider, StaticTokenIdentity};

/// Errors raised while assembling the server state
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Failed to load catalog: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Failed to build sources: {0}")]
    Source(#[from] SourceError),
}

/// Shared state handed to every handler
#[derive(Debug, Clone)]
pub struct AppState {
    pub engine: Arc<AggregationEngine>,
    pub trending: Arc<TrendingEngine>,
    pub identity: Arc<dyn IdentityProvider>,
    pub default_per_page: u32,
    pub max_per_page: u32,
}

impl AppState {
    pub fn new(
        engine: AggregationEngine,
        trending: TrendingEngine,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            engine: Arc::new(engine),
            trending: Arc::new(trending),
            identity,
            default_per_page: DEFAULT_PER_PAGE,
            max_per_page: MAX_PER_PAGE,
        }
    }

    /// Override the page-size defaults applied to query parameters
    pub fn with_page_limits(mut self, default_per_page: u32, max_per_page: u32) -> Self {
        self.max_per_page = max_per_page.max(1);
        self.default_per_page = default_per_page.clamp(1, self.max_per_page);
        self
    }

    /// Build the full state from configuration
    pub fn from_config(config: &Config) -> Result<Self, StartupError> {
        let catalog: Arc<dyn Catalog> = match &config.catalog.path {
            Some(path) => Arc::new(InMemoryCatalog::from_path(path)?),
            None => {
                tracing::warn!("No catalog path configured; local search will return nothing");
                Arc::new(InMemoryCatalog::default())
            }
        };

        let engine = AggregationEngine::from_config(config, catalog)?;
        let trending = engine.trending_engine(config.sources.trending_window_days);
        let identity = Arc::new(StaticTokenIdentity::from_config(&config.auth));

        Ok(Self::new(engine, trending, identity)
            .with_page_limits(config.server.default_per_page, config.server.max_per_page))
    }
}
