//! Local resource catalog source.

use async_trait::async_trait;
use std::sync::Arc;

use crate::catalog::{Catalog, CatalogEntry};
use crate::models::{ProviderResult, ResultMetadata, SearchQuery, SearchResult, SourceType};
use crate::sources::{Source, SourceError};
use crate::utils::{truncate_words, DEFAULT_MAX_WORDS};

/// Keyword search over approved catalog entries, fully paginated.
///
/// The catalog is an in-process dependency: its failures come back as
/// [`SourceError::Upstream`] and fail the whole request.
#[derive(Debug, Clone)]
pub struct LocalCatalogProvider {
    catalog: Arc<dyn Catalog>,
}

impl LocalCatalogProvider {
    /// Create a provider over the given catalog
    pub fn new(catalog: Arc<dyn Catalog>) -> Self {
        Self { catalog }
    }

    fn map_entry(entry: CatalogEntry) -> SearchResult {
        let description = entry
            .description
            .as_deref()
            .map(|d| truncate_words(d, DEFAULT_MAX_WORDS))
            .unwrap_or_default();

        SearchResult::new(
            entry.id.to_string(),
            entry.title,
            description,
            entry.url,
            ResultMetadata::Local {
                category: entry.category,
                is_approved: entry.is_approved,
                submitter: entry.submitter,
                created_at: entry.created_at,
                updated_at: entry.updated_at,
            },
        )
    }
}

#[async_trait]
impl Source for LocalCatalogProvider {
    fn source_type(&self) -> SourceType {
        SourceType::Local
    }

    async fn search(&self, query: &SearchQuery) -> Result<ProviderResult, SourceError> {
        let pagination = query.pagination;

        if query.is_empty() {
            return Ok(ProviderResult::empty(pagination.page));
        }

        let page = self
            .catalog
            .search_approved(query.trimmed(), pagination)
            .await
            .map_err(|e| SourceError::Upstream(e.to_string()))?;

        tracing::debug!(
            source = "local",
            query = query.trimmed(),
            total = page.total,
            "Catalog search complete"
        );

        let items = page.entries.into_iter().map(Self::map_entry).collect();
        Ok(ProviderResult::new(
            items,
            page.total,
            pagination.page_count(page.total),
            pagination.page,
        ))
    }
}
