//! Read-only access to the curated resource catalog.
//!
//! Persistence and moderation live elsewhere; search only needs
//! [`Catalog::search_approved`]. [`InMemoryCatalog`] is the implementation
//! shipped with the binary, seeded from a JSON file.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::models::Pagination;

/// A catalog row as the search core sees it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub url: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub is_approved: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Username of the submitter, if known
    #[serde(default)]
    pub submitter: Option<String>,
}

impl CatalogEntry {
    /// Case-insensitive substring match on title and description.
    ///
    /// `needle` must already be lowercase.
    fn matches(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
            || self
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(needle))
    }
}

/// One page of matching entries plus the overall match count
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogPage {
    pub entries: Vec<CatalogEntry>,
    pub total: u64,
}

/// Errors raised by a catalog backend
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid catalog data: {0}")]
    Invalid(#[from] serde_json::Error),

    #[error("Catalog unavailable: {0}")]
    Unavailable(String),
}

/// Keyword search over approved catalog entries
#[async_trait]
pub trait Catalog: Send + Sync + std::fmt::Debug {
    /// Approved entries whose title or description contains `keyword`
    /// (case-insensitive), newest first, restricted to the requested page.
    async fn search_approved(
        &self,
        keyword: &str,
        pagination: Pagination,
    ) -> Result<CatalogPage, CatalogError>;
}

/// Catalog held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    entries: Vec<CatalogEntry>,
}

impl InMemoryCatalog {
    /// Create a catalog from entries
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    /// Load a JSON array of entries
    pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path)?;
        let entries: Vec<CatalogEntry> = serde_json::from_str(&content)?;
        tracing::info!(path = %path.display(), entries = entries.len(), "Loaded catalog");
        Ok(Self::new(entries))
    }

    /// Number of entries, approved or not
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl Catalog for InMemoryCatalog {
    async fn search_approved(
        &self,
        keyword: &str,
        pagination: Pagination,
    ) -> Result<CatalogPage, CatalogError> {
        let needle = keyword.to_lowercase();

        let mut matches: Vec<&CatalogEntry> = self
            .entries
            .iter()
            .filter(|e| e.is_approved && e.matches(&needle))
            .collect();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matches.len() as u64;
        let entries = matches
            .into_iter()
            .skip(pagination.offset())
            .take(pagination.per_page as usize)
            .cloned()
            .collect();

        Ok(CatalogPage { entries, total })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn entry(id: u64, title: &str, description: Option<&str>, approved: bool) -> CatalogEntry {
        let created = "2024-01-01T00:00:00Z".parse::<DateTime<Utc>>().unwrap()
            + Duration::hours(id as i64);
        CatalogEntry {
            id,
            title: title.to_string(),
            description: description.map(str::to_string),
            url: format!("https://example.com/{}", id),
            category: Some("course".to_string()),
            is_approved: approved,
            created_at: created,
            updated_at: created,
            submitter: None,
        }
    }

    #[tokio::test]
    async fn test_matches_title_and_description_case_insensitively() {
        let catalog = InMemoryCatalog::new(vec![
            entry(1, "Intro to Transformers", None, true),
            entry(2, "Vision course", Some("covers TRANSFORMERS too"), true),
            entry(3, "Unrelated", Some("nothing here"), true),
        ]);

        let page = catalog
            .search_approved("transformers", Pagination::new(1, 20))
            .await
            .unwrap();

        assert_eq!(page.total, 2);
        let ids: Vec<u64> = page.entries.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![2, 1], "newest first");
    }

    #[tokio::test]
    async fn test_unapproved_entries_are_hidden() {
        let catalog = InMemoryCatalog::new(vec![
            entry(1, "Rust book", None, false),
            entry(2, "Rust by example", None, true),
        ]);

        let page = catalog
            .search_approved("rust", Pagination::new(1, 20))
            .await
            .unwrap();

        assert_eq!(page.total, 1);
        assert_eq!(page.entries[0].id, 2);
    }

    #[tokio::test]
    async fn test_page_past_the_end_is_empty() {
        let catalog = InMemoryCatalog::new(vec![entry(1, "Rust", None, true)]);

        let page = catalog
            .search_approved("rust", Pagination::new(4, 20))
            .await
            .unwrap();

        assert_eq!(page.total, 1);
        assert!(page.entries.is_empty());
    }

    #[test]
    fn test_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        std::fs::write(
            &path,
            r#"[{"id": 7, "title": "Deep Learning Book", "url": "https://example.com/dl",
                "is_approved": true, "created_at": "2024-01-01T00:00:00Z",
                "updated_at": "2024-01-02T00:00:00Z", "submitter": "alice"}]"#,
        )
        .unwrap();

        let catalog = InMemoryCatalog::from_path(&path).unwrap();
        assert_eq!(catalog.len(), 1);

        let missing = InMemoryCatalog::from_path(&dir.path().join("missing.json"));
        assert!(matches!(missing, Err(CatalogError::Io(_))));
    }
}
