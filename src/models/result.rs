//! Canonical search result shared by every source.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The kind of source a result came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    /// The curated resource catalog
    Local,
    /// A code-hosting repository (GitHub)
    CodeRepo,
    /// A preprint (arXiv)
    Preprint,
}

impl SourceType {
    /// Returns the display name of the source
    pub fn name(&self) -> &'static str {
        match self {
            SourceType::Local => "Resource catalog",
            SourceType::CodeRepo => "GitHub",
            SourceType::Preprint => "arXiv",
        }
    }

    /// Returns the key used for this source in aggregate responses and routes
    pub fn id(&self) -> &'static str {
        match self {
            SourceType::Local => "local",
            SourceType::CodeRepo => "github",
            SourceType::Preprint => "arxiv",
        }
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Source-specific metadata attached to a [`SearchResult`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResultMetadata {
    Local {
        category: Option<String>,
        is_approved: bool,
        submitter: Option<String>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    },
    CodeRepo {
        stars: u64,
        language: Option<String>,
        created_at: Option<DateTime<Utc>>,
        updated_at: Option<DateTime<Utc>>,
    },
    Preprint {
        authors: Vec<String>,
        published: Option<DateTime<Utc>>,
    },
}

impl ResultMetadata {
    /// The timestamp used to decide whether a result is recent.
    ///
    /// Repositories use their creation time, preprints their publication time.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            ResultMetadata::Local { created_at, .. } => Some(*created_at),
            ResultMetadata::CodeRepo { created_at, .. } => *created_at,
            ResultMetadata::Preprint { published, .. } => *published,
        }
    }
}

/// A search hit from any source, in canonical form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Source-local identifier (catalog row id, repository id, feed entry id)
    pub id: String,

    /// Non-empty title
    pub title: String,

    /// Description, already word-truncated at ingestion
    pub description: String,

    /// Link to the resource
    pub url: String,

    /// Where this result came from
    pub source_type: SourceType,

    /// Source-specific details
    pub metadata: ResultMetadata,
}

impl SearchResult {
    /// Create a new result
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        url: impl Into<String>,
        metadata: ResultMetadata,
    ) -> Self {
        let source_type = match metadata {
            ResultMetadata::Local { .. } => SourceType::Local,
            ResultMetadata::CodeRepo { .. } => SourceType::CodeRepo,
            ResultMetadata::Preprint { .. } => SourceType::Preprint,
        };

        Self {
            id: id.into(),
            title: title.into(),
            description: description.into(),
            url: url.into(),
            source_type,
            metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_type_serialization() {
        assert_eq!(
            serde_json::to_string(&SourceType::CodeRepo).unwrap(),
            "\"code_repo\""
        );
        assert_eq!(serde_json::to_string(&SourceType::Local).unwrap(), "\"local\"");
        assert_eq!(SourceType::Preprint.id(), "arxiv");
        assert_eq!(SourceType::CodeRepo.to_string(), "GitHub");
    }

    #[test]
    fn test_source_type_follows_metadata() {
        let result = SearchResult::new(
            "42",
            "owner/repo",
            "",
            "https://github.com/owner/repo",
            ResultMetadata::CodeRepo {
                stars: 7,
                language: Some("Rust".to_string()),
                created_at: None,
                updated_at: None,
            },
        );
        assert_eq!(result.source_type, SourceType::CodeRepo);

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["source_type"], "code_repo");
        assert_eq!(json["metadata"]["stars"], 7);
        assert_eq!(json["metadata"]["language"], "Rust");
    }

    #[test]
    fn test_preprint_metadata_keeps_author_order() {
        let metadata = ResultMetadata::Preprint {
            authors: vec!["Vaswani".to_string(), "Shazeer".to_string()],
            published: None,
        };
        let json = serde_json::to_value(&metadata).unwrap();
        assert_eq!(json["authors"][0], "Vaswani");
        assert_eq!(json["authors"][1], "Shazeer");
        assert!(metadata.timestamp().is_none());
    }
}
