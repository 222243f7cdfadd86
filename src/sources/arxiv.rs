//! arXiv preprint source backed by the Atom export API.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::reader::NsReader;
use std::sync::Arc;

use crate::models::{
    ProviderResult, ResultMetadata, SearchQuery, SearchResult, SourceType, TrendingWindow,
};
use crate::sources::{Source, SourceCapabilities, SourceError, EXTERNAL_RESULT_CAP};
use crate::utils::{
    collapse_whitespace, truncate_words, with_retry, HttpClient, RetryConfig, DEFAULT_MAX_WORDS,
};

/// Base URL for arXiv API
pub const ARXIV_API_URL: &str = "http://export.arxiv.org/api/query";

/// Subject categories every arXiv query is restricted to
pub const ARXIV_CATEGORY_FILTER: &str = "cat:cs.AI OR cat:cs.LG OR cat:cs.CL OR cat:stat.ML";

const ATOM_NS: &[u8] = b"http://www.w3.org/2005/Atom";

/// arXiv preprint search
///
/// Supports:
/// - Keyword search restricted to the AI/ML categories
/// - Trending (recent submissions, filtered locally by publication date)
#[derive(Debug, Clone)]
pub struct ArxivSource {
    client: Arc<HttpClient>,
    base_url: String,
    retry: RetryConfig,
}

impl ArxivSource {
    /// Create a new arXiv source
    pub fn new(client: Arc<HttpClient>) -> Self {
        Self {
            client,
            base_url: ARXIV_API_URL.to_string(),
            retry: RetryConfig::default(),
        }
    }

    /// Point the source at a different query endpoint
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the retry policy
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Build the `search_query` parameter
    pub fn build_search_query(keyword: &str) -> String {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            format!("({})", ARXIV_CATEGORY_FILTER)
        } else {
            format!("all:{} AND ({})", keyword, ARXIV_CATEGORY_FILTER)
        }
    }

    fn query_url(&self, search_query: &str) -> String {
        format!(
            "{}?search_query={}&start=0&max_results={}&sortBy=submittedDate&sortOrder=descending",
            self.base_url,
            urlencoding::encode(search_query),
            EXTERNAL_RESULT_CAP
        )
    }

    async fn fetch_feed(&self, search_query: &str) -> Result<Vec<SearchResult>, SourceError> {
        let url = self.query_url(search_query);
        let client = &self.client;
        let url = url.as_str();

        let body = with_retry(self.retry, || async move {
            let response = client
                .get(url)
                .send()
                .await
                .map_err(|e| SourceError::Network(format!("Failed to reach arXiv: {}", e)))?;

            let status = response.status();
            if !status.is_success() {
                return Err(SourceError::Api {
                    status: status.as_u16(),
                    message: format!("arXiv returned {}", status),
                });
            }

            Ok(response.text().await?)
        })
        .await?;

        let mut items = parse_feed(&body)?;
        items.truncate(EXTERNAL_RESULT_CAP);
        Ok(items)
    }
}

#[async_trait]
impl Source for ArxivSource {
    fn source_type(&self) -> SourceType {
        SourceType::Preprint
    }

    fn capabilities(&self) -> SourceCapabilities {
        SourceCapabilities::SEARCH | SourceCapabilities::TRENDING
    }

    async fn search(&self, query: &SearchQuery) -> Result<ProviderResult, SourceError> {
        let search_query = Self::build_search_query(&query.keyword);
        tracing::debug!(source = "arxiv", query = %search_query, "Searching preprints");

        let items = self.fetch_feed(&search_query).await?;
        let total = items.len() as u64;
        tracing::info!(source = "arxiv", total, "arXiv search complete");

        Ok(ProviderResult::new(items, total, 1, 1))
    }

    async fn trending(&self, window: &TrendingWindow) -> Result<Vec<SearchResult>, SourceError> {
        let items = self.fetch_feed(&Self::build_search_query("")).await?;

        // The API has no recency filter, so the window is applied here
        Ok(items
            .into_iter()
            .filter(|item| item.metadata.timestamp().is_some_and(|t| window.contains(t)))
            .collect())
    }
}

/// Fields collected while walking one `<entry>`
#[derive(Debug, Default)]
struct EntryFields {
    id: Option<String>,
    title: Option<String>,
    summary: Option<String>,
    published: Option<String>,
    alternate_link: Option<String>,
    first_link: Option<String>,
    authors: Vec<String>,
}

impl EntryFields {
    fn add_link(&mut self, element: &BytesStart<'_>) {
        let mut href = None;
        let mut rel = None;
        for attr in element.attributes().flatten() {
            let Ok(value) = attr.unescape_value() else {
                continue;
            };
            match attr.key.as_ref() {
                b"href" => href = Some(value.into_owned()),
                b"rel" => rel = Some(value.into_owned()),
                _ => {}
            }
        }

        let Some(href) = href else { return };
        if self.first_link.is_none() {
            self.first_link = Some(href.clone());
        }
        if rel.as_deref() == Some("alternate") && self.alternate_link.is_none() {
            self.alternate_link = Some(href);
        }
    }

    fn into_result(self) -> Option<SearchResult> {
        let raw_id = self.id.filter(|s| !s.trim().is_empty())?;
        let title = self
            .title
            .map(|t| collapse_whitespace(&t))
            .filter(|t| !t.is_empty())?;
        let url = self.alternate_link.or(self.first_link)?;

        let raw_id = raw_id.trim();
        let id = raw_id
            .rsplit_once("/abs/")
            .map(|(_, tail)| tail)
            .unwrap_or(raw_id)
            .to_string();

        let description = self
            .summary
            .map(|s| truncate_words(s.trim(), DEFAULT_MAX_WORDS))
            .unwrap_or_default();

        let published = self.published.and_then(|p| {
            DateTime::parse_from_rfc3339(p.trim())
                .ok()
                .map(|d| d.with_timezone(&Utc))
        });

        Some(SearchResult::new(
            id,
            title,
            description,
            url,
            ResultMetadata::Preprint {
                authors: self.authors,
                published,
            },
        ))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Id,
    Title,
    Summary,
    Published,
    AuthorName,
}

fn is_atom(ns: &ResolveResult<'_>) -> bool {
    matches!(ns, ResolveResult::Bound(n) if n.as_ref() == ATOM_NS)
}

fn xml_error(e: impl std::fmt::Display) -> SourceError {
    SourceError::Parse(format!("Invalid arXiv feed: {}", e))
}

/// Parse an arXiv Atom feed into results, in feed order.
///
/// The document root must be an Atom `feed`. Entries without an id, title
/// or link are dropped.
pub(crate) fn parse_feed(xml: &str) -> Result<Vec<SearchResult>, SourceError> {
    let mut reader = NsReader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut seen_root = false;
    let mut items = Vec::new();
    let mut entry: Option<EntryFields> = None;
    let mut field: Option<Field> = None;
    let mut in_author = false;

    loop {
        let (ns, event) = reader.read_resolved_event().map_err(xml_error)?;

        match event {
            Event::Start(ref e) | Event::Empty(ref e) if !seen_root => {
                if !(is_atom(&ns) && e.local_name().as_ref() == b"feed") {
                    return Err(SourceError::Parse(
                        "Response is not an Atom feed".to_string(),
                    ));
                }
                seen_root = true;
            }
            Event::Start(ref e) => {
                if !is_atom(&ns) {
                    continue;
                }
                let name = e.local_name();
                let Some(fields) = entry.as_mut() else {
                    if name.as_ref() == b"entry" {
                        entry = Some(EntryFields::default());
                    }
                    continue;
                };
                match name.as_ref() {
                    b"id" if !in_author => field = Some(Field::Id),
                    b"title" => field = Some(Field::Title),
                    b"summary" => field = Some(Field::Summary),
                    b"published" => field = Some(Field::Published),
                    b"author" => in_author = true,
                    b"name" if in_author => field = Some(Field::AuthorName),
                    b"link" => fields.add_link(e),
                    _ => {}
                }
            }
            Event::Empty(ref e) => {
                if let Some(fields) = entry.as_mut() {
                    if is_atom(&ns) && e.local_name().as_ref() == b"link" {
                        fields.add_link(e);
                    }
                }
            }
            Event::Text(ref e) => {
                let (Some(fields), Some(current)) = (entry.as_mut(), field) else {
                    continue;
                };
                let text = e.unescape().map_err(xml_error)?;
                append_field(fields, current, &text);
            }
            Event::CData(ref e) => {
                let (Some(fields), Some(current)) = (entry.as_mut(), field) else {
                    continue;
                };
                append_field(fields, current, &String::from_utf8_lossy(e));
            }
            Event::End(ref e) => {
                if !is_atom(&ns) {
                    continue;
                }
                match e.local_name().as_ref() {
                    b"entry" => {
                        if let Some(fields) = entry.take() {
                            match fields.into_result() {
                                Some(result) => items.push(result),
                                None => tracing::debug!(
                                    source = "arxiv",
                                    "Skipping entry without id, title or link"
                                ),
                            }
                        }
                        field = None;
                        in_author = false;
                    }
                    b"author" => {
                        in_author = false;
                        field = None;
                    }
                    _ => field = None,
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !seen_root {
        return Err(SourceError::Parse("Empty arXiv response".to_string()));
    }

    Ok(items)
}

fn append_field(fields: &mut EntryFields, field: Field, text: &str) {
    let slot = match field {
        Field::Id => &mut fields.id,
        Field::Title => &mut fields.title,
        Field::Summary => &mut fields.summary,
        Field::Published => &mut fields.published,
        Field::AuthorName => {
            let name = text.trim();
            if !name.is_empty() {
                fields.authors.push(name.to_string());
            }
            return;
        }
    };
    let value = slot.get_or_insert_with(String::new);
    if !value.is_empty() {
        value.push(' ');
    }
    value.push_str(text);
}
