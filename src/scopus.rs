//! Scopus API client.
//!
//! Thin wrapper over the Elsevier search and retrieval endpoints. Every call
//! is a single GET: no paging, no retries. Responses are handed to the
//! parsers in [`crate::normalize`] and [`crate::retrieval`].

use crate::error::{Result, ScopusError};
use crate::extract::RecordKind;
use crate::normalize::{normalize, SearchResultTable};
use crate::retrieval::{
    parse_abstract_retrieval, parse_affiliation_retrieval, parse_author_retrieval,
    parse_citation_overview, parse_serial, year_span, AbstractRecord, AffiliationProfile,
    AuthorProfile, CitationRow, SerialTables,
};
use reqwest::header::ACCEPT;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Elsevier API host
pub const DEFAULT_BASE_URL: &str = "https://api.elsevier.com";

const SEARCH_PATH: &str = "/content/search/scopus";
const AUTHOR_SEARCH_PATH: &str = "/content/search/author";
const AUTHOR_PATH: &str = "/content/author/author_id";
const ABSTRACT_PATH: &str = "/content/abstract/scopus_id";
const AFFILIATION_PATH: &str = "/content/affiliation/affiliation_id";
const SERIAL_PATH: &str = "/content/serial/title";
const CITATION_PATH: &str = "/content/abstract/citations";

/// Header carrying the API key
const API_KEY_HEADER: &str = "X-ELS-APIKey";

const JSON: &str = "application/json";

/// Wait suggested to callers when Scopus does not send `Retry-After`
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Parameters of a single search request.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    /// Scopus query string, e.g. `TITLE-ABS-KEY(mouse OR rat)`
    pub query: String,
    pub kind: RecordKind,
    /// Result view; author searches always use `STANDARD`
    pub view: Option<String>,
    /// Comma-separated field list
    pub fields: Option<String>,
    /// Publication year range, e.g. `2018-2022`
    pub date: Option<String>,
    /// Zero-based index of the first result
    pub start: u32,
    /// Page size
    pub count: Option<u32>,
}

impl SearchQuery {
    pub fn new(query: impl Into<String>, kind: RecordKind) -> Self {
        Self {
            query: query.into(),
            kind,
            view: None,
            fields: None,
            date: None,
            start: 0,
            count: None,
        }
    }
}

/// Scopus API client
pub struct ScopusClient {
    client: reqwest::Client,
    api_key: String,
    base_url: Url,
}

impl ScopusClient {
    /// Create a new ScopusClient
    ///
    /// # Arguments
    ///
    /// * `api_key` - Elsevier API key
    /// * `base_url` - API host, normally [`DEFAULT_BASE_URL`]
    pub fn new(api_key: impl Into<String>, base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ScopusError::Config(format!("Invalid base URL '{}': {}", base_url, e)))?;

        let client = reqwest::Client::builder()
            .user_agent(concat!("rustscopus/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ScopusError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url,
        })
    }

    /// Build the request URL for a search
    pub fn search_url(&self, query: &SearchQuery) -> Result<Url> {
        let (path, view) = match query.kind {
            RecordKind::Article => (SEARCH_PATH, query.view.as_deref()),
            RecordKind::Author => (AUTHOR_SEARCH_PATH, Some("STANDARD")),
        };

        let mut url = self.endpoint(path)?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("query", &query.query);
            pairs.append_pair("start", &query.start.to_string());
            if let Some(count) = query.count {
                pairs.append_pair("count", &count.to_string());
            }
            if let Some(view) = view {
                pairs.append_pair("view", view);
            }
            if let Some(fields) = &query.fields {
                pairs.append_pair("field", fields);
            }
            if let Some(date) = &query.date {
                pairs.append_pair("date", date);
            }
        }
        Ok(url)
    }

    /// Run a search and return the raw response document
    pub async fn search(&self, query: &SearchQuery) -> Result<Value> {
        info!(
            query = %query.query,
            kind = %query.kind,
            start = query.start,
            "Starting Scopus search"
        );
        let url = self.search_url(query)?;
        self.get_json(url).await
    }

    /// Run a search and normalize the response into a table
    ///
    /// Returns the table and the total result count Scopus reports.
    pub async fn search_table(&self, query: &SearchQuery) -> Result<(SearchResultTable, u64)> {
        let response = self.search(query).await?;
        normalize(&response, query.kind)
    }

    /// Retrieve an author profile
    pub async fn author(&self, author_id: &str) -> Result<AuthorProfile> {
        let mut url = self.resource(AUTHOR_PATH, author_id)?;
        url.query_pairs_mut().append_pair("view", "ENHANCED");
        let response = self.get_json(url).await?;
        parse_author_retrieval(&response)
    }

    /// Retrieve the abstract record of a document
    pub async fn abstract_record(&self, scopus_id: &str) -> Result<AbstractRecord> {
        let url = self.resource(ABSTRACT_PATH, scopus_id)?;
        let response = self.get_json(url).await?;
        parse_abstract_retrieval(&response)
    }

    /// Retrieve an affiliation profile
    pub async fn affiliation(&self, affiliation_id: &str) -> Result<AffiliationProfile> {
        let url = self.resource(AFFILIATION_PATH, affiliation_id)?;
        let response = self.get_json(url).await?;
        parse_affiliation_retrieval(&response)
    }

    /// Serial title metadata, CiteScores and subject ranks for an ISSN
    pub async fn serial(&self, issn: &str) -> Result<SerialTables> {
        let mut url = self.endpoint(SERIAL_PATH)?;
        url.query_pairs_mut()
            .append_pair("issn", issn)
            .append_pair("view", "ENHANCED");
        let response = self.get_json(url).await?;
        parse_serial(&response)
    }

    /// Yearly citation counts for documents over an inclusive year range
    pub async fn citation_overview(
        &self,
        scopus_ids: &[String],
        year_range: (i32, i32),
    ) -> Result<Vec<CitationRow>> {
        year_span(year_range)?;
        if scopus_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut url = self.endpoint(CITATION_PATH)?;
        url.query_pairs_mut()
            .append_pair("scopus_id", &scopus_ids.join(","))
            .append_pair("date", &format!("{}-{}", year_range.0, year_range.1));

        let response = self.get_json(url).await?;
        let rows = parse_citation_overview(&response, year_range)?;
        info!(requested = scopus_ids.len(), rows = rows.len(), "Citation overview parsed");
        Ok(rows)
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| ScopusError::Config(format!("Invalid endpoint '{}': {}", path, e)))
    }

    /// Endpoint with `id` appended as one percent-encoded path segment
    fn resource(&self, path: &str, id: &str) -> Result<Url> {
        let mut url = self.endpoint(path)?;
        url.path_segments_mut()
            .map_err(|_| ScopusError::Config(format!("Cannot append '{}' to {}", id, path)))?
            .pop_if_empty()
            .push(id);
        Ok(url)
    }

    async fn get_json(&self, url: Url) -> Result<Value> {
        debug!(path = url.path(), "Requesting Scopus");

        let response = self
            .client
            .get(url)
            .header(ACCEPT, JSON)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
            warn!(retry_after = retry_after, "Rate limited by Scopus");
            return Err(ScopusError::RateLimited(retry_after));
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), error = %error_text, "API error");
            return Err(ScopusError::Api {
                code: status.as_u16() as i32,
                message: format!("Scopus API error: {} - {}", status, error_text),
            });
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Err(ScopusError::EmptyResponse);
        }

        Ok(serde_json::from_str(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> ScopusClient {
        ScopusClient::new("test-key", DEFAULT_BASE_URL).unwrap()
    }

    #[test]
    fn test_search_url_article() {
        let mut query = SearchQuery::new("TITLE-ABS-KEY(mouse OR rat)", RecordKind::Article);
        query.fields = Some("dc:title,prism:volume".to_string());
        query.date = Some("2018-2022".to_string());

        let url = client().search_url(&query).unwrap();
        assert_eq!(url.path(), "/content/search/scopus");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("query".to_string(), "TITLE-ABS-KEY(mouse OR rat)".to_string())));
        assert!(pairs.contains(&("start".to_string(), "0".to_string())));
        assert!(pairs.contains(&("date".to_string(), "2018-2022".to_string())));
        assert!(pairs.contains(&("field".to_string(), "dc:title,prism:volume".to_string())));
        assert!(!pairs.iter().any(|(k, _)| k == "view"));
        assert!(!pairs.iter().any(|(k, _)| k == "apiKey"));
    }

    #[test]
    fn test_search_url_author_forces_standard_view() {
        let mut query = SearchQuery::new("AUTHLASTNAME(Hansen)", RecordKind::Author);
        query.view = Some("COMPLETE".to_string());

        let url = client().search_url(&query).unwrap();
        assert_eq!(url.path(), "/content/search/author");
        assert!(url
            .query_pairs()
            .any(|(k, v)| k == "view" && v == "STANDARD"));
    }

    #[test]
    fn test_resource_ids_stay_in_one_segment() {
        let client = client();

        let url = client.resource(AUTHOR_PATH, "7004212771").unwrap();
        assert_eq!(url.as_str(), "https://api.elsevier.com/content/author/author_id/7004212771");

        let url = client.resource(ABSTRACT_PATH, "../../search/scopus?query=x#frag").unwrap();
        assert!(url.path().starts_with("/content/abstract/scopus_id/"));
        assert_eq!(url.path_segments().map(|s| s.count()), Some(4));
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            ScopusClient::new("k", "not a url"),
            Err(ScopusError::Config(_))
        ));
    }
}
