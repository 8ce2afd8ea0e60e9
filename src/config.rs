//! Server configuration.
//!
//! Built once by the binary from CLI flags and environment, then passed
//! explicitly to the router. Library code never reads the environment.

use crate::error::{Result, ScopusError};
use crate::scopus::DEFAULT_BASE_URL;
use std::path::PathBuf;

/// Query served when `/scopus-api` is called without keywords
pub const DEFAULT_QUERY: &str = "TITLE-ABS-KEY(mouse OR rat AND rodent)";

/// Fields requested from the search endpoint
pub const DEFAULT_FIELDS: &str = "title,authors,publicationName,coverDate,authkeywords,volume";

/// Publication year range
pub const DEFAULT_DATE: &str = "2018-2022";

/// Where the last served CSV is persisted
pub const DEFAULT_OUTPUT_PATH: &str = "static/results.csv";

/// Everything the HTTP layer needs to forward a search
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub api_key: String,
    pub base_url: String,
    pub default_query: String,
    pub fields: Option<String>,
    pub date: Option<String>,
    pub output_path: PathBuf,
}

impl ServerConfig {
    /// Config with the stock query, fields, date range and output path
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            default_query: DEFAULT_QUERY.to_string(),
            fields: Some(DEFAULT_FIELDS.to_string()),
            date: Some(DEFAULT_DATE.to_string()),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
        }
    }

    /// Reject configs that cannot produce a request
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(ScopusError::Config(
                "API key is empty (set --api-key or SCOPUS_API_KEY)".to_string(),
            ));
        }
        if self.default_query.trim().is_empty() {
            return Err(ScopusError::Config("Default query is empty".to_string()));
        }
        Ok(())
    }
}
