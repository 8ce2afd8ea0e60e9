//! # rustscopus
//!
//! Scopus search-to-CSV microservice and JSON-to-table parsers.
//!
//! ## Modules
//!
//! - [`extract`] - Per-entry record extraction (articles, authors, affiliations)
//! - [`normalize`] - Search response to table normalization
//! - [`retrieval`] - Author, abstract, affiliation and citation parsers
//! - [`truncate`] - Sentence-aware string truncation
//! - [`scopus`] - Scopus API client
//! - [`export`] - CSV export
//! - [`server`] - HTTP endpoint
//! - [`config`] - Server configuration
//! - [`error`] - Custom error types
//!
//! ## Usage
//!
//! ```rust,no_run
//! use rustscopus::extract::RecordKind;
//! use rustscopus::scopus::{ScopusClient, SearchQuery, DEFAULT_BASE_URL};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = ScopusClient::new("my-api-key", DEFAULT_BASE_URL)?;
//!     let query = SearchQuery::new("TITLE-ABS-KEY(rodent)", RecordKind::Article);
//!     let (table, total) = client.search_table(&query).await?;
//!     println!("{} of {} results on this page", table.len(), total);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod export;
pub mod extract;
pub mod normalize;
pub mod retrieval;
pub mod scopus;
pub mod server;
pub mod truncate;
mod value;

pub use error::{Result, ScopusError};
pub use extract::{extract, RecordKind};
pub use normalize::{normalize, SearchResultTable};
pub use truncate::truncate;
