//! Record extraction for Scopus search entries.
//!
//! Article entries are read field by field: every field has its own
//! extraction path returning `Option`, so one malformed value only ever nulls
//! that one column. Author entries carry a primary key and are read strictly;
//! a missing identifier, name component or document count fails the record.

use crate::error::{Result, ScopusError};
use crate::value::{
    identifier_at, integer_at, require, require_identifier, require_integer,
    require_nullable_text, require_text, text_at,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Which Scopus search a raw entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Article,
    Author,
}

impl FromStr for RecordKind {
    type Err = ScopusError;

    /// Accepts the names as well as the numeric codes `1` (article) and `2` (author).
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "article" | "1" => Ok(Self::Article),
            "author" | "2" => Ok(Self::Author),
            other => Err(ScopusError::Validation(format!(
                "unknown record kind '{}', expected article or author",
                other
            ))),
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Article => f.write_str("article"),
            Self::Author => f.write_str("author"),
        }
    }
}

/// One affiliation attached to an article.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffiliationRecord {
    pub name: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
}

/// Flattened article row. Every column is always present; `None` means the
/// source field was absent or unparseable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRecord {
    pub scopus_id: Option<String>,
    pub title: Option<String>,
    pub publication_name: Option<String>,
    pub issn: Option<String>,
    pub isbn: Option<String>,
    pub eissn: Option<String>,
    pub volume: Option<String>,
    pub page_range: Option<String>,
    pub cover_date: Option<String>,
    pub doi: Option<String>,
    pub citation_count: Option<i64>,
    pub affiliation: Option<Vec<AffiliationRecord>>,
    pub aggregation_type: Option<String>,
    pub subtype_description: Option<String>,
    /// Scopus author ids, empty when the author list is absent or malformed
    pub authors: Vec<String>,
    /// Link whose `@ref` is `full-text`
    pub full_text: Option<String>,
    /// API link of the document (`prism:url`)
    pub url: Option<String>,
}

/// Flattened author row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorRecord {
    pub author_id: String,
    /// Given name and surname joined by a single space
    pub name: String,
    pub document_count: i64,
    pub affiliation: Option<String>,
    pub affiliation_id: Option<String>,
}

/// A record of either kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Record {
    Article(ArticleRecord),
    Author(AuthorRecord),
}

impl Record {
    pub fn kind(&self) -> RecordKind {
        match self {
            Self::Article(_) => RecordKind::Article,
            Self::Author(_) => RecordKind::Author,
        }
    }
}

/// Extract a flat record of the given kind from one raw search entry.
///
/// # Errors
///
/// Never fails for articles. For authors, returns `MissingField` or
/// `MalformedValue` when a mandatory field cannot be read.
pub fn extract(entry: &Value, kind: RecordKind) -> Result<Record> {
    match kind {
        RecordKind::Article => Ok(Record::Article(extract_article(entry))),
        RecordKind::Author => extract_author(entry).map(Record::Author),
    }
}

/// Tolerant article extraction; always succeeds.
pub fn extract_article(entry: &Value) -> ArticleRecord {
    ArticleRecord {
        scopus_id: identifier_at(entry, "dc:identifier"),
        title: text_at(entry, "dc:title"),
        publication_name: text_at(entry, "prism:publicationName"),
        issn: text_at(entry, "prism:issn"),
        isbn: text_at(entry, "prism:isbn"),
        eissn: text_at(entry, "prism:eIssn"),
        volume: text_at(entry, "prism:volume"),
        page_range: text_at(entry, "prism:pageRange"),
        cover_date: text_at(entry, "prism:coverDate"),
        doi: text_at(entry, "prism:doi"),
        citation_count: integer_at(entry, "citedby-count"),
        affiliation: article_affiliations(entry),
        aggregation_type: text_at(entry, "prism:aggregationType"),
        subtype_description: text_at(entry, "subtypeDescription"),
        authors: author_ids(entry),
        full_text: full_text_link(entry),
        url: text_at(entry, "prism:url"),
    }
}

fn article_affiliations(entry: &Value) -> Option<Vec<AffiliationRecord>> {
    let list = entry.get("affiliation")?.as_array()?;
    match extract_affiliations(list) {
        Ok(affiliations) => Some(affiliations),
        Err(e) => {
            debug!(error = %e, "Dropping unreadable affiliation list");
            None
        }
    }
}

// All or nothing: one author without an id empties the whole list.
fn author_ids(entry: &Value) -> Vec<String> {
    entry
        .get("author")
        .and_then(Value::as_array)
        .and_then(|authors| {
            authors
                .iter()
                .map(|author| text_at(author, "authid"))
                .collect::<Option<Vec<_>>>()
        })
        .unwrap_or_default()
}

fn full_text_link(entry: &Value) -> Option<String> {
    entry
        .get("link")?
        .as_array()?
        .iter()
        .find(|link| link.get("@ref").and_then(Value::as_str) == Some("full-text"))
        .and_then(|link| text_at(link, "@href"))
}

/// Strict author extraction.
///
/// # Errors
///
/// `MissingField` when `dc:identifier`, `preferred-name`, its `surname` or
/// `given-name`, or `document-count` is absent; `MalformedValue` when one of
/// them is present but unreadable.
pub fn extract_author(entry: &Value) -> Result<AuthorRecord> {
    let author_id = require_identifier(entry, "dc:identifier")?;
    let preferred = require(entry, "preferred-name")?;
    let surname = require_text(preferred, "surname")?;
    let given_name = require_text(preferred, "given-name")?;
    let document_count = require_integer(entry, "document-count")?;

    let (affiliation, affiliation_id) = match entry.get("affiliation-current") {
        Some(current) => (
            text_at(current, "affiliation-name"),
            text_at(current, "affiliation-id"),
        ),
        None => (None, None),
    };

    Ok(AuthorRecord {
        author_id,
        name: format!("{} {}", given_name, surname),
        document_count,
        affiliation,
        affiliation_id,
    })
}

/// Read `affilname`, `affiliation-city` and `affiliation-country` from each entry.
///
/// Unlike article fields these keys are read directly: a missing key in any
/// entry fails the whole call. A key present with a null value is kept as `None`.
pub fn extract_affiliations(list: &[Value]) -> Result<Vec<AffiliationRecord>> {
    list.iter()
        .map(|affiliation| {
            Ok(AffiliationRecord {
                name: require_nullable_text(affiliation, "affilname")?,
                city: require_nullable_text(affiliation, "affiliation-city")?,
                country: require_nullable_text(affiliation, "affiliation-country")?,
            })
        })
        .collect()
}
