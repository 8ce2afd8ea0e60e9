//! Batch normalization of Scopus search responses into tables.

use crate::error::{OptionExt, Result, ScopusError};
use crate::extract::{extract, ArticleRecord, AuthorRecord, Record, RecordKind};
use crate::value::integer;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

/// Homogeneous rows of a search table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Rows {
    Articles(Vec<ArticleRecord>),
    Authors(Vec<AuthorRecord>),
}

impl Rows {
    fn empty(kind: RecordKind) -> Self {
        match kind {
            RecordKind::Article => Self::Articles(Vec::new()),
            RecordKind::Author => Self::Authors(Vec::new()),
        }
    }

    pub fn kind(&self) -> RecordKind {
        match self {
            Self::Articles(_) => RecordKind::Article,
            Self::Authors(_) => RecordKind::Author,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Articles(rows) => rows.len(),
            Self::Authors(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One page of normalized search results.
///
/// `total_count` is what Scopus reports for the whole query and may exceed
/// the number of rows materialized from this page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResultTable {
    pub total_count: u64,
    pub rows: Rows,
}

impl SearchResultTable {
    pub fn kind(&self) -> RecordKind {
        self.rows.kind()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Append-only builder for a [`SearchResultTable`] of one record kind.
#[derive(Debug)]
pub struct TableBuilder {
    rows: Rows,
}

impl TableBuilder {
    pub fn new(kind: RecordKind) -> Self {
        Self {
            rows: Rows::empty(kind),
        }
    }

    /// Append a record; its kind must match the builder's.
    pub fn push(&mut self, record: Record) -> Result<()> {
        match (&mut self.rows, record) {
            (Rows::Articles(rows), Record::Article(article)) => rows.push(article),
            (Rows::Authors(rows), Record::Author(author)) => rows.push(author),
            (rows, record) => {
                return Err(ScopusError::Validation(format!(
                    "cannot add {} record to {} table",
                    record.kind(),
                    rows.kind()
                )))
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn finish(self, total_count: u64) -> SearchResultTable {
        SearchResultTable {
            total_count,
            rows: self.rows,
        }
    }
}

/// What to do with an entry whose strict extraction fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OnEntryError {
    /// Stop and return the error
    #[default]
    Abort,
    /// Log the failure and leave the entry out of the table
    Skip,
}

/// Normalize a search response, aborting on the first entry that fails.
///
/// Returns the table together with the total result count reported by Scopus.
pub fn normalize(response: &Value, kind: RecordKind) -> Result<(SearchResultTable, u64)> {
    normalize_with(response, kind, OnEntryError::Abort)
}

/// Normalize a search response with an explicit failure policy for entries.
///
/// Every entry yields one row (or, under [`OnEntryError::Skip`], none). An
/// empty result set still carries a placeholder entry; callers that care
/// should check [`total_results`] first.
///
/// # Errors
///
/// `MissingField` when `search-results`, `opensearch:totalResults` or `entry`
/// is absent, `MalformedValue` when the total is not a non-negative integer
/// or `entry` is not a list, and, under [`OnEntryError::Abort`], the first
/// entry-level extraction error.
pub fn normalize_with(
    response: &Value,
    kind: RecordKind,
    on_error: OnEntryError,
) -> Result<(SearchResultTable, u64)> {
    let total_count = total_results(response)?;
    let results = response
        .get("search-results")
        .ok_or_missing("search-results")?;

    if total_count == 0 {
        debug!(kind = %kind, "Search reported no results");
    }

    let mut builder = TableBuilder::new(kind);
    let entries = results
        .get("entry")
        .ok_or_missing("entry")?
        .as_array()
        .ok_or_else(|| ScopusError::malformed("entry", "expected a list of entries"))?;

    for (index, entry) in entries.iter().enumerate() {
        match extract(entry, kind) {
            Ok(record) => builder.push(record)?,
            Err(e) => match on_error {
                OnEntryError::Abort => {
                    warn!(index = index, error = %e, "Entry extraction failed, aborting batch");
                    return Err(e);
                }
                OnEntryError::Skip => {
                    warn!(index = index, error = %e, "Skipping unreadable entry");
                }
            },
        }
    }

    info!(
        kind = %kind,
        rows = builder.len(),
        total = total_count,
        "Normalized search response"
    );

    Ok((builder.finish(total_count), total_count))
}

/// Total hit count reported by a search response (`opensearch:totalResults`).
pub fn total_results(response: &Value) -> Result<u64> {
    let value = response
        .get("search-results")
        .ok_or_missing("search-results")?
        .get("opensearch:totalResults")
        .ok_or_missing("opensearch:totalResults")?;
    integer(value)
        .and_then(|n| u64::try_from(n).ok())
        .ok_or_else(|| {
            ScopusError::malformed(
                "opensearch:totalResults",
                format!("expected a non-negative integer, got {}", value),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn article_entry(n: usize) -> Value {
        json!({
            "dc:identifier": format!("SCOPUS_ID:{}", 1000 + n),
            "dc:title": format!("Paper {}", n),
            "citedby-count": n.to_string(),
        })
    }

    fn response(total: &str, entries: Vec<Value>) -> Value {
        json!({
            "search-results": {
                "opensearch:totalResults": total,
                "opensearch:startIndex": "0",
                "entry": entries
            }
        })
    }

    #[test]
    fn test_normalize_preserves_order_and_total() {
        let entries = (0..5).map(article_entry).collect();
        let (table, total) = normalize(&response("42", entries), RecordKind::Article).unwrap();

        assert_eq!(total, 42);
        assert_eq!(table.total_count, 42);
        assert_eq!(table.len(), 5);
        match table.rows {
            Rows::Articles(rows) => {
                let titles: Vec<_> = rows.iter().filter_map(|r| r.title.clone()).collect();
                assert_eq!(titles, ["Paper 0", "Paper 1", "Paper 2", "Paper 3", "Paper 4"]);
            }
            Rows::Authors(_) => panic!("expected article rows"),
        }
    }

    #[test]
    fn test_normalize_numeric_total() {
        let mut value = response("0", vec![article_entry(1)]);
        value["search-results"]["opensearch:totalResults"] = json!(3);
        let (table, total) = normalize(&value, RecordKind::Article).unwrap();
        assert_eq!(total, 3);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_normalize_zero_total_still_maps_entries() {
        let entry = json!({"dc:identifier": "SCOPUS_ID:1", "dc:title": "Real"});
        let (table, total) = normalize(&response("0", vec![entry]), RecordKind::Article).unwrap();
        assert_eq!(total, 0);
        assert_eq!(table.len(), 1);
        match table.rows {
            Rows::Articles(rows) => assert_eq!(rows[0].title.as_deref(), Some("Real")),
            Rows::Authors(_) => panic!("expected article rows"),
        }
    }

    #[test]
    fn test_empty_result_set_placeholder() {
        let placeholder = json!({"@_fa": "true", "error": "Result set was empty"});
        let value = response("0", vec![placeholder]);
        assert_eq!(total_results(&value).unwrap(), 0);

        let (table, _) = normalize(&value, RecordKind::Article).unwrap();
        assert_eq!(table.len(), 1);
        assert!(normalize(&value, RecordKind::Author).is_err());
    }

    #[test]
    fn test_normalize_missing_paths() {
        assert!(matches!(
            normalize(&json!({}), RecordKind::Article),
            Err(ScopusError::MissingField(ref f)) if f == "search-results"
        ));
        assert!(matches!(
            normalize(&json!({"search-results": {"entry": []}}), RecordKind::Article),
            Err(ScopusError::MissingField(ref f)) if f == "opensearch:totalResults"
        ));
        assert!(matches!(
            normalize(&json!({"search-results": {"opensearch:totalResults": "2"}}), RecordKind::Article),
            Err(ScopusError::MissingField(ref f)) if f == "entry"
        ));
        assert!(matches!(
            normalize(&response("-1", vec![]), RecordKind::Article),
            Err(ScopusError::MalformedValue { .. })
        ));
    }

    #[test]
    fn test_normalize_authors_abort_and_skip() {
        let good = json!({
            "dc:identifier": "AUTHOR_ID:1",
            "preferred-name": {"surname": "Doe", "given-name": "Jane"},
            "document-count": "3"
        });
        let bad = json!({"dc:identifier": "AUTHOR_ID:2"});
        let value = response("2", vec![good, bad]);

        assert!(matches!(
            normalize(&value, RecordKind::Author),
            Err(ScopusError::MissingField(_))
        ));

        let (table, total) = normalize_with(&value, RecordKind::Author, OnEntryError::Skip).unwrap();
        assert_eq!(total, 2);
        match table.rows {
            Rows::Authors(rows) => {
                assert_eq!(rows.len(), 1);
                assert_eq!(rows[0].name, "Jane Doe");
            }
            Rows::Articles(_) => panic!("expected author rows"),
        }
    }

    #[test]
    fn test_table_builder_rejects_mixed_kinds() {
        let mut builder = TableBuilder::new(RecordKind::Author);
        let err = builder
            .push(Record::Article(ArticleRecord::default()))
            .unwrap_err();
        assert!(matches!(err, ScopusError::Validation(_)));
        assert!(builder.is_empty());
    }
}
