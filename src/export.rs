//! CSV export of normalized tables.
//!
//! A header row is always written, so an empty table still produces a
//! well-formed file.

use crate::error::{Result, ScopusError};
use crate::extract::{AffiliationRecord, ArticleRecord};
use crate::normalize::{Rows, SearchResultTable};
use crate::retrieval::{year_span, CitationRow};
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Column order for article tables
pub const ARTICLE_COLUMNS: &[&str] = &[
    "scopus_id",
    "title",
    "publication_name",
    "issn",
    "isbn",
    "eissn",
    "volume",
    "page_range",
    "cover_date",
    "doi",
    "citation_count",
    "affiliation",
    "aggregation_type",
    "subtype_description",
    "authors",
    "full_text",
    "url",
];

/// Column order of the download served by the HTTP endpoint
pub const SUMMARY_COLUMNS: &[&str] = &["Title", "Publication Name", "Date", "Volume", "URL"];

/// Column order for author tables
pub const AUTHOR_COLUMNS: &[&str] = &[
    "author_id",
    "name",
    "document_count",
    "affiliation",
    "affiliation_id",
];

/// Article record with its list columns flattened to text
#[derive(Debug, Serialize)]
struct ArticleRow<'a> {
    scopus_id: Option<&'a str>,
    title: Option<&'a str>,
    publication_name: Option<&'a str>,
    issn: Option<&'a str>,
    isbn: Option<&'a str>,
    eissn: Option<&'a str>,
    volume: Option<&'a str>,
    page_range: Option<&'a str>,
    cover_date: Option<&'a str>,
    doi: Option<&'a str>,
    citation_count: Option<i64>,
    affiliation: Option<String>,
    aggregation_type: Option<&'a str>,
    subtype_description: Option<&'a str>,
    authors: String,
    full_text: Option<&'a str>,
    url: Option<&'a str>,
}

/// The few article columns the download endpoint serves
#[derive(Debug, Serialize)]
struct SummaryRow<'a> {
    title: Option<&'a str>,
    publication_name: Option<&'a str>,
    cover_date: Option<&'a str>,
    volume: Option<&'a str>,
    url: Option<&'a str>,
}

impl<'a> From<&'a ArticleRecord> for SummaryRow<'a> {
    fn from(r: &'a ArticleRecord) -> Self {
        Self {
            title: r.title.as_deref(),
            publication_name: r.publication_name.as_deref(),
            cover_date: r.cover_date.as_deref(),
            volume: r.volume.as_deref(),
            url: r.url.as_deref(),
        }
    }
}

impl<'a> From<&'a ArticleRecord> for ArticleRow<'a> {
    fn from(r: &'a ArticleRecord) -> Self {
        Self {
            scopus_id: r.scopus_id.as_deref(),
            title: r.title.as_deref(),
            publication_name: r.publication_name.as_deref(),
            issn: r.issn.as_deref(),
            isbn: r.isbn.as_deref(),
            eissn: r.eissn.as_deref(),
            volume: r.volume.as_deref(),
            page_range: r.page_range.as_deref(),
            cover_date: r.cover_date.as_deref(),
            doi: r.doi.as_deref(),
            citation_count: r.citation_count,
            affiliation: r.affiliation.as_deref().map(format_affiliations),
            aggregation_type: r.aggregation_type.as_deref(),
            subtype_description: r.subtype_description.as_deref(),
            authors: r.authors.join(";"),
            full_text: r.full_text.as_deref(),
            url: r.url.as_deref(),
        }
    }
}

/// `name, city, country` per affiliation (absent parts skipped), joined by `"; "`
pub fn format_affiliations(affiliations: &[AffiliationRecord]) -> String {
    affiliations
        .iter()
        .map(|a| {
            [&a.name, &a.city, &a.country]
                .into_iter()
                .filter_map(|part| part.as_deref())
                .collect::<Vec<_>>()
                .join(", ")
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Write a table as CSV to any writer
pub fn write_table<W: Write>(writer: W, table: &SearchResultTable) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    match &table.rows {
        Rows::Articles(rows) => {
            wtr.write_record(ARTICLE_COLUMNS)?;
            for row in rows {
                wtr.serialize(ArticleRow::from(row))?;
            }
        }
        Rows::Authors(rows) => {
            wtr.write_record(AUTHOR_COLUMNS)?;
            for row in rows {
                wtr.serialize(row)?;
            }
        }
    }

    wtr.flush()?;
    Ok(())
}

/// Render a table as CSV bytes
pub fn to_csv_bytes(table: &SearchResultTable) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    write_table(&mut buf, table)?;
    Ok(buf)
}

/// Write the title/venue/date/volume/URL summary of an article table
///
/// # Errors
///
/// `Validation` for author tables, which have none of these columns.
pub fn write_summary<W: Write>(writer: W, table: &SearchResultTable) -> Result<()> {
    let Rows::Articles(rows) = &table.rows else {
        return Err(ScopusError::Validation(
            "summary export needs an article table".to_string(),
        ));
    };

    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    wtr.write_record(SUMMARY_COLUMNS)?;
    for row in rows {
        wtr.serialize(SummaryRow::from(row))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Render the article summary as CSV bytes
pub fn summary_csv_bytes(table: &SearchResultTable) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    write_summary(&mut buf, table)?;
    Ok(buf)
}

/// Save a table to a CSV file
pub fn save_csv(path: &Path, table: &SearchResultTable) -> Result<()> {
    let file = std::fs::File::create(path)?;
    write_table(file, table)?;
    info!(path = %path.display(), rows = table.len(), "Saved CSV");
    Ok(())
}

/// Write citation rows with one column per year of the inclusive range
pub fn write_citations<W: Write>(
    writer: W,
    rows: &[CitationRow],
    year_range: (i32, i32),
) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    year_span(year_range)?;
    let years: Vec<i32> = (year_range.0..=year_range.1).collect();

    let mut header = vec!["scopus_id".to_string(), "previous_citation".to_string()];
    header.extend(years.iter().map(|y| y.to_string()));
    header.push("later_citation".to_string());
    header.push("total_citation".to_string());
    wtr.write_record(&header)?;

    let cell = |v: Option<i64>| v.map(|n| n.to_string()).unwrap_or_default();

    for row in rows {
        let mut record = vec![row.scopus_id.clone(), cell(row.previous_citation)];
        record.extend(years.iter().map(|year| {
            cell(
                row.yearly
                    .iter()
                    .find(|c| c.year == *year)
                    .map(|c| c.count),
            )
        }));
        record.push(cell(row.later_citation));
        record.push(cell(row.total_citation));
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}
