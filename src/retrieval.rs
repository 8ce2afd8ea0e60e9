//! Parsers for the Scopus retrieval endpoints.
//!
//! Covers author profiles, abstracts, affiliation profiles, author
//! affiliation histories, serial titles and citation overviews. Each parser
//! mixes strict and tolerant reads: structural paths that every response
//! carries are required, descriptive fields fall back to `None`.

use crate::error::{Result, ScopusError};
use crate::value::{
    integer_at, require, require_identifier, require_integer, require_list,
    require_nullable_text, require_text, text, text_at,
};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashSet;
use tracing::debug;

/// One affiliation of an author, current or historical.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuthorAffiliation {
    pub id: Option<String>,
    pub name: Option<String>,
    pub parent_id: Option<String>,
    pub parent_name: Option<String>,
    /// Address parts joined by ", "
    pub address: Option<String>,
    pub url: Option<String>,
}

/// Years of an author's first and latest publication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicationRange {
    pub start: String,
    pub end: String,
}

/// Author retrieval response, flattened.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthorProfile {
    pub author_id: String,
    pub eid: String,
    pub document_count: i64,
    pub cited_by_count: i64,
    pub citation_count: i64,
    pub name: String,
    pub first: String,
    pub last: String,
    pub indexed_name: String,
    pub publication_range: PublicationRange,
    pub affiliation_current: AuthorAffiliation,
    /// Journal objects as returned by Scopus
    pub journal_history: Vec<Value>,
    pub affiliation_history: Vec<AuthorAffiliation>,
}

/// Abstract retrieval response: the renamed core fields plus the rest of `coredata`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AbstractRecord {
    pub scopus_id: String,
    pub title: String,
    pub abstract_text: Option<String>,
    #[serde(flatten)]
    pub coredata: Map<String, Value>,
}

/// Affiliation retrieval response, flattened.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AffiliationProfile {
    pub eid: Option<String>,
    pub affiliation_name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub org_type: Option<String>,
    pub org_domain: Option<String>,
    pub org_url: Option<String>,
    /// `day/month/year`
    pub date_created: Option<String>,
}

/// Descriptive fields of one serial title.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SerialMetadata {
    pub source_id: String,
    /// `@code` of every subject area
    pub subject_areas: Vec<String>,
    /// Remaining entry fields, minus metric lists and links
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// CiteScore of a serial for one year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CiteScoreRow {
    pub source_id: String,
    pub issn: Option<String>,
    pub year: String,
    pub status: String,
    #[serde(flatten)]
    pub info: Map<String, Value>,
}

/// Rank of a serial within one subject for one year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectRankRow {
    pub source_id: String,
    pub issn: Option<String>,
    pub year: String,
    #[serde(flatten)]
    pub rank: Map<String, Value>,
}

/// Parsed `serial-metadata-response`: one metadata row per distinct source.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SerialTables {
    pub metadata: Vec<SerialMetadata>,
    pub citescores: Vec<CiteScoreRow>,
    pub subject_ranks: Vec<SubjectRankRow>,
}

/// Citation count of one year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearCount {
    pub year: i32,
    pub count: i64,
}

/// One document's row of a citation overview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CitationRow {
    pub scopus_id: String,
    /// Citations before the requested range
    pub previous_citation: Option<i64>,
    pub yearly: Vec<YearCount>,
    /// Citations after the requested range
    pub later_citation: Option<i64>,
    pub total_citation: Option<i64>,
}

/// Parse one entry of an author's affiliation list.
///
/// The `ip-doc` block is mandatory; every field inside it is optional.
pub fn parse_author_affiliation(entry: &Value) -> Result<AuthorAffiliation> {
    let ip_doc = require(entry, "ip-doc")?;

    Ok(AuthorAffiliation {
        id: text_at(ip_doc, "@id"),
        name: text_at(ip_doc, "afdispname"),
        parent_id: text_at(entry, "@parent"),
        parent_name: text_at(ip_doc, "parent-preferred-name"),
        address: ip_doc.get("address").and_then(joined_address),
        url: text_at(ip_doc, "org-URL"),
    })
}

fn joined_address(address: &Value) -> Option<String> {
    let parts = address
        .as_object()?
        .values()
        .map(text)
        .collect::<Option<Vec<_>>>()?;
    Some(parts.join(", "))
}

/// Parse an affiliation history; the first unreadable entry fails the whole list.
pub fn parse_affiliation_history(list: &Value) -> Result<Vec<AuthorAffiliation>> {
    require_list(list, "affiliation")?
        .into_iter()
        .map(parse_author_affiliation)
        .collect()
}

/// Parse an `author-retrieval-response` document.
pub fn parse_author_retrieval(response: &Value) -> Result<AuthorProfile> {
    let resp = require(response, "author-retrieval-response")?
        .get(0)
        .ok_or_else(|| ScopusError::malformed("author-retrieval-response", "expected a non-empty list"))?;

    let coredata = require(resp, "coredata")?;
    let profile = require(resp, "author-profile")?;

    let preferred = require(profile, "preferred-name")?;
    let first = require_text(preferred, "given-name")?;
    let last = require_text(preferred, "surname")?;

    let range = require(profile, "publication-range")?;
    let publication_range = PublicationRange {
        start: require_text(range, "@start")?,
        end: require_text(range, "@end")?,
    };

    let current = require(require(profile, "affiliation-current")?, "affiliation")?;
    let journals = require(require(profile, "journal-history")?, "journal")?;
    let history = require(require(profile, "affiliation-history")?, "affiliation")?;

    Ok(AuthorProfile {
        author_id: require_identifier(coredata, "dc:identifier")?,
        eid: require_text(coredata, "eid")?,
        document_count: require_integer(coredata, "document-count")?,
        cited_by_count: require_integer(coredata, "cited-by-count")?,
        citation_count: require_integer(coredata, "citation-count")?,
        name: format!("{} {}", first, last),
        indexed_name: require_text(preferred, "indexed-name")?,
        first,
        last,
        publication_range,
        affiliation_current: parse_author_affiliation(current)?,
        journal_history: require_list(journals, "journal")?.into_iter().cloned().collect(),
        affiliation_history: parse_affiliation_history(history)?,
    })
}

/// Parse an `abstracts-retrieval-response` document.
///
/// `dc:creator` and `link` are dropped from the remaining coredata.
pub fn parse_abstract_retrieval(response: &Value) -> Result<AbstractRecord> {
    let resp = require(response, "abstracts-retrieval-response")?;
    let coredata = require(resp, "coredata")?;

    let scopus_id = require_identifier(coredata, "dc:identifier")?;
    let abstract_text = require_nullable_text(coredata, "dc:description")?;
    let title = require_text(coredata, "dc:title")?;

    let mut rest = coredata
        .as_object()
        .cloned()
        .ok_or_else(|| ScopusError::malformed("coredata", "expected an object"))?;
    for key in ["dc:creator", "link", "dc:identifier", "dc:description", "dc:title"] {
        rest.remove(key);
    }

    Ok(AbstractRecord {
        scopus_id,
        title,
        abstract_text,
        coredata: rest,
    })
}

/// Parse an `affiliation-retrieval-response` document.
///
/// Only `institution-profile.date-created` is mandatory.
pub fn parse_affiliation_retrieval(response: &Value) -> Result<AffiliationProfile> {
    let resp = require(response, "affiliation-retrieval-response")?;
    let institution = require(resp, "institution-profile")?;
    let date_entry = require(institution, "date-created")?;

    Ok(AffiliationProfile {
        eid: resp.get("coredata").and_then(|c| text_at(c, "eid")),
        affiliation_name: text_at(resp, "affiliation-name"),
        address: text_at(resp, "address"),
        city: text_at(resp, "city"),
        country: text_at(resp, "country"),
        org_type: text_at(institution, "org-type"),
        org_domain: text_at(institution, "org-domain"),
        org_url: text_at(institution, "org-URL"),
        date_created: format_date_created(date_entry),
    })
}

// Keys sort as @day, @month, @year.
fn format_date_created(date: &Value) -> Option<String> {
    let object = date.as_object()?;
    let mut keys: Vec<&String> = object.keys().collect();
    keys.sort();
    let parts = keys
        .into_iter()
        .take(3)
        .map(|k| object.get(k).and_then(text))
        .collect::<Option<Vec<_>>>()?;
    (parts.len() == 3).then(|| parts.join("/"))
}

const SERIAL_DROPPED_KEYS: [&str; 5] = ["SNIPList", "SJRList", "prism:url", "link", "@_fa"];

/// Parse a `serial-metadata-response` document.
///
/// Entries repeating an already seen `source-id` are skipped. An entry whose
/// CiteScore block is absent or unreadable contributes metadata only.
///
/// # Errors
///
/// `MissingField` when an entry lacks `source-id`, `subject-area` or a
/// subject's `@code`.
pub fn parse_serial(response: &Value) -> Result<SerialTables> {
    let entries = require(require(response, "serial-metadata-response")?, "entry")?;

    let mut tables = SerialTables::default();
    let mut seen = HashSet::new();

    for entry in require_list(entries, "entry")? {
        let source_id = require_text(entry, "source-id")?;
        if !seen.insert(source_id.clone()) {
            debug!(source_id = %source_id, "Skipping repeated serial entry");
            continue;
        }

        let subject_areas = require_list(require(entry, "subject-area")?, "subject-area")?
            .into_iter()
            .map(|area| require_text(area, "@code"))
            .collect::<Result<Vec<_>>>()?;

        let mut fields = entry
            .as_object()
            .cloned()
            .ok_or_else(|| ScopusError::malformed("entry", "expected an object"))?;
        fields.retain(|key, _| {
            !SERIAL_DROPPED_KEYS.contains(&key.as_str())
                && !key.to_lowercase().contains("citescore")
        });
        fields.remove("source-id");
        fields.remove("subject-area");

        let issn = text_at(entry, "prism:issn");
        match serial_citescores(entry, &source_id, issn.as_deref()) {
            Ok((citescores, ranks)) => {
                tables.citescores.extend(citescores);
                tables.subject_ranks.extend(ranks);
            }
            Err(e) => debug!(source_id = %source_id, error = %e, "No CiteScore for serial"),
        }

        tables.metadata.push(SerialMetadata {
            source_id,
            subject_areas,
            fields,
        });
    }

    Ok(tables)
}

fn serial_citescores(
    entry: &Value,
    source_id: &str,
    issn: Option<&str>,
) -> Result<(Vec<CiteScoreRow>, Vec<SubjectRankRow>)> {
    let years = require(require(entry, "citeScoreYearInfoList")?, "citeScoreYearInfo")?;

    let mut citescores = Vec::new();
    let mut ranks = Vec::new();

    for year_info in require_list(years, "citeScoreYearInfo")? {
        let year = require_text(year_info, "@year")?;
        let status = require_text(year_info, "@status")?;

        let information = require_list(
            require(year_info, "citeScoreInformationList")?,
            "citeScoreInformationList",
        )?;
        let first = information
            .first()
            .ok_or_else(|| ScopusError::malformed("citeScoreInformationList", "empty list"))?;
        let score_info = require_list(require(first, "citeScoreInfo")?, "citeScoreInfo")?;
        let info = score_info
            .first()
            .ok_or_else(|| ScopusError::malformed("citeScoreInfo", "empty list"))?;

        for rank in require_list(require(info, "citeScoreSubjectRank")?, "citeScoreSubjectRank")? {
            let mut rank = rank
                .as_object()
                .cloned()
                .ok_or_else(|| ScopusError::malformed("citeScoreSubjectRank", "expected an object"))?;
            rank.remove("@_fa");
            ranks.push(SubjectRankRow {
                source_id: source_id.to_string(),
                issn: issn.map(str::to_string),
                year: year.clone(),
                rank,
            });
        }

        let mut info = info
            .as_object()
            .cloned()
            .ok_or_else(|| ScopusError::malformed("citeScoreInfo", "expected an object"))?;
        info.remove("@_fa");
        info.remove("citeScoreSubjectRank");

        citescores.push(CiteScoreRow {
            source_id: source_id.to_string(),
            issn: issn.map(str::to_string),
            year,
            status,
            info,
        });
    }

    Ok((citescores, ranks))
}

/// Widest year range a citation overview may cover
pub const MAX_CITATION_YEARS: usize = 200;

/// Number of years in the inclusive `year_range`.
///
/// # Errors
///
/// `Validation` when the range is reversed or wider than [`MAX_CITATION_YEARS`].
pub fn year_span(year_range: (i32, i32)) -> Result<usize> {
    let (start, end) = year_range;
    let span = i64::from(end) - i64::from(start) + 1;
    if span < 1 {
        return Err(ScopusError::Validation(format!(
            "citation year range {}-{} is reversed",
            start, end
        )));
    }
    match usize::try_from(span) {
        Ok(years) if years <= MAX_CITATION_YEARS => Ok(years),
        _ => Err(ScopusError::Validation(format!(
            "citation year range {}-{} spans {} years, at most {} allowed",
            start, end, span, MAX_CITATION_YEARS
        ))),
    }
}

/// Parse an `abstract-citations-response` over the inclusive `year_range`.
///
/// An entry without a yearly breakdown (`cc`) means the overview is unusable
/// and an empty table is returned.
pub fn parse_citation_overview(response: &Value, year_range: (i32, i32)) -> Result<Vec<CitationRow>> {
    let years = year_span(year_range)?;
    let (start, end) = year_range;

    let resp = require(response, "abstract-citations-response")?;
    let cite_info = require(resp, "citeInfoMatrix")
        .and_then(|m| require(m, "citeInfoMatrixXML"))
        .and_then(|m| require(m, "citationMatrix"))
        .and_then(|m| require(m, "citeInfo"))?;

    let mut rows = Vec::new();
    for info in require_list(cite_info, "citeInfo")? {
        let scopus_id = require_identifier(info, "dc:identifier")?;

        let Some(cc) = info.get("cc") else {
            debug!(scopus_id = %scopus_id, "Citation entry without yearly counts");
            return Ok(Vec::new());
        };
        let counts = require_list(cc, "cc")?;

        if counts.len() > years {
            return Err(ScopusError::malformed(
                "cc",
                format!("{} yearly counts for a {}-year range", counts.len(), years),
            ));
        }

        let yearly = counts
            .into_iter()
            .zip(start..=end)
            .map(|(count, year)| {
                Ok(YearCount {
                    year,
                    count: require_integer(count, "$")?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        rows.push(CitationRow {
            scopus_id,
            previous_citation: integer_at(info, "pcc"),
            yearly,
            later_citation: integer_at(info, "lcc"),
            total_citation: integer_at(info, "rowTotal"),
        });
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn affiliation_entry() -> Value {
        json!({
            "@parent": "60010348",
            "ip-doc": {
                "@id": "60027550",
                "afdispname": "Department of Biosciences",
                "parent-preferred-name": "University of Oslo",
                "address": {"city": "Oslo", "country": "Norway"},
                "org-URL": "https://www.uio.no"
            }
        })
    }

    fn author_response() -> Value {
        json!({
            "author-retrieval-response": [{
                "coredata": {
                    "dc:identifier": "AUTHOR_ID:7004212771",
                    "eid": "9-s2.0-7004212771",
                    "document-count": "42",
                    "cited-by-count": "900",
                    "citation-count": "1100"
                },
                "author-profile": {
                    "preferred-name": {
                        "given-name": "Kari",
                        "surname": "Hansen",
                        "indexed-name": "Hansen K."
                    },
                    "publication-range": {"@start": "1998", "@end": "2022"},
                    "affiliation-current": {"affiliation": affiliation_entry()},
                    "journal-history": {"journal": [{"sourcetitle": "Neuron", "issn": "08966273"}]},
                    "affiliation-history": {"affiliation": [affiliation_entry(), {"ip-doc": {"@id": "1"}}]}
                }
            }]
        })
    }

    #[test]
    fn test_parse_author_affiliation() {
        let affiliation = parse_author_affiliation(&affiliation_entry()).unwrap();
        assert_eq!(affiliation.id.as_deref(), Some("60027550"));
        assert_eq!(affiliation.parent_id.as_deref(), Some("60010348"));
        assert_eq!(affiliation.name.as_deref(), Some("Department of Biosciences"));
        assert_eq!(affiliation.address.as_deref(), Some("Oslo, Norway"));
        assert_eq!(affiliation.url.as_deref(), Some("https://www.uio.no"));
    }

    #[test]
    fn test_parse_author_affiliation_requires_ip_doc() {
        assert!(matches!(
            parse_author_affiliation(&json!({"@parent": "1"})),
            Err(ScopusError::MissingField(ref f)) if f == "ip-doc"
        ));
    }

    #[test]
    fn test_affiliation_history_is_strict_per_entry() {
        let history = json!([affiliation_entry(), {"@parent": "2"}]);
        assert!(parse_affiliation_history(&history).is_err());

        let single = affiliation_entry();
        assert_eq!(parse_affiliation_history(&single).unwrap().len(), 1);
    }

    #[test]
    fn test_parse_author_retrieval() {
        let profile = parse_author_retrieval(&author_response()).unwrap();
        assert_eq!(profile.author_id, "7004212771");
        assert_eq!(profile.name, "Kari Hansen");
        assert_eq!(profile.indexed_name, "Hansen K.");
        assert_eq!(profile.document_count, 42);
        assert_eq!(profile.publication_range.start, "1998");
        assert_eq!(profile.journal_history.len(), 1);
        assert_eq!(profile.affiliation_history.len(), 2);
        assert_eq!(profile.affiliation_history[1].name, None);
    }

    #[test]
    fn test_parse_author_retrieval_missing_profile_block() {
        let mut response = author_response();
        response["author-retrieval-response"][0]["author-profile"]
            .as_object_mut()
            .unwrap()
            .remove("journal-history");
        assert!(matches!(
            parse_author_retrieval(&response),
            Err(ScopusError::MissingField(ref f)) if f == "journal-history"
        ));
    }

    #[test]
    fn test_parse_abstract_retrieval() {
        let response = json!({
            "abstracts-retrieval-response": {
                "coredata": {
                    "dc:identifier": "SCOPUS_ID:85012345678",
                    "dc:title": "Rodent models of anxiety",
                    "dc:description": "We review...",
                    "dc:creator": {"author": []},
                    "link": [],
                    "prism:doi": "10.1016/j.bbr.2019.01.001"
                }
            }
        });
        let record = parse_abstract_retrieval(&response).unwrap();
        assert_eq!(record.scopus_id, "85012345678");
        assert_eq!(record.abstract_text.as_deref(), Some("We review..."));
        assert!(record.coredata.contains_key("prism:doi"));
        assert!(!record.coredata.contains_key("link"));
        assert!(!record.coredata.contains_key("dc:creator"));
        assert!(!record.coredata.contains_key("dc:title"));
    }

    #[test]
    fn test_parse_affiliation_retrieval() {
        let response = json!({
            "affiliation-retrieval-response": {
                "coredata": {"eid": "10-s2.0-60010348"},
                "affiliation-name": "University of Oslo",
                "city": "Oslo",
                "country": "Norway",
                "institution-profile": {
                    "org-type": "univ",
                    "date-created": {"@year": "2008", "@month": "02", "@day": "02"}
                }
            }
        });
        let profile = parse_affiliation_retrieval(&response).unwrap();
        assert_eq!(profile.eid.as_deref(), Some("10-s2.0-60010348"));
        assert_eq!(profile.address, None);
        assert_eq!(profile.org_type.as_deref(), Some("univ"));
        assert_eq!(profile.org_url, None);
        assert_eq!(profile.date_created.as_deref(), Some("02/02/2008"));
    }

    #[test]
    fn test_parse_affiliation_retrieval_requires_date_created() {
        let response = json!({
            "affiliation-retrieval-response": {"institution-profile": {"org-type": "univ"}}
        });
        assert!(matches!(
            parse_affiliation_retrieval(&response),
            Err(ScopusError::MissingField(ref f)) if f == "date-created"
        ));
    }

    fn serial_entry(source_id: &str) -> Value {
        json!({
            "@_fa": "true",
            "dc:title": "Neuron",
            "dc:publisher": "Cell Press",
            "source-id": source_id,
            "prism:issn": "08966273",
            "prism:url": "https://api.elsevier.com/content/serial/title/issn/08966273",
            "subject-area": [
                {"@_fa": "true", "@code": "2800", "@abbrev": "NEUR", "$": "General Neuroscience"}
            ],
            "SNIPList": {"SNIP": [{"$": "2.9"}]},
            "SJRList": {"SJR": [{"$": "7.7"}]},
            "citeScoreYearInfoList": {
                "citeScoreCurrentMetric": "26.4",
                "citeScoreYearInfo": [{
                    "@year": "2021",
                    "@status": "Complete",
                    "citeScoreInformationList": [{
                        "citeScoreInfo": [{
                            "@_fa": "true",
                            "docType": "all",
                            "citeScore": "26.4",
                            "citeScoreSubjectRank": [
                                {"@_fa": "true", "subjectCode": "2800", "rank": "3", "percentile": "99"}
                            ]
                        }]
                    }]
                }]
            },
            "link": [{"@ref": "scopus-source", "@href": "x"}]
        })
    }

    #[test]
    fn test_parse_serial() {
        let response = json!({"serial-metadata-response": {"entry": [serial_entry("17978")]}});
        let tables = parse_serial(&response).unwrap();

        assert_eq!(tables.metadata.len(), 1);
        let meta = &tables.metadata[0];
        assert_eq!(meta.source_id, "17978");
        assert_eq!(meta.subject_areas, vec!["2800"]);
        assert_eq!(meta.fields["dc:title"], "Neuron");
        for dropped in ["SNIPList", "SJRList", "prism:url", "link", "@_fa", "citeScoreYearInfoList"] {
            assert!(!meta.fields.contains_key(dropped), "{} kept", dropped);
        }

        assert_eq!(tables.citescores.len(), 1);
        let score = &tables.citescores[0];
        assert_eq!(score.year, "2021");
        assert_eq!(score.status, "Complete");
        assert_eq!(score.issn.as_deref(), Some("08966273"));
        assert_eq!(score.info["citeScore"], "26.4");
        assert!(!score.info.contains_key("citeScoreSubjectRank"));
        assert!(!score.info.contains_key("@_fa"));

        assert_eq!(tables.subject_ranks.len(), 1);
        let rank = &tables.subject_ranks[0];
        assert_eq!(rank.year, "2021");
        assert_eq!(rank.rank["rank"], "3");
        assert!(!rank.rank.contains_key("@_fa"));
    }

    #[test]
    fn test_parse_serial_skips_repeated_sources() {
        let mut other = serial_entry("17978");
        other["dc:title"] = json!("Neuron (duplicate)");
        let response = json!({"serial-metadata-response": {"entry": [
            serial_entry("17978"), other, serial_entry("12345")
        ]}});
        let tables = parse_serial(&response).unwrap();
        let ids: Vec<_> = tables.metadata.iter().map(|m| m.source_id.as_str()).collect();
        assert_eq!(ids, ["17978", "12345"]);
        assert_eq!(tables.metadata[0].fields["dc:title"], "Neuron");
        assert_eq!(tables.citescores.len(), 2);
    }

    #[test]
    fn test_parse_serial_without_citescore() {
        let mut entry = serial_entry("17978");
        entry.as_object_mut().unwrap().remove("citeScoreYearInfoList");
        let response = json!({"serial-metadata-response": {"entry": entry}});
        let tables = parse_serial(&response).unwrap();
        assert_eq!(tables.metadata.len(), 1);
        assert!(tables.citescores.is_empty());
        assert!(tables.subject_ranks.is_empty());
    }

    #[test]
    fn test_parse_serial_requires_source_id() {
        let mut entry = serial_entry("17978");
        entry.as_object_mut().unwrap().remove("source-id");
        let response = json!({"serial-metadata-response": {"entry": [entry]}});
        assert!(matches!(
            parse_serial(&response),
            Err(ScopusError::MissingField(ref f)) if f == "source-id"
        ));
    }

    fn citation_response(entries: Value) -> Value {
        json!({
            "abstract-citations-response": {
                "citeInfoMatrix": {"citeInfoMatrixXML": {"citationMatrix": {"citeInfo": entries}}}
            }
        })
    }

    #[test]
    fn test_parse_citation_overview() {
        let response = citation_response(json!([{
            "dc:identifier": "SCOPUS_ID:85012345678",
            "pcc": "3",
            "cc": [{"$": "4"}, {"$": "5"}, {"$": "6"}],
            "lcc": "0",
            "rowTotal": "18"
        }]));
        let rows = parse_citation_overview(&response, (2019, 2021)).unwrap();
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.scopus_id, "85012345678");
        assert_eq!(row.previous_citation, Some(3));
        assert_eq!(
            row.yearly,
            vec![
                YearCount { year: 2019, count: 4 },
                YearCount { year: 2020, count: 5 },
                YearCount { year: 2021, count: 6 },
            ]
        );
        assert_eq!(row.total_citation, Some(18));
    }

    #[test]
    fn test_citation_overview_without_yearly_counts_is_empty() {
        let response = citation_response(json!([
            {"dc:identifier": "SCOPUS_ID:1", "cc": [{"$": "1"}]},
            {"dc:identifier": "SCOPUS_ID:2", "rowTotal": "4"}
        ]));
        assert!(parse_citation_overview(&response, (2020, 2020)).unwrap().is_empty());
    }

    #[test]
    fn test_citation_overview_tolerates_missing_totals() {
        let response = citation_response(json!({"dc:identifier": "SCOPUS_ID:1", "cc": [{"$": "2"}]}));
        let rows = parse_citation_overview(&response, (2020, 2021)).unwrap();
        assert_eq!(rows[0].previous_citation, None);
        assert_eq!(rows[0].later_citation, None);
        assert_eq!(rows[0].yearly.len(), 1);
    }

    #[test]
    fn test_citation_overview_reversed_range() {
        let response = citation_response(json!([]));
        assert!(parse_citation_overview(&response, (2022, 2020)).is_err());
    }

    #[test]
    fn test_citation_overview_extreme_range() {
        let response = citation_response(json!([{"dc:identifier": "SCOPUS_ID:1", "cc": [{"$": "2"}]}]));
        assert!(matches!(
            parse_citation_overview(&response, (0, i32::MAX)),
            Err(ScopusError::Validation(_))
        ));
        assert!(matches!(
            parse_citation_overview(&response, (i32::MAX, i32::MIN)),
            Err(ScopusError::Validation(_))
        ));
    }

    #[test]
    fn test_year_span() {
        assert_eq!(year_span((2020, 2020)).unwrap(), 1);
        assert_eq!(year_span((2019, 2022)).unwrap(), 4);
        assert_eq!(year_span((1900, 2099)).unwrap(), MAX_CITATION_YEARS);
        assert!(year_span((1900, 2100)).is_err());
        assert!(year_span((i32::MIN, i32::MAX)).is_err());
    }
}
