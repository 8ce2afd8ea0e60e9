//! Accessors over raw Scopus JSON.
//!
//! Two families: the tolerant ones return `Option` and never fail, the
//! `require_*` ones return `Result` and name the key that was missing or bad.

use crate::error::{OptionExt, Result, ScopusError};
use serde_json::Value;

/// Render a scalar JSON value as text. Null, arrays and objects yield `None`.
pub(crate) fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Integer from either a JSON number or a numeric string (Scopus sends counts as strings).
pub(crate) fn integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Text after the last ':' of an identifier such as `SCOPUS_ID:85012345678`.
pub(crate) fn identifier(value: &Value) -> Option<String> {
    value
        .as_str()
        .and_then(|s| s.rsplit(':').next())
        .map(str::to_string)
}

pub(crate) fn text_at(entry: &Value, key: &str) -> Option<String> {
    entry.get(key).and_then(text)
}

pub(crate) fn integer_at(entry: &Value, key: &str) -> Option<i64> {
    entry.get(key).and_then(integer)
}

pub(crate) fn identifier_at(entry: &Value, key: &str) -> Option<String> {
    entry.get(key).and_then(identifier)
}

/// Key must be present (a JSON null counts as present).
pub(crate) fn require<'a>(entry: &'a Value, key: &str) -> Result<&'a Value> {
    entry.get(key).ok_or_missing(key)
}

pub(crate) fn require_text(entry: &Value, key: &str) -> Result<String> {
    let value = require(entry, key)?;
    text(value).ok_or_else(|| ScopusError::malformed(key, format!("expected text, got {}", value)))
}

pub(crate) fn require_integer(entry: &Value, key: &str) -> Result<i64> {
    let value = require(entry, key)?;
    integer(value)
        .ok_or_else(|| ScopusError::malformed(key, format!("expected integer, got {}", value)))
}

pub(crate) fn require_identifier(entry: &Value, key: &str) -> Result<String> {
    let value = require(entry, key)?;
    identifier(value)
        .ok_or_else(|| ScopusError::malformed(key, format!("expected identifier, got {}", value)))
}

/// Key must be present; a null value is accepted as `None`, a nested structure is not.
pub(crate) fn require_nullable_text(entry: &Value, key: &str) -> Result<Option<String>> {
    match require(entry, key)? {
        Value::Null => Ok(None),
        Value::Array(_) | Value::Object(_) => {
            Err(ScopusError::malformed(key, "expected text, got a nested structure"))
        }
        value => Ok(text(value)),
    }
}

/// A JSON list, or a lone object standing in for a one-element list.
pub(crate) fn require_list<'a>(value: &'a Value, field: &str) -> Result<Vec<&'a Value>> {
    match value {
        Value::Array(items) => Ok(items.iter().collect()),
        Value::Object(_) => Ok(vec![value]),
        other => Err(ScopusError::malformed(field, format!("expected a list, got {}", other))),
    }
}
