//! Sentence-aware string truncation for display.
//!
//! Positions are counted in characters, not bytes.

use crate::error::{Result, ScopusError};

/// Default lower bound of the search window.
pub const DEFAULT_MIN_POS: usize = 0;

/// Default maximum length before truncation kicks in.
pub const DEFAULT_MAX_POS: usize = 75;

const SUFFIX: &str = "...";

/// Shorten `s` to at most `max_pos` characters.
///
/// In priority order: return `s` whole if it fits; otherwise cut at the last
/// `.` inside `[min_pos, max_pos)`; otherwise at the last space in that
/// window; otherwise hard-cut at `max_pos`. `"..."` is appended in every case
/// when `ellipsis` is set.
///
/// # Errors
///
/// `InvalidRange` if `max_pos < min_pos`.
pub fn truncate(s: &str, min_pos: usize, max_pos: usize, ellipsis: bool) -> Result<String> {
    if max_pos < min_pos {
        return Err(ScopusError::InvalidRange {
            min: min_pos,
            max: max_pos,
        });
    }

    let suffix = if ellipsis { SUFFIX } else { "" };
    let chars: Vec<char> = s.chars().collect();

    if chars.len() <= max_pos {
        return Ok(format!("{}{}", s, suffix));
    }

    let window = &chars[min_pos..max_pos];
    let end = rfind(window, '.')
        .or_else(|| rfind(window, ' '))
        .map(|offset| min_pos + offset)
        .unwrap_or(max_pos);

    let mut out: String = chars[..end].iter().collect();
    out.push_str(suffix);
    Ok(out)
}

/// [`truncate`] with the default window and an ellipsis.
pub fn truncate_default(s: &str) -> String {
    // The default window is always valid.
    truncate(s, DEFAULT_MIN_POS, DEFAULT_MAX_POS, true).unwrap_or_else(|_| s.to_string())
}

fn rfind(window: &[char], needle: char) -> Option<usize> {
    window.iter().rposition(|&c| c == needle)
}
