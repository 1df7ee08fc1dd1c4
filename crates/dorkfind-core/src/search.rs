//! Literal substring matching over dork records.
//!
//! User input is never interpreted as a pattern language. A `SubstringPattern`
//! carries the raw text together with its case-folded form for in-process
//! matching, and can render an escaped SQL `LIKE`/`ILIKE` pattern for stores
//! whose matching primitive treats `%` and `_` as wildcards.

use crate::error::{DorkError, Result};
use crate::types::DorkRecord;

/// Escape character used in rendered `LIKE` patterns.
pub const LIKE_ESCAPE: char = '\\';

/// A validated, case-insensitive literal substring needle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubstringPattern {
    raw: String,
    folded: String,
}

impl SubstringPattern {
    /// Build a pattern from raw user text.
    ///
    /// Empty text is rejected: an empty needle would match every record.
    pub fn new(raw: &str) -> Result<Self> {
        if raw.is_empty() {
            return Err(DorkError::invalid_request("Query parameter is required"));
        }
        Ok(SubstringPattern {
            raw: raw.to_string(),
            folded: fold_case(raw),
        })
    }

    /// The text exactly as the user typed it
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Lowercased needle used for in-process matching
    pub fn folded(&self) -> &str {
        &self.folded
    }

    /// Check whether `text` contains this pattern, ignoring case.
    pub fn matches(&self, text: &str) -> bool {
        fold_case(text).contains(&self.folded)
    }

    /// Check a record's `query` field against this pattern.
    pub fn matches_record(&self, record: &DorkRecord) -> bool {
        self.matches(&record.query)
    }

    /// Render `%<escaped>%` for an `ILIKE ... ESCAPE '\'` comparison.
    pub fn like_pattern(&self) -> String {
        let escaped = escape_like(&self.raw);
        let mut pattern = String::with_capacity(escaped.len() + 2);
        pattern.push('%');
        pattern.push_str(&escaped);
        pattern.push('%');
        pattern
    }
}

/// Lowercase `text` one character at a time.
///
/// `str::to_lowercase` maps a final capital sigma to `ς`, so a needle and a
/// longer haystack containing the same letters could fold differently.
pub fn fold_case(text: &str) -> String {
    text.chars().flat_map(char::to_lowercase).collect()
}

/// Escape `LIKE` metacharacters so the text matches only itself.
///
/// `%`, `_` and the escape character are each prefixed with `\`.
pub fn escape_like(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 4);
    for c in text.chars() {
        if matches!(c, '%' | '_' | LIKE_ESCAPE) {
            out.push(LIKE_ESCAPE);
        }
        out.push(c);
    }
    out
}

/// Keep only the records whose `query` field contains `pattern`.
pub fn filter_records<'a, I>(records: I, pattern: &SubstringPattern) -> Vec<DorkRecord>
where
    I: IntoIterator<Item = &'a DorkRecord>,
{
    records
        .into_iter()
        .filter(|r| pattern.matches_record(r))
        .cloned()
        .collect()
}
