//! Column name cleansing
//!
//! Spreadsheet authors leave behind trailing blanks, non-breaking spaces, empty
//! cells and repeated names. Every list of table or column names goes through
//! [`cleanse`] before it is compared or emitted.

use std::collections::HashSet;

/// Invisible characters removed from anywhere in a name
const INVISIBLE: [char; 4] = ['\u{00A0}', '\u{200B}', '\u{2000}', '\u{180E}'];

fn is_nan_marker(name: &str) -> bool {
    name == "NaN" || name == "nan"
}

/// Cleanse a single name, returning `None` when nothing valid remains
pub fn cleanse_one(name: Option<&str>) -> Option<String> {
    let name = name?;
    if name.is_empty() || is_nan_marker(name) {
        return None;
    }

    let stripped: String = name.chars().filter(|c| !INVISIBLE.contains(c)).collect();
    let trimmed = stripped.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_string())
}

/// Cleanse a list of names
///
/// Drops empty, null and `NaN` entries, strips invisible characters and
/// surrounding whitespace, then deduplicates keeping the first occurrence.
pub fn cleanse<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = Option<S>>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    names
        .into_iter()
        .filter_map(|name| cleanse_one(name.as_ref().map(AsRef::as_ref)))
        .filter(|name| seen.insert(name.clone()))
        .collect()
}
