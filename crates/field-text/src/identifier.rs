//! Dash-delimited identifier splitting

use crate::value::is_missing;

/// Number of parts an identifier is split into
pub const IDENTIFIER_PARTS: usize = 4;

/// Split a dash-delimited identifier (e.g. a TIN) into exactly four parts
///
/// Missing, blank and `-` placeholder values yield four empty parts.
/// Shorter identifiers are padded on the right with empty strings, longer
/// ones keep only their first four segments.
///
/// # Examples
/// ```
/// use field_text::split_identifier;
/// assert_eq!(split_identifier(Some("123-456-789-000")), ["123", "456", "789", "000"]);
/// assert_eq!(split_identifier(Some("a-b")), ["a", "b", "", ""]);
/// assert_eq!(split_identifier(Some("a-b-c-d-e")), ["a", "b", "c", "d"]);
/// assert_eq!(split_identifier(None), ["", "", "", ""]);
/// ```
pub fn split_identifier(raw: Option<&str>) -> [String; IDENTIFIER_PARTS] {
    let mut parts: [String; IDENTIFIER_PARTS] = Default::default();

    let raw = match raw {
        Some(raw) if !is_missing(Some(raw)) && raw.trim() != "-" => raw,
        _ => return parts,
    };

    // Segments past the fourth are dropped
    for (slot, segment) in parts.iter_mut().zip(raw.split('-')) {
        *slot = segment.to_string();
    }

    parts
}
