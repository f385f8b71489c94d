//! Missing-value detection and column policies

use crate::date::format_date_mmddyyyy;
use serde::{Deserialize, Serialize};

/// Cell contents treated as "no value" (the usual spreadsheet NA markers)
pub const MISSING_TOKENS: [&str; 19] = [
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null", "",
];

/// Check whether a raw cell value counts as missing
///
/// Absent cells, empty cells and NA markers such as `NaN` or `N/A` are missing.
/// Whitespace-only cells are not missing here; callers that need blank
/// detection trim first.
pub fn is_missing(raw: Option<&str>) -> bool {
    match raw {
        None => true,
        Some(value) => MISSING_TOKENS.contains(&value),
    }
}

/// NaN-safe passthrough: missing becomes `""`, anything else is kept verbatim
pub fn clean_value(raw: Option<&str>) -> String {
    match raw {
        Some(value) if !is_missing(raw) => value.to_string(),
        _ => String::new(),
    }
}

/// Remove every `-` from a value, missing becomes `""`
pub fn strip_dashes(raw: Option<&str>) -> String {
    clean_value(raw).replace('-', "")
}

/// Normalization applied to date-like columns (From/To)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatePolicy {
    /// Parse as a calendar date and emit `MMDDYYYY`; unparseable input passes through
    #[default]
    Reformat,
    /// Drop every dash, no date semantics
    StripDashes,
    /// Keep the raw value
    Verbatim,
}

impl DatePolicy {
    /// Apply the policy to a raw cell value
    pub fn apply(self, raw: Option<&str>) -> String {
        match self {
            DatePolicy::Reformat => format_date_mmddyyyy(raw),
            DatePolicy::StripDashes => strip_dashes(raw),
            DatePolicy::Verbatim => clean_value(raw),
        }
    }
}
