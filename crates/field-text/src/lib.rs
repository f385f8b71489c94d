//! Field Text - value normalization for form filling
//!
//! This crate provides:
//! - Dash-delimited identifier splitting (TIN-style, always 4 parts)
//! - Missing-value detection for CSV cells (`NaN`, `N/A`, blanks, ...)
//! - Calendar date reformatting to `MMDDYYYY`
//! - The date-column normalization policy
//!
//! Everything here is total: malformed input degrades to a blank or to the
//! raw string, never to an error.
//!
//! # Example
//!
//! ```
//! use field_text::{split_identifier, DatePolicy};
//!
//! assert_eq!(split_identifier(Some("123-456")), ["123", "456", "", ""]);
//! assert_eq!(DatePolicy::Reformat.apply(Some("8/1/2025")), "08012025");
//! ```

mod date;
mod identifier;
mod value;

pub use date::{format_date_mmddyyyy, parse_date};
pub use identifier::{split_identifier, IDENTIFIER_PARTS};
pub use value::{clean_value, is_missing, strip_dashes, DatePolicy, MISSING_TOKENS};

use thiserror::Error;

/// Errors that can occur during value normalization
#[derive(Debug, Error)]
pub enum FieldTextError {
    #[error("Invalid date: {0}")]
    InvalidDate(String),
}

/// Result type for normalization operations
pub type Result<T> = std::result::Result<T, FieldTextError>;
