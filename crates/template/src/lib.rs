//! Template fields - semantic slots and their binding to a PDF form
//!
//! This crate provides:
//! - The 24 semantic slots of the invoice template ([`FieldKey`])
//! - Per-row values for every slot ([`FieldValues`])
//! - Positional or JSON-named binding of slots to form fields ([`FieldSchema`])
//!
//! # Example
//!
//! ```ignore
//! use template::{load_schema, FieldKey, FieldSchema, FieldValues};
//!
//! let schema_file = load_schema("schema.json")?;
//! let schema = FieldSchema::for_document(&template_doc, Some(&schema_file))?;
//! let values = FieldValues::new().with(FieldKey::Payee, "ACME Trading");
//! let map = schema.map(&values);
//! ```

mod mapper;
pub mod parser;
mod schema;
mod values;

pub use mapper::FieldSchema;
pub use parser::{load_schema, parse_schema};
pub use schema::*;
pub use values::{FieldValueMap, FieldValues};

use thiserror::Error;

/// Errors that can occur while building a field schema
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template has {found} fillable fields, at least {required} are required")]
    InsufficientFields { required: usize, found: usize },

    #[error("Schema names fields missing from the template: {}", .0.join(", "))]
    UnknownFields(Vec<String>),

    #[error("Schema leaves keys unbound: {}", .0.join(", "))]
    UnboundKeys(Vec<String>),

    #[error("Template field bound more than once: {0}")]
    DuplicateTarget(String),

    #[error("Failed to parse schema: {0}")]
    ParseError(String),

    #[error("PDF error: {0}")]
    PdfError(#[from] pdf_core::PdfError),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for template operations
pub type Result<T> = std::result::Result<T, TemplateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = TemplateError::InsufficientFields {
            required: 24,
            found: 3,
        };
        assert_eq!(
            err.to_string(),
            "Template has 3 fillable fields, at least 24 are required"
        );

        let err = TemplateError::UnknownFields(vec!["A".to_string(), "B".to_string()]);
        assert_eq!(
            err.to_string(),
            "Schema names fields missing from the template: A, B"
        );
    }
}
