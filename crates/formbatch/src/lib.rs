//! Formbatch - fill, flatten and merge invoice PDFs from CSV rows
//!
//! This crate provides:
//! - CSV ingestion with header validation ([`read_rows`])
//! - Row normalization into the 24 template slots ([`normalize_row`])
//! - The per-row fill / flatten pipeline and the final merge ([`BatchProcessor`])
//! - Batch configuration loaded from JSON ([`BatchConfig`])
//! - The blank CSV template ([`write_csv_template`])
//!
//! # Example
//!
//! ```ignore
//! use formbatch::{process_csv, BatchConfig};
//!
//! let config = BatchConfig::new().with_output_dir("out");
//! match process_csv("invoices.csv", "template.pdf", &config) {
//!     Ok(summary) => println!("{}", summary.status_message()),
//!     Err(failure) => eprintln!("{}", failure.status_message()),
//! }
//! ```

mod asset;
mod batch;
mod config;
mod row;

pub use asset::{write_csv_template, CSV_TEMPLATE};
pub use batch::{
    process_csv, BatchFailure, BatchProcessor, BatchSummary, RowOutcome, RowOutput, RowReport,
};
pub use config::{BatchConfig, FailurePolicy, FlattenStrategy, DEFAULT_DPI, MERGED_FILE_NAME};
pub use row::{normalize_row, parse_rows, read_rows, CsvRow, REQUIRED_COLUMNS};

use thiserror::Error;

/// Errors that can occur while running a batch
#[derive(Debug, Error)]
pub enum BatchError {
    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error("CSV is missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("CSV record {record} has {found} cells, the header has {expected}")]
    ExtraCells {
        record: usize,
        found: usize,
        expected: usize,
    },

    #[error("Template error: {0}")]
    Template(#[from] template::TemplateError),

    #[error("PDF error: {0}")]
    Pdf(#[from] pdf_core::PdfError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Result type for batch operations
pub type Result<T> = std::result::Result<T, BatchError>;
