//! PDF Core - Low-level PDF form manipulation
//!
//! This crate provides functionality for:
//! - Opening and saving PDF documents
//! - Listing AcroForm fields in document order
//! - Filling text fields and generating their appearance streams
//! - Flattening filled forms (structural removal or page rasterization)
//! - Merging documents in order
//!
//! # Example
//!
//! ```ignore
//! use pdf_core::{flatten_structural, FormFiller};
//!
//! let filler = FormFiller::from_file("template.pdf")?;
//! let filled = filler.fill([("Text1", "08012025"), ("Text2", "08312025")])?;
//! let mut flattened = flatten_structural(&filled)?;
//! flattened.save("flattened_1.pdf")?;
//! ```

mod appearance;
mod document;
mod fill;
mod flatten;
mod form;
mod image;
mod merge;
mod raster;

pub use appearance::{helvetica_width, TextAppearance};
pub use document::PdfDocument;
pub use fill::FormFiller;
pub use flatten::{assemble_image_pages, flatten_rasterized, flatten_structural};
pub use form::{decode_text_string, encode_text_string, FieldKind, FormField};
pub use image::{detect_format, ImageFormat, PageImage};
pub use merge::{merge_documents, merge_files};
pub use raster::{Pdftoppm, RasterFormat, Rasterizer};

use thiserror::Error;

/// Errors that can occur during PDF operations
#[derive(Debug, Error)]
pub enum PdfError {
    #[error("Failed to open PDF: {0}")]
    OpenError(String),

    #[error("Failed to save PDF: {0}")]
    SaveError(String),

    #[error("Form field not found: {0}")]
    FieldNotFound(String),

    #[error("Image error: {0}")]
    ImageError(String),

    #[error("PDF parsing error: {0}")]
    ParseError(String),

    #[error("Rasterizer unavailable: {0}")]
    RasterizerUnavailable(String),

    #[error("Rasterization failed: {0}")]
    RasterError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Lopdf error: {0}")]
    LopdfError(#[from] lopdf::Error),
}

/// Result type for PDF operations
pub type Result<T> = std::result::Result<T, PdfError>;

/// Horizontal text alignment, as stored in a field's `/Q` entry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

impl Align {
    /// Map a `/Q` quadding value (0 = left, 1 = center, 2 = right)
    pub fn from_quadding(q: i64) -> Self {
        match q {
            1 => Align::Center,
            2 => Align::Right,
            _ => Align::Left,
        }
    }
}
