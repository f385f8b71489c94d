//! Template filling

use crate::{PdfDocument, Result};
use std::path::Path;

/// Fills copies of a template held in memory
///
/// The template is parsed once to learn its field names; every call to
/// [`FormFiller::fill`] starts again from the original bytes, so fills
/// never see each other's values.
#[derive(Debug, Clone)]
pub struct FormFiller {
    template: Vec<u8>,
    field_names: Vec<String>,
}

impl FormFiller {
    /// Create a filler from template bytes
    pub fn new(template: Vec<u8>) -> Result<Self> {
        let doc = PdfDocument::open_from_bytes(&template)?;
        let field_names = doc.form_field_names()?;
        log::debug!("Template has {} fields", field_names.len());
        Ok(Self {
            template,
            field_names,
        })
    }

    /// Create a filler from a template file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::new(std::fs::read(path)?)
    }

    /// Field names of the template, in document order
    pub fn field_names(&self) -> &[String] {
        &self.field_names
    }

    /// Fill a fresh copy of the template
    ///
    /// # Errors
    /// `PdfError::FieldNotFound` when a pair names a field the template
    /// does not have.
    pub fn fill<'a, I>(&self, values: I) -> Result<PdfDocument>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut doc = PdfDocument::open_from_bytes(&self.template)?;
        doc.fill_fields(values)?;
        Ok(doc)
    }

    /// Fill a fresh copy and serialize it
    pub fn fill_to_bytes<'a, I>(&self, values: I) -> Result<Vec<u8>>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        self.fill(values)?.to_bytes()
    }
}
