//! Form flattening
//!
//! Two strategies are offered. Structural flattening drops the interactive
//! form and leaves each widget drawing its appearance stream as page
//! content. Rasterized flattening renders every page to an image and builds
//! a new image-only document, so nothing editable survives at all.

use crate::image::{full_page_operators, PageImage};
use crate::raster::Rasterizer;
use crate::{PdfDocument, PdfError, Result};
use lopdf::{dictionary, Dictionary, Document, Object, Stream};
use std::path::Path;

/// Remove the interactive form from a copy of `doc`
///
/// The input is left untouched. The result reports zero form fields.
pub fn flatten_structural(doc: &PdfDocument) -> Result<PdfDocument> {
    let mut flat = doc.clone();
    if !flat.remove_form()? {
        log::debug!("Document has no AcroForm, nothing to flatten");
    }
    Ok(flat)
}

/// Rasterize the PDF at `path` and rebuild it from page images
pub fn flatten_rasterized(path: &Path, rasterizer: &dyn Rasterizer, dpi: u32) -> Result<PdfDocument> {
    let images = rasterizer.rasterize(path, dpi)?;
    log::debug!("Rasterizer returned {} pages", images.len());
    assemble_image_pages(&images, dpi)
}

/// Build a document with one page per encoded image
///
/// Each page is sized so the image covers it exactly at `dpi`.
pub fn assemble_image_pages(images: &[Vec<u8>], dpi: u32) -> Result<PdfDocument> {
    if images.is_empty() {
        return Err(PdfError::RasterError("No page images to assemble".to_string()));
    }
    if dpi == 0 {
        return Err(PdfError::RasterError("DPI must be positive".to_string()));
    }

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut kids = Vec::with_capacity(images.len());

    for data in images {
        let image = PageImage::from_encoded(data)?;
        let (width, height) = image.page_size(dpi);
        let image_id = doc.add_object(image.to_xobject());

        let content = Stream::new(Dictionary::new(), full_page_operators("Im0", width, height));
        let content_id = doc.add_object(content);

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), Object::Real(width as f32), Object::Real(height as f32)],
            "Resources" => dictionary! {
                "XObject" => dictionary! { "Im0" => image_id },
            },
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    Ok(PdfDocument::from_document(doc))
}
