//! Concatenating documents

use crate::form::{catalog_id, inherited};
use crate::{PdfDocument, PdfError, Result};
use lopdf::{dictionary, Document, Object, ObjectId};
use std::collections::BTreeMap;
use std::path::Path;

/// Page attributes a page may inherit from its ancestors in the page tree
const INHERITABLE: [&[u8]; 4] = [b"MediaBox", b"CropBox", b"Resources", b"Rotate"];

/// Concatenate documents, keeping input order and page order
///
/// Returns `None` when there is nothing to merge. Catalog-level entries
/// of the inputs (forms, outlines, names) are not carried over.
pub fn merge_documents(documents: Vec<PdfDocument>) -> Result<Option<PdfDocument>> {
    if documents.is_empty() {
        return Ok(None);
    }

    let mut merged = Document::with_version("1.5");
    let mut objects: BTreeMap<ObjectId, Object> = BTreeMap::new();
    let mut page_ids: Vec<ObjectId> = Vec::new();
    let mut next_id = 1;

    for document in documents {
        let mut doc = document.into_inner();
        doc.renumber_objects_with(next_id);
        next_id = doc.max_id + 1;

        let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
        for page_id in &pages {
            materialize_inherited(&mut doc, *page_id)?;
        }
        let catalog = catalog_id(&doc)?;

        for (id, object) in doc.objects {
            if id == catalog || is_page_tree_node(&object) {
                continue;
            }
            objects.insert(id, object);
        }
        page_ids.extend(pages);
    }

    merged.objects = objects;
    merged.max_id = next_id - 1;
    let pages_id = merged.new_object_id();

    for page_id in &page_ids {
        merged
            .get_object_mut(*page_id)?
            .as_dict_mut()
            .map_err(|_| PdfError::ParseError("Page object is not a dictionary".to_string()))?
            .set("Parent", pages_id);
    }

    let count = page_ids.len() as i64;
    let kids: Vec<Object> = page_ids.into_iter().map(Object::Reference).collect();
    merged.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = merged.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    merged.trailer.set("Root", catalog_id);
    merged.prune_objects();

    log::debug!("Merged document has {} pages", count);
    Ok(Some(PdfDocument::from_document(merged)))
}

/// Open and concatenate PDF files in the given order
///
/// Any file that cannot be opened aborts the whole merge.
pub fn merge_files<P: AsRef<Path>>(paths: &[P]) -> Result<Option<PdfDocument>> {
    let documents = paths
        .iter()
        .map(PdfDocument::open)
        .collect::<Result<Vec<_>>>()?;
    merge_documents(documents)
}

/// Copy inherited page attributes onto the page itself
fn materialize_inherited(doc: &mut Document, page_id: ObjectId) -> Result<()> {
    let mut found = Vec::new();
    {
        let page = doc
            .get_object(page_id)?
            .as_dict()
            .map_err(|_| PdfError::ParseError("Page object is not a dictionary".to_string()))?;
        for key in INHERITABLE {
            if page.has(key) {
                continue;
            }
            if let Some(value) = inherited(doc, page_id, key)? {
                found.push((key, value.clone()));
            }
        }
    }

    let page = doc
        .get_object_mut(page_id)?
        .as_dict_mut()
        .map_err(|_| PdfError::ParseError("Page object is not a dictionary".to_string()))?;
    for (key, value) in found {
        page.set(key.to_vec(), value);
    }
    Ok(())
}

fn is_page_tree_node(object: &Object) -> bool {
    match object {
        Object::Dictionary(dict) => {
            matches!(dict.get(b"Type"), Ok(Object::Name(name)) if name == b"Pages")
        }
        _ => false,
    }
}
