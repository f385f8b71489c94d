//! AcroForm field discovery
//!
//! Fields are listed in *document order*: pages in order, widget annotations
//! in `/Annots` order on each page, first occurrence wins. Fields that have no
//! widget on any page are appended afterwards in `/Fields` tree order. A
//! document whose catalog has no `/AcroForm` entry has no fields at all.

use crate::{PdfError, Result};
use lopdf::{Dictionary, Document, Object, ObjectId, StringFormat};
use std::collections::HashSet;

/// Upper bound when following `/Parent` or `/Kids` links
const MAX_FIELD_DEPTH: usize = 32;

/// Field type, from the (possibly inherited) `/FT` entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Button,
    Choice,
    Signature,
    Unknown,
}

impl FieldKind {
    fn from_name(name: &[u8]) -> Self {
        match name {
            b"Tx" => FieldKind::Text,
            b"Btn" => FieldKind::Button,
            b"Ch" => FieldKind::Choice,
            b"Sig" => FieldKind::Signature,
            _ => FieldKind::Unknown,
        }
    }
}

/// A terminal form field
#[derive(Debug, Clone, PartialEq)]
pub struct FormField {
    /// Fully qualified name (`parent.child`)
    pub name: String,
    /// Field type
    pub kind: FieldKind,
    /// Current `/V` value, decoded as text
    pub value: Option<String>,
    /// Object holding the field dictionary
    pub(crate) id: ObjectId,
    /// Widget annotations drawing this field
    pub(crate) widgets: Vec<ObjectId>,
}

/// Resolve a possibly-indirect object
pub(crate) fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Result<&'a Object> {
    match obj {
        Object::Reference(id) => Ok(doc.get_object(*id)?),
        other => Ok(other),
    }
}

/// Read a number from an Integer or Real object
pub(crate) fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(*r as f64),
        _ => None,
    }
}

/// Object ID of the document catalog
pub(crate) fn catalog_id(doc: &Document) -> Result<ObjectId> {
    doc.trailer
        .get(b"Root")
        .map_err(|_| PdfError::ParseError("Document trailer missing Root entry".to_string()))?
        .as_reference()
        .map_err(|_| PdfError::ParseError("Root is not a reference".to_string()))
}

/// The `/AcroForm` dictionary, if the catalog has one
pub(crate) fn acroform(doc: &Document) -> Result<Option<&Dictionary>> {
    let catalog = doc
        .get_object(catalog_id(doc)?)?
        .as_dict()
        .map_err(|_| PdfError::ParseError("Catalog is not a dictionary".to_string()))?;

    match catalog.get(b"AcroForm") {
        Ok(obj) => {
            let dict = resolve(doc, obj)?
                .as_dict()
                .map_err(|_| PdfError::ParseError("AcroForm is not a dictionary".to_string()))?;
            Ok(Some(dict))
        }
        Err(_) => Ok(None),
    }
}

/// Decode a PDF text string (UTF-16BE with BOM, otherwise PDFDocEncoding)
pub fn decode_text_string(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    // PDFDocEncoding agrees with Latin-1 for printable text
    bytes.iter().map(|&b| b as char).collect()
}

/// Encode text as a PDF text string object
///
/// Latin-1 text is stored as a literal string, anything wider as UTF-16BE
/// with a byte order mark.
pub fn encode_text_string(text: &str) -> Object {
    if text.chars().all(|c| (c as u32) < 0x80 || ((c as u32) >= 0xA0 && (c as u32) <= 0xFF)) {
        let bytes: Vec<u8> = text.chars().map(|c| c as u32 as u8).collect();
        return Object::String(bytes, StringFormat::Literal);
    }

    let mut bytes = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

/// Look up an inheritable field attribute, walking up `/Parent`
pub(crate) fn inherited<'a>(
    doc: &'a Document,
    id: ObjectId,
    key: &[u8],
) -> Result<Option<&'a Object>> {
    let mut current = id;
    for _ in 0..MAX_FIELD_DEPTH {
        let dict = doc
            .get_object(current)?
            .as_dict()
            .map_err(|_| PdfError::ParseError("Field is not a dictionary".to_string()))?;
        if let Ok(value) = dict.get(key) {
            return Ok(Some(resolve(doc, value)?));
        }
        match dict.get(b"Parent") {
            Ok(Object::Reference(parent)) => current = *parent,
            _ => break,
        }
    }
    Ok(None)
}

/// Build the fully qualified name of a field (`a.b.c`)
fn qualified_name(doc: &Document, id: ObjectId) -> Result<String> {
    let mut parts = Vec::new();
    let mut current = id;
    for _ in 0..MAX_FIELD_DEPTH {
        let dict = doc
            .get_object(current)?
            .as_dict()
            .map_err(|_| PdfError::ParseError("Field is not a dictionary".to_string()))?;
        if let Ok(Object::String(bytes, _)) = dict.get(b"T").and_then(|t| resolve_t(doc, t)) {
            parts.push(decode_text_string(bytes));
        }
        match dict.get(b"Parent") {
            Ok(Object::Reference(parent)) => current = *parent,
            _ => break,
        }
    }
    parts.reverse();
    Ok(parts.join("."))
}

fn resolve_t<'a>(doc: &'a Document, obj: &'a Object) -> lopdf::Result<&'a Object> {
    match obj {
        Object::Reference(id) => doc.get_object(*id),
        other => Ok(other),
    }
}

fn has_name(dict: &Dictionary) -> bool {
    dict.has(b"T")
}

fn is_widget(dict: &Dictionary) -> bool {
    matches!(dict.get(b"Subtype"), Ok(Object::Name(name)) if name == b"Widget")
}

/// The terminal field a widget annotation belongs to
fn field_of_widget(doc: &Document, widget_id: ObjectId, widget: &Dictionary) -> Option<ObjectId> {
    if has_name(widget) {
        return Some(widget_id);
    }
    match widget.get(b"Parent") {
        Ok(Object::Reference(parent)) => doc
            .get_object(*parent)
            .ok()
            .and_then(|p| p.as_dict().ok())
            .filter(|p| has_name(p))
            .map(|_| *parent),
        _ => None,
    }
}

/// Kids of a field that are themselves named fields
fn named_kids(doc: &Document, dict: &Dictionary) -> Vec<ObjectId> {
    let Ok(kids) = dict.get(b"Kids").and_then(|k| resolve_t(doc, k)) else {
        return Vec::new();
    };
    let Ok(kids) = kids.as_array() else {
        return Vec::new();
    };
    kids.iter()
        .filter_map(|kid| kid.as_reference().ok())
        .filter(|id| {
            doc.get_object(*id)
                .ok()
                .and_then(|o| o.as_dict().ok())
                .map(has_name)
                .unwrap_or(false)
        })
        .collect()
}

/// Widget annotations of a terminal field
fn widgets_of_field(doc: &Document, id: ObjectId, dict: &Dictionary) -> Vec<ObjectId> {
    if is_widget(dict) {
        return vec![id];
    }
    let Ok(kids) = dict.get(b"Kids").and_then(|k| resolve_t(doc, k)) else {
        return Vec::new();
    };
    let Ok(kids) = kids.as_array() else {
        return Vec::new();
    };
    kids.iter()
        .filter_map(|kid| kid.as_reference().ok())
        .filter(|kid| {
            doc.get_object(*kid)
                .ok()
                .and_then(|o| o.as_dict().ok())
                .map(is_widget)
                .unwrap_or(false)
        })
        .collect()
}

/// Walk the `/Fields` tree collecting terminal fields
fn walk_field_tree(
    doc: &Document,
    id: ObjectId,
    depth: usize,
    out: &mut Vec<ObjectId>,
) -> Result<()> {
    if depth > MAX_FIELD_DEPTH {
        return Err(PdfError::ParseError("Form field tree too deep".to_string()));
    }
    let dict = doc
        .get_object(id)?
        .as_dict()
        .map_err(|_| PdfError::ParseError("Field is not a dictionary".to_string()))?;
    let kids = named_kids(doc, dict);
    if kids.is_empty() {
        out.push(id);
    } else {
        for kid in kids {
            walk_field_tree(doc, kid, depth + 1, out)?;
        }
    }
    Ok(())
}

/// Collect the terminal fields of a document in document order
pub(crate) fn collect_fields(doc: &Document) -> Result<Vec<FormField>> {
    let Some(form) = acroform(doc)? else {
        return Ok(Vec::new());
    };

    let mut order: Vec<ObjectId> = Vec::new();
    let mut seen: HashSet<ObjectId> = HashSet::new();

    for page_id in doc.get_pages().values() {
        let page = doc
            .get_object(*page_id)?
            .as_dict()
            .map_err(|_| PdfError::ParseError("Page object is not a dictionary".to_string()))?;
        let Ok(annots) = page.get(b"Annots") else {
            continue;
        };
        let Ok(annots) = resolve(doc, annots)?.as_array() else {
            continue;
        };
        for annot in annots {
            let Ok(annot_id) = annot.as_reference() else {
                continue;
            };
            let Ok(annot_dict) = doc.get_object(annot_id).and_then(|o| o.as_dict()) else {
                continue;
            };
            if !is_widget(annot_dict) {
                continue;
            }
            if let Some(field_id) = field_of_widget(doc, annot_id, annot_dict) {
                if seen.insert(field_id) {
                    order.push(field_id);
                }
            }
        }
    }

    // Fields without any placed widget
    if let Ok(fields) = form.get(b"Fields") {
        if let Ok(fields) = resolve(doc, fields)?.as_array() {
            let mut tree = Vec::new();
            for field in fields {
                if let Ok(id) = field.as_reference() {
                    walk_field_tree(doc, id, 0, &mut tree)?;
                }
            }
            for id in tree {
                if seen.insert(id) {
                    order.push(id);
                }
            }
        }
    }

    let mut fields = Vec::with_capacity(order.len());
    for id in order {
        let dict = doc
            .get_object(id)?
            .as_dict()
            .map_err(|_| PdfError::ParseError("Field is not a dictionary".to_string()))?;
        let kind = match inherited(doc, id, b"FT")? {
            Some(Object::Name(name)) => FieldKind::from_name(name),
            _ => FieldKind::Unknown,
        };
        let value = match inherited(doc, id, b"V")? {
            Some(Object::String(bytes, _)) => Some(decode_text_string(bytes)),
            Some(Object::Name(name)) => Some(String::from_utf8_lossy(name).into_owned()),
            _ => None,
        };
        fields.push(FormField {
            name: qualified_name(doc, id)?,
            kind,
            value,
            id,
            widgets: widgets_of_field(doc, id, dict),
        });
    }

    log::debug!("Found {} form fields", fields.len());
    Ok(fields)
}
