//! PDF Document wrapper

use crate::appearance::{TextAppearance, APPEARANCE_FONT};
use crate::form::{
    acroform, catalog_id, collect_fields, encode_text_string, inherited, number, resolve,
};
use crate::{Align, FieldKind, FormField, PdfError, Result};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use std::path::Path;

/// Field flag: comb field (bit 25)
const FLAG_COMB: i64 = 1 << 24;

/// Appearance state of an unselected button
const BUTTON_OFF: &[u8] = b"Off";

/// PDF Document wrapper providing form-level operations
#[derive(Debug, Clone)]
pub struct PdfDocument {
    /// The underlying lopdf document
    inner: Document,
}

impl PdfDocument {
    /// Open a PDF document from a file path
    ///
    /// # Example
    /// ```ignore
    /// let doc = PdfDocument::open("template.pdf")?;
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let inner = Document::load(path)
            .map_err(|e| PdfError::OpenError(format!("{}: {e}", path.display())))?;
        Ok(Self { inner })
    }

    /// Open a PDF document from bytes
    pub fn open_from_bytes(data: &[u8]) -> Result<Self> {
        let inner = Document::load_mem(data).map_err(|e| PdfError::OpenError(e.to_string()))?;
        Ok(Self { inner })
    }

    /// Wrap an already built lopdf document
    pub fn from_document(inner: Document) -> Self {
        Self { inner }
    }

    /// Get the number of pages in the document
    pub fn page_count(&self) -> usize {
        self.inner.get_pages().len()
    }

    /// Get all page object IDs in page order
    pub fn get_page_ids(&self) -> Vec<ObjectId> {
        self.inner.get_pages().values().copied().collect()
    }

    /// Whether the catalog still carries an interactive form
    pub fn has_form(&self) -> Result<bool> {
        Ok(acroform(&self.inner)?.is_some())
    }

    /// Terminal form fields in document order
    pub fn form_fields(&self) -> Result<Vec<FormField>> {
        collect_fields(&self.inner)
    }

    /// Names of the terminal form fields in document order
    ///
    /// A document without an interactive form reports no names.
    pub fn form_field_names(&self) -> Result<Vec<String>> {
        Ok(self.form_fields()?.into_iter().map(|f| f.name).collect())
    }

    /// Current value of a field, if set
    pub fn field_value(&self, name: &str) -> Result<Option<String>> {
        self.form_fields()?
            .into_iter()
            .find(|f| f.name == name)
            .map(|f| f.value)
            .ok_or_else(|| PdfError::FieldNotFound(name.to_string()))
    }

    /// Set field values and regenerate text field appearances
    ///
    /// Fields not named keep their current value. Naming a field the
    /// document does not have is an error, checked before anything changes.
    pub fn fill_fields<'a, I>(&mut self, values: I) -> Result<()>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let fields = self.form_fields()?;
        let mut updates = Vec::new();
        for (name, value) in values {
            let field = fields
                .iter()
                .find(|f| f.name == name)
                .ok_or_else(|| PdfError::FieldNotFound(name.to_string()))?;
            updates.push((field, value));
        }

        let font_id = self.inner.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });

        for (field, value) in updates {
            match field.kind {
                FieldKind::Button => self.set_button_state(field.id, &field.widgets, value)?,
                kind => {
                    self.field_dict_mut(field.id)?.set("V", encode_text_string(value));
                    if kind == FieldKind::Text {
                        for widget in &field.widgets {
                            self.set_text_appearance(field.id, *widget, value, font_id)?;
                        }
                    }
                }
            }
            log::debug!("Set field {:?} = {:?}", field.name, value);
        }

        self.set_need_appearances()?;
        Ok(())
    }

    /// Select a check box or radio state
    ///
    /// The value names the state; blank selects `Off`. Each widget shows the
    /// state when its normal appearance defines one, `Off` otherwise.
    fn set_button_state(
        &mut self,
        field_id: ObjectId,
        widgets: &[ObjectId],
        value: &str,
    ) -> Result<()> {
        let state = match value.trim() {
            "" => BUTTON_OFF.to_vec(),
            state => state.as_bytes().to_vec(),
        };
        self.field_dict_mut(field_id)?.set("V", Object::Name(state.clone()));

        for widget_id in widgets {
            let shown = if self.widget_has_state(*widget_id, &state)? {
                state.clone()
            } else {
                BUTTON_OFF.to_vec()
            };
            self.field_dict_mut(*widget_id)?.set("AS", Object::Name(shown));
        }
        Ok(())
    }

    /// Whether a widget's `/AP /N` dictionary has an entry named `state`
    fn widget_has_state(&self, widget_id: ObjectId, state: &[u8]) -> Result<bool> {
        let widget = self
            .inner
            .get_object(widget_id)?
            .as_dict()
            .map_err(|_| PdfError::ParseError("Widget is not a dictionary".to_string()))?;
        let Ok(ap) = widget.get(b"AP") else {
            return Ok(false);
        };
        let normal = match resolve(&self.inner, ap)?.as_dict() {
            Ok(ap) => match ap.get(b"N") {
                Ok(normal) => resolve(&self.inner, normal)?,
                Err(_) => return Ok(false),
            },
            Err(_) => return Ok(false),
        };
        Ok(normal.as_dict().map(|n| n.has(state)).unwrap_or(false))
    }

    fn field_dict_mut(&mut self, id: ObjectId) -> Result<&mut Dictionary> {
        self.inner
            .get_object_mut(id)?
            .as_dict_mut()
            .map_err(|_| PdfError::ParseError("Field is not a dictionary".to_string()))
    }

    /// Build and attach the normal appearance of one text widget
    fn set_text_appearance(
        &mut self,
        field_id: ObjectId,
        widget_id: ObjectId,
        value: &str,
        font_id: ObjectId,
    ) -> Result<()> {
        let rect = match inherited(&self.inner, widget_id, b"Rect")? {
            Some(Object::Array(rect)) if rect.len() == 4 => {
                let coords: Vec<f64> = rect.iter().filter_map(number).collect();
                if coords.len() != 4 {
                    return Err(PdfError::ParseError("Widget Rect is not numeric".to_string()));
                }
                coords
            }
            _ => return Err(PdfError::ParseError("Widget missing Rect".to_string())),
        };
        let width = (rect[2] - rect[0]).abs();
        let height = (rect[3] - rect[1]).abs();

        let mut look = TextAppearance::new(width, height);
        if let Some(Object::String(da, _)) = self.default_appearance(widget_id)? {
            look = look.with_default_appearance(&String::from_utf8_lossy(&da));
        }
        if let Some(q) = self.quadding(field_id)? {
            look.align = Align::from_quadding(q);
        }
        let flags = match inherited(&self.inner, field_id, b"Ff")? {
            Some(Object::Integer(flags)) => *flags,
            _ => 0,
        };
        if flags & FLAG_COMB != 0 {
            if let Some(Object::Integer(max_len)) = inherited(&self.inner, field_id, b"MaxLen")? {
                look.comb = Some((*max_len).max(0) as usize);
            }
        }

        let stream = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Form",
                "BBox" => vec![0.into(), 0.into(), Object::Real(width as f32), Object::Real(height as f32)],
                "Resources" => dictionary! {
                    "Font" => dictionary! { APPEARANCE_FONT => font_id },
                },
            },
            look.content(value),
        );
        let stream_id = self.inner.add_object(stream);

        self.inner
            .get_object_mut(widget_id)?
            .as_dict_mut()
            .map_err(|_| PdfError::ParseError("Widget is not a dictionary".to_string()))?
            .set("AP", dictionary! { "N" => stream_id });
        Ok(())
    }

    /// `/DA` of a widget, falling back to the field tree, then the AcroForm
    fn default_appearance(&self, widget_id: ObjectId) -> Result<Option<Object>> {
        if let Some(da) = inherited(&self.inner, widget_id, b"DA")? {
            return Ok(Some(da.clone()));
        }
        Ok(acroform(&self.inner)?.and_then(|form| form.get(b"DA").ok().cloned()))
    }

    /// `/Q` of a field, falling back to the AcroForm
    fn quadding(&self, field_id: ObjectId) -> Result<Option<i64>> {
        if let Some(Object::Integer(q)) = inherited(&self.inner, field_id, b"Q")? {
            return Ok(Some(*q));
        }
        Ok(acroform(&self.inner)?
            .and_then(|form| form.get(b"Q").ok())
            .and_then(|q| q.as_i64().ok()))
    }

    /// Mutable access to the AcroForm dictionary, direct or indirect
    fn acroform_mut(&mut self) -> Result<Option<&mut Dictionary>> {
        let catalog_id = catalog_id(&self.inner)?;
        let form_ref = match self.catalog()?.get(b"AcroForm") {
            Ok(Object::Reference(id)) => Some(*id),
            Ok(_) => None,
            Err(_) => return Ok(None),
        };

        let form = match form_ref {
            Some(id) => self.inner.get_object_mut(id)?,
            None => self
                .inner
                .get_object_mut(catalog_id)?
                .as_dict_mut()
                .map_err(|_| PdfError::ParseError("Catalog is not a dictionary".to_string()))?
                .get_mut(b"AcroForm")?,
        };
        form.as_dict_mut()
            .map(Some)
            .map_err(|_| PdfError::ParseError("AcroForm is not a dictionary".to_string()))
    }

    fn set_need_appearances(&mut self) -> Result<()> {
        if let Some(form) = self.acroform_mut()? {
            form.set("NeedAppearances", Object::Boolean(true));
        }
        Ok(())
    }

    fn catalog(&self) -> Result<&Dictionary> {
        self.inner
            .get_object(catalog_id(&self.inner)?)?
            .as_dict()
            .map_err(|_| PdfError::ParseError("Catalog is not a dictionary".to_string()))
    }

    /// Remove the interactive form definition from the catalog
    ///
    /// Widget annotations stay on their pages and keep drawing their
    /// appearance streams, but no longer belong to an editable form.
    /// Returns whether a form was present.
    pub fn remove_form(&mut self) -> Result<bool> {
        let catalog_id = catalog_id(&self.inner)?;
        let removed = self
            .inner
            .get_object_mut(catalog_id)?
            .as_dict_mut()
            .map_err(|_| PdfError::ParseError("Catalog is not a dictionary".to_string()))?
            .remove(b"AcroForm")
            .is_some();
        if removed {
            self.inner.prune_objects();
        }
        Ok(removed)
    }

    /// Save the document to a file
    pub fn save<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.inner
            .save(path)
            .map_err(|e| PdfError::SaveError(e.to_string()))?;
        Ok(())
    }

    /// Save the document to bytes
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.inner
            .save_to(&mut buffer)
            .map_err(|e| PdfError::SaveError(e.to_string()))?;
        Ok(buffer)
    }

    /// Get a reference to the underlying lopdf document
    pub fn inner(&self) -> &Document {
        &self.inner
    }

    /// Consume the wrapper, returning the lopdf document
    pub fn into_inner(self) -> Document {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// One page with a comb TIN field and a right-aligned amount field
    fn form_bytes() -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let page_id = doc.new_object_id();
        let tin = doc.add_object(dictionary! {
            "Type" => "Annot",
            "Subtype" => "Widget",
            "FT" => "Tx",
            "T" => Object::string_literal("tin"),
            "Ff" => FLAG_COMB,
            "MaxLen" => 3,
            "Rect" => vec![10.into(), 700.into(), 70.into(), 720.into()],
            "P" => page_id,
        });
        let amount = doc.add_object(dictionary! {
            "Type" => "Annot",
            "Subtype" => "Widget",
            "FT" => "Tx",
            "T" => Object::string_literal("amount"),
            "Q" => 2,
            "DA" => Object::string_literal("/Helv 9 Tf 0 g"),
            "Rect" => vec![10.into(), 600.into(), 110.into(), 620.into()],
            "P" => page_id,
        });
        doc.objects.insert(
            page_id,
            Object::Dictionary(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                "Annots" => vec![tin.into(), amount.into()],
            }),
        );
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );
        let form = doc.add_object(dictionary! {
            "Fields" => vec![tin.into(), amount.into()],
            "DA" => Object::string_literal("/Helv 0 Tf 0 g"),
        });
        let catalog = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
            "AcroForm" => form,
        });
        doc.trailer.set("Root", catalog);

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer).unwrap();
        buffer
    }

    fn appearance_of(doc: &PdfDocument, name: &str) -> String {
        let field = doc
            .form_fields()
            .unwrap()
            .into_iter()
            .find(|f| f.name == name)
            .unwrap();
        let widget = doc.inner().get_object(field.widgets[0]).unwrap().as_dict().unwrap();
        let ap = widget.get(b"AP").unwrap().as_dict().unwrap();
        let stream_id = ap.get(b"N").unwrap().as_reference().unwrap();
        let stream = doc.inner().get_object(stream_id).unwrap().as_stream().unwrap();
        String::from_utf8_lossy(&stream.content).into_owned()
    }

    #[test]
    fn test_field_names_in_document_order() {
        let doc = PdfDocument::open_from_bytes(&form_bytes()).unwrap();
        assert_eq!(doc.form_field_names().unwrap(), vec!["tin", "amount"]);
        assert!(doc.has_form().unwrap());
    }

    #[test]
    fn test_fill_sets_values_and_appearances() {
        let mut doc = PdfDocument::open_from_bytes(&form_bytes()).unwrap();
        doc.fill_fields([("tin", "123"), ("amount", "1,500.00")]).unwrap();

        assert_eq!(doc.field_value("tin").unwrap().as_deref(), Some("123"));
        assert_eq!(doc.field_value("amount").unwrap().as_deref(), Some("1,500.00"));

        let tin = appearance_of(&doc, "tin");
        assert_eq!(tin.matches(" Tj").count(), 3);

        let amount = appearance_of(&doc, "amount");
        assert!(amount.contains("/Helv 9 Tf"));
        assert!(amount.contains("(1,500.00) Tj"));
    }

    #[test]
    fn test_fill_sets_need_appearances() {
        let mut doc = PdfDocument::open_from_bytes(&form_bytes()).unwrap();
        doc.fill_fields([("tin", "1")]).unwrap();
        let form = acroform(doc.inner()).unwrap().unwrap();
        assert!(form.get(b"NeedAppearances").unwrap().as_bool().unwrap());
    }

    #[test]
    fn test_fill_unknown_field_changes_nothing() {
        let mut doc = PdfDocument::open_from_bytes(&form_bytes()).unwrap();
        let err = doc.fill_fields([("tin", "1"), ("nope", "x")]).unwrap_err();
        assert!(matches!(err, PdfError::FieldNotFound(name) if name == "nope"));
        assert_eq!(doc.field_value("tin").unwrap(), None);
    }

    #[test]
    fn test_remove_form() {
        let mut doc = PdfDocument::open_from_bytes(&form_bytes()).unwrap();
        assert!(doc.remove_form().unwrap());
        assert!(!doc.has_form().unwrap());
        assert!(doc.form_field_names().unwrap().is_empty());
        assert!(!doc.remove_form().unwrap());
    }

    /// One page with a check box whose on state is `Yes`
    fn checkbox_bytes() -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let page_id = doc.new_object_id();
        let on = doc.add_object(Stream::new(Dictionary::new(), b"0 0 m".to_vec()));
        let off = doc.add_object(Stream::new(Dictionary::new(), Vec::new()));
        let check = doc.add_object(dictionary! {
            "Type" => "Annot",
            "Subtype" => "Widget",
            "FT" => "Btn",
            "T" => Object::string_literal("paid"),
            "V" => Object::Name(b"Off".to_vec()),
            "AS" => Object::Name(b"Off".to_vec()),
            "Rect" => vec![10.into(), 700.into(), 22.into(), 712.into()],
            "AP" => dictionary! {
                "N" => dictionary! { "Yes" => on, "Off" => off },
            },
            "P" => page_id,
        });
        doc.objects.insert(
            page_id,
            Object::Dictionary(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                "Annots" => vec![check.into()],
            }),
        );
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );
        let catalog = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
            "AcroForm" => dictionary! { "Fields" => vec![check.into()] },
        });
        doc.trailer.set("Root", catalog);

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer).unwrap();
        buffer
    }

    fn check_state(doc: &PdfDocument) -> (Vec<u8>, Vec<u8>) {
        let field = &doc.form_fields().unwrap()[0];
        let dict = doc.inner().get_object(field.id).unwrap().as_dict().unwrap();
        let v = dict.get(b"V").unwrap().as_name().unwrap().to_vec();
        let state = dict.get(b"AS").unwrap().as_name().unwrap().to_vec();
        (v, state)
    }

    #[test]
    fn test_fill_checkbox_sets_name_and_state() {
        let mut doc = PdfDocument::open_from_bytes(&checkbox_bytes()).unwrap();
        doc.fill_fields([("paid", "Yes")]).unwrap();
        assert_eq!(check_state(&doc), (b"Yes".to_vec(), b"Yes".to_vec()));
        assert_eq!(doc.field_value("paid").unwrap().as_deref(), Some("Yes"));
        // No text appearance replaces the on/off appearances
        let widget = doc.inner().get_object(doc.form_fields().unwrap()[0].id).unwrap();
        let normal = widget.as_dict().unwrap().get(b"AP").unwrap().as_dict().unwrap();
        assert!(normal.get(b"N").unwrap().as_dict().unwrap().has(b"Yes"));
    }

    #[test]
    fn test_fill_checkbox_blank_or_unknown_state_is_off() {
        let mut doc = PdfDocument::open_from_bytes(&checkbox_bytes()).unwrap();
        doc.fill_fields([("paid", "")]).unwrap();
        assert_eq!(check_state(&doc), (b"Off".to_vec(), b"Off".to_vec()));

        doc.fill_fields([("paid", "Maybe")]).unwrap();
        assert_eq!(check_state(&doc), (b"Maybe".to_vec(), b"Off".to_vec()));
    }

    #[test]
    fn test_open_garbage_fails() {
        let err = PdfDocument::open_from_bytes(b"not a pdf").unwrap_err();
        assert!(matches!(err, PdfError::OpenError(_)));
    }
}
