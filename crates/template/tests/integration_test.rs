//! Integration tests for the template crate
//!
//! Schemas are resolved against form PDFs built in memory and the mapped
//! values are filled through pdf-core.

use lopdf::{dictionary, Object};
use pdf_core::{FormFiller, PdfDocument};
use pretty_assertions::assert_eq;
use template::{
    load_schema, FieldKey, FieldSchema, FieldValues, SchemaFile, TemplateError, FIELD_COUNT,
};

/// One-page form with text fields named by `names`, in widget order
fn create_form_pdf(names: &[&str]) -> Vec<u8> {
    let mut doc = lopdf::Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let page_id = doc.new_object_id();

    let mut widgets: Vec<Object> = Vec::new();
    for (i, name) in names.iter().enumerate() {
        let y = 800 - 30 * i as i64;
        let widget = doc.add_object(dictionary! {
            "Type" => "Annot",
            "Subtype" => "Widget",
            "FT" => "Tx",
            "T" => Object::string_literal(*name),
            "Rect" => vec![40.into(), y.into(), 300.into(), (y + 18).into()],
            "P" => page_id,
        });
        widgets.push(widget.into());
    }

    doc.objects.insert(
        page_id,
        Object::Dictionary(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Annots" => widgets.clone(),
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
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
        "AcroForm" => dictionary! { "Fields" => widgets },
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

fn text_names(count: usize) -> Vec<String> {
    (1..=count).map(|i| format!("Text{i}")).collect()
}

fn as_strs(names: &[String]) -> Vec<&str> {
    names.iter().map(String::as_str).collect()
}

#[test]
fn test_positional_schema_from_document() {
    let names = text_names(24);
    let doc = PdfDocument::open_from_bytes(&create_form_pdf(&as_strs(&names))).unwrap();
    let schema = FieldSchema::for_document(&doc, None).unwrap();

    assert_eq!(schema.target(FieldKey::FromDate), "Text1");
    assert_eq!(schema.target(FieldKey::MyTinPart4), "Text13");
    assert_eq!(schema.target(FieldKey::MaxTotal), "Text24");
}

#[test]
fn test_template_with_too_few_fields() {
    let names = text_names(10);
    let doc = PdfDocument::open_from_bytes(&create_form_pdf(&as_strs(&names))).unwrap();
    let err = FieldSchema::for_document(&doc, None).unwrap_err();
    assert!(matches!(
        err,
        TemplateError::InsufficientFields {
            required: 24,
            found: 10
        }
    ));
}

#[test]
fn test_named_schema_file_round_trip() {
    let names = text_names(24);
    let doc = PdfDocument::open_from_bytes(&create_form_pdf(&as_strs(&names))).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("schema.json");
    let exported = SchemaFile::from_field_names(&names);
    std::fs::write(&path, exported.to_json().unwrap()).unwrap();

    let loaded = load_schema(&path).unwrap();
    assert_eq!(loaded, exported);

    let named = FieldSchema::for_document(&doc, Some(&loaded)).unwrap();
    let positional = FieldSchema::for_document(&doc, None).unwrap();
    assert_eq!(named, positional);
}

#[test]
fn test_named_schema_against_renamed_template() {
    let names: Vec<String> = FieldKey::ALL.iter().map(|k| format!("f_{k}")).collect();
    let doc = PdfDocument::open_from_bytes(&create_form_pdf(&as_strs(&names))).unwrap();

    let json = format!(
        r#"{{ "version": "1.0", "fields": {{ {} }} }}"#,
        FieldKey::ALL
            .iter()
            .map(|k| format!(r#""{k}": "f_{k}""#))
            .collect::<Vec<_>>()
            .join(", ")
    );
    let file = template::parse_schema(&json).unwrap();
    let schema = FieldSchema::for_document(&doc, Some(&file)).unwrap();
    assert_eq!(schema.target(FieldKey::IpsEwt), "f_ips_ewt");
}

#[test]
fn test_mapped_values_fill_the_template() {
    let names = text_names(FIELD_COUNT);
    let filler = FormFiller::new(create_form_pdf(&as_strs(&names))).unwrap();
    let schema = FieldSchema::positional(filler.field_names()).unwrap();

    let values = FieldValues::new()
        .with(FieldKey::FromDate, "08012025")
        .with(FieldKey::TinPart1, "123")
        .with(FieldKey::Payee, "ACME Trading");
    let map = schema.map(&values);
    let filled = filler.fill(map.iter()).unwrap();

    assert_eq!(filled.field_value("Text1").unwrap().as_deref(), Some("08012025"));
    assert_eq!(filled.field_value("Text3").unwrap().as_deref(), Some("123"));
    assert_eq!(filled.field_value("Text7").unwrap().as_deref(), Some("ACME Trading"));
    assert_eq!(filled.field_value("Text24").unwrap().as_deref(), Some(""));
}
