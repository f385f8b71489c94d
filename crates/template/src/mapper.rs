//! Binding semantic slots to template fields

use crate::schema::{FieldKey, SchemaFile, FIELD_COUNT};
use crate::values::{FieldValueMap, FieldValues};
use crate::{Result, TemplateError};
use pdf_core::PdfDocument;
use std::collections::HashSet;

/// Resolved binding of every [`FieldKey`] to a template field name
///
/// Built once per batch and validated against the template's real field
/// set, so mapping a row cannot fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSchema {
    targets: Vec<String>,
}

impl FieldSchema {
    /// Bind slot *i* to the *i*-th field name
    ///
    /// Extra template fields beyond the 24 slots are left alone.
    pub fn positional(field_names: &[String]) -> Result<Self> {
        if field_names.len() < FIELD_COUNT {
            return Err(TemplateError::InsufficientFields {
                required: FIELD_COUNT,
                found: field_names.len(),
            });
        }
        if field_names.len() > FIELD_COUNT {
            log::debug!(
                "Template has {} fields, binding the first {}",
                field_names.len(),
                FIELD_COUNT
            );
        }

        let targets: Vec<String> = field_names[..FIELD_COUNT].to_vec();
        check_distinct(&targets)?;
        Ok(Self { targets })
    }

    /// Bind slots as a schema file says, checked against `field_names`
    ///
    /// Every target must exist in the template and every slot must be
    /// bound, to a field no other slot uses.
    pub fn named(schema: &SchemaFile, field_names: &[String]) -> Result<Self> {
        let available: HashSet<&str> = field_names.iter().map(String::as_str).collect();

        let mut reported = HashSet::new();
        let unknown: Vec<String> = schema
            .fields
            .values()
            .filter(|name| !available.contains(name.as_str()))
            .filter(|name| reported.insert(name.as_str()))
            .cloned()
            .collect();
        if !unknown.is_empty() {
            return Err(TemplateError::UnknownFields(unknown));
        }

        let unbound: Vec<String> = FieldKey::ALL
            .iter()
            .filter(|key| !schema.fields.contains_key(*key))
            .map(|key| key.to_string())
            .collect();
        if !unbound.is_empty() {
            return Err(TemplateError::UnboundKeys(unbound));
        }

        let targets: Vec<String> = FieldKey::ALL
            .iter()
            .filter_map(|key| schema.fields.get(key).cloned())
            .collect();
        check_distinct(&targets)?;
        Ok(Self { targets })
    }

    /// Schema for a template document: named when a schema file is given,
    /// positional otherwise
    pub fn for_document(doc: &PdfDocument, schema: Option<&SchemaFile>) -> Result<Self> {
        let field_names = doc.form_field_names()?;
        Self::for_field_names(&field_names, schema)
    }

    /// Same as [`FieldSchema::for_document`], from already listed names
    pub fn for_field_names(field_names: &[String], schema: Option<&SchemaFile>) -> Result<Self> {
        match schema {
            Some(schema) => Self::named(schema, field_names),
            None => Self::positional(field_names),
        }
    }

    /// Template field bound to a slot
    pub fn target(&self, key: FieldKey) -> &str {
        &self.targets[key.index()]
    }

    /// Map one row's values onto template field names
    ///
    /// The result always holds exactly [`FIELD_COUNT`] entries.
    pub fn map(&self, values: &FieldValues) -> FieldValueMap {
        let mut map = FieldValueMap::with_capacity(FIELD_COUNT);
        for (key, value) in values.iter() {
            map.insert(self.target(key).to_string(), value.to_string());
        }
        map
    }
}

fn check_distinct(targets: &[String]) -> Result<()> {
    let mut seen = HashSet::new();
    for name in targets {
        if !seen.insert(name.as_str()) {
            return Err(TemplateError::DuplicateTarget(name.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    fn names(count: usize) -> Vec<String> {
        (1..=count).map(|i| format!("Text{i}")).collect()
    }

    fn full_schema() -> SchemaFile {
        // Reverse binding: from_date -> Text24 ... max_total -> Text1
        let fields: BTreeMap<FieldKey, String> = FieldKey::ALL
            .iter()
            .map(|key| (*key, format!("Text{}", FIELD_COUNT - key.index())))
            .collect();
        SchemaFile {
            version: "1.0".to_string(),
            fields,
        }
    }

    #[test]
    fn test_positional_binding() {
        let schema = FieldSchema::positional(&names(24)).unwrap();
        assert_eq!(schema.target(FieldKey::FromDate), "Text1");
        assert_eq!(schema.target(FieldKey::TinPart1), "Text3");
        assert_eq!(schema.target(FieldKey::MaxTotal), "Text24");
    }

    #[test]
    fn test_positional_too_few_fields() {
        let err = FieldSchema::positional(&names(20)).unwrap_err();
        assert!(matches!(
            err,
            TemplateError::InsufficientFields {
                required: 24,
                found: 20
            }
        ));
    }

    #[test]
    fn test_positional_ignores_extra_fields() {
        let schema = FieldSchema::positional(&names(30)).unwrap();
        let map = schema.map(&FieldValues::new());
        assert_eq!(map.len(), FIELD_COUNT);
        assert_eq!(map.get("Text25"), None);
    }

    #[test]
    fn test_positional_duplicate_names() {
        let mut fields = names(24);
        fields[5] = "Text1".to_string();
        assert!(matches!(
            FieldSchema::positional(&fields),
            Err(TemplateError::DuplicateTarget(name)) if name == "Text1"
        ));
    }

    #[test]
    fn test_map_has_every_slot() {
        let schema = FieldSchema::positional(&names(24)).unwrap();
        let values = FieldValues::new()
            .with(FieldKey::FromDate, "08012025")
            .with(FieldKey::Payee, "ACME");
        let map = schema.map(&values);

        assert_eq!(map.len(), 24);
        assert_eq!(map.get("Text1"), Some("08012025"));
        assert_eq!(map.get("Text7"), Some("ACME"));
        assert_eq!(map.get("Text2"), Some(""));
        let order: Vec<&str> = map.iter().map(|(name, _)| name).collect();
        assert_eq!(order[0], "Text1");
        assert_eq!(order[23], "Text24");
    }

    #[test]
    fn test_named_binding() {
        let schema = FieldSchema::named(&full_schema(), &names(24)).unwrap();
        assert_eq!(schema.target(FieldKey::FromDate), "Text24");
        assert_eq!(schema.target(FieldKey::MaxTotal), "Text1");

        let map = schema.map(&FieldValues::new().with(FieldKey::FromDate, "x"));
        assert_eq!(map.get("Text24"), Some("x"));
    }

    #[test]
    fn test_named_unknown_fields_are_all_listed() {
        let mut file = full_schema();
        file.fields.insert(FieldKey::Payee, "PayeeName".to_string());
        file.fields.insert(FieldKey::Atc, "AtcCode".to_string());

        let err = FieldSchema::named(&file, &names(24)).unwrap_err();
        match err {
            TemplateError::UnknownFields(missing) => {
                assert_eq!(missing, vec!["PayeeName".to_string(), "AtcCode".to_string()]);
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn test_named_unbound_keys() {
        let mut file = full_schema();
        file.fields.remove(&FieldKey::M2);
        file.fields.remove(&FieldKey::Twq);

        let err = FieldSchema::named(&file, &names(24)).unwrap_err();
        match err {
            TemplateError::UnboundKeys(keys) => assert_eq!(keys, vec!["m2", "twq"]),
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn test_named_duplicate_target() {
        let mut file = full_schema();
        file.fields.insert(FieldKey::M1, "Text1".to_string());
        assert!(matches!(
            FieldSchema::named(&file, &names(24)),
            Err(TemplateError::DuplicateTarget(_))
        ));
    }

    #[test]
    fn test_for_field_names_picks_strategy() {
        let positional = FieldSchema::for_field_names(&names(24), None).unwrap();
        assert_eq!(positional.target(FieldKey::FromDate), "Text1");

        let named = FieldSchema::for_field_names(&names(24), Some(&full_schema())).unwrap();
        assert_eq!(named.target(FieldKey::FromDate), "Text24");
    }
}
