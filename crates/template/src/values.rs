//! Per-row field values

use crate::schema::{FieldKey, FIELD_COUNT};
use indexmap::IndexMap;
use std::ops::Index;

/// One value for every semantic slot, never sparse
///
/// Slots that were not set hold the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldValues {
    values: [String; FIELD_COUNT],
}

impl FieldValues {
    /// All slots empty
    pub fn new() -> Self {
        Self::default()
    }

    /// Set one slot
    pub fn set(&mut self, key: FieldKey, value: impl Into<String>) {
        self.values[key.index()] = value.into();
    }

    /// Builder-style [`FieldValues::set`]
    pub fn with(mut self, key: FieldKey, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Value of one slot
    pub fn get(&self, key: FieldKey) -> &str {
        &self.values[key.index()]
    }

    /// Slots and values in canonical order
    pub fn iter(&self) -> impl Iterator<Item = (FieldKey, &str)> {
        FieldKey::ALL
            .into_iter()
            .zip(self.values.iter().map(String::as_str))
    }
}

impl Index<FieldKey> for FieldValues {
    type Output = str;

    fn index(&self, key: FieldKey) -> &str {
        self.get(key)
    }
}

/// Template field name to value, in binding order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldValueMap {
    entries: IndexMap<String, String>,
}

impl FieldValueMap {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: IndexMap::with_capacity(capacity),
        }
    }

    pub(crate) fn insert(&mut self, name: String, value: String) -> Option<String> {
        self.entries.insert(name, value)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Value bound to a template field
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    /// `(field name, value)` pairs in binding order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<'a> IntoIterator for &'a FieldValueMap {
    type Item = (&'a str, &'a str);
    type IntoIter = Box<dyn Iterator<Item = (&'a str, &'a str)> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_values_are_blank() {
        let values = FieldValues::new();
        assert_eq!(values.iter().count(), FIELD_COUNT);
        assert!(values.iter().all(|(_, v)| v.is_empty()));
    }

    #[test]
    fn test_set_and_index() {
        let values = FieldValues::new()
            .with(FieldKey::Payee, "ACME Trading")
            .with(FieldKey::TinPart2, "456");
        assert_eq!(&values[FieldKey::Payee], "ACME Trading");
        assert_eq!(values.get(FieldKey::TinPart2), "456");
        assert_eq!(values.get(FieldKey::TinPart1), "");
    }

    #[test]
    fn test_map_keeps_insertion_order() {
        let mut map = FieldValueMap::with_capacity(3);
        map.insert("b".to_string(), "2".to_string());
        map.insert("a".to_string(), "1".to_string());
        let pairs: Vec<(&str, &str)> = map.iter().collect();
        assert_eq!(pairs, vec![("b", "2"), ("a", "1")]);
        assert_eq!(map.get("a"), Some("1"));
        assert_eq!((&map).into_iter().count(), 2);
    }
}
