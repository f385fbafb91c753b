use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;

use serde::de::{self, Deserialize, Deserializer, MapAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::info;

use crate::{Error, Result};

/// Opaque entity identifier (usually a resource URI or its fragment).
pub type EntityId = String;

/// Well-known attribute keys produced by the graph-to-JSON export.
pub mod keys {
    pub const LABEL: &str = "label";
    pub const SPOKEN_IN_COUNTRY: &str = "spokenInCountry";
    pub const LANGUAGE_FAMILY: &str = "languageFamily";
    pub const HAS_FEATURE_PRESENT: &str = "hasFeaturePresent";
    pub const HAS_FEATURE_ABSENT: &str = "hasFeatureAbsent";
    pub const HAS_LANGUAGE: &str = "hasLanguage";
}

/// Ordered multi-valued string map (property -> values).
///
/// Keys keep insertion order, which is the order they were discovered in
/// the source graph. Descriptions are rendered in this order, so it must
/// survive loading.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    entries: Vec<(String, Vec<String>)>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, values)| values.as_slice())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// First value of a property, if any.
    pub fn first(&self, key: &str) -> Option<&str> {
        self.get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Set a property. An existing key is overwritten in place.
    pub fn insert(&mut self, key: impl Into<String>, values: Vec<String>) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = values,
            None => self.entries.push((key, values)),
        }
    }

    /// Append one value to a property, creating it if needed.
    pub fn push_value(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => existing.push(value.into()),
            None => self.entries.push((key, vec![value.into()])),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(k, values)| (k.as_str(), values.as_slice()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn label(&self) -> Option<&str> {
        self.first(keys::LABEL)
    }

    pub fn spoken_in_country(&self) -> &[String] {
        self.get(keys::SPOKEN_IN_COUNTRY).unwrap_or_default()
    }

    pub fn language_family(&self) -> &[String] {
        self.get(keys::LANGUAGE_FAMILY).unwrap_or_default()
    }

    pub fn features_present(&self) -> &[String] {
        self.get(keys::HAS_FEATURE_PRESENT).unwrap_or_default()
    }

    pub fn features_absent(&self) -> &[String] {
        self.get(keys::HAS_FEATURE_ABSENT).unwrap_or_default()
    }

    pub fn has_language(&self) -> &[String] {
        self.get(keys::HAS_LANGUAGE).unwrap_or_default()
    }
}

impl<K: Into<String>> FromIterator<(K, Vec<String>)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, Vec<String>)>>(iter: I) -> Self {
        let mut attrs = Attributes::new();
        for (key, values) in iter {
            attrs.insert(key, values);
        }
        attrs
    }
}

impl Serialize for Attributes {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, values) in &self.entries {
            map.serialize_entry(key, values)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Attributes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct AttributesVisitor;

        impl<'de> Visitor<'de> for AttributesVisitor {
            type Value = Attributes;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map of property name to list of strings")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut access: A,
            ) -> std::result::Result<Attributes, A::Error> {
                let mut attrs = Attributes::new();
                while let Some((key, values)) = access.next_entry::<String, Vec<String>>()? {
                    attrs.insert(key, values);
                }
                Ok(attrs)
            }
        }

        deserializer.deserialize_map(AttributesVisitor)
    }
}

/// Top-level JSON shape: entity id -> attributes, in document order.
struct OrderedEntities(Vec<(EntityId, Attributes)>);

impl<'de> Deserialize<'de> for OrderedEntities {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct EntitiesVisitor;

        impl<'de> Visitor<'de> for EntitiesVisitor {
            type Value = OrderedEntities;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map of entity identifier to attribute map")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut access: A,
            ) -> std::result::Result<OrderedEntities, A::Error> {
                let mut entries: Vec<(EntityId, Attributes)> = Vec::new();
                let mut seen = HashSet::new();
                while let Some((id, attrs)) = access.next_entry::<String, Attributes>()? {
                    if !seen.insert(id.clone()) {
                        return Err(de::Error::custom(format!("duplicate entity '{id}'")));
                    }
                    entries.push((id, attrs));
                }
                Ok(OrderedEntities(entries))
            }
        }

        deserializer.deserialize_map(EntitiesVisitor)
    }
}

/// Read-only store of entity attributes.
///
/// Entity order is the order of the source document and defines the
/// positional layout of the vector index built from it.
#[derive(Debug, Clone, Default)]
pub struct EntityStore {
    ids: Vec<EntityId>,
    entities: HashMap<EntityId, Attributes>,
}

impl EntityStore {
    /// Build a store from `(id, attributes)` pairs. Later duplicates replace
    /// earlier values but keep the first position.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (EntityId, Attributes)>,
    {
        let mut store = EntityStore::default();
        for (id, attrs) in entries {
            if store.entities.insert(id.clone(), attrs).is_none() {
                store.ids.push(id);
            }
        }
        store
    }

    /// Parse the mapping-of-mappings JSON export.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let OrderedEntities(entries) = serde_json::from_str(json)
            .map_err(|e| Error::Load(format!("invalid entity store JSON: {}", e)))?;
        Ok(Self::from_entries(entries))
    }

    /// Load the store from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Load(format!("cannot read {}: {}", path.display(), e)))?;
        let store = Self::from_json_str(&content)?;
        info!("Loaded {} entities from {}", store.len(), path.display());
        Ok(store)
    }

    pub fn get(&self, id: &str) -> Option<&Attributes> {
        self.entities.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entities.contains_key(id)
    }

    /// Entity identifiers in load order.
    pub fn ids(&self) -> &[EntityId] {
        &self.ids
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Attributes)> {
        self.ids
            .iter()
            .filter_map(|id| self.entities.get(id).map(|attrs| (id.as_str(), attrs)))
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn attributes_keep_insertion_order() {
        let mut attrs = Attributes::new();
        attrs.insert("zeta", strings(&["1"]));
        attrs.insert("alpha", strings(&["2"]));
        attrs.insert("mid", strings(&["3"]));

        let keys: Vec<&str> = attrs.keys().collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn insert_overwrites_in_place() {
        let mut attrs = Attributes::new();
        attrs.insert("a", strings(&["1"]));
        attrs.insert("b", strings(&["2"]));
        attrs.insert("a", strings(&["3"]));

        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs.keys().next(), Some("a"));
        assert_eq!(attrs.get("a"), Some(&["3".to_string()][..]));
    }

    #[test]
    fn push_value_appends() {
        let mut attrs = Attributes::new();
        attrs.push_value("hasLanguage", "arn");
        attrs.push_value("hasLanguage", "aym");

        assert_eq!(attrs.has_language(), &strings(&["arn", "aym"])[..]);
    }

    #[test]
    fn named_accessors_default_to_empty() {
        let attrs = Attributes::new();
        assert!(attrs.label().is_none());
        assert!(attrs.spoken_in_country().is_empty());
        assert!(attrs.language_family().is_empty());
        assert!(attrs.features_present().is_empty());
        assert!(attrs.features_absent().is_empty());
        assert!(attrs.has_language().is_empty());
    }

    #[test]
    fn deserialize_preserves_document_order() {
        let json = r#"{"label": ["Mapudungun"], "isoCode": ["arn"], "glottocode": ["mapu1245"]}"#;
        let attrs: Attributes = serde_json::from_str(json).unwrap();

        let keys: Vec<&str> = attrs.keys().collect();
        assert_eq!(keys, vec!["label", "isoCode", "glottocode"]);
        assert_eq!(attrs.label(), Some("Mapudungun"));
    }

    #[test]
    fn serialize_round_trips_order() {
        let attrs: Attributes = vec![
            ("b", strings(&["1"])),
            ("a", strings(&["2", "3"])),
        ]
        .into_iter()
        .collect();

        let json = serde_json::to_string(&attrs).unwrap();
        assert_eq!(json, r#"{"b":["1"],"a":["2","3"]}"#);
    }

    #[test]
    fn store_loads_in_document_order() {
        let json = r#"{
            "zz": {"label": ["Last in alphabet"]},
            "aa": {"label": ["First in alphabet"]}
        }"#;
        let store = EntityStore::from_json_str(json).unwrap();

        assert_eq!(store.ids(), &["zz".to_string(), "aa".to_string()]);
        assert_eq!(store.get("aa").and_then(|a| a.label()), Some("First in alphabet"));
        assert!(store.get("missing").is_none());
    }

    #[test]
    fn store_rejects_wrong_shape() {
        let err = EntityStore::from_json_str(r#"["not", "a", "map"]"#).unwrap_err();
        assert!(matches!(err, Error::Load(_)));

        let err = EntityStore::from_json_str(r#"{"x": {"label": "not a list"}}"#).unwrap_err();
        assert!(matches!(err, Error::Load(_)));

        let err = EntityStore::from_json_str("{broken").unwrap_err();
        assert!(matches!(err, Error::Load(_)));
    }

    #[test]
    fn store_rejects_duplicate_entities() {
        let json = r#"{"a": {}, "a": {}}"#;
        let err = EntityStore::from_json_str(json).unwrap_err();
        assert!(err.to_string().contains("duplicate entity"));
    }

    #[test]
    fn load_missing_file_is_load_error() {
        let err = EntityStore::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, Error::Load(_)));
    }

    #[test]
    fn iter_follows_id_order() {
        let store = EntityStore::from_entries(vec![
            ("q1".to_string(), Attributes::new()),
            ("q2".to_string(), Attributes::new()),
            ("q1".to_string(), vec![("label", strings(&["x"]))].into_iter().collect()),
        ]);

        let ids: Vec<&str> = store.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["q1", "q2"]);
        assert_eq!(store.get("q1").and_then(|a| a.label()), Some("x"));
        assert_eq!(store.len(), 2);
    }
}
