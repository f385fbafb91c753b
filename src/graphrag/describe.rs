//! Flat text descriptions of entities, used only as embedding input.

use super::store::{keys, Attributes, EntityStore};

/// Placeholder for a referenced country with no resolvable label.
pub const UNKNOWN_COUNTRY: &str = "unknown country";
/// Placeholder for a referenced family with no resolvable label.
pub const UNKNOWN_FAMILY: &str = "unknown family";

/// Renders entity descriptions against a store.
///
/// Rendering is pure: the same store always yields the same text.
#[derive(Debug, Clone, Copy)]
pub struct DescriptionSynthesizer<'a> {
    store: &'a EntityStore,
    label_key: &'a str,
}

impl<'a> DescriptionSynthesizer<'a> {
    pub fn new(store: &'a EntityStore) -> Self {
        Self {
            store,
            label_key: keys::LABEL,
        }
    }

    /// Use a different attribute when resolving referenced labels.
    pub fn with_label_key(mut self, label_key: &'a str) -> Self {
        self.label_key = label_key;
        self
    }

    /// Description of a stored entity, `None` if the id is unknown.
    pub fn describe(&self, id: &str) -> Option<String> {
        self.store.get(id).map(|attrs| self.describe_attributes(attrs))
    }

    /// Textual part, then `". "`, then the structural part.
    pub fn describe_attributes(&self, attrs: &Attributes) -> String {
        format!("{}. {}", textual_part(attrs), self.structural_part(attrs))
    }

    /// One sentence per recognised relation present on the entity.
    pub fn structural_part(&self, attrs: &Attributes) -> String {
        let mut sentences = Vec::new();

        let countries = attrs.spoken_in_country();
        if !countries.is_empty() {
            let labels = self.resolve_labels(countries, UNKNOWN_COUNTRY);
            sentences.push(format!("Spoken in: {}", labels.join(", ")));
        }

        let families = attrs.language_family();
        if !families.is_empty() {
            let labels = self.resolve_labels(families, UNKNOWN_FAMILY);
            sentences.push(format!("Belongs to the language family: {}", labels.join(", ")));
        }

        // Feature ids are enumerated categories; they are not resolved.
        let present = attrs.features_present();
        if !present.is_empty() {
            sentences.push(format!(
                "Has the following grammatical features: {}",
                present.join(", ")
            ));
        }

        let absent = attrs.features_absent();
        if !absent.is_empty() {
            sentences.push(format!(
                "Lacks the following grammatical features: {}",
                absent.join(", ")
            ));
        }

        sentences.join(". ")
    }

    fn resolve_labels<'s>(&'s self, ids: &[String], placeholder: &'s str) -> Vec<&'s str> {
        ids.iter()
            .map(|id| {
                self.store
                    .get(id)
                    .and_then(|attrs| attrs.first(self.label_key))
                    .unwrap_or(placeholder)
            })
            .collect()
    }
}

/// `"key: v1, v2"` for every attribute in stored order, joined by `". "`.
pub fn textual_part(attrs: &Attributes) -> String {
    attrs
        .iter()
        .map(|(key, values)| format!("{}: {}", key, values.join(", ")))
        .collect::<Vec<_>>()
        .join(". ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, &[&str])]) -> Attributes {
        pairs
            .iter()
            .map(|(k, vs)| (*k, vs.iter().map(|v| v.to_string()).collect()))
            .collect()
    }

    fn sample_store() -> EntityStore {
        EntityStore::from_entries(vec![
            (
                "mapu1245".to_string(),
                attrs(&[
                    ("label", &["Mapudungun"]),
                    ("isoCode", &["arn"]),
                    ("spokenInCountry", &["Q298", "Q414"]),
                    ("languageFamily", &["arau1255"]),
                    ("hasFeaturePresent", &["GB020", "GB021"]),
                    ("hasFeatureAbsent", &["GB030"]),
                ]),
            ),
            ("Q298".to_string(), attrs(&[("label", &["Chile"])])),
            ("Q414".to_string(), attrs(&[("hasLanguage", &["mapu1245"])])),
            ("arau1255".to_string(), attrs(&[("label", &["Araucanian"])])),
        ])
    }

    #[test]
    fn textual_part_follows_attribute_order() {
        let a = attrs(&[("label", &["Aymara"]), ("isoCode", &["aym", "ayr"])]);
        assert_eq!(textual_part(&a), "label: Aymara. isoCode: aym, ayr");
    }

    #[test]
    fn describes_relations_with_resolved_labels() {
        let store = sample_store();
        let synth = DescriptionSynthesizer::new(&store);
        let text = synth.describe("mapu1245").unwrap();

        assert!(text.starts_with("label: Mapudungun. isoCode: arn. spokenInCountry: Q298, Q414"));
        assert!(text.contains("Spoken in: Chile, unknown country"));
        assert!(text.contains("Belongs to the language family: Araucanian"));
        assert!(text.contains("Has the following grammatical features: GB020, GB021"));
        assert!(text.contains("Lacks the following grammatical features: GB030"));
    }

    #[test]
    fn missing_referenced_entity_uses_placeholder() {
        let store = EntityStore::from_entries(vec![(
            "x".to_string(),
            attrs(&[("languageFamily", &["nowhere"])]),
        )]);
        let text = DescriptionSynthesizer::new(&store).describe("x").unwrap();
        assert!(text.contains("Belongs to the language family: unknown family"));
    }

    #[test]
    fn entity_without_relations_has_empty_structural_part() {
        let store = EntityStore::from_entries(vec![(
            "Q298".to_string(),
            attrs(&[("label", &["Chile"])]),
        )]);
        let text = DescriptionSynthesizer::new(&store).describe("Q298").unwrap();
        assert_eq!(text, "label: Chile. ");
    }

    #[test]
    fn describe_is_deterministic() {
        let store = sample_store();
        let synth = DescriptionSynthesizer::new(&store);
        for id in store.ids() {
            assert_eq!(synth.describe(id), synth.describe(id));
        }
    }

    #[test]
    fn unknown_entity_has_no_description() {
        let store = sample_store();
        assert!(DescriptionSynthesizer::new(&store).describe("missing").is_none());
    }

    #[test]
    fn custom_label_key_is_used_for_references() {
        let store = EntityStore::from_entries(vec![
            ("l".to_string(), attrs(&[("spokenInCountry", &["c"])])),
            ("c".to_string(), attrs(&[("rdfs:label", &["Perú"])])),
        ]);
        let text = DescriptionSynthesizer::new(&store)
            .with_label_key("rdfs:label")
            .describe("l")
            .unwrap();
        assert!(text.contains("Spoken in: Perú"));
    }
}
