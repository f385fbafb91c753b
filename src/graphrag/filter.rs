//! Keyword-driven attribute filtering.

use super::store::Attributes;
use super::vocabulary::Vocabulary;

/// Narrows an entity's attributes to those a question asks about.
#[derive(Debug, Clone, Copy)]
pub struct RelevanceFilter<'a> {
    vocabulary: &'a Vocabulary,
}

impl<'a> RelevanceFilter<'a> {
    pub fn new(vocabulary: &'a Vocabulary) -> Self {
        Self { vocabulary }
    }

    /// Copy of the relevant attributes, in this order:
    /// 1. the label (always, when present),
    /// 2. the country provenance property, if the question names a
    ///    registered country,
    /// 3. every property whose keyword occurs in the question.
    ///
    /// A label-only or empty result is normal.
    pub fn filter(&self, attributes: &Attributes, question: &str) -> Attributes {
        let vocab = self.vocabulary;
        let question_lower = question.to_lowercase();
        let mut filtered = Attributes::new();

        if let Some(label) = attributes.get(&vocab.label_key) {
            filtered.insert(vocab.label_key.as_str(), label.to_vec());
        }

        if vocab.countries.find_in(question).is_some() {
            if let Some(values) = attributes.get(&vocab.country_property) {
                filtered.insert(vocab.country_property.as_str(), values.to_vec());
            }
        }

        for rule in vocab.keywords.matching(&question_lower) {
            if let Some(values) = attributes.get(&rule.property) {
                filtered.insert(rule.property.as_str(), values.to_vec());
            }
        }

        filtered
    }

    /// True when the filtered attributes carry more than the label.
    pub fn has_information(&self, filtered: &Attributes) -> bool {
        filtered.keys().any(|key| key != self.vocabulary.label_key)
    }
}
