//! Static lookup tables used to interpret questions.
//!
//! Both tables are plain configuration: they are built once (from defaults
//! or `config.yml`) and passed by reference into the retriever and the
//! relevance filter.

use serde::{Deserialize, Serialize};

use super::store::keys;

/// Property carrying country provenance on language entities.
pub const DEFAULT_COUNTRY_PROPERTY: &str = "http://purl.org/dc/terms/spatial";

/// Country display name mapped to its entity identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
    pub name: String,
    pub id: String,
}

/// Curated, ordered list of countries matched literally against questions.
///
/// Not derived from the graph, so countries present in the store can be
/// missing here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountryRegistry {
    countries: Vec<Country>,
    lowered: Vec<String>,
}

impl CountryRegistry {
    pub fn new(countries: Vec<Country>) -> Self {
        let lowered = countries.iter().map(|c| c.name.to_lowercase()).collect();
        Self { countries, lowered }
    }

    /// First country (registry order) whose name occurs in the question,
    /// ignoring case. Later mentions are ignored.
    pub fn find_in(&self, question: &str) -> Option<&Country> {
        let question = question.to_lowercase();
        self.lowered
            .iter()
            .position(|name| !name.is_empty() && question.contains(name.as_str()))
            .map(|idx| &self.countries[idx])
    }

    pub fn countries(&self) -> &[Country] {
        &self.countries
    }

    pub fn len(&self) -> usize {
        self.countries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
    }
}

/// One keyword (or phrase) pointing at a canonical property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordRule {
    pub keyword: String,
    pub property: String,
}

impl KeywordRule {
    pub fn new(keyword: impl Into<String>, property: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into().to_lowercase(),
            property: property.into(),
        }
    }
}

/// Ordered keyword -> property table. Several keywords may share a property.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordTable {
    rules: Vec<KeywordRule>,
}

impl KeywordTable {
    pub fn new<I>(rules: I) -> Self
    where
        I: IntoIterator<Item = KeywordRule>,
    {
        Self {
            rules: rules
                .into_iter()
                .map(|r| KeywordRule::new(r.keyword, r.property))
                .filter(|r| !r.keyword.is_empty())
                .collect(),
        }
    }

    /// Rules whose keyword occurs in an already-lowercased question,
    /// in table order.
    pub fn matching<'a>(&'a self, question_lower: &'a str) -> impl Iterator<Item = &'a KeywordRule> {
        self.rules
            .iter()
            .filter(move |rule| question_lower.contains(rule.keyword.as_str()))
    }

    pub fn rules(&self) -> &[KeywordRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Everything the core needs to interpret a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    /// Attribute holding an entity's display name.
    pub label_key: String,
    /// Attribute copied when the question names a registered country.
    pub country_property: String,
    pub countries: CountryRegistry,
    pub keywords: KeywordTable,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self {
            label_key: keys::LABEL.to_string(),
            country_property: DEFAULT_COUNTRY_PROPERTY.to_string(),
            countries: CountryRegistry::new(default_countries()),
            keywords: KeywordTable::new(default_keywords()),
        }
    }
}

pub fn default_countries() -> Vec<Country> {
    [
        ("Chile", "http://www.wikidata.org/entity/Q298"),
        ("Perú", "http://www.wikidata.org/entity/Q419"),
        ("Argentina", "http://www.wikidata.org/entity/Q414"),
    ]
    .into_iter()
    .map(|(name, id)| Country {
        name: name.to_string(),
        id: id.to_string(),
    })
    .collect()
}

pub fn default_keywords() -> Vec<KeywordRule> {
    const TABLE: &[(&str, &str)] = &[
        // language name
        ("nombre", "rdfs:label"),
        ("lengua", "rdfs:label"),
        ("idioma", "rdfs:label"),
        ("denominación", "rdfs:label"),
        ("etiqueta", "rdfs:label"),
        // glottolog
        ("glottocode", "ling:glottocode"),
        ("código glottolog", "ling:glottocode"),
        ("identificador glottolog", "ling:glottocode"),
        // iso 639-3
        ("iso", "ling:isoCode"),
        ("código iso", "ling:isoCode"),
        ("iso 639-3", "ling:isoCode"),
        ("identificador iso", "ling:isoCode"),
        // family
        ("familia", "ling:languageFamily"),
        ("familia lingüística", "ling:languageFamily"),
        ("grupo lingüístico", "ling:languageFamily"),
        ("clasificación familiar", "ling:languageFamily"),
        // location
        ("ubicación", "geo:location"),
        ("región", "geo:location"),
        ("localización", "geo:location"),
        ("zona", "geo:location"),
        // countries
        ("país", "ling:spokenInCountry"),
        ("nación", "ling:spokenInCountry"),
        ("territorio", "ling:spokenInCountry"),
        // grammatical features
        ("rasgo", "ling:hasFeaturePresent"),
        ("característica", "ling:hasFeaturePresent"),
        ("propiedad gramatical", "ling:hasFeaturePresent"),
        ("atributo", "ling:hasFeaturePresent"),
        // speakers
        ("hablantes", "ling:numberOfSpeakers"),
        ("número de hablantes", "ling:numberOfSpeakers"),
        ("cantidad de hablantes", "ling:numberOfSpeakers"),
        ("población hablante", "ling:numberOfSpeakers"),
        // typology
        ("tipología", "ling:linguisticTypology"),
        ("clasificación lingüística", "ling:linguisticTypology"),
        ("categorización", "ling:linguisticTypology"),
        // unesco
        ("unesco", "ling:unescoLanguageStatus"),
        ("estado unesco", "ling:unescoLanguageStatus"),
        ("estado de la lengua", "ling:unescoLanguageStatus"),
        ("clasificación unesco", "ling:unescoLanguageStatus"),
        // english synonyms
        ("language family", "ling:languageFamily"),
        ("family", "ling:languageFamily"),
        ("speakers", "ling:numberOfSpeakers"),
        ("country", "ling:spokenInCountry"),
        ("feature", "ling:hasFeaturePresent"),
        ("typology", "ling:linguisticTypology"),
        ("endangered", "ling:unescoLanguageStatus"),
        ("location", "geo:location"),
        ("region", "geo:location"),
    ];

    TABLE
        .iter()
        .map(|(keyword, property)| KeywordRule::new(*keyword, *property))
        .collect()
}
