use tracing::{debug, info};

use super::index::{SearchHit, VectorIndex};
use super::store::{EntityId, EntityStore};
use super::vocabulary::{Country, Vocabulary};
use crate::embeddings::Embedder;
use crate::metrics;
use crate::Result;

/// Default number of semantic results.
pub const DEFAULT_TOP_K: usize = 5;

/// Result of a hybrid retrieval.
#[derive(Debug, Clone, Default)]
pub struct RetrievalResult {
    /// Vector-similarity hits, best first
    pub semantic: Vec<SearchHit>,
    /// Country named in the question, if any
    pub country: Option<Country>,
    /// Languages of that country, in stored order
    pub expanded: Vec<EntityId>,
}

impl RetrievalResult {
    /// Semantic ids followed by expansion ids. Duplicates are kept.
    pub fn ids(&self) -> Vec<EntityId> {
        self.semantic
            .iter()
            .map(|hit| hit.id.clone())
            .chain(self.expanded.iter().cloned())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.semantic.len() + self.expanded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.semantic.is_empty() && self.expanded.is_empty()
    }
}

/// Semantic search plus country -> languages graph expansion.
pub struct Retriever<'a> {
    store: &'a EntityStore,
    index: &'a VectorIndex,
    vocabulary: &'a Vocabulary,
    embedder: &'a dyn Embedder,
}

impl<'a> Retriever<'a> {
    pub fn new(
        store: &'a EntityStore,
        index: &'a VectorIndex,
        vocabulary: &'a Vocabulary,
        embedder: &'a dyn Embedder,
    ) -> Self {
        Self {
            store,
            index,
            vocabulary,
            embedder,
        }
    }

    /// Entity ids relevant to the question: top-`k` semantic hits first,
    /// then the languages of the first country named in the question.
    pub async fn retrieve(&self, question: &str, k: usize) -> Result<Vec<EntityId>> {
        Ok(self.retrieve_detailed(question, k).await?.ids())
    }

    /// Same as [`Retriever::retrieve`], keeping scores and the matched country.
    pub async fn retrieve_detailed(&self, question: &str, k: usize) -> Result<RetrievalResult> {
        let semantic = if self.index.is_empty() || k == 0 {
            Vec::new()
        } else {
            let query = self.embedder.embed(question).await?;
            self.index.search(&query, k)?
        };

        let country = self.vocabulary.countries.find_in(question).cloned();
        let expanded = match &country {
            Some(country) => self.country_languages(country),
            None => Vec::new(),
        };

        if let Some(country) = &country {
            info!(
                "Question mentions {}: appending {} languages",
                country.name,
                expanded.len()
            );
        }
        debug!(
            "Retrieved {} semantic + {} expanded entities",
            semantic.len(),
            expanded.len()
        );
        metrics::record_retrieval(semantic.len(), expanded.len());

        Ok(RetrievalResult {
            semantic,
            country,
            expanded,
        })
    }

    fn country_languages(&self, country: &Country) -> Vec<EntityId> {
        self.store
            .get(&country.id)
            .map(|attrs| attrs.has_language().to_vec())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::LocalEmbedder;
    use crate::graphrag::describe::DescriptionSynthesizer;
    use crate::graphrag::store::Attributes;
    use crate::graphrag::vocabulary::{CountryRegistry, KeywordTable};
    use crate::Error;
    use async_trait::async_trait;

    fn attrs(pairs: &[(&str, &[&str])]) -> Attributes {
        pairs
            .iter()
            .map(|(k, vs)| (*k, vs.iter().map(|v| v.to_string()).collect()))
            .collect()
    }

    fn store() -> EntityStore {
        EntityStore::from_entries(vec![
            ("arn".to_string(), attrs(&[("label", &["Mapudungun"]), ("isoCode", &["arn"])])),
            ("aym".to_string(), attrs(&[("label", &["Aymara"]), ("isoCode", &["aym"])])),
            ("que".to_string(), attrs(&[("label", &["Quechua"]), ("isoCode", &["que"])])),
            ("Q298".to_string(), attrs(&[("label", &["Chile"]), ("hasLanguage", &["arn", "aym"])])),
        ])
    }

    fn vocabulary() -> Vocabulary {
        Vocabulary {
            countries: CountryRegistry::new(vec![
                Country {
                    name: "Chile".into(),
                    id: "Q298".into(),
                },
                Country {
                    name: "Bolivia".into(),
                    id: "Q750".into(),
                },
            ]),
            keywords: KeywordTable::default(),
            ..Vocabulary::default()
        }
    }

    async fn build_index(store: &EntityStore, embedder: &LocalEmbedder) -> VectorIndex {
        let synth = DescriptionSynthesizer::new(store);
        let mut index = VectorIndex::new(64);
        for (id, attrs) in store.iter() {
            let vector = embedder
                .embed(&synth.describe_attributes(attrs))
                .await
                .unwrap();
            index.add(id.to_string(), &vector).unwrap();
        }
        index
    }

    struct FailingEmbedder;

    #[async_trait]
    impl Embedder for FailingEmbedder {
        async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Err(Error::Embedding("service unavailable".into()))
        }

        fn dimension(&self) -> Option<usize> {
            None
        }
    }

    #[tokio::test]
    async fn no_country_means_semantic_results_only() {
        let store = store();
        let embedder = LocalEmbedder::new(64);
        let index = build_index(&store, &embedder).await;
        let vocab = vocabulary();
        let retriever = Retriever::new(&store, &index, &vocab, &embedder);

        let question = "What is the iso code of Quechua?";
        let ids = retriever.retrieve(question, 2).await.unwrap();
        let semantic: Vec<EntityId> = index
            .search(&embedder.embed_text(question), 2)
            .unwrap()
            .into_iter()
            .map(|h| h.id)
            .collect();

        assert_eq!(ids, semantic);
        assert_eq!(ids.len(), 2);
    }

    #[tokio::test]
    async fn country_languages_are_appended_with_duplicates() {
        let store = store();
        let embedder = LocalEmbedder::new(64);
        let index = build_index(&store, &embedder).await;
        let vocab = vocabulary();
        let retriever = Retriever::new(&store, &index, &vocab, &embedder);

        let result = retriever.retrieve_detailed("Languages of Chile", 4).await.unwrap();
        let ids = result.ids();

        assert_eq!(result.semantic.len(), 4);
        assert_eq!(&ids[4..], &["arn".to_string(), "aym".to_string()]);
        assert_eq!(ids.iter().filter(|id| *id == "arn").count(), 2);
        assert_eq!(result.country.map(|c| c.id), Some("Q298".to_string()));
    }

    #[tokio::test]
    async fn country_missing_from_store_adds_nothing() {
        let store = store();
        let embedder = LocalEmbedder::new(64);
        let index = build_index(&store, &embedder).await;
        let vocab = vocabulary();
        let retriever = Retriever::new(&store, &index, &vocab, &embedder);

        let result = retriever.retrieve_detailed("Languages of Bolivia", 1).await.unwrap();
        assert_eq!(result.semantic.len(), 1);
        assert!(result.expanded.is_empty());
        assert!(result.country.is_some());
    }

    #[tokio::test]
    async fn empty_index_still_expands_country() {
        let store = store();
        let index = VectorIndex::new(64);
        let vocab = vocabulary();
        let embedder = FailingEmbedder;
        let retriever = Retriever::new(&store, &index, &vocab, &embedder);

        let ids = retriever.retrieve("lenguas de chile", 5).await.unwrap();
        assert_eq!(ids, vec!["arn".to_string(), "aym".to_string()]);
    }

    #[tokio::test]
    async fn embedding_failure_propagates() {
        let store = store();
        let index = build_index(&store, &LocalEmbedder::new(64)).await;
        let vocab = vocabulary();
        let embedder = FailingEmbedder;
        let retriever = Retriever::new(&store, &index, &vocab, &embedder);

        let err = retriever.retrieve("Languages of Chile", 5).await.unwrap_err();
        assert!(matches!(err, Error::Embedding(_)));
    }

    #[tokio::test]
    async fn query_dimension_mismatch_is_fatal() {
        let store = store();
        let index = build_index(&store, &LocalEmbedder::new(64)).await;
        let vocab = vocabulary();
        let embedder = LocalEmbedder::new(32);
        let retriever = Retriever::new(&store, &index, &vocab, &embedder);

        let err = retriever.retrieve("Aymara", 1).await.unwrap_err();
        assert!(matches!(err, Error::IndexMismatch(_)));
    }

    #[test]
    fn retrieval_result_ids_keep_order() {
        let result = RetrievalResult {
            semantic: vec![
                SearchHit {
                    id: "a".into(),
                    score: 0.9,
                },
                SearchHit {
                    id: "b".into(),
                    score: 0.5,
                },
            ],
            country: None,
            expanded: vec!["b".into(), "c".into()],
        };

        assert_eq!(result.ids(), vec!["a", "b", "b", "c"]);
        assert_eq!(result.len(), 4);
        assert!(!result.is_empty());
        assert!(RetrievalResult::default().is_empty());
    }
}
