//! Context assembly and the question-answering pipeline.

use std::fmt::Write as _;

use tracing::{debug, info, warn};

use super::filter::RelevanceFilter;
use super::index::VectorIndex;
use super::retriever::{RetrievalResult, Retriever, DEFAULT_TOP_K};
use super::store::{Attributes, EntityId, EntityStore};
use super::vocabulary::Vocabulary;
use crate::embeddings::Embedder;
use crate::integrations::Generator;
use crate::metrics;
use crate::prompts::{self, Prompt};
use crate::Result;

/// Shown when an entity has no label.
pub const NAME_UNAVAILABLE: &str = "name unavailable";
/// Body of a placeholder block.
pub const NO_ADDITIONAL_INFORMATION: &str = "No additional information available";
/// Returned instead of a generated answer when nothing relevant was found.
pub const NO_INFORMATION_FOUND: &str =
    "No specific information about the languages mentioned was found in the database.";

/// Default generation budget, in tokens.
pub const DEFAULT_MAX_TOKENS: u32 = 200;

/// Renders retrieved entities into grounding text.
#[derive(Debug, Clone, Copy)]
pub struct ContextAssembler<'a> {
    store: &'a EntityStore,
    vocabulary: &'a Vocabulary,
}

impl<'a> ContextAssembler<'a> {
    pub fn new(store: &'a EntityStore, vocabulary: &'a Vocabulary) -> Self {
        Self { store, vocabulary }
    }

    /// One block per id, in input order, separated by a blank line.
    ///
    /// The flag is true when at least one block carries properties
    /// beyond the label.
    pub fn build_context(&self, question: &str, ids: &[EntityId]) -> (String, bool) {
        let filter = RelevanceFilter::new(self.vocabulary);
        let empty = Attributes::new();
        let mut blocks = Vec::with_capacity(ids.len());
        let mut has_real_info = false;

        for id in ids {
            let attributes = self.store.get(id).unwrap_or(&empty);
            let filtered = filter.filter(attributes, question);

            if filter.has_information(&filtered) {
                has_real_info = true;
                blocks.push(self.render_block(&filtered));
            } else {
                debug!("No relevant properties for {}", id);
                blocks.push(self.render_placeholder(attributes));
            }
        }

        (blocks.join("\n"), has_real_info)
    }

    fn label_of(&self, attributes: &Attributes) -> String {
        match attributes.get(&self.vocabulary.label_key) {
            Some(values) if !values.is_empty() => values.join(", "),
            _ => NAME_UNAVAILABLE.to_string(),
        }
    }

    fn render_block(&self, filtered: &Attributes) -> String {
        let mut block = format!(
            "Entity: {}\nRelevant properties:\n",
            self.label_of(filtered)
        );
        for (key, values) in filtered.iter() {
            if key == self.vocabulary.label_key {
                continue;
            }
            let _ = writeln!(block, "- {}: {}", key, values.join(", "));
        }
        block
    }

    fn render_placeholder(&self, attributes: &Attributes) -> String {
        format!(
            "Entity: {}\nRelevant properties:\n- {}\n",
            self.label_of(attributes),
            NO_ADDITIONAL_INFORMATION
        )
    }
}

/// Outcome of [`QaPipeline::answer`].
#[derive(Debug, Clone)]
pub struct Answer {
    /// Generated text, or [`NO_INFORMATION_FOUND`]
    pub text: String,
    /// Context the answer was grounded on
    pub context: String,
    /// Retrieved ids, duplicates included
    pub retrieved: Vec<EntityId>,
    /// False when the generator was skipped
    pub has_real_info: bool,
}

/// Retrieval, filtering, context assembly and generation over one
/// loaded knowledge graph.
pub struct QaPipeline {
    store: EntityStore,
    index: VectorIndex,
    vocabulary: Vocabulary,
    embedder: Box<dyn Embedder>,
    generator: Box<dyn Generator>,
    top_k: usize,
    max_tokens: u32,
    template: String,
}

impl QaPipeline {
    /// Assemble a pipeline. Fails with [`crate::Error::IndexMismatch`] when the
    /// embedder is known to produce vectors of another size than the index.
    pub fn new(
        store: EntityStore,
        index: VectorIndex,
        vocabulary: Vocabulary,
        embedder: Box<dyn Embedder>,
        generator: Box<dyn Generator>,
    ) -> Result<Self> {
        index.ensure_compatible(embedder.dimension())?;

        let missing = index.ids().iter().filter(|id| !store.contains(id)).count();
        if missing > 0 {
            warn!("{} indexed ids are not in the entity store", missing);
        }

        info!(
            "Pipeline ready: {} entities, {} indexed, generator {}",
            store.len(),
            index.len(),
            generator.model()
        );

        Ok(Self {
            store,
            index,
            vocabulary,
            embedder,
            generator,
            top_k: DEFAULT_TOP_K,
            max_tokens: DEFAULT_MAX_TOKENS,
            template: Prompt::GroundedAnswer.builtin().to_string(),
        })
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Replace the prompt template (`{context}` and `{question}` placeholders).
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    fn retriever(&self) -> Retriever<'_> {
        Retriever::new(
            &self.store,
            &self.index,
            &self.vocabulary,
            self.embedder.as_ref(),
        )
    }

    pub async fn retrieve(&self, question: &str, k: usize) -> Result<Vec<EntityId>> {
        self.retriever().retrieve(question, k).await
    }

    pub async fn retrieve_detailed(&self, question: &str, k: usize) -> Result<RetrievalResult> {
        self.retriever().retrieve_detailed(question, k).await
    }

    pub fn build_context(&self, question: &str, ids: &[EntityId]) -> (String, bool) {
        ContextAssembler::new(&self.store, &self.vocabulary).build_context(question, ids)
    }

    /// Answer a question with the configured top-k.
    pub async fn answer(&self, question: &str) -> Result<Answer> {
        self.answer_with(question, self.top_k).await
    }

    /// Answer a question. The generator is not called when no retrieved
    /// entity has relevant properties.
    pub async fn answer_with(&self, question: &str, k: usize) -> Result<Answer> {
        let retrieved = self.retrieve(question, k).await?;
        let (context, has_real_info) = self.build_context(question, &retrieved);
        debug!("Context:\n{}", context);

        let text = if has_real_info {
            let prompt = prompts::render(&self.template, &context, question);
            self.generator.generate(&prompt, self.max_tokens).await?
        } else {
            info!("No relevant information for question, skipping generation");
            NO_INFORMATION_FOUND.to_string()
        };
        metrics::record_answer(has_real_info);

        Ok(Answer {
            text,
            context,
            retrieved,
            has_real_info,
        })
    }
}
