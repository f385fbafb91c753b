//! Retrieval and grounding over a knowledge graph of languages.
//!
//! The pipeline for one question:
//! 1. [`Retriever`] embeds the question, takes the top-k entities from the
//!    [`VectorIndex`] and appends the languages of a country named in it.
//! 2. [`RelevanceFilter`] keeps only the attributes the question asks about.
//! 3. [`ContextAssembler`] renders the filtered entities as text.
//! 4. [`QaPipeline`] sends context and question to a generator, unless
//!    nothing relevant was found.
//!
//! Index construction uses [`DescriptionSynthesizer`] to turn each entity
//! into text before embedding.

pub mod context;
pub mod describe;
pub mod filter;
pub mod index;
pub mod retriever;
pub mod store;
pub mod vocabulary;

pub use context::{Answer, ContextAssembler, QaPipeline, NO_INFORMATION_FOUND};
pub use describe::DescriptionSynthesizer;
pub use filter::RelevanceFilter;
pub use index::{SearchHit, VectorIndex};
pub use retriever::{RetrievalResult, Retriever, DEFAULT_TOP_K};
pub use store::{Attributes, EntityId, EntityStore};
pub use vocabulary::{Country, CountryRegistry, KeywordRule, KeywordTable, Vocabulary};
