//! Grambank RAG Library
//!
//! Retrieval-and-grounding question answering over a knowledge graph of
//! South American languages:
//! - Load entity attributes exported from the graph
//! - Synthesize entity descriptions and build a vector index over them
//! - Retrieve entities by semantic similarity plus country -> language expansion
//! - Keep only the properties a question asks about
//! - Assemble grounding context and call a text generator (OpenAI or Ollama)

pub mod config;
pub mod embeddings;
pub mod error;
pub mod graphrag;
pub mod integrations;
pub mod metrics;
pub mod prompts;

// Re-export common types
pub use config::Config;
pub use embeddings::{Embedder, EmbeddingService, LocalEmbedder};
pub use error::{Error, Result};
pub use integrations::{Generator, OllamaClient, OpenAIClient};
pub use prompts::{load_prompt, Prompt};

// Commands module uses re-exported types, so it must be declared after the re-exports
pub mod commands;
