//! External model integrations.
//!
//! Provides clients for:
//! - OpenAI (chat completions)
//! - Ollama (local generation and embeddings)

pub mod ollama;
pub mod openai;

pub use ollama::OllamaClient;
pub use openai::OpenAIClient;

use async_trait::async_trait;

use crate::Result;

/// Produces free text from a prompt.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generate a completion of at most `max_tokens` tokens.
    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String>;

    /// Model identifier, for logging.
    fn model(&self) -> &str;
}
