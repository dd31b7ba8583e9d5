//! External model capabilities
//!
//! The pipeline talks to two hosted services: one that turns text into vectors and one that
//! completes prompts. Both sit behind traits so the HTTP client can be swapped for a local
//! server, another vendor, or a test double.

use crate::error::AppResult;

pub mod openai_compatible;

pub use openai_compatible::{OpenAiCompatibleClient, OpenAiCompatibleConfig};

/// Turns text into embedding vectors
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed every input, returning one vector per text in the same order
    async fn embed(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>>;

    /// Model identifier recorded alongside stored vectors
    fn model_id(&self) -> String;
}

/// Completes a single prompt
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Send `prompt` as a user message and return the raw reply text
    ///
    /// With `structured_output` set the service is asked to reply with a JSON object.
    /// Transport failures, non-2xx statuses and replies without content are upstream errors.
    async fn complete(&self, prompt: &str, structured_output: bool) -> AppResult<String>;
}
