use async_trait::async_trait;

use crate::errors::Result;

/// Text embedding collaborator.
///
/// Implementations return exactly one vector per input, in input order.
/// Failures are reported as `RagError::Embedding`.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Provider name for logs
    fn name(&self) -> &str;

    /// Largest batch accepted by a single `embed` call
    fn max_batch_size(&self) -> usize {
        16
    }

    /// Embed a batch of texts
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Generative text collaborator.
///
/// Failures (transport, rate limit, timeout, empty reply) are reported as
/// `RagError::Generation`.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Provider name for logs
    fn name(&self) -> &str;

    /// Return a single completion for the rendered prompt
    async fn complete(&self, prompt: &str) -> Result<String>;
}
