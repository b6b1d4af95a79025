//! Hosted model collaborators: embedding and text generation

pub mod azure;
pub mod provider;
pub mod types;

pub use azure::AzureOpenAiClient;
pub use provider::{CompletionProvider, EmbeddingProvider};
pub use types::ChatMessage;
