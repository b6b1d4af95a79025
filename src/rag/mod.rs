// Retrieval-augmented answering over accident cases
//
// Components:
// - Index: embedded cases with exact cosine search
// - Retrieval Engine: query embedding and top-k lookup
// - Context Builder: joins rendered cases for the prompt
// - Composer: instruction template and chat completion
// - Pipeline: lazy index cache and end-to-end orchestration

pub mod composer;
pub mod context;
pub mod index;
pub mod pipeline;
pub mod retrieval;
pub mod similarity;

// Re-export key types
pub use composer::{AnswerComposer, ComposedAnswer, FALLBACK_ANSWER};
pub use context::{AssembledContext, ContextBuilder};
pub use index::{SearchHit, SearchIndex};
pub use pipeline::{Answer, IndexStatus, RagPipeline};
pub use retrieval::{Retrieval, RetrievalEngine, SearchParams, DEFAULT_TOP_K};
