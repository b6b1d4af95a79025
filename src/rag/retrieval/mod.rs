pub mod engine;

pub use engine::{Retrieval, RetrievalEngine, SearchParams, DEFAULT_TOP_K};
