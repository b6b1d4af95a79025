//! Chabunhae (차분해) - accident fault ratio assistant
//!
//! Describe a traffic accident in plain Korean and get back the most similar
//! published fault-ratio case, its ratio and a link to the source chart.
//!
//! # Architecture
//!
//! - **cases**: accident case records and the JSON case store
//! - **llm**: embedding and chat providers (Azure OpenAI)
//! - **rag**: vector index, retrieval, answer composition, pipeline
//! - **crawl**: scraper that builds the case store from the chart site
//! - **cli** / **repl**: command line and interactive front ends

pub mod cases;
pub mod cli;
pub mod crawl;
pub mod errors;
pub mod llm;
pub mod logging;
pub mod rag;
pub mod repl;

// Re-export commonly used types
pub use cases::{AccidentCase, CaseStore};
pub use errors::{RagError, Result};
pub use rag::{Answer, RagPipeline};
