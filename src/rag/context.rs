//! Context assembly for the answer prompt

use serde::{Deserialize, Serialize};

use crate::rag::index::SearchHit;

/// Separator placed between rendered cases
pub const CASE_SEPARATOR: &str = "\n\n";

/// Assembled retrieval context
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssembledContext {
    /// Rendered cases joined by a blank line, most similar first
    pub text: String,
    /// Number of cases included
    pub case_count: usize,
    /// Case codes included, in context order
    pub case_codes: Vec<String>,
    /// Source links included, in context order
    pub source_links: Vec<String>,
}

impl AssembledContext {
    /// True when no case made it into the context
    pub fn is_empty(&self) -> bool {
        self.case_count == 0
    }
}

/// Joins search hits into the exact string handed to the composer
#[derive(Debug, Clone, Default)]
pub struct ContextBuilder;

impl ContextBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Build context from ranked hits
    pub fn build(&self, hits: &[SearchHit]) -> AssembledContext {
        AssembledContext {
            text: hits
                .iter()
                .map(|hit| hit.rendered.as_str())
                .collect::<Vec<_>>()
                .join(CASE_SEPARATOR),
            case_count: hits.len(),
            case_codes: hits.iter().map(|hit| hit.case.case_code.clone()).collect(),
            source_links: hits.iter().map(|hit| hit.case.source_link.clone()).collect(),
        }
    }
}
