//! Retrieval engine: embed the query, pick the nearest cases
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

use crate::errors::{RagError, Result};
use crate::llm::EmbeddingProvider;
use crate::rag::context::{AssembledContext, ContextBuilder};
use crate::rag::index::{SearchHit, SearchIndex};

/// Default number of cases returned per query
pub const DEFAULT_TOP_K: usize = 4;

/// Search parameters for retrieval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchParams {
    /// Maximum number of results to retrieve
    pub top_k: usize,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
        }
    }
}

/// Outcome of one retrieval
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Retrieval {
    /// The query as given
    pub query: String,
    /// Matches, most similar first
    pub hits: Vec<SearchHit>,
    /// Joined context passed to the composer
    pub context: AssembledContext,
}

/// Retrieval engine for similarity search
pub struct RetrievalEngine {
    embedder: Arc<dyn EmbeddingProvider>,
    context_builder: ContextBuilder,
    default_params: SearchParams,
}

impl RetrievalEngine {
    /// Create new retrieval engine
    pub fn new(embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self::with_params(embedder, SearchParams::default())
    }

    /// Create with custom default parameters
    pub fn with_params(embedder: Arc<dyn EmbeddingProvider>, params: SearchParams) -> Self {
        Self {
            embedder,
            context_builder: ContextBuilder::new(),
            default_params: params,
        }
    }

    /// Retrieve cases matching query
    pub async fn retrieve(&self, index: &SearchIndex, query: &str) -> Result<Retrieval> {
        self.retrieve_with_params(index, query, &self.default_params)
            .await
    }

    /// Retrieve with custom parameters
    pub async fn retrieve_with_params(
        &self,
        index: &SearchIndex,
        query: &str,
        params: &SearchParams,
    ) -> Result<Retrieval> {
        if query.trim().is_empty() {
            return Err(RagError::EmptyQuery);
        }

        // Nothing to match against; skip the embedding call entirely
        if index.is_empty() || params.top_k == 0 {
            return Ok(Retrieval {
                query: query.to_string(),
                hits: Vec::new(),
                context: AssembledContext::default(),
            });
        }

        let started = Instant::now();
        let mut vectors = self.embedder.embed(&[query.to_string()]).await?;
        let query_vector = match (vectors.pop(), vectors.is_empty()) {
            (Some(vector), true) => vector,
            _ => {
                return Err(RagError::Embedding(format!(
                    "{} did not return exactly one query vector",
                    self.embedder.name()
                )))
            }
        };

        let hits = index.search(&query_vector, params.top_k)?;
        let context = self.context_builder.build(&hits);

        tracing::debug!(
            matches = hits.len(),
            top_case = hits.first().map(|h| h.case.case_code.as_str()).unwrap_or("-"),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Retrieved similar cases"
        );

        Ok(Retrieval {
            query: query.to_string(),
            hits,
            context,
        })
    }

    /// Get default search parameters
    pub fn default_params(&self) -> &SearchParams {
        &self.default_params
    }
}
