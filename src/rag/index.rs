//! Exact nearest-neighbour index over embedded accident cases
//!
//! Built in one pass from a store snapshot. There is no insert or delete;
//! a changed corpus means building a new index.

use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::cases::AccidentCase;
use crate::errors::{RagError, Result};
use crate::llm::EmbeddingProvider;
use crate::rag::similarity::{is_finite_vector, top_k_by_cosine};

/// One record matched by a similarity search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// The matched record
    pub case: AccidentCase,
    /// Its canonical rendering
    pub rendered: String,
    /// Cosine similarity to the query
    pub score: f32,
}

/// Read-only vector index
#[derive(Debug, Clone)]
pub struct SearchIndex {
    cases: Vec<AccidentCase>,
    rendered: Vec<String>,
    vectors: Vec<Vec<f32>>,
    dimension: usize,
}

impl SearchIndex {
    /// Embed every case and build the index.
    ///
    /// Any failure aborts the whole build; nothing partial is returned.
    pub async fn build(cases: &[AccidentCase], embedder: &dyn EmbeddingProvider) -> Result<Self> {
        let started = Instant::now();

        for case in cases {
            if let Some(label) = case.first_missing_field() {
                return Err(RagError::IndexBuild(format!(
                    "case '{}' has an empty '{}' field",
                    case.case_code, label
                )));
            }
        }

        let rendered: Vec<String> = cases.iter().map(AccidentCase::render).collect();
        let batch_size = embedder.max_batch_size().max(1);
        let mut vectors: Vec<Vec<f32>> = Vec::with_capacity(rendered.len());

        for (batch_no, batch) in rendered.chunks(batch_size).enumerate() {
            let embedded = embedder.embed(batch).await.map_err(|e| {
                RagError::IndexBuild(format!(
                    "{} failed on batch {}: {}",
                    embedder.name(),
                    batch_no,
                    e
                ))
            })?;

            if embedded.len() != batch.len() {
                return Err(RagError::IndexBuild(format!(
                    "{} returned {} vectors for {} texts",
                    embedder.name(),
                    embedded.len(),
                    batch.len()
                )));
            }
            vectors.extend(embedded);
        }

        let dimension = vectors.first().map(Vec::len).unwrap_or(0);
        if !vectors.is_empty() && dimension == 0 {
            return Err(RagError::IndexBuild(
                "embedding service returned empty vectors".to_string(),
            ));
        }
        if let Some(pos) = vectors.iter().position(|v| v.len() != dimension) {
            return Err(RagError::IndexBuild(format!(
                "vector for case '{}' has dimension {}, expected {}",
                cases[pos].case_code,
                vectors[pos].len(),
                dimension
            )));
        }
        if let Some(pos) = vectors.iter().position(|v| !is_finite_vector(v)) {
            return Err(RagError::IndexBuild(format!(
                "vector for case '{}' has non-finite components",
                cases[pos].case_code
            )));
        }

        tracing::info!(
            cases = cases.len(),
            dimension,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Built search index"
        );

        Ok(Self {
            cases: cases.to_vec(),
            rendered,
            vectors,
            dimension,
        })
    }

    /// The `k` records closest to `query`, most similar first
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        if self.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        if query.len() != self.dimension {
            return Err(RagError::Embedding(format!(
                "query vector has dimension {}, index expects {}",
                query.len(),
                self.dimension
            )));
        }
        if !is_finite_vector(query) {
            return Err(RagError::Embedding(
                "query vector has non-finite components".to_string(),
            ));
        }

        let hits = top_k_by_cosine(query, &self.vectors, k)
            .into_iter()
            .map(|(idx, score)| SearchHit {
                case: self.cases[idx].clone(),
                rendered: self.rendered[idx].clone(),
                score,
            })
            .collect();
        Ok(hits)
    }

    /// Vector dimension (0 for an empty index)
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of indexed records
    pub fn len(&self) -> usize {
        self.cases.len()
    }

    /// Whether the index holds no records
    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }
}
