//! End-to-end question answering: lazy index, retrieval, composition
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use std::time::Instant;
use tokio::sync::Mutex;

use crate::cases::CaseStore;
use crate::cli::config::Config;
use crate::errors::{RagError, Result};
use crate::llm::{AzureOpenAiClient, CompletionProvider, EmbeddingProvider};
use crate::rag::composer::AnswerComposer;
use crate::rag::context::AssembledContext;
use crate::rag::index::{SearchHit, SearchIndex};
use crate::rag::retrieval::{Retrieval, RetrievalEngine, SearchParams};

/// Pipeline answer for one question
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    /// Original question
    pub query: String,
    /// Model reply, verbatim, or the fallback sentence
    pub text: String,
    /// Retrieved cases, most similar first
    pub matches: Vec<SearchHit>,
    /// Context handed to the model
    pub context: AssembledContext,
    /// Link found on the answer's `사고 링크:` line
    pub source_link: Option<String>,
    /// Whether the cited link is one of the retrieved cases
    pub link_retrieved: bool,
    /// True when no case was retrieved and the model was not called
    pub fallback: bool,
}

/// Snapshot of index state for status displays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStatus {
    pub cases: usize,
    pub built: bool,
    pub dimension: usize,
}

/// Retrieval-augmented answering over the accident case store.
///
/// The search index is built on first use and shared afterwards. Concurrent
/// first callers wait on the same build; a failed build caches nothing.
pub struct RagPipeline {
    store: RwLock<Arc<CaseStore>>,
    embedder: Arc<dyn EmbeddingProvider>,
    retrieval: RetrievalEngine,
    composer: AnswerComposer,
    index: Mutex<Option<Arc<SearchIndex>>>,
}

impl RagPipeline {
    /// Create a pipeline over `store` with explicit collaborators
    pub fn new(
        store: CaseStore,
        embedder: Arc<dyn EmbeddingProvider>,
        completer: Arc<dyn CompletionProvider>,
        params: SearchParams,
    ) -> Self {
        Self {
            store: RwLock::new(Arc::new(store)),
            retrieval: RetrievalEngine::with_params(embedder.clone(), params),
            embedder,
            composer: AnswerComposer::new(completer),
            index: Mutex::new(None),
        }
    }

    /// Create a pipeline backed by Azure OpenAI for both embeddings and chat
    pub fn from_config(config: &Config, store: CaseStore) -> Result<Self> {
        config.require_credentials()?;
        let client = Arc::new(AzureOpenAiClient::new(
            &config.azure,
            config.retrieval.embed_batch_size,
        )?);

        Ok(Self::new(
            store,
            client.clone(),
            client,
            SearchParams {
                top_k: config.retrieval.top_k,
            },
        ))
    }

    /// The search index, building it if needed
    pub async fn index(&self) -> Result<Arc<SearchIndex>> {
        let mut slot = self.index.lock().await;
        if let Some(index) = slot.as_ref() {
            return Ok(Arc::clone(index));
        }

        let store = self.store_snapshot()?;
        tracing::info!(cases = store.len(), "Building search index");
        let index = Arc::new(SearchIndex::build(store.cases(), self.embedder.as_ref()).await?);
        *slot = Some(Arc::clone(&index));
        Ok(index)
    }

    /// Build the index now so configuration and service errors surface early
    pub async fn warm_up(&self) -> Result<()> {
        self.index().await.map(|_| ())
    }

    /// Drop the cached index; the next request rebuilds it
    pub async fn invalidate(&self) {
        let mut slot = self.index.lock().await;
        if slot.take().is_some() {
            tracing::info!("Search index invalidated");
        }
    }

    /// Swap in a new case store and drop the stale index
    pub async fn replace_store(&self, store: CaseStore) -> Result<()> {
        {
            let mut guard = self
                .store
                .write()
                .map_err(|_| RagError::Generic("case store lock poisoned".to_string()))?;
            *guard = Arc::new(store);
        }
        self.invalidate().await;
        Ok(())
    }

    /// Whether the index is currently cached
    pub async fn is_index_built(&self) -> bool {
        self.index.lock().await.is_some()
    }

    /// Case count and index state
    pub async fn status(&self) -> Result<IndexStatus> {
        let cases = self.store_snapshot()?.len();
        let slot = self.index.lock().await;
        Ok(IndexStatus {
            cases,
            built: slot.is_some(),
            dimension: slot.as_ref().map(|i| i.dimension()).unwrap_or(0),
        })
    }

    /// Current case store
    pub fn store_snapshot(&self) -> Result<Arc<CaseStore>> {
        self.store
            .read()
            .map(|guard| Arc::clone(&*guard))
            .map_err(|_| RagError::Generic("case store lock poisoned".to_string()))
    }

    /// Retrieve similar cases with the default parameters
    pub async fn retrieve(&self, query: &str) -> Result<Retrieval> {
        let params = *self.retrieval.default_params();
        self.retrieve_with_params(query, &params).await
    }

    /// Retrieve similar cases with custom parameters
    pub async fn retrieve_with_params(&self, query: &str, params: &SearchParams) -> Result<Retrieval> {
        if query.trim().is_empty() {
            return Err(RagError::EmptyQuery);
        }
        let index = self.index().await?;
        self.retrieval
            .retrieve_with_params(&index, query, params)
            .await
    }

    /// Answer a question with the default parameters
    pub async fn ask(&self, query: &str) -> Result<Answer> {
        let params = *self.retrieval.default_params();
        self.ask_with_params(query, &params).await
    }

    /// Answer a question: retrieve, then compose
    pub async fn ask_with_params(&self, query: &str, params: &SearchParams) -> Result<Answer> {
        let started = Instant::now();
        let retrieval = self.retrieve_with_params(query, params).await?;
        let composed = self.composer.compose(&retrieval.context, query).await?;

        tracing::debug!(
            matches = retrieval.hits.len(),
            fallback = composed.fallback,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Answered question"
        );

        Ok(Answer {
            query: retrieval.query,
            text: composed.text,
            matches: retrieval.hits,
            context: retrieval.context,
            source_link: composed.source_link,
            link_retrieved: composed.link_retrieved,
            fallback: composed.fallback,
        })
    }

    /// Default number of cases retrieved per question
    pub fn top_k(&self) -> usize {
        self.retrieval.default_params().top_k
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cases::AccidentCase;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct LengthEmbedder {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl EmbeddingProvider for LengthEmbedder {
        fn name(&self) -> &str {
            "length"
        }

        async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(inputs
                .iter()
                .map(|t| vec![1.0, t.chars().count() as f32 / 100.0])
                .collect())
        }
    }

    struct EchoModel;

    #[async_trait]
    impl CompletionProvider for EchoModel {
        fn name(&self) -> &str {
            "echo"
        }

        async fn complete(&self, prompt: &str) -> Result<String> {
            Ok(prompt
                .lines()
                .find(|l| l.starts_with("사고 링크:"))
                .unwrap_or("링크 없음")
                .to_string())
        }
    }

    fn pipeline(cases: Vec<AccidentCase>) -> (RagPipeline, Arc<LengthEmbedder>) {
        let embedder = Arc::new(LengthEmbedder {
            calls: AtomicUsize::new(0),
        });
        let pipeline = RagPipeline::new(
            CaseStore::from_cases(cases),
            embedder.clone(),
            Arc::new(EchoModel),
            SearchParams::default(),
        );
        (pipeline, embedder)
    }

    fn sample() -> AccidentCase {
        AccidentCase::new("차1-1", "직진", "좌회전", "교차로 충돌", "50 : 50", "http://example/1")
    }

    #[tokio::test]
    async fn test_index_is_built_once() {
        let (pipeline, embedder) = pipeline(vec![sample()]);
        assert!(!pipeline.is_index_built().await);

        pipeline.ask("교차로에서 충돌").await.unwrap();
        pipeline.ask("교차로에서 충돌").await.unwrap();

        // one build call plus one query embedding per question
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 3);
        assert!(pipeline.is_index_built().await);
    }

    #[tokio::test]
    async fn test_invalidate_forces_rebuild() {
        let (pipeline, embedder) = pipeline(vec![sample()]);
        pipeline.warm_up().await.unwrap();
        pipeline.invalidate().await;
        assert!(!pipeline.is_index_built().await);

        pipeline.warm_up().await.unwrap();
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_replace_store_updates_status() {
        let (pipeline, _) = pipeline(vec![sample()]);
        pipeline.warm_up().await.unwrap();

        pipeline.replace_store(CaseStore::from_cases(Vec::new())).await.unwrap();
        let status = pipeline.status().await.unwrap();
        assert_eq!(status.cases, 0);
        assert!(!status.built);
    }

    #[tokio::test]
    async fn test_blank_query_does_not_build() {
        let (pipeline, embedder) = pipeline(vec![sample()]);
        let err = pipeline.ask("  \n").await.unwrap_err();

        assert!(matches!(err, RagError::EmptyQuery));
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
        assert!(!pipeline.is_index_built().await);
    }

    #[tokio::test]
    async fn test_answer_cites_retrieved_case() {
        let (pipeline, _) = pipeline(vec![sample()]);
        let answer = pipeline.ask("교차로에서 충돌").await.unwrap();

        assert_eq!(answer.matches.len(), 1);
        assert!(answer.text.contains("http://example/1"));
        assert!(answer.link_retrieved);
    }
}
