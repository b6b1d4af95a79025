//! Shared in-process providers for integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chabunhae::cases::AccidentCase;
use chabunhae::errors::{RagError, Result};
use chabunhae::llm::{CompletionProvider, EmbeddingProvider};
use chabunhae::rag::{RagPipeline, SearchParams, FALLBACK_ANSWER};
use chabunhae::CaseStore;

pub const DIMENSION: usize = 1024;

/// Call counters shared between a test and its providers
#[derive(Debug, Default)]
pub struct Calls {
    pub embed: AtomicUsize,
    pub embed_build: AtomicUsize,
    pub complete: AtomicUsize,
}

impl Calls {
    pub fn embeds(&self) -> usize {
        self.embed.load(Ordering::SeqCst)
    }

    pub fn builds(&self) -> usize {
        self.embed_build.load(Ordering::SeqCst)
    }

    pub fn completions(&self) -> usize {
        self.complete.load(Ordering::SeqCst)
    }
}

/// Deterministic embedding: character bigrams hashed into a fixed vector
pub fn bigram_vector(text: &str) -> Vec<f32> {
    let mut v = vec![0.0; DIMENSION];
    let chars: Vec<char> = text.chars().filter(|c| !c.is_whitespace()).collect();
    for pair in chars.windows(2) {
        let mut hasher = DefaultHasher::new();
        pair.hash(&mut hasher);
        v[(hasher.finish() % DIMENSION as u64) as usize] += 1.0;
    }
    v
}

pub struct BigramEmbedder {
    pub calls: Arc<Calls>,
    pub batch: usize,
    pub delay: Option<Duration>,
}

impl BigramEmbedder {
    pub fn new(calls: Arc<Calls>) -> Self {
        Self {
            calls,
            batch: 16,
            delay: None,
        }
    }
}

#[async_trait]
impl EmbeddingProvider for BigramEmbedder {
    fn name(&self) -> &str {
        "bigram"
    }

    fn max_batch_size(&self) -> usize {
        self.batch
    }

    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>> {
        self.calls.embed.fetch_add(1, Ordering::SeqCst);
        if inputs.iter().any(|t| t.starts_with("사고유형:")) {
            self.calls.embed_build.fetch_add(1, Ordering::SeqCst);
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(inputs.iter().map(|t| bigram_vector(t)).collect())
    }
}

/// Embedding service that is always down
pub struct FailingEmbedder {
    pub calls: Arc<Calls>,
}

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    fn name(&self) -> &str {
        "failing"
    }

    async fn embed(&self, _inputs: &[String]) -> Result<Vec<Vec<f32>>> {
        self.calls.embed.fetch_add(1, Ordering::SeqCst);
        Err(RagError::Embedding("service unavailable".to_string()))
    }
}

/// Chat model that answers with the first source link in its prompt
pub struct ScriptedModel {
    pub calls: Arc<Calls>,
}

#[async_trait]
impl CompletionProvider for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        self.calls.complete.fetch_add(1, Ordering::SeqCst);
        let answer = match prompt.lines().find(|l| l.starts_with("사고 링크:")) {
            Some(link_line) => format!("가장 유사한 사례입니다.\n{}", link_line),
            None => FALLBACK_ANSWER.to_string(),
        };
        Ok(answer)
    }
}

/// Chat model that is rate limited
pub struct RateLimitedModel {
    pub calls: Arc<Calls>,
}

#[async_trait]
impl CompletionProvider for RateLimitedModel {
    fn name(&self) -> &str {
        "rate-limited"
    }

    async fn complete(&self, _prompt: &str) -> Result<String> {
        self.calls.complete.fetch_add(1, Ordering::SeqCst);
        Err(RagError::Generation("rate limited (HTTP 429)".to_string()))
    }
}

pub fn case(code: &str, narrative: &str, ratio: &str, link: &str) -> AccidentCase {
    AccidentCase::new(code, "직진", "좌회전", narrative, ratio, link)
}

pub fn sample_cases() -> Vec<AccidentCase> {
    vec![
        case(
            "차1-1",
            "신호기에 의해 교통정리가 이루어지는 교차로에서 녹색 신호에 직진하는 A차량과 적색 신호에 직진하는 B차량이 충돌한 사고",
            "0 : 100",
            "http://example/1",
        ),
        case(
            "차2-1",
            "동일 방향으로 주행하던 A차량이 진로 변경을 하다가 후행 직진하던 B차량과 충돌한 사고",
            "70 : 30",
            "http://example/2",
        ),
        case(
            "차3-1",
            "주차장 통로에서 후진하던 A차량과 주차 구획에서 나오던 B차량이 충돌한 사고",
            "50 : 50",
            "http://example/3",
        ),
    ]
}

pub fn pipeline(cases: Vec<AccidentCase>, calls: Arc<Calls>) -> RagPipeline {
    RagPipeline::new(
        CaseStore::from_cases(cases),
        Arc::new(BigramEmbedder::new(calls.clone())),
        Arc::new(ScriptedModel { calls }),
        SearchParams::default(),
    )
}
