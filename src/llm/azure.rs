//! Azure OpenAI client for embeddings and chat completions
//!
//! One client, one configuration: the embedding and chat deployments share the
//! endpoint, key and API version.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use std::time::Duration;

use crate::cli::config::AzureConfig;
use crate::errors::{RagError, Result};
use crate::llm::provider::{CompletionProvider, EmbeddingProvider};
use crate::llm::types::{
    ChatCompletionRequest, ChatCompletionResponse, ChatMessage, EmbeddingData, EmbeddingRequest,
    EmbeddingResponse,
};

/// HTTP client for an Azure OpenAI resource
#[derive(Debug, Clone)]
pub struct AzureOpenAiClient {
    client: Client,
    endpoint: String,
    api_version: String,
    embedding_deployment: String,
    chat_deployment: String,
    temperature: f32,
    max_tokens: Option<u32>,
    batch_size: usize,
}

impl AzureOpenAiClient {
    /// Build a client from configuration; endpoint and API key are required
    pub fn new(config: &AzureConfig, batch_size: usize) -> Result<Self> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| RagError::Config("missing Azure OpenAI API key".to_string()))?;
        if config.endpoint.trim().is_empty() {
            return Err(RagError::Config(
                "missing Azure OpenAI endpoint".to_string(),
            ));
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            "api-key",
            HeaderValue::from_str(api_key)
                .map_err(|_| RagError::Config("invalid Azure OpenAI API key".to_string()))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim().trim_end_matches('/').to_string(),
            api_version: config.api_version.clone(),
            embedding_deployment: config.embedding_deployment.clone(),
            chat_deployment: config.chat_deployment.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            batch_size: batch_size.max(1),
        })
    }

    /// URL for an operation on a deployment
    pub fn deployment_url(&self, deployment: &str, operation: &str) -> String {
        format!(
            "{}/openai/deployments/{}/{}?api-version={}",
            self.endpoint,
            urlencoding::encode(deployment),
            operation,
            urlencoding::encode(&self.api_version)
        )
    }

    /// Sampling temperature sent with every completion
    pub fn temperature(&self) -> f32 {
        self.temperature
    }
}

/// Human-readable failure for a non-success response
fn describe_status(status: StatusCode, body: &str) -> String {
    if status == StatusCode::TOO_MANY_REQUESTS {
        format!("rate limited ({}): {}", status, body)
    } else {
        format!("HTTP {}: {}", status, body)
    }
}

fn describe_transport(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        format!("request timed out: {}", err)
    } else if err.is_connect() {
        format!("service unreachable: {}", err)
    } else {
        err.to_string()
    }
}

/// Put embeddings back in input order
///
/// The `index` fields must be exactly `0..expected`, each once.
fn order_embeddings(mut data: Vec<EmbeddingData>, expected: usize) -> Result<Vec<Vec<f32>>> {
    if data.len() != expected {
        return Err(RagError::Embedding(format!(
            "service returned {} embeddings for {} inputs",
            data.len(),
            expected
        )));
    }

    data.sort_by_key(|entry| entry.index);
    if let Some((position, entry)) = data
        .iter()
        .enumerate()
        .find(|(position, entry)| entry.index != *position)
    {
        return Err(RagError::Embedding(format!(
            "embedding index {} found where {} was expected",
            entry.index, position
        )));
    }

    Ok(data.into_iter().map(|entry| entry.embedding).collect())
}

#[async_trait]
impl EmbeddingProvider for AzureOpenAiClient {
    fn name(&self) -> &str {
        "azure-openai"
    }

    fn max_batch_size(&self) -> usize {
        self.batch_size
    }

    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let url = self.deployment_url(&self.embedding_deployment, "embeddings");
        let response = self
            .client
            .post(&url)
            .json(&EmbeddingRequest { input: inputs })
            .send()
            .await
            .map_err(|e| RagError::Embedding(describe_transport(&e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(RagError::Embedding(describe_status(status, &body)));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| RagError::Embedding(format!("failed to parse response: {}", e)))?;

        order_embeddings(parsed.data, inputs.len())
    }
}

#[async_trait]
impl CompletionProvider for AzureOpenAiClient {
    fn name(&self) -> &str {
        "azure-openai"
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let url = self.deployment_url(&self.chat_deployment, "chat/completions");
        let messages = [ChatMessage::user(prompt)];
        let request = ChatCompletionRequest {
            messages: &messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| RagError::Generation(describe_transport(&e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(RagError::Generation(describe_status(status, &body)));
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| RagError::Generation(format!("failed to parse response: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| RagError::Generation("service returned no completion".to_string()))
    }
}
