//! OpenAI embedding and chat providers.
//!
//! Both talk to the REST API directly through `reqwest`; a shared
//! [`reqwest::Client`] can be injected with `with_client` so connection pools
//! and timeouts are configured once per process.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::batch::split_by_budget;
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::llm::{ChatModel, CompletionRequest};

/// The default OpenAI API base URL.
pub const OPENAI_API_BASE: &str = "https://api.openai.com";

/// The default model for OpenAI embeddings.
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// The default chat model.
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";

const SMALL_MODEL_DIMENSIONS: usize = 1536;
const LARGE_MODEL_DIMENSIONS: usize = 3072;

/// Maximum number of inputs accepted by one embeddings request.
const MAX_INPUTS_PER_REQUEST: usize = 2048;

/// Character budget of one embeddings request, below the API's limit of
/// 300k tokens summed over all inputs.
const MAX_CHARS_PER_REQUEST: usize = 800_000;

/// An [`EmbeddingProvider`] backed by `POST /v1/embeddings`.
///
/// Batches beyond the API's per-request input count or token budget are sent
/// as several sequential requests and reassembled in input order.
///
/// ```rust,ignore
/// let provider = OpenAIEmbeddingProvider::new(api_key)?.with_model("text-embedding-3-large");
/// let vectors = provider.embed_batch(&["first chunk", "second chunk"]).await?;
/// ```
pub struct OpenAIEmbeddingProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAIEmbeddingProvider {
    /// Create a provider for the default embedding model.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(RagError::MissingConfig { keys: vec!["OPENAI_API_KEY".into()] });
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: OPENAI_API_BASE.into(),
            model: DEFAULT_EMBEDDING_MODEL.into(),
        })
    }

    /// Use an existing HTTP client.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Set the API base URL (for proxies and compatible servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the model name (e.g. `text-embedding-3-large`).
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    async fn request_embeddings(&self, input: &[&str]) -> Result<Vec<Vec<f32>>> {
        let request_body = EmbeddingRequest { model: &self.model, input };

        let response = self
            .client
            .post(format!("{}/v1/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!(provider = "OpenAI", error = %e, "request failed");
                embedding_error(format!("request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(provider = "OpenAI", %status, "API error");
            return Err(embedding_error(format!("API returned {status}: {}", error_detail(body))));
        }

        let embedding_response: EmbeddingResponse = response.json().await.map_err(|e| {
            error!(provider = "OpenAI", error = %e, "failed to parse response");
            embedding_error(format!("failed to parse response: {e}"))
        })?;

        embedding_response.into_ordered(input.len())
    }
}

// ── OpenAI API request/response types ──────────────────────────────

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

impl EmbeddingResponse {
    /// Return embeddings in input order, checking one was returned per input.
    fn into_ordered(mut self, expected: usize) -> Result<Vec<Vec<f32>>> {
        if self.data.len() != expected {
            return Err(embedding_error(format!(
                "API returned {} embeddings for {expected} inputs",
                self.data.len()
            )));
        }
        self.data.sort_by_key(|d| d.index);
        Ok(self.data.into_iter().map(|d| d.embedding).collect())
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Prefer the structured `error.message` of an API error body.
fn error_detail(body: String) -> String {
    serde_json::from_str::<ErrorResponse>(&body).map(|e| e.error.message).unwrap_or(body)
}

fn embedding_error(message: String) -> RagError {
    RagError::EmbeddingError { provider: "OpenAI".into(), message }
}

fn generation_error(message: String) -> RagError {
    RagError::GenerationError { provider: "OpenAI".into(), message }
}

// ── EmbeddingProvider implementation ───────────────────────────────

#[async_trait]
impl EmbeddingProvider for OpenAIEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        debug!(provider = "OpenAI", text_len = text.len(), "embedding single text");

        let results = self.embed_batch(&[text]).await?;
        results.into_iter().next().ok_or_else(|| embedding_error("API returned empty response".into()))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(
            provider = "OpenAI",
            batch_size = texts.len(),
            model = %self.model,
            "embedding batch"
        );

        let weights: Vec<usize> = texts.iter().map(|t| t.chars().count()).collect();
        let batches = split_by_budget(&weights, MAX_INPUTS_PER_REQUEST, MAX_CHARS_PER_REQUEST);
        if batches.len() > 1 {
            debug!(provider = "OpenAI", requests = batches.len(), "splitting embedding batch");
        }

        let mut embeddings = Vec::with_capacity(texts.len());
        for range in batches {
            embeddings.extend(self.request_embeddings(&texts[range]).await?);
        }
        Ok(embeddings)
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        match self.model.as_str() {
            "text-embedding-3-large" => LARGE_MODEL_DIMENSIONS,
            _ => SMALL_MODEL_DIMENSIONS,
        }
    }
}

/// A [`ChatModel`] backed by the OpenAI chat completions API.
///
/// # Example
///
/// ```rust,ignore
/// use jarvis_rag::openai::OpenAIChatModel;
/// use jarvis_rag::{ChatModel, CompletionRequest};
///
/// let model = OpenAIChatModel::new("sk-...")?.with_model("gpt-4o-mini");
/// let answer = model.complete(&CompletionRequest::deterministic("Hello")).await?;
/// ```
pub struct OpenAIChatModel {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAIChatModel {
    /// Create a new chat model client using `gpt-4o-mini`.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(RagError::MissingConfig { keys: vec!["OPENAI_API_KEY".into()] });
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: OPENAI_API_BASE.into(),
            model: DEFAULT_CHAT_MODEL.into(),
        })
    }

    /// Use an existing HTTP client.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Set the API base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

#[async_trait]
impl ChatModel for OpenAIChatModel {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        debug!(
            provider = "OpenAI",
            model = %self.model,
            prompt_len = request.prompt.len(),
            temperature = request.temperature,
            "requesting completion"
        );

        let request_body = ChatCompletionRequest {
            model: &self.model,
            messages: vec![ChatMessage { role: "user", content: &request.prompt }],
            temperature: request.temperature,
        };

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!(provider = "OpenAI", error = %e, "completion request failed");
                generation_error(format!("request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(provider = "OpenAI", %status, "completion API error");
            return Err(generation_error(format!("API returned {status}: {}", error_detail(body))));
        }

        let completion: ChatCompletionResponse = response.json().await.map_err(|e| {
            error!(provider = "OpenAI", error = %e, "failed to parse completion");
            generation_error(format!("failed to parse response: {e}"))
        })?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| generation_error("API returned no completion".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rejects_empty_api_key() {
        assert!(OpenAIEmbeddingProvider::new("").is_err());
        assert!(OpenAIChatModel::new("").is_err());
    }

    #[test]
    fn embeddings_are_returned_in_input_order() {
        let response: EmbeddingResponse = serde_json::from_value(json!({
            "data": [
                {"index": 1, "embedding": [0.0, 1.0]},
                {"index": 0, "embedding": [1.0, 0.0]}
            ]
        }))
        .unwrap();

        let ordered = response.into_ordered(2).unwrap();
        assert_eq!(ordered, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[test]
    fn embedding_count_mismatch_is_an_error() {
        let response: EmbeddingResponse =
            serde_json::from_value(json!({"data": [{"index": 0, "embedding": [1.0]}]})).unwrap();
        assert!(matches!(response.into_ordered(2), Err(RagError::EmbeddingError { .. })));
    }

    #[test]
    fn chat_request_is_a_single_user_message_at_temperature_zero() {
        let body = ChatCompletionRequest {
            model: "gpt-4o-mini",
            messages: vec![ChatMessage { role: "user", content: "hi" }],
            temperature: 0.0,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "model": "gpt-4o-mini",
                "messages": [{"role": "user", "content": "hi"}],
                "temperature": 0.0
            })
        );
    }

    #[test]
    fn api_error_detail_is_extracted() {
        let body = json!({"error": {"message": "Incorrect API key provided"}}).to_string();
        assert_eq!(error_detail(body), "Incorrect API key provided");
        assert_eq!(error_detail("gateway timeout".into()), "gateway timeout");
    }

    #[test]
    fn dimensions_follow_the_model() {
        let small = OpenAIEmbeddingProvider::new("sk-test").unwrap();
        assert_eq!(small.dimensions(), 1536);

        let large = small.with_model("text-embedding-3-large");
        assert_eq!(large.dimensions(), 3072);
        assert_eq!(large.model_name(), "text-embedding-3-large");
    }

    #[test]
    fn default_sized_chunks_stay_within_the_request_budget() {
        let chunk = "x".repeat(1000);
        let weights = vec![chunk.len(); 5000];
        let batches = split_by_budget(&weights, MAX_INPUTS_PER_REQUEST, MAX_CHARS_PER_REQUEST);

        assert!(batches.len() > 5000 / MAX_INPUTS_PER_REQUEST + 1);
        assert!(batches.iter().all(|b| b.len() * 1000 <= MAX_CHARS_PER_REQUEST));
        assert_eq!(batches.iter().map(|b| b.len()).sum::<usize>(), 5000);
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let model = OpenAIChatModel::new("sk-test").unwrap().with_base_url("http://localhost:8080/");
        assert_eq!(model.base_url, "http://localhost:8080");
        assert_eq!(model.model_name(), DEFAULT_CHAT_MODEL);
    }
}
