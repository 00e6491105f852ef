//! Chat model trait for generating answers from an assembled prompt.

use async_trait::async_trait;

use crate::error::Result;

/// A single-turn completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// The fully rendered prompt, sent as one user message.
    pub prompt: String,
    /// Sampling temperature. `0.0` requests deterministic output.
    pub temperature: f32,
}

impl CompletionRequest {
    /// A request at temperature `0.0`.
    pub fn deterministic(prompt: impl Into<String>) -> Self {
        Self { prompt: prompt.into(), temperature: 0.0 }
    }
}

/// A hosted language model that completes prompts.
///
/// # Example
///
/// ```rust,ignore
/// use jarvis_rag::{ChatModel, CompletionRequest};
///
/// let answer = model.complete(&CompletionRequest::deterministic("Say hi")).await?;
/// ```
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// The model identifier reported to clients.
    fn model_name(&self) -> &str;

    /// Return the model's completion for the request, verbatim.
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;
}
