use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use jarvis_rag::RagError;
use serde_json::json;
use thiserror::Error;

/// Message returned by `/api/chat` when the request carries no question.
pub const NO_MESSAGE: &str = "No message provided";

/// An error returned from an API handler, rendered as `{"error": message}`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Start-up could not build the assistant.
    #[error("Jarvis not initialized. Please check environment variables and run ingest first.")]
    NotInitialized,

    /// The request was missing a question or was not valid JSON.
    #[error("{0}")]
    BadRequest(String),

    /// Retrieval or generation failed.
    #[error("Error generating response: {0}")]
    Upstream(#[source] RagError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotInitialized | ApiError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RagError> for ApiError {
    fn from(error: RagError) -> Self {
        match error {
            RagError::EmptyInput(message) => ApiError::BadRequest(message),
            other => ApiError::Upstream(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}
