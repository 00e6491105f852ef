//! Error types for the `jarvis-rag` crate.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while ingesting documents or answering questions.
#[derive(Debug, Error)]
pub enum RagError {
    /// One or more required settings are absent.
    #[error("Missing required configuration: {}", keys.join(", "))]
    MissingConfig {
        /// Names of the missing settings.
        keys: Vec<String>,
    },

    /// A configuration value is present but invalid.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Text could not be extracted from a source document.
    #[error("Extraction error ({}): {message}", path.display())]
    ExtractionError {
        /// The file that failed to extract.
        path: PathBuf,
        /// A description of the failure.
        message: String,
    },

    /// There was nothing to operate on (no documents, no chunks, no question).
    #[error("Empty input: {0}")]
    EmptyInput(String),

    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred in the vector store backend.
    #[error("Vector store error ({backend}): {message}")]
    VectorStoreError {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred while generating a completion.
    #[error("Generation error ({provider}): {message}")]
    GenerationError {
        /// The chat model provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },
}

/// Coarse classification of a [`RagError`], used by callers to decide
/// between aborting, skipping and reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A required setting is absent or invalid.
    ConfigurationMissing,
    /// A single document could not be parsed.
    ExtractionFailure,
    /// No documents, chunks or question were provided.
    EmptyInput,
    /// An embedding, vector store or language model call failed.
    ServiceFailure,
}

impl ErrorKind {
    /// Whether a caller could reasonably try the operation again later.
    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorKind::ServiceFailure)
    }
}

impl RagError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            RagError::MissingConfig { .. } | RagError::ConfigError(_) => {
                ErrorKind::ConfigurationMissing
            }
            RagError::ExtractionError { .. } => ErrorKind::ExtractionFailure,
            RagError::EmptyInput(_) => ErrorKind::EmptyInput,
            RagError::EmbeddingError { .. }
            | RagError::VectorStoreError { .. }
            | RagError::GenerationError { .. } => ErrorKind::ServiceFailure,
        }
    }
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
