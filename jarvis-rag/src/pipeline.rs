//! Ingestion and retrieval pipeline.
//!
//! The [`RagPipeline`] composes an [`EmbeddingProvider`], a [`VectorStore`],
//! a [`Chunker`] and a [`TextExtractor`]. Ingestion runs
//! extract → chunk → embed → upsert; retrieval runs embed → search → filter.
//!
//! # Example
//!
//! ```rust,ignore
//! use jarvis_rag::{RagPipeline, RagConfig, InMemoryVectorStore};
//!
//! let pipeline = RagPipeline::builder()
//!     .config(RagConfig::default())
//!     .embedding_provider(Arc::new(my_embedder))
//!     .vector_store(Arc::new(InMemoryVectorStore::new("docs")))
//!     .build()?;
//!
//! let report = pipeline.ingest_folder("docs").await?;
//! let results = pipeline.retrieve("what is covered?").await?;
//! ```

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::chunking::{CharacterChunker, Chunker};
use crate::config::RagConfig;
use crate::document::{Chunk, Document, SearchResult};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::loader::{PdfTextExtractor, TextExtractor, discover_pdf_files, source_name};
use crate::vectorstore::VectorStore;

/// A file that was skipped because its text could not be extracted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileFailure {
    /// The file name.
    pub file: String,
    /// Why extraction failed.
    pub message: String,
}

/// Outcome of a successful [`RagPipeline::ingest_folder`] run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestReport {
    /// The index the chunks were written to.
    pub index_name: String,
    /// Number of PDF files discovered.
    pub files_found: usize,
    /// Files whose chunks were stored, in processing order.
    pub processed: Vec<String>,
    /// Files skipped because extraction failed.
    pub failures: Vec<FileFailure>,
    /// Total number of chunks embedded and upserted.
    pub chunk_count: usize,
}

/// The ingestion and retrieval orchestrator.
///
/// Construct one via [`RagPipeline::builder()`].
pub struct RagPipeline {
    config: RagConfig,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    vector_store: Arc<dyn VectorStore>,
    chunker: Arc<dyn Chunker>,
    extractor: Arc<dyn TextExtractor>,
}

impl RagPipeline {
    /// Create a new [`RagPipelineBuilder`].
    pub fn builder() -> RagPipelineBuilder {
        RagPipelineBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Return a reference to the vector store.
    pub fn vector_store(&self) -> &Arc<dyn VectorStore> {
        &self.vector_store
    }

    /// Ingest a single in-memory document: chunk → embed → store.
    ///
    /// Returns the chunks that were stored (with embeddings attached).
    ///
    /// # Errors
    ///
    /// Returns [`RagError::EmptyInput`] if the document produces no chunks,
    /// or the embedding / vector store error if either call fails.
    pub async fn ingest(&self, document: &Document) -> Result<Vec<Chunk>> {
        let chunks = self.chunker.chunk(document);
        if chunks.is_empty() {
            return Err(RagError::EmptyInput(format!("document '{}' has no text", document.id)));
        }
        self.embed_and_store(chunks).await
    }

    /// Ingest every PDF file directly inside `dir`.
    ///
    /// Files whose text cannot be extracted are logged, recorded in the
    /// report and skipped. All chunks of the remaining files are embedded in
    /// one batch and upserted in one call.
    ///
    /// # Errors
    ///
    /// - [`RagError::EmptyInput`] if the folder is missing, holds no PDF
    ///   files, or no file yielded any chunk. Nothing is embedded or stored;
    ///   the message lists every file that failed to extract.
    /// - The embedding or vector store error if either call fails.
    pub async fn ingest_folder(&self, dir: impl AsRef<Path>) -> Result<IngestReport> {
        let dir = dir.as_ref();
        let files = discover_pdf_files(dir)?;
        if files.is_empty() {
            return Err(RagError::EmptyInput(format!(
                "no PDF files found in '{}'",
                dir.display()
            )));
        }

        info!(folder = %dir.display(), file_count = files.len(), "starting ingestion");

        let mut processed = Vec::new();
        let mut failures = Vec::new();
        let mut chunks = Vec::new();

        for path in &files {
            let file = source_name(path);
            match self.extractor.extract(path).await {
                Ok(text) => {
                    let document_chunks = self.chunker.chunk(&Document::pdf(file.clone(), text));
                    info!(file = %file, chunk_count = document_chunks.len(), "chunked document");
                    chunks.extend(document_chunks);
                    processed.push(file);
                }
                Err(e) => {
                    warn!(file = %file, error = %e, "skipping document");
                    failures.push(FileFailure { file, message: e.to_string() });
                }
            }
        }

        if chunks.is_empty() {
            let details: String = failures
                .iter()
                .map(|failure| format!("\n  failed: {} ({})", failure.file, failure.message))
                .collect();
            return Err(RagError::EmptyInput(format!(
                "no document chunks produced ({} of {} files failed){details}",
                failures.len(),
                files.len()
            )));
        }

        let stored = self.embed_and_store(chunks).await?;

        let report = IngestReport {
            index_name: self.vector_store.index_name().to_string(),
            files_found: files.len(),
            processed,
            failures,
            chunk_count: stored.len(),
        };
        info!(
            index = %report.index_name,
            chunk_count = report.chunk_count,
            failed_files = report.failures.len(),
            "ingestion completed"
        );
        Ok(report)
    }

    async fn embed_and_store(&self, mut chunks: Vec<Chunk>) -> Result<Vec<Chunk>> {
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();

        let embeddings = self.embedding_provider.embed_batch(&texts).await.inspect_err(|e| {
            error!(
                model = self.embedding_provider.model_name(),
                chunk_count = chunks.len(),
                error = %e,
                "embedding failed during ingestion"
            );
        })?;

        if embeddings.len() != chunks.len() {
            return Err(RagError::EmbeddingError {
                provider: self.embedding_provider.model_name().to_string(),
                message: format!(
                    "received {} embeddings for {} chunks",
                    embeddings.len(),
                    chunks.len()
                ),
            });
        }

        for (chunk, embedding) in chunks.iter_mut().zip(embeddings) {
            chunk.embedding = embedding;
        }

        self.vector_store.upsert(&chunks).await.inspect_err(|e| {
            error!(index = self.vector_store.index_name(), error = %e, "upsert failed during ingestion");
        })?;

        Ok(chunks)
    }

    /// Retrieve the chunks nearest to `query`: embed → search → filter.
    ///
    /// Returns at most `top_k` results ordered by descending similarity.
    /// Results below the configured `similarity_threshold`, if any, are dropped.
    ///
    /// # Errors
    ///
    /// Returns the embedding or vector store error if either call fails.
    pub async fn retrieve(&self, query: &str) -> Result<Vec<SearchResult>> {
        let query_embedding = self.embedding_provider.embed(query).await.inspect_err(|e| {
            error!(error = %e, "embedding failed during retrieval");
        })?;

        let results =
            self.vector_store.search(&query_embedding, self.config.top_k).await.inspect_err(|e| {
                error!(index = self.vector_store.index_name(), error = %e, "vector store search failed");
            })?;

        let filtered: Vec<SearchResult> = match self.config.similarity_threshold {
            Some(threshold) => results.into_iter().filter(|r| r.score >= threshold).collect(),
            None => results,
        };

        info!(result_count = filtered.len(), "retrieval completed");
        Ok(filtered)
    }
}

/// Builder for constructing a [`RagPipeline`].
///
/// The embedding provider and vector store are required. The chunker
/// defaults to a [`CharacterChunker`] built from the config, and the
/// extractor to [`PdfTextExtractor`].
#[derive(Default)]
pub struct RagPipelineBuilder {
    config: Option<RagConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    vector_store: Option<Arc<dyn VectorStore>>,
    chunker: Option<Arc<dyn Chunker>>,
    extractor: Option<Arc<dyn TextExtractor>>,
}

impl RagPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the vector store backend.
    pub fn vector_store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.vector_store = Some(store);
        self
    }

    /// Set the document chunker.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Set the text extractor used by [`RagPipeline::ingest_folder`].
    pub fn extractor(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    /// Build the [`RagPipeline`], validating that all required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if a required field is missing.
    pub fn build(self) -> Result<RagPipeline> {
        let config = self.config.unwrap_or_default();
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::ConfigError("embedding_provider is required".to_string()))?;
        let vector_store = self
            .vector_store
            .ok_or_else(|| RagError::ConfigError("vector_store is required".to_string()))?;
        let chunker = self
            .chunker
            .unwrap_or_else(|| Arc::new(CharacterChunker::from_config(&config)));
        let extractor = self.extractor.unwrap_or_else(|| Arc::new(PdfTextExtractor));

        Ok(RagPipeline { config, embedding_provider, vector_store, chunker, extractor })
    }
}
