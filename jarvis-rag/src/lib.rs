//! Retrieval-augmented question answering over a folder of PDF files.
//!
//! This crate provides:
//! - PDF discovery and text extraction
//! - Character chunking with overlap
//! - Embedding through OpenAI and storage in a Pinecone index
//! - An [`Assistant`] that answers questions from retrieved chunks
//!
//! Every external service sits behind a trait ([`EmbeddingProvider`],
//! [`VectorStore`], [`ChatModel`], [`TextExtractor`]) so the pipeline can be
//! exercised with in-process fakes.

pub mod assistant;
mod batch;
pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod inmemory;
pub mod llm;
pub mod loader;
pub mod openai;
pub mod pinecone;
pub mod pipeline;
pub mod settings;
pub mod vectorstore;

pub use assistant::{Assistant, PROMPT_TEMPLATE, Turn};
pub use chunking::{CharacterChunker, Chunker, Splits};
pub use config::{RagConfig, RagConfigBuilder};
pub use document::{Chunk, Document, SearchResult};
pub use embedding::EmbeddingProvider;
pub use error::{ErrorKind, RagError, Result};
pub use inmemory::InMemoryVectorStore;
pub use llm::{ChatModel, CompletionRequest};
pub use loader::{PdfTextExtractor, TextExtractor, discover_pdf_files, source_name};
pub use openai::{OpenAIChatModel, OpenAIEmbeddingProvider};
pub use pinecone::PineconeVectorStore;
pub use pipeline::{FileFailure, IngestReport, RagPipeline, RagPipelineBuilder};
pub use settings::Settings;
pub use vectorstore::VectorStore;
