//! The values that flow from a PDF file to a cited answer.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Metadata key holding the originating file name.
pub const SOURCE_KEY: &str = "source";

/// Metadata key holding the document type tag.
pub const TYPE_KEY: &str = "type";

/// Metadata key holding the chunk's position within its document.
pub const CHUNK_INDEX_KEY: &str = "chunk_index";

/// The extracted text of one source file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// The file name for PDF documents.
    pub id: String,
    pub text: String,
    /// Copied onto every chunk of the document.
    pub metadata: HashMap<String, String>,
}

impl Document {
    /// Create a document extracted from a PDF file.
    ///
    /// The file name becomes both the document id and its `source` metadata.
    pub fn pdf(file_name: impl Into<String>, text: impl Into<String>) -> Self {
        let file_name = file_name.into();
        let metadata = HashMap::from([
            (SOURCE_KEY.to_string(), file_name.clone()),
            (TYPE_KEY.to_string(), "pdf".to_string()),
        ]);
        Self { id: file_name, text: text.into(), metadata }
    }
}

/// A window of a [`Document`]'s text, the unit that is embedded and indexed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// `{document_id}_{chunk_index}`, stable across re-ingestion.
    pub id: String,
    pub text: String,
    /// Empty until the pipeline embeds the chunk.
    pub embedding: Vec<f32>,
    /// `source`, `type` and `chunk_index`.
    pub metadata: HashMap<String, String>,
    pub document_id: String,
}

impl Chunk {
    /// The originating file name, if recorded.
    pub fn source(&self) -> Option<&str> {
        self.metadata.get(SOURCE_KEY).map(String::as_str).filter(|s| !s.is_empty())
    }
}

/// A chunk returned by similarity search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub chunk: Chunk,
    /// Similarity to the query; results are ordered by it, highest first.
    pub score: f32,
}
