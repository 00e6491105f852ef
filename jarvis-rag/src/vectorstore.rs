//! Vector store trait for storing and searching vector embeddings.

use async_trait::async_trait;

use crate::document::{Chunk, SearchResult};
use crate::error::Result;

/// A handle to one named vector index supporting upsert and similarity search.
///
/// The ingestion pipeline is the only writer; the query path only searches.
///
/// # Example
///
/// ```rust,ignore
/// use jarvis_rag::{InMemoryVectorStore, VectorStore};
///
/// let store = InMemoryVectorStore::new("docs");
/// store.upsert(&chunks).await?;
/// let results = store.search(&query_embedding, 3).await?;
/// ```
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// The name of the index this store reads and writes.
    fn index_name(&self) -> &str;

    /// Upsert chunks into the index. Chunks must have embeddings set.
    async fn upsert(&self, chunks: &[Chunk]) -> Result<()>;

    /// Search for the `top_k` most similar chunks to the given embedding.
    ///
    /// Returns results ordered by descending similarity score.
    async fn search(&self, embedding: &[f32], top_k: usize) -> Result<Vec<SearchResult>>;
}
