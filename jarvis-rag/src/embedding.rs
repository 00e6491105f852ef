//! Turning chunk text and questions into vectors.

use async_trait::async_trait;

use crate::error::Result;

/// A hosted or local embedding model.
///
/// Ingestion embeds every chunk of a run through one
/// [`embed_batch`](EmbeddingProvider::embed_batch) call; answering a question
/// embeds it once through [`embed`](EmbeddingProvider::embed). Both must use
/// the same model so that question and chunk vectors are comparable.
///
/// ```rust,ignore
/// let vector = provider.embed("What is the refund policy?").await?;
/// assert_eq!(vector.len(), provider.dimensions());
/// ```
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Identifier of the embedding model, reported in logs and errors.
    fn model_name(&self) -> &str;

    /// Length of the vectors this provider produces.
    fn dimensions(&self) -> usize;

    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed `texts`, returning one vector per text in input order.
    ///
    /// Falls back to one [`embed`](EmbeddingProvider::embed) call per text.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text).await?);
        }
        Ok(vectors)
    }
}
