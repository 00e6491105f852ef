//! Document chunking.
//!
//! [`CharacterChunker`] splits text into windows of at most `chunk_size`
//! characters, preferring to end a window just after a separator, and starts
//! every following window `chunk_overlap` characters before the previous one
//! ended. Dropping the leading overlap of every chunk but the first and
//! concatenating the rest reproduces the input exactly.

use crate::config::RagConfig;
use crate::document::{CHUNK_INDEX_KEY, Chunk, Document};

/// A strategy for splitting documents into chunks.
///
/// Implementations produce [`Chunk`]s with text and metadata but no embeddings.
/// Embeddings are attached later by the pipeline.
pub trait Chunker: Send + Sync {
    /// Split a document into chunks.
    ///
    /// Returns an empty `Vec` if the document has empty text.
    /// Each returned chunk has an empty embedding vector.
    fn chunk(&self, document: &Document) -> Vec<Chunk>;
}

/// Splits text by character count with a preferred separator and a fixed overlap.
///
/// Lengths are counted in `char`s, so a chunk never splits a UTF-8 code point.
/// Chunk IDs are generated as `{document_id}_{chunk_index}`. Each chunk inherits
/// the parent document's metadata plus a `chunk_index` field.
///
/// # Example
///
/// ```rust
/// use jarvis_rag::CharacterChunker;
///
/// let chunker = CharacterChunker::new(10, 3, "\n");
/// let chunks: Vec<&str> = chunker.split("alpha\nbeta\ngamma").collect();
/// assert_eq!(chunks, vec!["alpha\n", "ha\nbeta\n", "ta\ngamma"]);
/// ```
#[derive(Debug, Clone)]
pub struct CharacterChunker {
    chunk_size: usize,
    chunk_overlap: usize,
    separator: String,
}

impl CharacterChunker {
    /// Create a new `CharacterChunker`.
    ///
    /// `chunk_size` is raised to at least 1 and `chunk_overlap` is lowered to
    /// at most `chunk_size - 1`, so any combination of arguments yields a
    /// chunker that terminates.
    ///
    /// # Arguments
    ///
    /// * `chunk_size`: maximum number of characters per chunk
    /// * `chunk_overlap`: number of characters shared by consecutive chunks
    /// * `separator`: preferred boundary; an empty separator always cuts at `chunk_size`
    pub fn new(chunk_size: usize, chunk_overlap: usize, separator: impl Into<String>) -> Self {
        let chunk_size = chunk_size.max(1);
        let chunk_overlap = chunk_overlap.min(chunk_size - 1);
        Self { chunk_size, chunk_overlap, separator: separator.into() }
    }

    /// Create a chunker from the chunking fields of a [`RagConfig`].
    pub fn from_config(config: &RagConfig) -> Self {
        Self::new(config.chunk_size, config.chunk_overlap, config.separator.clone())
    }

    /// Maximum number of characters per chunk.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Number of characters shared by consecutive chunks.
    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Lazily split `text` into chunks in document order.
    pub fn split<'a>(&'a self, text: &'a str) -> Splits<'a> {
        let boundaries =
            text.char_indices().map(|(i, _)| i).chain(std::iter::once(text.len())).collect();
        Splits { chunker: self, text, boundaries, start: 0, finished: false }
    }
}

impl Default for CharacterChunker {
    fn default() -> Self {
        Self::from_config(&RagConfig::default())
    }
}

/// Iterator over the chunks of one text, returned by [`CharacterChunker::split`].
#[derive(Debug)]
pub struct Splits<'a> {
    chunker: &'a CharacterChunker,
    text: &'a str,
    /// Byte offset of every char, followed by `text.len()`.
    boundaries: Vec<usize>,
    /// Char index where the next chunk begins.
    start: usize,
    finished: bool,
}

impl Splits<'_> {
    fn char_count(&self) -> usize {
        self.boundaries.len() - 1
    }

    /// Char index just past the last separator inside `[start, limit)`, if
    /// cutting there still moves the next chunk's start forward.
    fn separator_end(&self, limit: usize) -> Option<usize> {
        let separator = self.chunker.separator.as_str();
        if separator.is_empty() {
            return None;
        }

        let window_start = self.boundaries[self.start];
        let window = &self.text[window_start..self.boundaries[limit]];
        let byte_end = window_start + window.rfind(separator)? + separator.len();
        let end = self.boundaries.binary_search(&byte_end).ok()?;

        (end > self.start + self.chunker.chunk_overlap).then_some(end)
    }
}

impl<'a> Iterator for Splits<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        if self.finished || self.start >= self.char_count() {
            self.finished = true;
            return None;
        }

        if self.char_count() - self.start <= self.chunker.chunk_size {
            self.finished = true;
            return Some(&self.text[self.boundaries[self.start]..]);
        }

        let limit = self.start + self.chunker.chunk_size;
        let end = self.separator_end(limit).unwrap_or(limit);
        let chunk = &self.text[self.boundaries[self.start]..self.boundaries[end]];
        self.start = end - self.chunker.chunk_overlap;
        Some(chunk)
    }
}

impl std::iter::FusedIterator for Splits<'_> {}

impl Chunker for CharacterChunker {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        self.split(&document.text)
            .enumerate()
            .map(|(i, text)| {
                let mut metadata = document.metadata.clone();
                metadata.insert(CHUNK_INDEX_KEY.to_string(), i.to_string());
                Chunk {
                    id: format!("{}_{i}", document.id),
                    text: text.to_string(),
                    embedding: Vec::new(),
                    metadata,
                    document_id: document.id.clone(),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(chunker: &CharacterChunker, text: &str) -> Vec<String> {
        chunker.split(text).map(str::to_string).collect()
    }

    #[test]
    fn empty_text_yields_no_chunks() {
        let chunker = CharacterChunker::new(10, 2, "\n");
        assert!(split(&chunker, "").is_empty());
    }

    #[test]
    fn short_text_is_a_single_chunk() {
        let chunker = CharacterChunker::new(100, 20, "\n");
        assert_eq!(split(&chunker, "one line\nanother"), vec!["one line\nanother"]);
    }

    #[test]
    fn text_of_exactly_chunk_size_is_a_single_chunk() {
        let chunker = CharacterChunker::new(5, 1, "\n");
        assert_eq!(split(&chunker, "abcde"), vec!["abcde"]);
    }

    #[test]
    fn prefers_the_last_separator_inside_the_window() {
        let chunker = CharacterChunker::new(12, 2, "\n");
        let chunks = split(&chunker, "aaa\nbbb\ncccc\ndddd");
        assert_eq!(chunks[0], "aaa\nbbb\n");
        assert!(chunks[1].starts_with("b\ncccc"));
    }

    #[test]
    fn unsplittable_run_is_cut_at_the_hard_cap() {
        let chunker = CharacterChunker::new(4, 1, "\n");
        let chunks = split(&chunker, "abcdefghij");
        assert_eq!(chunks, vec!["abcd", "defg", "ghij"]);
        assert!(chunks.iter().all(|c| c.chars().count() <= 4));
    }

    #[test]
    fn separator_too_close_to_start_is_ignored() {
        // Cutting after "a\n" would not move past the 3-character overlap.
        let chunker = CharacterChunker::new(6, 3, "\n");
        let chunks = split(&chunker, "a\nbcdefgh");
        assert_eq!(chunks[0], "a\nbcde");
    }

    #[test]
    fn multibyte_text_is_split_on_char_boundaries() {
        let chunker = CharacterChunker::new(3, 1, "");
        let chunks = split(&chunker, "héllo wörld");
        assert!(chunks.iter().all(|c| c.chars().count() <= 3));
        assert_eq!(chunks[0], "hél");
        assert_eq!(chunks[1], "llo");
    }

    #[test]
    fn degenerate_parameters_are_clamped() {
        let chunker = CharacterChunker::new(0, 10, "\n");
        assert_eq!(chunker.chunk_size(), 1);
        assert_eq!(chunker.chunk_overlap(), 0);
        assert_eq!(split(&chunker, "abc"), vec!["a", "b", "c"]);
    }

    #[test]
    fn iterator_is_fused() {
        let chunker = CharacterChunker::new(4, 0, "");
        let mut splits = chunker.split("abcdef");
        assert_eq!(splits.next(), Some("abcd"));
        assert_eq!(splits.next(), Some("ef"));
        assert_eq!(splits.next(), None);
        assert_eq!(splits.next(), None);
    }

    #[test]
    fn chunks_carry_document_metadata_and_index() {
        let chunker = CharacterChunker::new(5, 1, "\n");
        let document = Document::pdf("guide.pdf", "abcdefghij");
        let chunks = chunker.chunk(&document);

        assert_eq!(chunks.len(), 3);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.id, format!("guide.pdf_{i}"));
            assert_eq!(chunk.source(), Some("guide.pdf"));
            assert_eq!(chunk.metadata.get("type").map(String::as_str), Some("pdf"));
            assert_eq!(chunk.metadata.get("chunk_index"), Some(&i.to_string()));
            assert!(chunk.embedding.is_empty());
            assert_eq!(chunk.document_id, "guide.pdf");
        }
    }
}
