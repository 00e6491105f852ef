//! Property tests for character chunking.

use jarvis_rag::chunking::{CharacterChunker, Chunker};
use jarvis_rag::document::Document;
use proptest::prelude::*;

/// Text with frequent line breaks, plus some non-ASCII characters.
fn arb_text() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => "[a-z \n]{0,400}",
        1 => "[a-zé€😀\n]{0,200}",
    ]
}

fn arb_chunker() -> impl Strategy<Value = CharacterChunker> {
    (1usize..60, 0usize..60, prop_oneof![Just("\n"), Just(" "), Just("")])
        .prop_map(|(size, overlap, separator)| CharacterChunker::new(size, overlap, separator))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// No chunk is longer than the configured size.
    #[test]
    fn chunks_never_exceed_chunk_size(chunker in arb_chunker(), text in arb_text()) {
        for chunk in chunker.split(&text) {
            prop_assert!(!chunk.is_empty());
            prop_assert!(chunk.chars().count() <= chunker.chunk_size());
        }
    }

    /// Consecutive chunks share exactly `chunk_overlap` characters.
    #[test]
    fn consecutive_chunks_overlap_exactly(chunker in arb_chunker(), text in arb_text()) {
        let overlap = chunker.chunk_overlap();
        let chunks: Vec<&str> = chunker.split(&text).collect();

        for pair in chunks.windows(2) {
            let previous: Vec<char> = pair[0].chars().collect();
            let tail: String = previous[previous.len() - overlap..].iter().collect();
            let head: String = pair[1].chars().take(overlap).collect();
            prop_assert_eq!(tail, head);
        }
    }

    /// Dropping the overlap from every chunk after the first and joining the
    /// rest gives back the original text.
    #[test]
    fn chunks_reconstruct_the_text(chunker in arb_chunker(), text in arb_text()) {
        let overlap = chunker.chunk_overlap();
        let mut rebuilt = String::new();
        for (i, chunk) in chunker.split(&text).enumerate() {
            if i == 0 {
                rebuilt.push_str(chunk);
            } else {
                rebuilt.extend(chunk.chars().skip(overlap));
            }
        }
        prop_assert_eq!(rebuilt, text);
    }

    /// Text no longer than the chunk size is returned as a single chunk.
    #[test]
    fn short_text_is_one_chunk(text in "[a-z \n]{1,200}", slack in 0usize..50) {
        let size = text.chars().count() + slack;
        let chunker = CharacterChunker::new(size, size / 5, "\n");
        let chunks: Vec<&str> = chunker.split(&text).collect();
        prop_assert_eq!(chunks, vec![text.as_str()]);
    }

    /// Chunk ids and indices follow document order.
    #[test]
    fn chunk_ids_follow_document_order(chunker in arb_chunker(), text in arb_text()) {
        let document = Document::pdf("manual.pdf", text.clone());
        let chunks = chunker.chunk(&document);

        prop_assert_eq!(chunks.len(), chunker.split(&text).count());
        for (i, chunk) in chunks.iter().enumerate() {
            prop_assert_eq!(&chunk.id, &format!("manual.pdf_{i}"));
            prop_assert_eq!(chunk.metadata.get("chunk_index"), Some(&i.to_string()));
        }
    }
}

#[test]
fn default_chunker_uses_thousand_character_windows() {
    let chunker = CharacterChunker::default();
    assert_eq!(chunker.chunk_size(), 1000);
    assert_eq!(chunker.chunk_overlap(), 200);

    let line = "x".repeat(99) + "\n";
    let text = line.repeat(25);
    let chunks: Vec<&str> = chunker.split(&text).collect();

    assert_eq!(chunks.len(), 3);
    assert_eq!(chunks[0].chars().count(), 1000);
    assert!(chunks[0].ends_with('\n'));
}
