//! Property tests for in-memory vector store search ordering.

use std::collections::HashMap;

use jarvis_rag::document::Chunk;
use jarvis_rag::inmemory::InMemoryVectorStore;
use jarvis_rag::vectorstore::VectorStore;
use proptest::prelude::*;

/// Generate a non-zero L2-normalized embedding of the given dimension.
fn arb_normalized_embedding(dim: usize) -> impl Strategy<Value = Vec<f32>> {
    proptest::collection::vec(-1.0f32..1.0f32, dim).prop_filter_map("non-zero embedding", |mut v| {
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm < 1e-8 {
            return None;
        }
        for val in &mut v {
            *val /= norm;
        }
        Some(v)
    })
}

/// Generate a chunk of `report.pdf` with a normalized embedding.
fn arb_chunk(dim: usize) -> impl Strategy<Value = Chunk> {
    (0usize..64, "[a-z ]{5,30}", arb_normalized_embedding(dim)).prop_map(
        |(index, text, embedding)| Chunk {
            id: format!("report.pdf_{index}"),
            text,
            embedding,
            metadata: HashMap::from([("source".to_string(), "report.pdf".to_string())]),
            document_id: "report.pdf".to_string(),
        },
    )
}

mod prop_inmemory_search_ordering {
    use super::*;

    const DIM: usize = 16;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Results come back in descending score order and never exceed
        /// `top_k` or the number of stored chunks.
        #[test]
        fn results_ordered_descending_and_bounded_by_top_k(
            chunks in proptest::collection::vec(arb_chunk(DIM), 1..20),
            query in arb_normalized_embedding(DIM),
            top_k in 1usize..25,
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let (results, unique_count) = rt.block_on(async {
                let store = InMemoryVectorStore::new("test");
                store.upsert(&chunks).await.unwrap();

                // Repeated ids overwrite, so count what the store actually holds.
                let count = store.len().await;
                let results = store.search(&query, top_k).await.unwrap();
                (results, count)
            });

            prop_assert!(results.len() <= top_k);
            prop_assert_eq!(results.len(), top_k.min(unique_count));

            for window in results.windows(2) {
                prop_assert!(
                    window[0].score >= window[1].score,
                    "results not in descending order: {} < {}",
                    window[0].score,
                    window[1].score,
                );
            }
        }
    }
}
