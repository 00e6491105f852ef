//! Retrieval-augmented question answering.
//!
//! [`Assistant::ask`] retrieves once per question and derives both the
//! grounding context and the cited sources from that single result.

use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info};

use crate::document::SearchResult;
use crate::error::{RagError, Result};
use crate::llm::{ChatModel, CompletionRequest};
use crate::pipeline::RagPipeline;

/// Instruction template sent to the chat model. `{context}` and `{question}`
/// are substituted by [`render_prompt`].
pub const PROMPT_TEMPLATE: &str = "You are Jarvis, a helpful personal AI assistant.
You answer questions using the document content provided below.

INSTRUCTIONS:
- Use ONLY the provided context to answer the question
- If the answer isn't in the context, say \"I don't have that information in the provided documents\"
- Be concise and stick to the facts in the documents
- Cite the relevant sources when helpful

Context: {context}

Question: {question}

Answer:";

/// Label used when a retrieved chunk has no source metadata.
const UNKNOWN_SOURCE_LABEL: &str = "Unknown source";

/// Source identifier cited when a retrieved chunk has no source metadata.
const UNKNOWN_SOURCE: &str = "Unknown";

/// One question/answer exchange. Nothing is kept after it is returned.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Turn {
    /// The question as asked.
    pub question: String,
    /// The context assembled from the retrieved chunks.
    pub context: String,
    /// The model's completion, verbatim.
    pub answer: String,
    /// Distinct sources of the retrieved chunks, in ranking order.
    pub sources: Vec<String>,
}

/// Answers questions from retrieved document context.
///
/// # Example
///
/// ```rust,ignore
/// use jarvis_rag::Assistant;
///
/// let assistant = Assistant::new(Arc::new(pipeline), Arc::new(chat_model));
/// let turn = assistant.ask("What does chapter two cover?").await?;
/// println!("{} ({:?})", turn.answer, turn.sources);
/// ```
pub struct Assistant {
    pipeline: Arc<RagPipeline>,
    model: Arc<dyn ChatModel>,
}

impl Assistant {
    /// Create an assistant over a retrieval pipeline and a chat model.
    pub fn new(pipeline: Arc<RagPipeline>, model: Arc<dyn ChatModel>) -> Self {
        Self { pipeline, model }
    }

    /// The chat model's identifier.
    pub fn model_name(&self) -> &str {
        self.model.model_name()
    }

    /// The name of the index questions are answered from.
    pub fn index_name(&self) -> &str {
        self.pipeline.vector_store().index_name()
    }

    /// Answer `question` from the indexed documents.
    ///
    /// # Errors
    ///
    /// - [`RagError::EmptyInput`] if the question is empty or whitespace,
    ///   before any outbound call.
    /// - The embedding, vector store or generation error of the failing
    ///   call. Nothing is retried.
    pub async fn ask(&self, question: &str) -> Result<Turn> {
        if question.trim().is_empty() {
            return Err(RagError::EmptyInput("No message provided".to_string()));
        }

        let results = self.pipeline.retrieve(question).await?;
        let context = format_context(&results);
        let sources = collect_sources(&results, self.pipeline.config().max_sources);

        let request = CompletionRequest::deterministic(render_prompt(&context, question));
        let answer = self.model.complete(&request).await.inspect_err(|e| {
            error!(model = self.model.model_name(), error = %e, "generation failed");
        })?;

        info!(retrieved = results.len(), source_count = sources.len(), "answered question");
        Ok(Turn { question: question.to_string(), context, answer, sources })
    }
}

/// Render retrieved chunks as labelled blocks in ranking order, separated
/// by blank lines.
pub fn format_context(results: &[SearchResult]) -> String {
    results
        .iter()
        .enumerate()
        .map(|(i, result)| {
            let source = result.chunk.source().unwrap_or(UNKNOWN_SOURCE_LABEL);
            format!("[Source {}: {source}]\n{}", i + 1, result.chunk.text.trim())
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Distinct sources of `results`, first occurrence wins, at most `max`.
pub fn collect_sources(results: &[SearchResult], max: usize) -> Vec<String> {
    let mut sources: Vec<String> = Vec::new();
    for result in results.iter().take(max) {
        let source = result.chunk.source().unwrap_or(UNKNOWN_SOURCE);
        if !sources.iter().any(|s| s == source) {
            sources.push(source.to_string());
        }
    }
    sources
}

/// Fill [`PROMPT_TEMPLATE`] with the context and question.
///
/// Substitution is a single pass, so placeholders occurring inside the
/// context or question are left as they are.
pub fn render_prompt(context: &str, question: &str) -> String {
    let (head, rest) = PROMPT_TEMPLATE.split_once("{context}").unwrap_or((PROMPT_TEMPLATE, ""));
    let (middle, tail) = rest.split_once("{question}").unwrap_or((rest, ""));
    [head, context, middle, question, tail].concat()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::document::Chunk;

    fn result(source: Option<&str>, text: &str, score: f32) -> SearchResult {
        let metadata = source
            .map(|s| HashMap::from([("source".to_string(), s.to_string())]))
            .unwrap_or_default();
        SearchResult {
            chunk: Chunk {
                id: format!("{text}_0"),
                text: text.to_string(),
                embedding: Vec::new(),
                metadata,
                document_id: source.unwrap_or_default().to_string(),
            },
            score,
        }
    }

    #[test]
    fn context_is_labelled_in_ranking_order() {
        let results = vec![result(Some("a.pdf"), "  first\n", 0.9), result(None, "second", 0.5)];
        assert_eq!(
            format_context(&results),
            "[Source 1: a.pdf]\nfirst\n\n[Source 2: Unknown source]\nsecond"
        );
    }

    #[test]
    fn empty_results_give_empty_context() {
        assert_eq!(format_context(&[]), "");
        assert!(collect_sources(&[], 3).is_empty());
    }

    #[test]
    fn sources_are_deduplicated_in_first_occurrence_order() {
        let results = vec![
            result(Some("b.pdf"), "1", 0.9),
            result(Some("a.pdf"), "2", 0.8),
            result(Some("b.pdf"), "3", 0.7),
        ];
        assert_eq!(collect_sources(&results, 3), vec!["b.pdf", "a.pdf"]);
    }

    #[test]
    fn sources_only_consider_the_top_results() {
        let results = vec![
            result(Some("a.pdf"), "1", 0.9),
            result(Some("b.pdf"), "2", 0.8),
            result(Some("c.pdf"), "3", 0.7),
            result(Some("d.pdf"), "4", 0.6),
        ];
        assert_eq!(collect_sources(&results, 3), vec!["a.pdf", "b.pdf", "c.pdf"]);
        assert_eq!(collect_sources(&results[..1], 3), vec!["a.pdf"]);
    }

    #[test]
    fn missing_source_is_cited_as_unknown() {
        assert_eq!(collect_sources(&[result(None, "x", 0.1)], 3), vec!["Unknown"]);
    }

    #[test]
    fn prompt_contains_context_and_question() {
        let prompt = render_prompt("[Source 1: a.pdf]\nfacts {question}", "What {context}?");
        assert!(prompt.contains("Context: [Source 1: a.pdf]\nfacts {question}\n"));
        assert!(prompt.contains("Question: What {context}?"));
        assert!(prompt.contains("Use ONLY the provided context"));
        assert!(prompt.ends_with("Answer:"));
    }
}
