//! Suggested questions shown by the chat UI.

use std::path::Path;

use jarvis_rag::discover_pdf_files;
use tracing::debug;

/// Suggestions used when no documents are available.
pub const FALLBACK_QUESTIONS: [&str; 3] =
    ["What can you help me with?", "Tell me about your capabilities", "How do you work?"];

/// Suggest questions based on the PDF files in `docs_dir`.
///
/// When the folder holds PDFs the first question names the first document by
/// its humanised file stem. Otherwise, including when the folder cannot be
/// read, the generic [`FALLBACK_QUESTIONS`] are returned. The result is never
/// empty.
///
/// ```rust
/// let questions = jarvis_server::example_questions("does/not/exist");
/// assert_eq!(questions[0], "What can you help me with?");
/// ```
pub fn example_questions(docs_dir: impl AsRef<Path>) -> Vec<String> {
    let files = match discover_pdf_files(docs_dir.as_ref()) {
        Ok(files) => files,
        Err(e) => {
            debug!(error = %e, "no documents for example questions");
            Vec::new()
        }
    };

    let first_stem = files.first().and_then(|path| path.file_stem());
    let Some(title) = first_stem.map(|stem| humanize(&stem.to_string_lossy())) else {
        return FALLBACK_QUESTIONS.iter().map(|q| q.to_string()).collect();
    };

    vec![
        format!("What is {title} about?"),
        "Summarize the key points".to_string(),
        "Show me code examples from the document".to_string(),
    ]
}

fn humanize(stem: &str) -> String {
    stem.replace(['-', '_'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_the_first_document() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::write(temp.path().join("zeta.pdf"), b"%PDF").unwrap();
        std::fs::write(temp.path().join("my_report-v2.pdf"), b"%PDF").unwrap();

        let questions = example_questions(temp.path());
        assert_eq!(questions.len(), 3);
        assert_eq!(questions[0], "What is my report v2 about?");
        assert_eq!(questions[1], "Summarize the key points");
    }

    #[test]
    fn falls_back_without_pdfs() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::write(temp.path().join("notes.txt"), b"text").unwrap();

        assert_eq!(example_questions(temp.path()), FALLBACK_QUESTIONS);
        assert_eq!(example_questions(temp.path().join("missing")), FALLBACK_QUESTIONS);
    }

    #[test]
    fn humanize_replaces_dashes_and_underscores() {
        assert_eq!(humanize("q3_sales-summary"), "q3 sales summary");
    }
}
