//! PDF discovery and text extraction.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::error::{RagError, Result};

/// List the `.pdf` files directly inside `dir`, sorted by path.
///
/// # Errors
///
/// Returns [`RagError::EmptyInput`] if `dir` does not exist, is not a
/// directory or cannot be read.
pub fn discover_pdf_files(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(RagError::EmptyInput(format!("'{}' folder not found", dir.display())));
    }

    let entries = std::fs::read_dir(dir).map_err(|e| unreadable_folder(dir, &e))?;

    let mut files = entries
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_pdf(path))
        .collect::<Vec<_>>();

    files.sort();
    Ok(files)
}

fn unreadable_folder(dir: &Path, e: &std::io::Error) -> RagError {
    RagError::EmptyInput(format!("cannot read '{}': {e}", dir.display()))
}

fn is_pdf(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

/// The file name used as a document's source identifier.
pub fn source_name(path: &Path) -> String {
    path.file_name().map(|name| name.to_string_lossy().into_owned()).unwrap_or_default()
}

/// Extracts plain text from a document on disk.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Extract the text of the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ExtractionError`] if the file is unreadable,
    /// corrupted, or contains no extractable text.
    async fn extract(&self, path: &Path) -> Result<String>;
}

/// A [`TextExtractor`] for PDF files backed by the `pdf-extract` crate.
///
/// Parsing runs on the blocking thread pool. A parser panic on a malformed
/// file is reported as an extraction error for that file only.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfTextExtractor;

#[async_trait]
impl TextExtractor for PdfTextExtractor {
    async fn extract(&self, path: &Path) -> Result<String> {
        let extraction_error =
            |message: String| RagError::ExtractionError { path: path.to_path_buf(), message };

        let bytes = tokio::fs::read(path).await.map_err(|e| extraction_error(e.to_string()))?;
        let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
            .await
            .map_err(|e| extraction_error(format!("parser aborted: {e}")))?
            .map_err(|e| extraction_error(e.to_string()))?;

        if text.trim().is_empty() {
            return Err(extraction_error("no extractable text".to_string()));
        }

        debug!(file = %path.display(), text_len = text.len(), "extracted pdf text");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn discovers_only_pdf_files_in_sorted_order() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("nested")).unwrap();

        fs::write(root.join("b.pdf"), b"%PDF").unwrap();
        fs::write(root.join("A.PDF"), b"%PDF").unwrap();
        fs::write(root.join("notes.txt"), b"ignore").unwrap();
        fs::write(root.join("nested/c.pdf"), b"%PDF").unwrap();

        let files = discover_pdf_files(root).unwrap();
        let names: Vec<String> = files.iter().map(|p| source_name(p)).collect();
        assert_eq!(names, vec!["A.PDF", "b.pdf"]);
    }

    #[test]
    fn missing_folder_is_empty_input() {
        let temp = tempfile::tempdir().unwrap();
        let err = discover_pdf_files(temp.path().join("docs")).unwrap_err();
        assert!(matches!(err, RagError::EmptyInput(_)));
    }

    #[test]
    fn unreadable_folder_is_an_input_problem() {
        let denied = std::io::Error::from(std::io::ErrorKind::PermissionDenied);
        let err = unreadable_folder(Path::new("docs"), &denied);

        assert_eq!(err.kind(), crate::ErrorKind::EmptyInput);
        assert!(!err.kind().is_retryable());
        assert!(err.to_string().contains("cannot read 'docs'"));
    }

    #[tokio::test]
    async fn corrupted_pdf_is_an_extraction_failure() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("broken.pdf");
        fs::write(&path, b"this is not a pdf").unwrap();

        let err = PdfTextExtractor.extract(&path).await.unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::ExtractionFailure);
    }

    #[tokio::test]
    async fn unreadable_file_is_an_extraction_failure() {
        let temp = tempfile::tempdir().unwrap();
        let err = PdfTextExtractor.extract(&temp.path().join("missing.pdf")).await.unwrap_err();
        assert!(matches!(err, RagError::ExtractionError { .. }));
    }
}
