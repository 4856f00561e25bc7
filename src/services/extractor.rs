//! PDF text extraction.

use std::path::{Path, PathBuf};

use crate::error::ExtractError;

/// Extract every page's text, joined by single spaces.
///
/// Pages without a text layer contribute empty strings. Runs on the blocking pool;
/// a panic inside the PDF library is reported as [`ExtractError::Aborted`].
pub async fn extract_text(path: &Path) -> Result<String, ExtractError> {
    let path: PathBuf = path.to_path_buf();
    tokio::task::spawn_blocking(move || extract_text_blocking(&path))
        .await
        .map_err(|e| ExtractError::Aborted(e.to_string()))?
}

fn extract_text_blocking(path: &Path) -> Result<String, ExtractError> {
    let pages = pdf_extract::extract_text_by_pages(path)
        .map_err(|e| ExtractError::ReadError(e.to_string()))?;
    Ok(join_pages(&pages))
}

fn join_pages(pages: &[String]) -> String {
    pages.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::write_pdf;

    #[test]
    fn test_join_pages_with_single_spaces() {
        let pages = vec!["first".to_string(), String::new(), "third".to_string()];
        assert_eq!(join_pages(&pages), "first  third");
    }

    #[tokio::test]
    async fn test_extract_text_from_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.pdf");
        write_pdf(&path, &["Hello from page one", "Goodbye from page two"]);

        let text = extract_text(&path).await.unwrap();
        assert!(text.contains("Hello"));
        assert!(text.contains("Goodbye"));
    }

    #[tokio::test]
    async fn test_malformed_pdf_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"this is not a pdf").unwrap();

        assert!(extract_text(&path).await.is_err());
    }

    #[tokio::test]
    async fn test_missing_file_is_an_error() {
        let result = extract_text(Path::new("/nonexistent/file.pdf")).await;
        assert!(result.is_err());
    }
}
