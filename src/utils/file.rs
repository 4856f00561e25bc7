//! File utilities for upload handling.

use std::path::{Path, PathBuf};

use crate::models::Namespace;

/// Check the upload's filename ends in a lowercase `.pdf`.
pub fn is_pdf_filename(filename: &str) -> bool {
    filename.ends_with(".pdf")
}

/// Scratch path for a session's upload.
pub fn temp_upload_path(dir: &Path, namespace: &Namespace) -> PathBuf {
    dir.join(format!("temp_{}.pdf", namespace.as_str()))
}

/// An uploaded file on disk that is removed when the guard drops.
#[derive(Debug)]
pub struct TempFile {
    path: PathBuf,
}

impl TempFile {
    /// Write `bytes` to `path`, creating parent directories as needed.
    pub async fn write(path: PathBuf, bytes: &[u8]) -> std::io::Result<Self> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        // Guard first, so a failed write still cleans up a partial file.
        let guard = Self { path };
        tokio::fs::write(&guard.path, bytes).await?;
        Ok(guard)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to remove temp file");
            }
        }
    }
}
