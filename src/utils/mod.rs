//! Utility modules.

pub mod file;

pub use file::{TempFile, is_pdf_filename, temp_upload_path};
