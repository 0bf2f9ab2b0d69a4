//! Text extraction: turns an uploaded PDF into normalized plain text.

use async_trait::async_trait;
use thiserror::Error;

use crate::documents::storage::ObjectStorage;
use crate::models::document::DocumentRow;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("failed to read {path}: {message}")]
    Storage { path: String, message: String },

    #[error("failed to parse PDF {path}: {message}")]
    Pdf { path: String, message: String },

    #[error("no text content found in PDF {0}")]
    Empty(String),
}

#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Returns the document's raw text. Never returns blank text.
    async fn extract(&self, doc: &DocumentRow) -> Result<String, ExtractError>;
}

/// Downloads the PDF from object storage and extracts it with `pdf-extract`.
pub struct PdfTextExtractor {
    storage: ObjectStorage,
}

impl PdfTextExtractor {
    pub fn new(storage: ObjectStorage) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl TextExtractor for PdfTextExtractor {
    async fn extract(&self, doc: &DocumentRow) -> Result<String, ExtractError> {
        let path = doc.file_path.clone();
        let data = self
            .storage
            .fetch(&path)
            .await
            .map_err(|e| ExtractError::Storage {
                path: path.clone(),
                message: e.to_string(),
            })?;

        // pdf-extract is CPU-bound and synchronous
        let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&data))
            .await
            .map_err(|e| ExtractError::Pdf {
                path: path.clone(),
                message: e.to_string(),
            })?
            .map_err(|e| ExtractError::Pdf {
                path: path.clone(),
                message: e.to_string(),
            })?;

        if text.trim().is_empty() {
            return Err(ExtractError::Empty(path));
        }
        Ok(text)
    }
}

/// Collapses runs of whitespace within each line and drops blank lines.
pub fn normalize_text(text: &str) -> String {
    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
