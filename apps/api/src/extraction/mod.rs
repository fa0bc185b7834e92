//! Document text extraction for uploaded resumes.
//!
//! Accepts exactly three kinds, chosen by file extension: PDF, DOCX and plain
//! text. Extraction is synchronous; callers on the async runtime should use
//! [`extract_text_blocking`].

mod docx;

use std::fmt;
use std::path::Path;

use thiserror::Error;
use tracing::debug;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
    Txt,
}

impl DocumentKind {
    /// Resolves the kind from a file name's extension, case-insensitively.
    pub fn from_file_name(file_name: &str) -> Result<Self, ExtractError> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("")
            .to_lowercase();

        match extension.as_str() {
            "pdf" => Ok(DocumentKind::Pdf),
            "docx" => Ok(DocumentKind::Docx),
            "txt" => Ok(DocumentKind::Txt),
            _ => Err(ExtractError::UnsupportedFormat(extension)),
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DocumentKind::Pdf => "pdf",
            DocumentKind::Docx => "docx",
            DocumentKind::Txt => "txt",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Unsupported file type '{0}'. Please upload PDF, DOCX, or TXT files")]
    UnsupportedFormat(String),

    #[error("Failed to extract text from {kind}: {source}")]
    Extraction {
        kind: DocumentKind,
        #[source]
        source: BoxError,
    },

    #[error("No text content found in the file")]
    EmptyContent,
}

impl ExtractError {
    fn extraction(kind: DocumentKind, source: impl Into<BoxError>) -> Self {
        ExtractError::Extraction {
            kind,
            source: source.into(),
        }
    }
}

/// Extracts the visible text of a document, trimmed of surrounding whitespace.
///
/// Fails with [`ExtractError::EmptyContent`] when nothing but whitespace remains.
pub fn extract_text(bytes: &[u8], kind: DocumentKind) -> Result<String, ExtractError> {
    let raw = match kind {
        DocumentKind::Pdf => extract_pdf(bytes)?,
        DocumentKind::Docx => docx::extract_paragraphs(bytes)
            .map_err(|e| ExtractError::extraction(kind, e.to_string()))?
            .join("\n"),
        DocumentKind::Txt => std::str::from_utf8(bytes)
            .map_err(|e| ExtractError::extraction(kind, e))?
            .to_string(),
    };

    let text = raw.trim();
    debug!("Extracted {} characters from {kind} document", text.len());

    if text.is_empty() {
        return Err(ExtractError::EmptyContent);
    }
    Ok(text.to_string())
}

/// Runs [`extract_text`] on the blocking pool. PDF decoding is CPU bound and
/// the decoder may panic on hostile input; a panic surfaces as an extraction
/// failure.
pub async fn extract_text_blocking(
    bytes: bytes::Bytes,
    kind: DocumentKind,
) -> Result<String, ExtractError> {
    tokio::task::spawn_blocking(move || extract_text(&bytes, kind))
        .await
        .map_err(|e| ExtractError::extraction(kind, e))?
}

fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractError> {
    let pages = pdf_extract::extract_text_from_mem_by_pages(bytes)
        .map_err(|e| ExtractError::extraction(DocumentKind::Pdf, e.to_string()))?;
    Ok(pages.join("\n"))
}
