//! Document extraction: turns an uploaded resume file into plain text.
//!
//! Only the text is handed on; an empty result is not an error here, the
//! pipeline rejects empty documents itself.

use thiserror::Error;
use tracing::debug;

const PDF_MAGIC: &[u8] = b"%PDF-";
const DOCX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),

    #[error("Could not extract text from PDF: {0}")]
    PdfExtraction(String),

    #[error("Text file is not valid UTF-8")]
    InvalidEncoding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    PlainText,
    Docx,
}

/// Decides the document kind from content sniffing, the declared content type,
/// then the file extension.
pub fn detect_kind(
    file_name: Option<&str>,
    content_type: Option<&str>,
    bytes: &[u8],
) -> Result<DocumentKind, DocumentError> {
    if bytes.starts_with(PDF_MAGIC) {
        return Ok(DocumentKind::Pdf);
    }

    let content_type = content_type.map(|c| c.to_ascii_lowercase());
    match content_type.as_deref() {
        Some("application/pdf") => return Ok(DocumentKind::Pdf),
        Some(DOCX_CONTENT_TYPE) => return Ok(DocumentKind::Docx),
        Some(ct) if ct.starts_with("text/plain") || ct.starts_with("text/markdown") => {
            return Ok(DocumentKind::PlainText)
        }
        _ => {}
    }

    let extension = file_name
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase());
    match extension.as_deref() {
        Some("pdf") => Ok(DocumentKind::Pdf),
        Some("txt") | Some("md") => Ok(DocumentKind::PlainText),
        Some("docx") | Some("doc") => Ok(DocumentKind::Docx),
        _ => Err(DocumentError::UnsupportedFormat(
            file_name
                .or(content_type.as_deref())
                .unwrap_or("unknown")
                .to_string(),
        )),
    }
}

pub fn extract_text(
    file_name: Option<&str>,
    content_type: Option<&str>,
    bytes: &[u8],
) -> Result<String, DocumentError> {
    let kind = detect_kind(file_name, content_type, bytes)?;
    debug!("Extracting {} bytes as {:?}", bytes.len(), kind);

    let text = match kind {
        // pdf-extract can panic on malformed files; keep that inside this request.
        DocumentKind::Pdf => std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes))
            .map_err(|_| DocumentError::PdfExtraction("PDF parser aborted".to_string()))?
            .map_err(|e| DocumentError::PdfExtraction(e.to_string()))?,
        DocumentKind::PlainText => std::str::from_utf8(bytes)
            .map_err(|_| DocumentError::InvalidEncoding)?
            .to_string(),
        DocumentKind::Docx => {
            return Err(DocumentError::UnsupportedFormat(
                "DOCX uploads are not supported; upload a PDF or plain text file".to_string(),
            ))
        }
    };

    Ok(text.trim().to_string())
}
