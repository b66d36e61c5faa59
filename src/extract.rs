//! PDF text extraction.
//!
//! Uploads supply raw PDF bytes; this module returns plain UTF-8 text with
//! pages concatenated in document order. Pages without extractable text
//! (scans, pure images) contribute nothing. Any parse failure is returned
//! as an error so the caller can abort the whole upload.

/// Extraction error. The message carries the underlying parser text so the
/// HTTP layer can surface it verbatim.
#[derive(Debug)]
pub enum ExtractError {
    Pdf(String),
}

impl std::fmt::Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractError::Pdf(e) => write!(f, "PDF extraction failed: {}", e),
        }
    }
}

impl std::error::Error for ExtractError {}

/// Extracts plain text from one PDF document held in memory.
pub fn pdf_text(bytes: &[u8]) -> Result<String, ExtractError> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| ExtractError::Pdf(e.to_string()))
}
