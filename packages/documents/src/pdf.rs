//! PDF text extraction.

use crate::DocumentError;

/// Extracts text per page, dropping pages with no extractable text.
///
/// # Errors
///
/// Returns [`DocumentError::Extraction`] if the PDF cannot be parsed.
pub fn extract_pages(bytes: &[u8]) -> Result<Vec<String>, DocumentError> {
    let pages = pdf_extract::extract_text_from_mem_by_pages(bytes)
        .map_err(|e| DocumentError::Extraction(format!("failed to extract text from PDF: {e}")))?;

    let non_empty: Vec<String> = pages
        .into_iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect();

    log::debug!("Extracted {} non-empty pages from PDF", non_empty.len());

    Ok(non_empty)
}
