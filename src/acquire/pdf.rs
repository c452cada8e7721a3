use crate::{Error, Result};

/// PDF headers may be preceded by junk, but must start within the first 1024 bytes.
const HEADER_SEARCH_WINDOW: usize = 1024;

/// Returns true if the bytes carry a `%PDF-` header.
pub fn looks_like_pdf(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(HEADER_SEARCH_WINDOW)];
    head.windows(5).any(|window| window == b"%PDF-")
}

/// Extract plain text from an in-memory PDF on the blocking pool.
///
/// pdf-extract can panic on malformed input; the panic surfaces as a join error and is
/// reported like any other extraction failure.
pub async fn extract_text(bytes: Vec<u8>) -> Result<String> {
    tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
        .await
        .map_err(|e| Error::Acquisition(format!("PDF text extraction aborted: {}", e)))?
        .map_err(|e| Error::Acquisition(format!("Failed to extract text from PDF: {}", e)))
}
