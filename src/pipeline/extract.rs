//! PDF text extraction over in-memory bytes.

use super::types::PipelineError;

/// Extract plain text from raw PDF bytes.
///
/// Fails with [`PipelineError::UnreadablePdf`] when the bytes are not a parseable
/// PDF and with [`PipelineError::EmptyDocument`] when the PDF contains no
/// extractable text (scanned images, empty pages).
pub(crate) fn extract_text(bytes: &[u8]) -> Result<String, PipelineError> {
    let text = pdf_extract::extract_text_from_mem(bytes)
        .map_err(|error| PipelineError::UnreadablePdf(error.to_string()))?;

    if text.trim().is_empty() {
        return Err(PipelineError::EmptyDocument);
    }

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bytes_that_are_not_a_pdf() {
        let error = extract_text(b"plain text pretending to be a pdf").expect_err("not a pdf");
        assert!(matches!(error, PipelineError::UnreadablePdf(_)));
    }

    #[test]
    fn rejects_empty_input() {
        let error = extract_text(b"").expect_err("empty input");
        assert!(matches!(error, PipelineError::UnreadablePdf(_)));
    }
}
