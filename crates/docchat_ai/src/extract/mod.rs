use docchat_core::error::AppError;

/// Extract text content from PDF bytes.
///
/// Returns an error for encrypted/corrupt files and for PDFs with no
/// extractable text (image-only scans).
pub fn extract_pdf_text(bytes: &[u8]) -> Result<String, AppError> {
    let raw = pdf_extract::extract_text_from_mem(bytes).map_err(|e| {
        AppError::new("PDF_EXTRACT_FAILED", "Failed to extract text from PDF")
            .with_details(e.to_string())
    })?;

    let cleaned = clean_text(&raw);
    if cleaned.is_empty() {
        return Err(AppError::new(
            "PDF_EXTRACT_EMPTY",
            "PDF contains no extractable text",
        ));
    }
    Ok(cleaned)
}

/// Clean up common PDF extraction artifacts: trailing whitespace per line and
/// runs of blank lines collapsed to a single paragraph break.
fn clean_text(text: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            if lines.last().map(|l| !l.is_empty()).unwrap_or(false) {
                lines.push("");
            }
        } else {
            lines.push(trimmed);
        }
    }
    lines.join("\n").trim().to_string()
}
