//! PDF text extraction.
//!
//! Delegates to `pdf_oxide` when the `pdf` feature is enabled. The extracted
//! text is flat (one string per page); structuring it into Markdown is left to
//! the caller.

use super::error::Result;
#[cfg(feature = "pdf")]
use super::{SourceFormat, error::ConvertError};

/// Extract the text of every page, pages joined with a newline.
#[cfg(feature = "pdf")]
pub fn extract_text(bytes: &[u8]) -> Result<String> {
    use pdf_oxide::PdfDocument;
    use std::io::Write;

    // pdf_oxide opens documents by path.
    let mut temp = tempfile::Builder::new().suffix(".pdf").tempfile()?;
    temp.write_all(bytes)?;
    temp.flush()?;

    let mut doc = PdfDocument::open(temp.path())
        .map_err(|e| ConvertError::extraction(SourceFormat::Pdf, e))?;
    let page_count = doc
        .page_count()
        .map_err(|e| ConvertError::extraction(SourceFormat::Pdf, e))?;

    let mut pages = Vec::with_capacity(page_count);
    for index in 0..page_count {
        let text = doc
            .extract_text(index)
            .map_err(|e| ConvertError::extraction(SourceFormat::Pdf, e))?;
        pages.push(text);
    }

    log::debug!("Extracted text from {} PDF page(s)", page_count);
    Ok(pages.join("\n"))
}

/// Without the `pdf` feature every PDF is rejected.
#[cfg(not(feature = "pdf"))]
pub fn extract_text(_bytes: &[u8]) -> Result<String> {
    Err(super::error::ConvertError::PdfDisabled)
}
