//! Error types for document conversion.

use super::SourceFormat;

/// Result type alias for conversion operations.
pub type Result<T> = std::result::Result<T, ConvertError>;

/// Errors that can occur while turning a document into Markdown.
///
/// Unsupported inputs are rejected before any extraction starts; failures
/// inside a supported format are reported separately as [`ConvertError::Extraction`].
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// File extension is not one of the supported formats
    #[error("Unsupported file type '{extension}'. Only .docx, .pdf and plain text are supported.")]
    Unsupported {
        /// Lowercased extension without the dot (empty when missing)
        extension: String,
    },

    /// Input exceeds the configured size limit
    #[error("File is too large: {size} bytes (limit is {limit} bytes)")]
    TooLarge {
        /// Size of the rejected input
        size: u64,
        /// Configured limit
        limit: u64,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The document could not be read (corrupt container, bad XML, broken PDF)
    #[error("Failed to extract text from {format} document: {message}")]
    Extraction {
        /// Format that was being read
        format: SourceFormat,
        /// Underlying failure
        message: String,
    },

    /// PDF input while the crate was built without the `pdf` feature
    #[error("PDF support is not enabled in this build (rebuild with `--features pdf`)")]
    PdfDisabled,
}

impl ConvertError {
    pub(crate) fn extraction(format: SourceFormat, message: impl std::fmt::Display) -> Self {
        ConvertError::Extraction {
            format,
            message: message.to_string(),
        }
    }
}
