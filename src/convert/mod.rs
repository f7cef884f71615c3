//! Document conversion.
//!
//! Turns DOCX, PDF and plain-text documents into Markdown:
//!
//! - DOCX keeps its own structure (styles, lists, emphasis) and is rendered directly
//! - PDF and plain text only yield flat text, which goes through the
//!   [`Structurer`](crate::structurer::Structurer) heuristics
//!
//! The format is decided from the file extension before anything is read, so
//! unsupported files are rejected early.

pub mod docx;
mod error;
pub mod pdf;

pub use error::{ConvertError, Result};

use crate::structurer::{Block, Structurer};
use std::fmt;
use std::path::Path;

/// Default upload limit: 20 MiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 20 * 1024 * 1024;

/// Supported input formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Docx,
    Pdf,
    Text,
}

impl SourceFormat {
    /// Look up a format by file extension (case-insensitive, without the dot).
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "docx" => Some(SourceFormat::Docx),
            "pdf" => Some(SourceFormat::Pdf),
            "txt" | "text" | "md" | "markdown" => Some(SourceFormat::Text),
            _ => None,
        }
    }

    /// Decide the format of a file from its extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();

        Self::from_extension(extension).ok_or_else(|| ConvertError::Unsupported {
            extension: extension.to_ascii_lowercase(),
        })
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SourceFormat::Docx => "DOCX",
            SourceFormat::Pdf => "PDF",
            SourceFormat::Text => "text",
        })
    }
}

/// Result of a successful conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    pub format: SourceFormat,
    /// Newline-terminated Markdown (empty only for empty documents).
    pub markdown: String,
    /// Non-fatal problems, also embedded at the top of `markdown`.
    pub warnings: Vec<String>,
}

/// Converts documents to Markdown.
#[derive(Debug, Clone)]
pub struct Converter {
    structurer: Structurer,
    max_file_size: u64,
}

impl Default for Converter {
    fn default() -> Self {
        Self::new(Structurer::default())
    }
}

impl Converter {
    pub fn new(structurer: Structurer) -> Self {
        Self {
            structurer,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }

    /// Override the maximum accepted input size in bytes.
    pub fn with_max_file_size(mut self, max_file_size: u64) -> Self {
        self.max_file_size = max_file_size;
        self
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// Convert a file, choosing the format from its extension.
    pub fn convert_file(&self, path: &Path) -> Result<Conversion> {
        let format = SourceFormat::from_path(path)?;
        let bytes = self.read_file(path)?;
        log::info!(
            "Converting {} ({}, {} bytes)",
            path.display(),
            format,
            bytes.len()
        );
        self.convert_bytes(format, &bytes)
    }

    /// Read a file, refusing it up front when it exceeds the size limit.
    pub fn read_file(&self, path: &Path) -> Result<Vec<u8>> {
        self.check_size(std::fs::metadata(path)?.len())?;
        Ok(std::fs::read(path)?)
    }

    /// Convert in-memory document bytes of a known format.
    pub fn convert_bytes(&self, format: SourceFormat, bytes: &[u8]) -> Result<Conversion> {
        self.check_size(bytes.len() as u64)?;

        let (mut markdown, warnings) = match format {
            SourceFormat::Docx => {
                let doc = docx::parse(bytes, self.max_file_size)?;
                (doc.to_markdown(), doc.warnings)
            }
            SourceFormat::Pdf | SourceFormat::Text => {
                let text = self.extract_text(format, bytes)?;
                (self.structurer.structure(&text), Vec::new())
            }
        };

        if !warnings.is_empty() {
            for warning in &warnings {
                log::warn!("{}", warning);
            }
            markdown = format!(
                "<!-- Conversion warnings:\n{}\n-->\n\n{}",
                warnings.join("\n"),
                markdown
            );
        }

        if !markdown.is_empty() && !markdown.ends_with('\n') {
            markdown.push('\n');
        }

        log::debug!("Produced {} bytes of Markdown", markdown.len());
        Ok(Conversion {
            format,
            markdown,
            warnings,
        })
    }

    /// Extract flat text without any Markdown structure.
    ///
    /// DOCX paragraphs become one line each.
    pub fn extract_text(&self, format: SourceFormat, bytes: &[u8]) -> Result<String> {
        self.check_size(bytes.len() as u64)?;
        match format {
            SourceFormat::Docx => Ok(docx::parse(bytes, self.max_file_size)?.plain_text()),
            SourceFormat::Pdf => pdf::extract_text(bytes),
            SourceFormat::Text => Ok(String::from_utf8_lossy(bytes).into_owned()),
        }
    }

    /// Classify the extracted text of a document line by line.
    pub fn blocks(&self, format: SourceFormat, bytes: &[u8]) -> Result<Vec<Block>> {
        let text = self.extract_text(format, bytes)?;
        Ok(self.structurer.blocks(&text))
    }

    fn check_size(&self, size: u64) -> Result<()> {
        if size > self.max_file_size {
            return Err(ConvertError::TooLarge {
                size,
                limit: self.max_file_size,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            SourceFormat::from_path(Path::new("notes.DOCX")).unwrap(),
            SourceFormat::Docx
        );
        assert_eq!(
            SourceFormat::from_path(Path::new("paper.pdf")).unwrap(),
            SourceFormat::Pdf
        );
        assert_eq!(
            SourceFormat::from_path(Path::new("raw.txt")).unwrap(),
            SourceFormat::Text
        );
    }

    #[test]
    fn test_unsupported_extension() {
        let err = SourceFormat::from_path(Path::new("slides.PPTX")).unwrap_err();
        match err {
            ConvertError::Unsupported { extension } => assert_eq!(extension, "pptx"),
            other => panic!("unexpected error: {other}"),
        }

        let err = SourceFormat::from_path(Path::new("README")).unwrap_err();
        assert!(err.to_string().starts_with("Unsupported file type ''"));
    }

    #[test]
    fn test_text_conversion_uses_structurer() {
        let converter = Converter::default();
        let conversion = converter
            .convert_bytes(SourceFormat::Text, b"INTRODUCTION\r\nKey ideas:\r\nPointers store addresses.")
            .unwrap();
        assert_eq!(
            conversion.markdown,
            "## INTRODUCTION\n### Key ideas\nPointers store addresses.\n"
        );
        assert!(conversion.warnings.is_empty());
    }

    #[test]
    fn test_invalid_utf8_is_decoded_lossily() {
        let conversion = Converter::default()
            .convert_bytes(SourceFormat::Text, b"caf\xff au lait")
            .unwrap();
        assert_eq!(conversion.markdown, "caf\u{fffd} au lait\n");
    }

    #[test]
    fn test_empty_text_stays_empty() {
        let conversion = Converter::default()
            .convert_bytes(SourceFormat::Text, b"")
            .unwrap();
        assert_eq!(conversion.markdown, "");
    }

    #[test]
    fn test_size_limit() {
        let converter = Converter::default().with_max_file_size(4);
        let err = converter
            .convert_bytes(SourceFormat::Text, b"too long")
            .unwrap_err();
        assert!(matches!(err, ConvertError::TooLarge { size: 8, limit: 4 }));
    }

    #[test]
    fn test_convert_file_checks_extension_first() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("image.png");
        std::fs::write(&path, b"\x89PNG").unwrap();

        let err = Converter::default().convert_file(&path).unwrap_err();
        assert!(matches!(err, ConvertError::Unsupported { .. }));
    }

    #[test]
    fn test_read_file_checks_size_before_reading() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.txt");
        std::fs::write(&path, vec![b'a'; 64]).unwrap();

        let converter = Converter::default().with_max_file_size(16);
        let err = converter.read_file(&path).unwrap_err();
        assert!(matches!(err, ConvertError::TooLarge { size: 64, limit: 16 }));
        assert_eq!(Converter::default().read_file(&path).unwrap().len(), 64);
    }

    #[test]
    fn test_convert_text_file() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        write!(file, "CHAPTER ONE\n\n\n\nIt was a dark night.\n").unwrap();

        let conversion = Converter::default().convert_file(file.path()).unwrap();
        assert_eq!(conversion.format, SourceFormat::Text);
        assert_eq!(
            conversion.markdown,
            "## CHAPTER ONE\n\nIt was a dark night.\n"
        );
    }

    #[test]
    fn test_docx_warnings_prefixed_as_comment() {
        let xml = r#"<w:document xmlns:w="urn:w"><w:body><w:p><w:pPr><w:pStyle w:val="Fancy"/></w:pPr><w:r><w:t>Hello</w:t></w:r></w:p></w:body></w:document>"#;
        let mut cursor = std::io::Cursor::new(Vec::new());
        {
            let mut zip = zip::ZipWriter::new(&mut cursor);
            zip.start_file("word/document.xml", zip::write::SimpleFileOptions::default())
                .unwrap();
            zip.write_all(xml.as_bytes()).unwrap();
            zip.finish().unwrap();
        }

        let conversion = Converter::default()
            .convert_bytes(SourceFormat::Docx, &cursor.into_inner())
            .unwrap();
        assert_eq!(
            conversion.markdown,
            "<!-- Conversion warnings:\nUnrecognised paragraph style: Fancy\n-->\n\nHello\n"
        );
    }

    #[test]
    fn test_blocks_from_text() {
        let blocks = Converter::default()
            .blocks(SourceFormat::Text, b"TOPICS\nmemory")
            .unwrap();
        assert_eq!(
            blocks,
            vec![
                Block::Heading2("TOPICS".to_string()),
                Block::Paragraph("memory".to_string())
            ]
        );
    }

    #[cfg(not(feature = "pdf"))]
    #[test]
    fn test_pdf_without_feature() {
        let err = Converter::default()
            .convert_bytes(SourceFormat::Pdf, b"%PDF-1.7")
            .unwrap_err();
        assert!(matches!(err, ConvertError::PdfDisabled));
    }
}
