//! # smartnote
//!
//! Turns lecture documents into structured Markdown notes.
//!
//! The core is a line classifier for flat text (as extracted from PDFs):
//! short ALL-CAPS lines become `##` headings, short lines ending in a colon
//! become `###` headings and everything else passes through unchanged. Runs of
//! blank lines collapse to a single blank line.
//!
//! Around it the crate provides document conversion (DOCX, PDF, plain text),
//! safe output file naming, heading outlines and class/topic note sets.
//!
//! ## Example
//!
//! ```rust
//! use smartnote::{Outline, structure};
//!
//! let raw = "LECTURE 3\nKey terms:\npointer stores an address\n\n\n\nEND OF NOTES";
//! let markdown = structure(raw);
//!
//! assert_eq!(
//!     markdown,
//!     "## LECTURE 3\n### Key terms\npointer stores an address\n\n## END OF NOTES\n"
//! );
//!
//! let outline = Outline::from_markdown(&markdown);
//! println!("{}", outline.render_box_tree());
//! ```

/// Configuration file and environment overrides.
pub mod config;

/// DOCX, PDF and plain-text conversion to Markdown.
pub mod convert;

/// Input handling for files and stdin.
pub mod input;

/// Class / topic / note hierarchies and their graph form.
pub mod notes;

/// Heading trees.
pub mod outline;

/// Output file naming and atomic writes.
pub mod output;

/// Heuristic plain text to Markdown structuring.
pub mod structurer;

/// Reconversion on file changes.
pub mod watcher;

// Re-export commonly used types for convenience
pub use config::Config;
pub use convert::{Conversion, ConvertError, Converter, SourceFormat};
pub use notes::{GraphData, NoteSet, NotesDocument, NotesError};
pub use outline::Outline;
pub use structurer::{Block, Structurer, StructurerConfig, structure};
