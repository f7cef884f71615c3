//! Writing converted Markdown to disk.
//!
//! Output locations are always passed in by the caller; nothing here depends
//! on process-wide directories.

use regex::Regex;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Longest file name (in bytes) most filesystems accept.
const MAX_FILE_NAME_BYTES: usize = 255;

const MARKDOWN_EXTENSION: &str = ".md";

/// Used instead of `.md` when the plain name would overwrite the source.
const CONVERTED_EXTENSION: &str = ".converted.md";

#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("Failed to create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Derive the `.md` file name for a converted document.
///
/// Uses the sanitized stem of `original_name`; when nothing usable is left the
/// name falls back to `doc_<uuid>`.
///
/// ```
/// use smartnote::output::output_file_name;
///
/// assert_eq!(output_file_name("Lecture 3: Pointers.docx"), "Lecture 3 Pointers.md");
/// assert!(output_file_name("...pdf").starts_with("doc_"));
/// ```
pub fn output_file_name(original_name: &str) -> String {
    file_name_with_extension(original_name, MARKDOWN_EXTENSION)
}

/// Output file name in `dir` that never points at the `source` file itself.
///
/// Converting `notes.md` into its own directory would otherwise replace the
/// input; in that case the name becomes `notes.converted.md`.
pub fn output_file_name_in(dir: &Path, original_name: &str, source: Option<&Path>) -> String {
    let file_name = output_file_name(original_name);
    match source {
        Some(source) if is_same_file(&dir.join(&file_name), source) => {
            log::info!(
                "{} would overwrite its source; writing {} instead",
                file_name,
                CONVERTED_EXTENSION
            );
            file_name_with_extension(original_name, CONVERTED_EXTENSION)
        }
        _ => file_name,
    }
}

fn file_name_with_extension(original_name: &str, extension: &str) -> String {
    let stem = Path::new(original_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();

    let safe = sanitize_to_length(stem, MAX_FILE_NAME_BYTES - extension.len());
    if safe.is_empty() {
        format!("doc_{}{}", uuid::Uuid::new_v4(), extension)
    } else {
        format!("{}{}", safe, extension)
    }
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Make `name` safe to use as a file name on common platforms.
///
/// Removes path separators, reserved punctuation and control characters, drops
/// trailing dots and spaces, rejects `.`/`..` and Windows device names, and
/// truncates to 255 bytes. May return an empty string.
pub fn sanitize_file_name(name: &str) -> String {
    sanitize_to_length(name, MAX_FILE_NAME_BYTES)
}

fn sanitize_to_length(name: &str, max_bytes: usize) -> String {
    static ILLEGAL: OnceLock<Regex> = OnceLock::new();
    static TRAILING: OnceLock<Regex> = OnceLock::new();
    static WINDOWS_RESERVED: OnceLock<Regex> = OnceLock::new();

    let illegal = ILLEGAL.get_or_init(|| {
        Regex::new(r#"[/?<>\\:*|"\x00-\x1f\x{80}-\x{9f}]"#).unwrap()
    });
    let trailing = TRAILING.get_or_init(|| Regex::new(r"[. ]+$").unwrap());
    let windows_reserved = WINDOWS_RESERVED.get_or_init(|| {
        Regex::new(r"(?i)^(con|prn|aux|nul|com[0-9]|lpt[0-9])(\..*)?$").unwrap()
    });

    let cleaned = illegal.replace_all(name, "");
    if cleaned.chars().all(|c| c == '.') || windows_reserved.is_match(&cleaned) {
        return String::new();
    }
    let truncated = truncate_to_bytes(&cleaned, max_bytes);
    trailing.replace_all(truncated, "").into_owned()
}

/// Write `markdown` to `dir/file_name`, creating `dir` when needed.
///
/// The content goes to a temporary file in the same directory first and is
/// then renamed over the target, so readers never see a partial file.
pub fn write_markdown(dir: &Path, file_name: &str, markdown: &str) -> Result<PathBuf, OutputError> {
    std::fs::create_dir_all(dir).map_err(|source| OutputError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let target = dir.join(file_name);
    let write_err = |source| OutputError::Write {
        path: target.clone(),
        source,
    };

    let mut temp_file = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
    temp_file.write_all(markdown.as_bytes()).map_err(write_err)?;
    temp_file.flush().map_err(write_err)?;
    temp_file.persist(&target).map_err(|e| write_err(e.error))?;

    log::info!("Wrote {}", target.display());
    Ok(target)
}

fn truncate_to_bytes(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
