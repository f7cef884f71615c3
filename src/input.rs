//! Where a command reads its document from.
//!
//! A path argument names a file, `-` forces stdin, and no argument at all
//! reads stdin only when something is piped into it.

use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("No input file given and nothing piped to stdin")]
    NoTty,

    #[error("Input on stdin exceeds the {limit} byte limit")]
    TooLarge { limit: u64 },

    #[error("Failed to read stdin: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    File(PathBuf),
    Stdin(Vec<u8>),
}

impl InputSource {
    /// Name used for derived output files.
    pub fn display_name(&self) -> String {
        match self {
            InputSource::File(path) => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            InputSource::Stdin(_) => "document".to_string(),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            InputSource::File(path) => Some(path),
            InputSource::Stdin(_) => None,
        }
    }
}

/// Resolve the input of a command from its optional file argument.
///
/// Stdin is buffered up to `max_bytes`; files are only named here and read
/// later by the command.
pub fn determine_input_source(
    file: Option<&Path>,
    max_bytes: u64,
) -> Result<InputSource, InputError> {
    match file {
        Some(path) if path == Path::new("-") => read_source(io::stdin().lock(), max_bytes),
        Some(path) => Ok(InputSource::File(path.to_path_buf())),
        None if io::stdin().is_terminal() => Err(InputError::NoTty),
        None => read_source(io::stdin().lock(), max_bytes),
    }
}

/// Buffer `reader` as stdin input, failing once it exceeds `max_bytes`.
pub fn read_source<R: Read>(reader: R, max_bytes: u64) -> Result<InputSource, InputError> {
    let mut buffer = Vec::new();
    reader
        .take(max_bytes.saturating_add(1))
        .read_to_end(&mut buffer)?;
    if buffer.len() as u64 > max_bytes {
        return Err(InputError::TooLarge { limit: max_bytes });
    }
    log::debug!("Read {} bytes from stdin", buffer.len());
    Ok(InputSource::Stdin(buffer))
}
