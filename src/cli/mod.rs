mod commands;

pub use commands::{Cli, Command, ConvertArgs, FormatArg, NotesArgs, NotesFormat};
