use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use smartnote::SourceFormat;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "smartnote")]
#[command(version)]
#[command(about = "Turn lecture documents into structured Markdown notes")]
#[command(
    long_about = "smartnote - Convert DOCX, PDF and plain-text documents into Markdown.\n\n\
    Plain text is structured line by line: short ALL-CAPS lines become '##' headings\n\
    and short lines ending in ':' become '###' headings. DOCX keeps its own styles.\n\n\
    Examples:\n  \
    smartnote convert lecture.docx            # Markdown to stdout\n  \
    smartnote convert notes.pdf -o out/       # Write out/notes.md\n  \
    pdftotext a.pdf - | smartnote convert     # Structure piped text\n  \
    smartnote convert raw.txt --outline       # Show the heading tree\n  \
    smartnote notes notes.json --format tree  # Render a note set"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Increase log output (-v for info, -vv for debug)
    ///
    /// RUST_LOG takes precedence when it is set.
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Use this config file instead of the default location
    #[arg(short = 'c', long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Convert a document to Markdown
    Convert(ConvertArgs),

    /// Render, search or edit a notes JSON file
    ///
    /// Accepts either a hierarchy ({"Class": ..., "Topics": {...}}) or a
    /// graph ({"nodes": [...], "edges": [...]}).
    Notes(NotesArgs),

    /// Show the effective configuration
    Config {
        /// Print only the config file location
        #[arg(long = "path")]
        path: bool,
    },
}

#[derive(Debug, Args)]
pub struct ConvertArgs {
    /// Document to convert (.docx, .pdf, .txt, .md), or '-' for stdin
    ///
    /// If no file is given and stdin is piped, input is read from stdin
    /// and treated as plain text unless --from says otherwise.
    pub file: Option<PathBuf>,

    /// Write <name>.md into this directory instead of printing it
    #[arg(short = 'o', long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Print to stdout even when an output directory is configured
    #[arg(long = "stdout", conflicts_with = "output_dir")]
    pub stdout: bool,

    /// Input format, overriding the file extension
    #[arg(long = "from", value_name = "FORMAT")]
    pub from: Option<FormatArg>,

    /// Print the heading tree of the result instead of the Markdown
    #[arg(long = "outline", conflicts_with = "blocks")]
    pub outline: bool,

    /// Print the classified lines as JSON
    #[arg(long = "blocks")]
    pub blocks: bool,

    /// Render the result in the terminal
    #[arg(long = "preview", conflicts_with_all = ["outline", "blocks"])]
    pub preview: bool,

    /// Convert again whenever the file changes (Ctrl-C to stop)
    #[arg(long = "watch")]
    pub watch: bool,
}

#[derive(Debug, Args)]
pub struct NotesArgs {
    /// Notes JSON file, or '-' for stdin
    pub file: Option<PathBuf>,

    /// How to print the notes
    ///
    ///   outline  - Markdown list view (default)
    ///   tree     - Box-drawing tree
    ///   graph    - Graph JSON (nodes and edges)
    ///   elements - Graph elements for rendering
    ///   json     - Normalized input JSON
    #[arg(short = 'f', long = "format", default_value = "outline")]
    pub format: NotesFormat,

    /// Add a node for every extension note (elements format)
    #[arg(long = "extension-nodes")]
    pub extension_nodes: bool,

    /// Hide extension nodes (elements format)
    #[arg(long = "minimal")]
    pub minimal: bool,

    /// List nodes whose label, summary or extensions contain TEXT
    #[arg(long = "search", value_name = "TEXT")]
    pub search: Option<String>,

    /// Show the details panel for a node or extension element id
    #[arg(long = "details", value_name = "ID", conflicts_with = "search")]
    pub details: Option<String>,

    /// Replace the summary of the node labelled LABEL with its first extension
    #[arg(long = "promote", value_name = "LABEL")]
    pub promote: Option<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FormatArg {
    /// Word document
    Docx,
    /// PDF document
    Pdf,
    /// Plain text
    #[value(alias = "txt")]
    Text,
}

impl From<FormatArg> for SourceFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Docx => SourceFormat::Docx,
            FormatArg::Pdf => SourceFormat::Pdf,
            FormatArg::Text => SourceFormat::Text,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum NotesFormat {
    /// Markdown list view
    Outline,
    /// Box-drawing tree
    Tree,
    /// Graph JSON
    Graph,
    /// Render elements JSON
    Elements,
    /// Normalized JSON
    Json,
}
