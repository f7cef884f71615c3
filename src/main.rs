//! # smartnote
//!
//! Turn lecture documents into structured Markdown notes.
//!
//! ## Usage
//!
//! Convert a document and print the Markdown:
//! ```sh
//! smartnote convert lecture.docx
//! ```
//!
//! Write the result into a directory and keep it up to date:
//! ```sh
//! smartnote convert notes.txt -o out/ --watch
//! ```
//!
//! Render a notes file as a tree:
//! ```sh
//! smartnote notes notes.json --format tree
//! ```

mod cli;

use clap::Parser as ClapParser;
use cli::{Cli, Command, ConvertArgs, NotesArgs, NotesFormat};
use color_eyre::Result;
use color_eyre::eyre::{WrapErr, eyre};
use smartnote::input::{self, InputError, InputSource};
use smartnote::notes::ElementOptions;
use smartnote::output::{output_file_name_in, write_markdown};
use smartnote::watcher::FileWatcher;
use smartnote::{Config, Conversion, Converter, NotesDocument, Outline, SourceFormat};
use std::path::Path;
use std::process;
use std::time::Duration;

fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Cli::parse();
    init_logging(args.verbose);

    let config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load(),
    };

    match &args.command {
        Command::Convert(convert) => run_convert(convert, &config),
        Command::Notes(notes) => run_notes(notes, &config),
        Command::Config { path } => print_config(&config, *path),
    }
}

fn init_logging(verbose: u8) {
    let default_filter = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

fn read_input(file: Option<&Path>, max_bytes: u64) -> Result<InputSource> {
    match input::determine_input_source(file, max_bytes) {
        Ok(source) => Ok(source),
        Err(InputError::NoTty) => {
            eprintln!("Error: input file argument is required");
            eprintln!("\nUsage: smartnote convert [OPTIONS] <FILE>");
            eprintln!("       smartnote convert [OPTIONS] -");
            eprintln!("       pdftotext notes.pdf - | smartnote convert [OPTIONS]\n");
            eprintln!("Use '-' to explicitly read from stdin.");
            process::exit(1);
        }
        Err(e) => Err(e.into()),
    }
}

fn run_convert(args: &ConvertArgs, config: &Config) -> Result<()> {
    let source = read_input(args.file.as_deref(), config.convert.max_file_size)?;
    let converter = config.converter();

    let output_dir = if args.stdout {
        None
    } else {
        args.output_dir.as_deref().or(config.convert.output_dir.as_deref())
    };

    convert_once(args, &converter, &source, output_dir)?;

    if !args.watch {
        return Ok(());
    }

    let Some(path) = source.path() else {
        return Err(eyre!("--watch needs a file argument, not stdin"));
    };

    let mut watcher = FileWatcher::new().wrap_err("Failed to start file watcher")?;
    watcher
        .watch(path)
        .wrap_err_with(|| format!("Failed to watch {}", path.display()))?;
    eprintln!("Watching {} (Ctrl-C to stop)", path.display());

    loop {
        if watcher.wait_for_change(Duration::from_secs(1)) {
            // Keep watching through broken intermediate saves
            if let Err(e) = convert_once(args, &converter, &source, output_dir) {
                log::error!("{:#}", e);
            }
        }
    }
}

fn convert_once(
    args: &ConvertArgs,
    converter: &Converter,
    source: &InputSource,
    output_dir: Option<&Path>,
) -> Result<()> {
    let forced = args.from.map(SourceFormat::from);
    let (format, bytes) = match source {
        InputSource::File(path) => {
            let format = match forced {
                Some(format) => format,
                None => SourceFormat::from_path(path)?,
            };
            let bytes = converter
                .read_file(path)
                .wrap_err_with(|| format!("Failed to read {}", path.display()))?;
            (format, bytes)
        }
        InputSource::Stdin(bytes) => (forced.unwrap_or(SourceFormat::Text), bytes.clone()),
    };

    if args.blocks {
        let blocks = converter.blocks(format, &bytes)?;
        println!("{}", serde_json::to_string_pretty(&blocks)?);
        return Ok(());
    }

    let Conversion { markdown, .. } = converter.convert_bytes(format, &bytes)?;

    if args.outline {
        print!("{}", Outline::from_markdown(&markdown).render_box_tree());
        return Ok(());
    }

    if args.preview {
        termimad::MadSkin::default().print_text(&markdown);
        return Ok(());
    }

    match output_dir {
        Some(dir) => {
            let file_name = output_file_name_in(dir, &source.display_name(), source.path());
            let path = write_markdown(dir, &file_name, &markdown)?;
            println!("{}", path.display());
        }
        None => print!("{}", markdown),
    }
    Ok(())
}

fn run_notes(args: &NotesArgs, config: &Config) -> Result<()> {
    let json = match read_input(args.file.as_deref(), config.convert.max_file_size)? {
        InputSource::File(path) => std::fs::read_to_string(&path)
            .wrap_err_with(|| format!("Failed to read {}", path.display()))?,
        InputSource::Stdin(bytes) => {
            String::from_utf8(bytes).wrap_err("Notes input is not valid UTF-8")?
        }
    };
    let mut document = NotesDocument::from_json(&json)?;

    if let Some(query) = &args.search {
        let graph = document.into_graph();
        for node in graph.search(query) {
            println!("{}\t{}", node.id, node.label);
        }
        return Ok(());
    }

    if let Some(id) = &args.details {
        let details = document.into_graph().details(id)?;
        println!("{}", serde_json::to_string_pretty(&details)?);
        return Ok(());
    }

    if let Some(label) = &args.promote {
        let mut graph = document.into_graph();
        let node = graph.promote_first_extension(label)?;
        log::info!("Promoted first extension of '{}' to its summary", node.label);
        document = NotesDocument::Graph(graph);
    }

    match args.format {
        NotesFormat::Outline => {
            print!("{}", document.into_note_set().normalized().render_outline());
        }
        NotesFormat::Tree => {
            print!("{}", document.into_note_set().normalized().outline().render_box_tree());
        }
        NotesFormat::Graph => {
            println!("{}", serde_json::to_string_pretty(&document.into_graph())?);
        }
        NotesFormat::Elements => {
            let options = ElementOptions {
                extension_nodes: args.extension_nodes,
                minimal: args.minimal,
            };
            let elements = document.into_graph().elements(options);
            println!("{}", serde_json::to_string_pretty(&elements)?);
        }
        NotesFormat::Json => {
            let json = match document {
                NotesDocument::Hierarchy(notes) => serde_json::to_string_pretty(&notes.normalized())?,
                NotesDocument::Graph(graph) => serde_json::to_string_pretty(&graph)?,
            };
            println!("{}", json);
        }
    }
    Ok(())
}

fn print_config(config: &Config, path_only: bool) -> Result<()> {
    if path_only {
        match Config::config_path() {
            Some(path) => println!("{}", path.display()),
            None => return Err(eyre!("Could not determine config directory")),
        }
        return Ok(());
    }

    print!("{}", config.to_toml()?);
    Ok(())
}
