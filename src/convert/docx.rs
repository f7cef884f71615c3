//! DOCX reading.
//!
//! DOCX files are ZIP archives containing WordprocessingML. The body lives in
//! `word/document.xml`; this module streams it with `quick-xml` and keeps only
//! what survives into Markdown: paragraph styles (title, headings), list
//! membership and level, and bold/italic runs.
//!
//! Images are not extracted. Each one is reported as a warning instead.

use super::SourceFormat;
use super::error::{ConvertError, Result};
use indexmap::IndexSet;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use regex::Regex;
use std::io::{Cursor, Read};
use std::sync::OnceLock;
use zip::ZipArchive;

/// Deepest list level WordprocessingML defines (`w:ilvl` is 0-8).
const MAX_LIST_LEVEL: usize = 8;

/// Paragraph styles that map to plain body text without a warning.
const BODY_STYLES: &[&str] = &[
    "Normal",
    "BodyText",
    "NoSpacing",
    "ListParagraph",
    "Caption",
    "Quote",
    "Subtitle",
];

/// A parsed DOCX body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocxDocument {
    pub paragraphs: Vec<Paragraph>,
    /// Things that could not be represented (unknown styles, images).
    pub warnings: Vec<String>,
}

/// How a paragraph should be rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParagraphKind {
    #[default]
    Body,
    /// Heading level 1-6
    Heading(usize),
    /// List item with zero-based nesting level
    ListItem(usize),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Paragraph {
    pub kind: ParagraphKind,
    pub runs: Vec<TextRun>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
}

impl Paragraph {
    /// Text of the paragraph without any formatting.
    pub fn plain_text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }

    fn is_blank(&self) -> bool {
        self.runs.iter().all(|r| r.text.trim().is_empty())
    }

    /// Inline Markdown for the paragraph body (no block prefix).
    fn inline_markdown(&self) -> String {
        let mut merged: Vec<TextRun> = Vec::new();
        for run in &self.runs {
            match merged.last_mut() {
                Some(last) if last.bold == run.bold && last.italic == run.italic => {
                    last.text.push_str(&run.text);
                }
                _ => merged.push(run.clone()),
            }
        }

        let body: String = merged
            .iter()
            .map(|run| emphasize(&escape_inline(&run.text), run.bold, run.italic))
            .collect();

        body.trim().replace('\n', "  \n")
    }
}

impl DocxDocument {
    /// Render the document as Markdown.
    ///
    /// Blocks are separated by a blank line, except consecutive list items which
    /// stay on adjacent lines. The result ends with a newline unless it is empty.
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        let mut previous: Option<ParagraphKind> = None;

        for paragraph in self.paragraphs.iter().filter(|p| !p.is_blank()) {
            let inline = paragraph.inline_markdown();
            let block = match paragraph.kind {
                ParagraphKind::Heading(level) => format!("{} {}", "#".repeat(level), inline),
                ParagraphKind::ListItem(level) => format!("{}- {}", "  ".repeat(level), inline),
                ParagraphKind::Body => escape_line_start(&inline),
            };

            if let Some(prev) = previous {
                let both_list = matches!(prev, ParagraphKind::ListItem(_))
                    && matches!(paragraph.kind, ParagraphKind::ListItem(_));
                out.push_str(if both_list { "\n" } else { "\n\n" });
            }
            out.push_str(&block);
            previous = Some(paragraph.kind);
        }

        if !out.is_empty() {
            out.push('\n');
        }
        out
    }

    /// Plain text with one line per paragraph, no markup.
    pub fn plain_text(&self) -> String {
        self.paragraphs
            .iter()
            .map(Paragraph::plain_text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Parse DOCX bytes.
///
/// `max_xml_size` bounds the decompressed size of `word/document.xml`; the
/// container size alone says little about what it expands to.
pub fn parse(bytes: &[u8], max_xml_size: u64) -> Result<DocxDocument> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ConvertError::extraction(SourceFormat::Docx, format!("not a DOCX archive: {}", e)))?;

    let xml = {
        let file = archive.by_name("word/document.xml").map_err(|_| {
            ConvertError::extraction(SourceFormat::Docx, "archive has no word/document.xml")
        })?;
        let too_large = || {
            ConvertError::extraction(
                SourceFormat::Docx,
                format!("word/document.xml expands beyond the {} byte limit", max_xml_size),
            )
        };
        if file.size() > max_xml_size {
            return Err(too_large());
        }

        // The declared size is not trusted; the read itself is bounded too.
        let mut content = String::new();
        file.take(max_xml_size.saturating_add(1))
            .read_to_string(&mut content)
            .map_err(|e| ConvertError::extraction(SourceFormat::Docx, e))?;
        if content.len() as u64 > max_xml_size {
            return Err(too_large());
        }
        content
    };

    parse_document_xml(&xml)
}

/// Parse the contents of `word/document.xml`.
pub fn parse_document_xml(xml: &str) -> Result<DocxDocument> {
    let mut reader = Reader::from_str(xml);

    let mut buf = Vec::new();
    let mut doc = DocxDocument::default();
    let mut unknown_styles: IndexSet<String> = IndexSet::new();
    let mut images = 0usize;

    let mut paragraph = Paragraph::default();
    let mut run = TextRun::default();
    let mut in_paragraph = false;
    let mut in_run = false;
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"p" => {
                    in_paragraph = true;
                    paragraph = Paragraph::default();
                }
                b"r" => {
                    in_run = true;
                    run = TextRun::default();
                }
                b"t" => in_text = in_run,
                b"drawing" | b"pict" => images += 1,
                _ => apply_property(e, in_paragraph, in_run, &mut paragraph, &mut run, &mut unknown_styles),
            },
            Ok(Event::Empty(ref e)) => match e.local_name().as_ref() {
                b"br" | b"cr" if in_run => run.text.push('\n'),
                b"tab" if in_run => run.text.push('\t'),
                b"drawing" | b"pict" => images += 1,
                _ => apply_property(e, in_paragraph, in_run, &mut paragraph, &mut run, &mut unknown_styles),
            },
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"p" => {
                    in_paragraph = false;
                    doc.paragraphs.push(std::mem::take(&mut paragraph));
                }
                b"r" => {
                    in_run = false;
                    if !run.text.is_empty() {
                        paragraph.runs.push(std::mem::take(&mut run));
                    }
                }
                b"t" => in_text = false,
                _ => {}
            },
            Ok(Event::Text(e)) => {
                if in_text {
                    let text = e
                        .unescape()
                        .map_err(|err| ConvertError::extraction(SourceFormat::Docx, err))?;
                    run.text.push_str(&text);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ConvertError::extraction(
                    SourceFormat::Docx,
                    format!("XML parse error at position {}: {}", reader.buffer_position(), e),
                ));
            }
            _ => {}
        }
        buf.clear();
    }

    for style in unknown_styles {
        doc.warnings.push(format!("Unrecognised paragraph style: {}", style));
    }
    if images > 0 {
        log::warn!("{} image(s) in DOCX input were not extracted", images);
        doc.warnings.push(format!("Image omitted ({} in document)", images));
    }

    log::debug!(
        "Parsed DOCX body: {} paragraphs, {} warnings",
        doc.paragraphs.len(),
        doc.warnings.len()
    );
    Ok(doc)
}

/// Apply a paragraph or run property element.
fn apply_property(
    e: &BytesStart,
    in_paragraph: bool,
    in_run: bool,
    paragraph: &mut Paragraph,
    run: &mut TextRun,
    unknown_styles: &mut IndexSet<String>,
) {
    match e.local_name().as_ref() {
        b"b" if in_run => run.bold = is_on(e),
        b"i" if in_run => run.italic = is_on(e),
        b"pStyle" if in_paragraph && !in_run => {
            if let Some(style) = get_attribute(e, "val") {
                match heading_level_for_style(&style) {
                    Some(level) => paragraph.kind = ParagraphKind::Heading(level),
                    None if BODY_STYLES.contains(&style.as_str()) => {}
                    None => {
                        unknown_styles.insert(style);
                    }
                }
            }
        }
        b"numPr" if in_paragraph && !in_run => {
            if !matches!(paragraph.kind, ParagraphKind::Heading(_)) {
                paragraph.kind = ParagraphKind::ListItem(0);
            }
        }
        b"ilvl" if in_paragraph && !in_run => {
            if let ParagraphKind::ListItem(_) = paragraph.kind {
                let level = get_attribute(e, "val")
                    .and_then(|v| v.parse::<usize>().ok())
                    .unwrap_or(0);
                paragraph.kind = ParagraphKind::ListItem(level.min(MAX_LIST_LEVEL));
            }
        }
        _ => {}
    }
}

/// Map a paragraph style id to a heading level.
///
/// `Title` is level 1; `Heading1`..`Heading9` (any case, optional space) are
/// clamped to 1-6.
fn heading_level_for_style(style: &str) -> Option<usize> {
    if style.eq_ignore_ascii_case("title") {
        return Some(1);
    }

    let lower = style.to_ascii_lowercase();
    let rest = lower.strip_prefix("heading")?.trim_start();
    if rest.is_empty() || !rest.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    rest.parse::<usize>().ok().map(|level| level.clamp(1, 6))
}

/// Toggle properties like `<w:b/>` are on unless `w:val` says otherwise.
fn is_on(e: &BytesStart) -> bool {
    !matches!(
        get_attribute(e, "val").as_deref(),
        Some("0") | Some("false") | Some("off")
    )
}

fn get_attribute(e: &BytesStart, name: &str) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == name.as_bytes())
        .map(|attr| String::from_utf8_lossy(&attr.value).to_string())
}

/// Wrap the non-whitespace core of `text` in emphasis markers.
fn emphasize(text: &str, bold: bool, italic: bool) -> String {
    let marker = match (bold, italic) {
        (true, true) => "***",
        (true, false) => "**",
        (false, true) => "*",
        (false, false) => return text.to_string(),
    };

    let core = text.trim();
    if core.is_empty() {
        return text.to_string();
    }

    let start = text.len() - text.trim_start().len();
    let end = start + core.len();
    format!("{}{}{}{}{}", &text[..start], marker, core, marker, &text[end..])
}

/// Backslash-escape characters with inline Markdown meaning.
fn escape_inline(text: &str) -> String {
    static INLINE: OnceLock<Regex> = OnceLock::new();
    let pattern = INLINE.get_or_init(|| Regex::new(r"([\\`*_\[\]])").unwrap());
    pattern.replace_all(text, r"\$1").into_owned()
}

/// Escape a body line that would otherwise parse as a block construct.
fn escape_line_start(line: &str) -> String {
    static BLOCK_START: OnceLock<Regex> = OnceLock::new();
    let pattern = BLOCK_START.get_or_init(|| {
        Regex::new(r"^(#{1,6} |>|[-+] |(\d+)\. )").unwrap()
    });

    match pattern.captures(line) {
        Some(caps) => match caps.get(2) {
            Some(number) => format!("{}\\{}", number.as_str(), &line[number.end()..]),
            None => format!("\\{}", line),
        },
        None => line.to_string(),
    }
}
