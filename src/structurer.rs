//! Heuristic structuring of extracted plain text into Markdown.
//!
//! Text pulled out of PDFs (and other flat sources) has no markup left, only
//! lines. The structurer looks at each line on its own and decides whether it
//! reads like a heading, a paragraph or a paragraph break:
//!
//! - short, shouted lines (`INTRODUCTION`, `CHAPTER 2`) become `##` headings
//! - short lines ending in a colon (`Summary:`) become `###` headings
//! - everything else passes through unchanged
//!
//! Runs of blank lines are collapsed so the output never contains more than
//! one empty line in a row.
//!
//! ## Example
//!
//! ```
//! use smartnote::structurer::structure;
//!
//! let md = structure("OVERVIEW\r\nKey points:\r\nThe rest is prose.");
//! assert_eq!(md, "## OVERVIEW\n### Key points\nThe rest is prose.\n");
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// One classified line of output Markdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "text", rename_all = "snake_case")]
pub enum Block {
    /// Short all-uppercase line, rendered as `## text`.
    Heading2(String),
    /// Short line that ended in a colon (colon removed), rendered as `### text`.
    Heading3(String),
    /// Any other non-blank line, rendered verbatim.
    Paragraph(String),
    /// Empty line separating paragraphs.
    Blank,
}

impl Block {
    /// Markdown heading level, if this block is a heading.
    pub fn heading_level(&self) -> Option<usize> {
        match self {
            Block::Heading2(_) => Some(2),
            Block::Heading3(_) => Some(3),
            Block::Paragraph(_) | Block::Blank => None,
        }
    }

    /// Text carried by the block (empty for [`Block::Blank`]).
    pub fn text(&self) -> &str {
        match self {
            Block::Heading2(text) | Block::Heading3(text) | Block::Paragraph(text) => text,
            Block::Blank => "",
        }
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Block::Heading2(text) => write!(f, "## {}", text),
            Block::Heading3(text) => write!(f, "### {}", text),
            Block::Paragraph(text) => f.write_str(text),
            Block::Blank => Ok(()),
        }
    }
}

/// Thresholds used by the line classifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructurerConfig {
    /// Longest line (in characters) still treated as an all-caps heading.
    #[serde(default = "default_max_heading_chars")]
    pub max_heading_chars: usize,

    /// Most whitespace-separated words an all-caps heading may have.
    #[serde(default = "default_max_heading_words")]
    pub max_heading_words: usize,

    /// Colon-terminated lines must be strictly shorter than this to become headings.
    #[serde(default = "default_max_label_chars")]
    pub max_label_chars: usize,
}

impl Default for StructurerConfig {
    fn default() -> Self {
        Self {
            max_heading_chars: default_max_heading_chars(),
            max_heading_words: default_max_heading_words(),
            max_label_chars: default_max_label_chars(),
        }
    }
}

fn default_max_heading_chars() -> usize {
    100
}

fn default_max_heading_words() -> usize {
    8
}

fn default_max_label_chars() -> usize {
    80
}

/// Line-by-line text structurer.
#[derive(Debug, Clone, Default)]
pub struct Structurer {
    config: StructurerConfig,
}

impl Structurer {
    /// Create a structurer with custom thresholds.
    pub fn new(config: StructurerConfig) -> Self {
        Self { config }
    }

    /// Thresholds in use.
    pub fn config(&self) -> &StructurerConfig {
        &self.config
    }

    /// Classify every line of `raw` without rendering.
    ///
    /// `\r\n` line endings are treated as `\n`. The result has one block per
    /// input line, so text ending in a newline yields a trailing [`Block::Blank`].
    pub fn blocks(&self, raw: &str) -> Vec<Block> {
        raw.split('\n')
            .map(|line| classify_line(line.strip_suffix('\r').unwrap_or(line), &self.config))
            .collect()
    }

    /// Convert `raw` into Markdown.
    ///
    /// Total over all inputs: the empty string maps to the empty string and
    /// anything else produces newline-terminated Markdown.
    pub fn structure(&self, raw: &str) -> String {
        if raw.is_empty() {
            return String::new();
        }
        render_blocks(&self.blocks(raw))
    }
}

/// Convert `raw` into Markdown using the default thresholds.
pub fn structure(raw: &str) -> String {
    Structurer::default().structure(raw)
}

/// Classify a single line. Surrounding whitespace is ignored.
pub fn classify_line(line: &str, config: &StructurerConfig) -> Block {
    let trimmed = trim_line(line);
    if trimmed.is_empty() {
        return Block::Blank;
    }

    let length = trimmed.chars().count();

    if length <= config.max_heading_chars
        && is_shouted(trimmed)
        && trimmed.split_whitespace().count() <= config.max_heading_words
    {
        return Block::Heading2(trimmed.to_string());
    }

    if length < config.max_label_chars {
        if let Some(label) = trimmed.strip_suffix(':') {
            return Block::Heading3(label.to_string());
        }
    }

    Block::Paragraph(trimmed.to_string())
}

/// Join rendered blocks with newlines, collapse blank runs and terminate with `\n`.
pub fn render_blocks(blocks: &[Block]) -> String {
    if blocks.is_empty() {
        return String::new();
    }

    let joined = blocks
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n");

    let mut markdown = collapse_blank_lines(&joined);
    if !markdown.ends_with('\n') {
        markdown.push('\n');
    }
    markdown
}

/// Replace every run of three or more newlines with exactly two.
pub fn collapse_blank_lines(text: &str) -> String {
    static BLANK_RUN: OnceLock<Regex> = OnceLock::new();
    let pattern = BLANK_RUN.get_or_init(|| Regex::new(r"\n{3,}").unwrap());
    pattern.replace_all(text, "\n\n").into_owned()
}

/// Trim whitespace and any byte-order mark from both ends.
fn trim_line(line: &str) -> &str {
    line.trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}')
}

/// True when the line contains no lowercase ASCII letters and no underscores.
///
/// Word characters are `[A-Za-z0-9_]`; uppercase letters, digits, whitespace
/// and every non-word character (punctuation, non-ASCII) are accepted. A line
/// with no letters at all therefore counts as shouted.
fn is_shouted(line: &str) -> bool {
    !line.chars().any(|c| c.is_ascii_lowercase() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_heading2_detection() {
        assert_eq!(structure("HELLO WORLD\n"), "## HELLO WORLD\n");
    }

    #[test]
    fn test_heading3_detection() {
        assert_eq!(structure("Summary:\n"), "### Summary\n");
    }

    #[test]
    fn test_paragraph_passthrough() {
        assert_eq!(
            structure("This is a normal sentence.\n"),
            "This is a normal sentence.\n"
        );
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(structure(""), "");
    }

    #[test]
    fn test_single_line_without_newline() {
        assert_eq!(structure("just one line"), "just one line\n");
    }

    #[test]
    fn test_whitespace_only_input() {
        assert_eq!(structure("   \t "), "\n");
    }

    #[test]
    fn test_token_count_boundary() {
        let config = StructurerConfig::default();
        assert_eq!(
            classify_line("A B C D E F G H", &config),
            Block::Heading2("A B C D E F G H".to_string())
        );
        assert_eq!(
            classify_line("A B C D E F G H I", &config),
            Block::Paragraph("A B C D E F G H I".to_string())
        );
    }

    #[test]
    fn test_tokens_split_on_whitespace_runs() {
        let config = StructurerConfig::default();
        let line = "  A    B\tC  D   E F G     H  ";
        assert!(matches!(classify_line(line, &config), Block::Heading2(_)));
    }

    #[test]
    fn test_length_boundary() {
        let config = StructurerConfig::default();
        let exact = "A".repeat(100);
        let over = "A".repeat(101);
        assert_eq!(classify_line(&exact, &config), Block::Heading2(exact.clone()));
        assert_eq!(classify_line(&over, &config), Block::Paragraph(over.clone()));
    }

    #[test]
    fn test_blank_collapsing_between_paragraphs() {
        let input = "first paragraph\n\n\n\nsecond paragraph";
        assert_eq!(structure(input), "first paragraph\n\nsecond paragraph\n");
    }

    #[test]
    fn test_trailing_newline_not_duplicated() {
        let out = structure("Hello there.\n");
        assert_eq!(out, "Hello there.\n");
        assert!(!out.ends_with("\n\n"));
    }

    #[test]
    fn test_crlf_line_endings() {
        assert_eq!(
            structure("TITLE\r\nsome text\r\n"),
            "## TITLE\nsome text\n"
        );
    }

    #[test]
    fn test_punctuation_only_line_is_heading() {
        // No letters at all still passes the all-caps test.
        assert_eq!(structure("--- * ---\n"), "## --- * ---\n");
        assert_eq!(structure("2024\n"), "## 2024\n");
    }

    #[test]
    fn test_underscore_disqualifies_heading2() {
        let config = StructurerConfig::default();
        assert_eq!(
            classify_line("MAX_VALUE", &config),
            Block::Paragraph("MAX_VALUE".to_string())
        );
    }

    #[test]
    fn test_non_ascii_uppercase_heading() {
        assert_eq!(structure("RÉSUMÉ\n"), "## RÉSUMÉ\n");
    }

    #[test]
    fn test_priority_heading2_over_heading3() {
        // Shouted lines keep their colon.
        assert_eq!(structure("NOTES:\n"), "## NOTES:\n");
    }

    #[test]
    fn test_colon_stripped_once() {
        assert_eq!(structure("Ratio::\n"), "### Ratio:\n");
    }

    #[test]
    fn test_long_colon_line_is_paragraph() {
        let config = StructurerConfig::default();
        let line = format!("{}:", "x".repeat(79));
        assert_eq!(line.chars().count(), 80);
        assert_eq!(classify_line(&line, &config), Block::Paragraph(line.clone()));

        let shorter = format!("{}:", "x".repeat(78));
        assert_eq!(
            classify_line(&shorter, &config),
            Block::Heading3("x".repeat(78))
        );
    }

    #[test]
    fn test_lines_are_trimmed() {
        assert_eq!(
            structure("   indented text   \n\tKey terms:  \n"),
            "indented text\n### Key terms\n"
        );
    }

    #[test]
    fn test_byte_order_mark_trimmed() {
        assert_eq!(structure("\u{feff}CONTENTS\n"), "## CONTENTS\n");
    }

    #[test]
    fn test_blocks_keep_one_entry_per_line() {
        let blocks = Structurer::default().blocks("INTRO\n\nBody text.\n");
        assert_eq!(
            blocks,
            vec![
                Block::Heading2("INTRO".to_string()),
                Block::Blank,
                Block::Paragraph("Body text.".to_string()),
                Block::Blank,
            ]
        );
    }

    #[test]
    fn test_custom_thresholds() {
        let structurer = Structurer::new(StructurerConfig {
            max_heading_chars: 100,
            max_heading_words: 2,
            max_label_chars: 80,
        });
        assert_eq!(structurer.structure("ONE TWO THREE"), "ONE TWO THREE\n");
        assert_eq!(structurer.structure("ONE TWO"), "## ONE TWO\n");
    }

    #[test]
    fn test_block_serialization() {
        let json = serde_json::to_string(&Block::Heading3("Summary".to_string())).unwrap();
        assert_eq!(json, r#"{"type":"heading3","text":"Summary"}"#);
        let blank = serde_json::to_string(&Block::Blank).unwrap();
        assert_eq!(blank, r#"{"type":"blank"}"#);
    }

    #[test]
    fn test_heading_level() {
        assert_eq!(Block::Heading2("A".into()).heading_level(), Some(2));
        assert_eq!(Block::Heading3("a".into()).heading_level(), Some(3));
        assert_eq!(Block::Paragraph("a".into()).heading_level(), None);
        assert_eq!(Block::Blank.heading_level(), None);
    }

    proptest! {
        #[test]
        fn prop_collapse_is_idempotent(s in "[a\\n ]{0,40}") {
            let once = collapse_blank_lines(&s);
            prop_assert_eq!(collapse_blank_lines(&once), once.clone());
        }

        #[test]
        fn prop_output_has_no_triple_newline(s in "(?s).{0,200}") {
            let out = structure(&s);
            prop_assert!(!out.contains("\n\n\n"));
        }

        #[test]
        fn prop_nonempty_output_is_newline_terminated(s in "(?s).{1,200}") {
            prop_assert!(structure(&s).ends_with('\n'));
        }
    }
}
