//! Heading outlines.
//!
//! Builds a tree out of a flat list of `(level, text)` headings. Each heading
//! becomes a child of the nearest preceding heading with a lower level. The tree
//! lives in an [`indextree`] arena so it can be walked without reference cycles.

use indextree::{Arena, NodeId};

/// A heading stored in the outline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineEntry {
    pub level: usize,
    pub text: String,
}

/// Heading hierarchy of a document.
#[derive(Debug, Clone, Default)]
pub struct Outline {
    arena: Arena<OutlineEntry>,
    roots: Vec<NodeId>,
}

impl Outline {
    /// Build an outline from headings in document order.
    pub fn from_headings<I, S>(headings: I) -> Self
    where
        I: IntoIterator<Item = (usize, S)>,
        S: Into<String>,
    {
        let mut arena = Arena::new();
        let mut roots = Vec::new();
        let mut stack: Vec<(usize, NodeId)> = Vec::new();

        for (level, text) in headings {
            let node = arena.new_node(OutlineEntry {
                level,
                text: text.into(),
            });

            while stack.last().is_some_and(|(open, _)| *open >= level) {
                stack.pop();
            }

            match stack.last() {
                Some((_, parent)) => parent.append(node, &mut arena),
                None => roots.push(node),
            }
            stack.push((level, node));
        }

        Self { arena, roots }
    }

    /// Build an outline from the ATX headings (`#` .. `######`) of a Markdown text.
    pub fn from_markdown(markdown: &str) -> Self {
        Self::from_headings(markdown.lines().filter_map(|line| {
            let level = heading_level(line)?;
            Some((level, line.trim_start()[level..].trim()))
        }))
    }

    /// Number of headings in the outline.
    pub fn len(&self) -> usize {
        self.arena.count()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Top-level headings, in order.
    pub fn roots(&self) -> Vec<&OutlineEntry> {
        self.roots.iter().map(|id| self.entry(*id)).collect()
    }

    /// Direct children of the `index`-th root heading.
    pub fn children_of_root(&self, index: usize) -> Vec<&OutlineEntry> {
        self.roots
            .get(index)
            .map(|root| {
                root.children(&self.arena)
                    .map(|child| self.entry(child))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Render the outline with box-drawing connectors, one heading per line.
    pub fn render_box_tree(&self) -> String {
        let mut out = String::new();
        for (i, root) in self.roots.iter().enumerate() {
            let is_last = i == self.roots.len() - 1;
            self.render_node(*root, "", is_last, &mut out);
        }
        out
    }

    fn render_node(&self, id: NodeId, prefix: &str, is_last: bool, out: &mut String) {
        let connector = if is_last { "└── " } else { "├── " };
        out.push_str(prefix);
        out.push_str(connector);
        out.push_str(&self.entry(id).text);
        out.push('\n');

        let child_prefix = format!("{}{}", prefix, if is_last { "    " } else { "│   " });
        let children: Vec<NodeId> = id.children(&self.arena).collect();
        for (i, child) in children.iter().enumerate() {
            self.render_node(*child, &child_prefix, i == children.len() - 1, out);
        }
    }

    fn entry(&self, id: NodeId) -> &OutlineEntry {
        self.arena[id].get()
    }
}

/// Heading level of an ATX heading line: 1-6 `#`s followed by whitespace.
///
/// ```
/// # use smartnote::outline::heading_level;
/// assert_eq!(heading_level("## Section"), Some(2));
/// assert_eq!(heading_level("#NoSpace"), None);
/// assert_eq!(heading_level("####### Too deep"), None);
/// ```
pub fn heading_level(line: &str) -> Option<usize> {
    let trimmed = line.trim_start();
    let level = trimmed.chars().take_while(|c| *c == '#').count();
    let rest = &trimmed[level..];

    if (1..=6).contains(&level) && rest.starts_with(char::is_whitespace) {
        Some(level)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nesting_follows_levels() {
        let outline = Outline::from_headings(vec![
            (1, "Course"),
            (2, "Pointers"),
            (3, "Double pointers"),
            (2, "Memory"),
            (1, "Appendix"),
        ]);

        assert_eq!(outline.len(), 5);
        let roots: Vec<_> = outline.roots().iter().map(|e| e.text.clone()).collect();
        assert_eq!(roots, vec!["Course", "Appendix"]);

        let children: Vec<_> = outline
            .children_of_root(0)
            .iter()
            .map(|e| e.text.clone())
            .collect();
        assert_eq!(children, vec!["Pointers", "Memory"]);
    }

    #[test]
    fn test_render_box_tree() {
        let outline = Outline::from_headings(vec![
            (1, "Course"),
            (2, "Pointers"),
            (3, "Double pointers"),
            (2, "Memory"),
        ]);

        let expected = "\
└── Course
    ├── Pointers
    │   └── Double pointers
    └── Memory
";
        assert_eq!(outline.render_box_tree(), expected);
    }

    #[test]
    fn test_deeper_first_heading_is_root() {
        let outline = Outline::from_headings(vec![(3, "Orphan"), (2, "Section")]);
        assert_eq!(outline.roots().len(), 2);
    }

    #[test]
    fn test_from_markdown_skips_paragraphs() {
        let markdown = "## INTRO\ntext\n### Details\n\n## END\n#hashtag\n";
        let outline = Outline::from_markdown(markdown);
        assert_eq!(outline.len(), 3);
        assert_eq!(
            outline.render_box_tree(),
            "├── INTRO\n│   └── Details\n└── END\n"
        );
    }

    #[test]
    fn test_heading_level() {
        assert_eq!(heading_level("# Title"), Some(1));
        assert_eq!(heading_level("###### Six"), Some(6));
        assert_eq!(heading_level("  ## Indented"), Some(2));
        assert_eq!(heading_level("not a heading"), None);
        assert_eq!(heading_level("#"), None);
    }

    #[test]
    fn test_empty_outline() {
        let outline = Outline::from_markdown("just a paragraph\n");
        assert!(outline.is_empty());
        assert_eq!(outline.render_box_tree(), "");
    }
}
