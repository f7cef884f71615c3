//! Node/edge model for the graph view.
//!
//! [`GraphData`] is the input/output model (`nodes` + `edges`). [`Element`]s are
//! what a graph renderer consumes: every node and edge wrapped in `{"data": ...}`,
//! optionally with one small node per extension hanging off its topic.

use super::{NoteSet, NotesError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

const EXTENSION_SEPARATOR: &str = "::ext::";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphData {
    pub nodes: Vec<GraphNode>,
    #[serde(default)]
    pub edges: Vec<GraphEdge>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    #[serde(rename = "type", default)]
    pub kind: NodeKind,
    /// Concise main note.
    #[serde(default)]
    pub summary: String,
    /// Individual notes attached to the node.
    #[serde(default)]
    pub extensions: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Class,
    #[default]
    Topic,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub from: String,
    pub to: String,
}

/// How to expand the graph into elements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ElementOptions {
    /// Add one node per extension, linked to its topic.
    pub extension_nodes: bool,
    /// Leave extension nodes out even when `extension_nodes` is set.
    pub minimal: bool,
}

/// A renderable graph element.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Element {
    Node { data: NodeData },
    Edge { data: EdgeData },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Class,
    Topic,
    Extension,
}

impl From<NodeKind> for ElementKind {
    fn from(kind: NodeKind) -> Self {
        match kind {
            NodeKind::Class => ElementKind::Class,
            NodeKind::Topic => ElementKind::Topic,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeData {
    pub id: String,
    pub label: String,
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Vec<String>>,
    #[serde(rename = "type")]
    pub kind: ElementKind,
    #[serde(rename = "parentTopicId", skip_serializing_if = "Option::is_none")]
    pub parent_topic_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EdgeData {
    pub id: String,
    pub source: String,
    pub target: String,
}

/// What the detail panel shows for a selected element.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeDetails {
    pub label: String,
    pub summary: String,
    pub extensions: Vec<String>,
    /// Node to highlight: the node itself, or the parent topic of an extension.
    pub highlight: String,
}

impl GraphData {
    /// Check that node ids are unique and every edge joins existing nodes.
    pub fn validate(&self) -> Result<()> {
        let mut ids = HashSet::with_capacity(self.nodes.len());
        for node in &self.nodes {
            if !ids.insert(node.id.as_str()) {
                return Err(NotesError::DuplicateNode(node.id.clone()));
            }
        }

        for edge in &self.edges {
            for end in [&edge.from, &edge.to] {
                if !ids.contains(end.as_str()) {
                    return Err(NotesError::DanglingEdge {
                        from: edge.from.clone(),
                        to: edge.to.clone(),
                        missing: end.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Expand into renderer elements: nodes first (each followed by its
    /// extension nodes when enabled), then the graph edges in input order.
    pub fn elements(&self, options: ElementOptions) -> Vec<Element> {
        let show_extensions = options.extension_nodes && !options.minimal;
        let mut elements = Vec::new();

        for node in &self.nodes {
            elements.push(Element::Node {
                data: NodeData {
                    id: node.id.clone(),
                    label: node.label.clone(),
                    summary: node.summary.clone(),
                    extensions: Some(node.extensions.clone()),
                    kind: node.kind.into(),
                    parent_topic_id: None,
                },
            });

            if !show_extensions {
                continue;
            }
            for (i, extension) in node.extensions.iter().enumerate() {
                let ext_id = format!("{}{}{}", node.id, EXTENSION_SEPARATOR, i);
                elements.push(Element::Node {
                    data: NodeData {
                        id: ext_id.clone(),
                        label: format!("ex{}", i + 1),
                        summary: extension.clone(),
                        extensions: None,
                        kind: ElementKind::Extension,
                        parent_topic_id: Some(node.id.clone()),
                    },
                });
                elements.push(Element::Edge {
                    data: EdgeData {
                        id: format!("e_{}_{}", node.id, ext_id),
                        source: node.id.clone(),
                        target: ext_id,
                    },
                });
            }
        }

        for (idx, edge) in self.edges.iter().enumerate() {
            elements.push(Element::Edge {
                data: EdgeData {
                    id: format!("edge_{}", idx),
                    source: edge.from.clone(),
                    target: edge.to.clone(),
                },
            });
        }

        elements
    }

    /// Nodes whose label, summary or extensions contain `query` (case-insensitive).
    pub fn search(&self, query: &str) -> Vec<&GraphNode> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        let hit = |text: &str| text.to_lowercase().contains(&needle);
        self.nodes
            .iter()
            .filter(|node| {
                hit(node.label.as_str())
                    || hit(node.summary.as_str())
                    || node.extensions.iter().any(|e| hit(e.as_str()))
            })
            .collect()
    }

    /// Details for a node id or an extension element id (`<topic>::ext::<n>`).
    pub fn details(&self, id: &str) -> Result<NodeDetails> {
        if let Some(node) = self.node(id) {
            return Ok(NodeDetails {
                label: node.label.clone(),
                summary: node.summary.clone(),
                extensions: node.extensions.clone(),
                highlight: node.id.clone(),
            });
        }

        let (parent, index) = id
            .rsplit_once(EXTENSION_SEPARATOR)
            .and_then(|(parent, index)| Some((parent, index.parse::<usize>().ok()?)))
            .ok_or_else(|| NotesError::UnknownNode(id.to_string()))?;

        let extension = self
            .node(parent)
            .and_then(|node| node.extensions.get(index))
            .ok_or_else(|| NotesError::UnknownNode(id.to_string()))?;

        Ok(NodeDetails {
            label: "Extension".to_string(),
            summary: extension.clone(),
            extensions: Vec::new(),
            highlight: parent.to_string(),
        })
    }

    /// Replace the summary of the node labelled `label` with its first extension.
    pub fn promote_first_extension(&mut self, label: &str) -> Result<&GraphNode> {
        let node = self
            .nodes
            .iter_mut()
            .find(|n| n.label == label)
            .ok_or_else(|| NotesError::UnknownNode(label.to_string()))?;

        let first = node
            .extensions
            .first()
            .cloned()
            .ok_or_else(|| NotesError::NoExtensions(label.to_string()))?;
        node.summary = first;
        Ok(node)
    }

    /// Collapse the graph back into a hierarchy.
    ///
    /// The first class node names the class ("Untitled" when there is none);
    /// every topic node becomes a topic with its extensions as notes.
    pub fn to_note_set(&self) -> NoteSet {
        let class_name = self
            .nodes
            .iter()
            .find(|n| n.kind == NodeKind::Class)
            .map(|n| n.label.clone())
            .unwrap_or_else(|| "Untitled".to_string());

        let mut notes = NoteSet::new(class_name);
        for node in self.nodes.iter().filter(|n| n.kind == NodeKind::Topic) {
            notes
                .topics
                .insert(node.label.clone(), node.extensions.clone());
        }
        notes
    }
}
