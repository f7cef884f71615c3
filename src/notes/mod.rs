//! Class / topic / notes hierarchies.
//!
//! Notes arrive as JSON in one of two shapes:
//!
//! - a hierarchy: `{"Class": "...", "Topics": {"topic": ["note", ...]}}`
//! - a graph: `{"nodes": [...], "edges": [{"from": "...", "to": "..."}]}`
//!
//! [`NotesDocument::from_json`] recognizes the shape explicitly and rejects
//! anything else instead of guessing. Both shapes convert into each other, so
//! either can be shown as a Markdown list, a heading tree or graph elements.

pub mod graph;

pub use graph::{
    EdgeData, Element, ElementKind, ElementOptions, GraphData, GraphEdge, GraphNode, NodeData,
    NodeDetails, NodeKind,
};

use crate::outline::Outline;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Result type alias for notes operations.
pub type Result<T> = std::result::Result<T, NotesError>;

#[derive(Debug, thiserror::Error)]
pub enum NotesError {
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(
        "Unrecognized notes shape: expected an object with \"Class\" and \"Topics\" or an object with \"nodes\", found {0}"
    )]
    UnrecognizedShape(&'static str),

    /// Hierarchy failed validation
    #[error("{0}")]
    Invalid(String),

    #[error("Edge {from} -> {to} references unknown node '{missing}'")]
    DanglingEdge {
        from: String,
        to: String,
        missing: String,
    },

    #[error("Duplicate node id '{0}'")]
    DuplicateNode(String),

    #[error("Node not found: {0}")]
    UnknownNode(String),

    #[error("No extensions to promote on '{0}'")]
    NoExtensions(String),
}

/// A class with its topics and their notes, in insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteSet {
    #[serde(rename = "Class")]
    pub class_name: String,

    #[serde(rename = "Topics")]
    pub topics: IndexMap<String, Vec<String>>,

    /// Source text the notes were derived from, kept for auditing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_text: Option<String>,
}

/// Recognized input shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum NotesDocument {
    Hierarchy(NoteSet),
    Graph(GraphData),
}

impl NotesDocument {
    /// Parse JSON and classify its shape.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) if map.contains_key("Class") && map.contains_key("Topics") => {
                NoteSet::from_map(&map).map(NotesDocument::Hierarchy)
            }
            Value::Object(map) if map.contains_key("nodes") => {
                let graph: GraphData = serde_json::from_value(Value::Object(map))?;
                graph.validate()?;
                Ok(NotesDocument::Graph(graph))
            }
            other => Err(NotesError::UnrecognizedShape(shape_name(&other))),
        }
    }

    /// View the document as a hierarchy.
    pub fn into_note_set(self) -> NoteSet {
        match self {
            NotesDocument::Hierarchy(notes) => notes,
            NotesDocument::Graph(graph) => graph.to_note_set(),
        }
    }

    /// View the document as a graph.
    pub fn into_graph(self) -> GraphData {
        match self {
            NotesDocument::Hierarchy(notes) => notes.to_graph(),
            NotesDocument::Graph(graph) => graph,
        }
    }
}

impl NoteSet {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            topics: IndexMap::new(),
            raw_text: None,
        }
    }

    /// Validate and read a hierarchy object.
    fn from_map(map: &Map<String, Value>) -> Result<Self> {
        let class_name = match map.get("Class") {
            Some(Value::String(name)) => name.clone(),
            _ => return Err(NotesError::Invalid("'Class' must be a string.".to_string())),
        };

        let Some(Value::Object(raw_topics)) = map.get("Topics") else {
            return Err(NotesError::Invalid(
                "'Topics' must be a dictionary.".to_string(),
            ));
        };

        let mut topics = IndexMap::with_capacity(raw_topics.len());
        for (topic, items) in raw_topics {
            let Value::Array(items) = items else {
                return Err(NotesError::Invalid(format!(
                    "Topic '{}' must have a list of notes.",
                    topic
                )));
            };
            let notes = items
                .iter()
                .map(|item| match item {
                    Value::String(note) => Ok(note.clone()),
                    _ => Err(NotesError::Invalid("All notes must be strings.".to_string())),
                })
                .collect::<Result<Vec<_>>>()?;
            topics.insert(topic.clone(), notes);
        }

        let raw_text = match map.get("raw_text") {
            Some(Value::String(text)) => Some(text.clone()),
            _ => None,
        };

        Ok(Self {
            class_name,
            topics,
            raw_text,
        })
    }

    /// Trim the class name, topic names and every note.
    ///
    /// Topics whose names collide after trimming keep the first position and
    /// the last list of notes.
    pub fn normalized(&self) -> Self {
        let mut topics = IndexMap::with_capacity(self.topics.len());
        for (topic, notes) in &self.topics {
            topics.insert(
                topic.trim().to_string(),
                notes.iter().map(|n| n.trim().to_string()).collect(),
            );
        }

        Self {
            class_name: self.class_name.trim().to_string(),
            topics,
            raw_text: self.raw_text.clone(),
        }
    }

    pub fn note_count(&self) -> usize {
        self.topics.values().map(Vec::len).sum()
    }

    /// Render the list view as Markdown.
    ///
    /// ```
    /// use smartnote::notes::NoteSet;
    ///
    /// let mut notes = NoteSet::new("C Programming");
    /// notes.topics.insert("Memory".into(), vec!["Stack".into(), "Heap".into()]);
    /// assert_eq!(notes.render_outline(), "# C Programming\n\n## Memory\n- Stack\n- Heap\n");
    /// ```
    pub fn render_outline(&self) -> String {
        let mut out = format!("# {}\n", self.class_name);
        for (topic, notes) in &self.topics {
            out.push_str(&format!("\n## {}\n", topic));
            for note in notes {
                out.push_str(&format!("- {}\n", note));
            }
        }
        out
    }

    /// Heading tree: class at level 1, topics at 2, notes at 3.
    pub fn outline(&self) -> Outline {
        let mut headings = vec![(1, self.class_name.as_str())];
        for (topic, notes) in &self.topics {
            headings.push((2, topic.as_str()));
            headings.extend(notes.iter().map(|note| (3, note.as_str())));
        }
        Outline::from_headings(headings)
    }

    /// Build the node/edge model: one class node linked to one node per topic.
    pub fn to_graph(&self) -> GraphData {
        let class_id = format!("class_{}", slug(&self.class_name));
        let mut used = std::collections::HashSet::new();
        used.insert(class_id.clone());

        let mut nodes = vec![GraphNode {
            id: class_id.clone(),
            label: self.class_name.clone(),
            kind: NodeKind::Class,
            summary: String::new(),
            extensions: Vec::new(),
        }];
        let mut edges = Vec::with_capacity(self.topics.len());

        for (topic, notes) in &self.topics {
            let base = format!("topic_{}", slug(topic));
            let mut id = base.clone();
            let mut suffix = 2;
            while !used.insert(id.clone()) {
                id = format!("{}_{}", base, suffix);
                suffix += 1;
            }

            edges.push(GraphEdge {
                from: class_id.clone(),
                to: id.clone(),
            });
            nodes.push(GraphNode {
                id,
                label: topic.clone(),
                kind: NodeKind::Topic,
                summary: String::new(),
                extensions: notes.clone(),
            });
        }

        GraphData { nodes, edges }
    }
}

/// Replace every non-alphanumeric character with `_`.
fn slug(label: &str) -> String {
    label
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}

fn shape_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object without recognized keys",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HIERARCHY: &str = r#"{
        "Class": "C Programming Concepts",
        "Topics": {
            "Pointer": ["Stores an address", "Can point to another pointer"],
            "File I/O": ["Create file pointer", "Open file"],
            "Structure": []
        }
    }"#;

    fn sample() -> NoteSet {
        NotesDocument::from_json(HIERARCHY).unwrap().into_note_set()
    }

    #[test]
    fn test_hierarchy_shape() {
        let notes = sample();
        assert_eq!(notes.class_name, "C Programming Concepts");
        let topics: Vec<_> = notes.topics.keys().cloned().collect();
        assert_eq!(topics, vec!["Pointer", "File I/O", "Structure"]);
        assert_eq!(notes.note_count(), 4);
    }

    #[test]
    fn test_graph_shape() {
        let doc = NotesDocument::from_json(
            r#"{"nodes": [{"id": "c", "label": "Class", "type": "class"}, {"id": "t", "label": "Topic"}],
                "edges": [{"from": "c", "to": "t"}]}"#,
        )
        .unwrap();
        let NotesDocument::Graph(graph) = doc else {
            panic!("expected graph");
        };
        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.nodes[1].kind, NodeKind::Topic);
    }

    #[test]
    fn test_unrecognized_shapes_fail_closed() {
        for json in [r#""just text""#, r#"["a", "b"]"#, r#"{"Class": "x"}"#, "42", "null"] {
            let err = NotesDocument::from_json(json).unwrap_err();
            assert!(
                matches!(err, NotesError::UnrecognizedShape(_)),
                "{json} gave {err}"
            );
        }
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            NotesDocument::from_json("{not json"),
            Err(NotesError::Json(_))
        ));
    }

    #[test]
    fn test_validation_messages() {
        let cases = [
            (r#"{"Class": "c", "Topics": []}"#, "'Topics' must be a dictionary."),
            (
                r#"{"Class": "c", "Topics": {"t": "note"}}"#,
                "Topic 't' must have a list of notes.",
            ),
            (
                r#"{"Class": "c", "Topics": {"t": ["ok", 3]}}"#,
                "All notes must be strings.",
            ),
            (r#"{"Class": 1, "Topics": {}}"#, "'Class' must be a string."),
        ];
        for (json, message) in cases {
            let err = NotesDocument::from_json(json).unwrap_err();
            assert_eq!(err.to_string(), message);
        }
    }

    #[test]
    fn test_normalized_trims_everything() {
        let doc = NotesDocument::from_json(
            r#"{"Class": "  Biology ", "Topics": {" Cells ": ["  nucleus ", "wall"]}, "raw_text": "src"}"#,
        )
        .unwrap();
        let notes = doc.into_note_set().normalized();
        assert_eq!(notes.class_name, "Biology");
        assert_eq!(notes.topics["Cells"], vec!["nucleus", "wall"]);
        assert_eq!(notes.raw_text.as_deref(), Some("src"));
    }

    #[test]
    fn test_render_outline() {
        let expected = "\
# C Programming Concepts

## Pointer
- Stores an address
- Can point to another pointer

## File I/O
- Create file pointer
- Open file

## Structure
";
        assert_eq!(sample().render_outline(), expected);
    }

    #[test]
    fn test_outline_tree() {
        let tree = sample().outline().render_box_tree();
        assert!(tree.starts_with("└── C Programming Concepts\n    ├── Pointer\n    │   ├── Stores an address\n"));
        assert!(tree.ends_with("    └── Structure\n"));
    }

    #[test]
    fn test_to_graph_ids_and_edges() {
        let graph = sample().to_graph();
        let ids: Vec<_> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "class_C_Programming_Concepts",
                "topic_Pointer",
                "topic_File_I_O",
                "topic_Structure"
            ]
        );
        assert_eq!(graph.edges.len(), 3);
        assert!(graph.edges.iter().all(|e| e.from == "class_C_Programming_Concepts"));
        assert_eq!(graph.nodes[1].extensions.len(), 2);
        graph.validate().unwrap();
    }

    #[test]
    fn test_to_graph_deduplicates_ids() {
        let mut notes = NoteSet::new("Class");
        notes.topics.insert("a b".into(), vec![]);
        notes.topics.insert("a-b".into(), vec![]);
        notes.topics.insert("a_b".into(), vec![]);
        let graph = notes.to_graph();
        let ids: Vec<_> = graph.nodes.iter().skip(1).map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["topic_a_b", "topic_a_b_2", "topic_a_b_3"]);
    }

    #[test]
    fn test_serializes_with_capitalized_keys() {
        let json = serde_json::to_value(sample()).unwrap();
        assert!(json.get("Class").is_some());
        assert!(json.get("Topics").is_some());
        assert!(json.get("raw_text").is_none());
    }
}
