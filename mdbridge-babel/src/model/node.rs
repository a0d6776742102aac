//! The editor document tree.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Type-specific node or mark attributes. Key order is irrelevant for equality.
pub type Attrs = serde_json::Map<String, Value>;

/// Node type names of the built-in vocabulary.
pub mod node_types {
    pub const DOC: &str = "doc";
    pub const PARAGRAPH: &str = "paragraph";
    pub const HEADING: &str = "heading";
    pub const BLOCKQUOTE: &str = "blockquote";
    pub const BULLET_LIST: &str = "bulletList";
    pub const ORDERED_LIST: &str = "orderedList";
    pub const TASK_LIST: &str = "taskList";
    pub const LIST_ITEM: &str = "listItem";
    pub const TASK_ITEM: &str = "taskItem";
    pub const CODE_BLOCK: &str = "codeBlock";
    pub const HORIZONTAL_RULE: &str = "horizontalRule";
    pub const IMAGE: &str = "image";
    pub const TABLE: &str = "table";
    pub const TABLE_ROW: &str = "tableRow";
    pub const TABLE_HEADER: &str = "tableHeader";
    pub const TABLE_CELL: &str = "tableCell";
    pub const TEXT: &str = "text";
    pub const HARD_BREAK: &str = "hardBreak";
}

/// Mark type names of the built-in vocabulary.
pub mod mark_types {
    pub const BOLD: &str = "bold";
    pub const ITALIC: &str = "italic";
    pub const STRIKE: &str = "strike";
    pub const CODE: &str = "code";
    pub const LINK: &str = "link";
}

/// A node of the editor document tree.
///
/// Container nodes carry `content`; text leaves carry `text` and `marks`.
/// Attributes are opaque to the conversion drivers and only interpreted by the
/// rule that owns the node type.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DocumentNode {
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default, skip_serializing_if = "Attrs::is_empty")]
    pub attrs: Attrs,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub marks: Vec<Mark>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<DocumentNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// An inline annotation attached to a text leaf (bold, link, ...).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Mark {
    #[serde(rename = "type")]
    pub mark_type: String,
    #[serde(default, skip_serializing_if = "Attrs::is_empty")]
    pub attrs: Attrs,
}

impl Mark {
    pub fn new(mark_type: impl Into<String>) -> Self {
        Mark {
            mark_type: mark_type.into(),
            attrs: Attrs::new(),
        }
    }

    /// A link mark; `title` is stored as `null` when absent.
    pub fn link(href: impl Into<String>, title: Option<String>) -> Self {
        Mark::new(mark_types::LINK)
            .with_attr("href", Value::String(href.into()))
            .with_attr("title", title.map(Value::String).unwrap_or(Value::Null))
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    pub fn is(&self, mark_type: &str) -> bool {
        self.mark_type == mark_type
    }

    pub fn attr_str(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).and_then(Value::as_str)
    }
}

impl DocumentNode {
    pub fn new(node_type: impl Into<String>) -> Self {
        DocumentNode {
            node_type: node_type.into(),
            ..Default::default()
        }
    }

    pub fn doc(content: Vec<DocumentNode>) -> Self {
        DocumentNode::new(node_types::DOC).with_content(content)
    }

    pub fn paragraph(content: Vec<DocumentNode>) -> Self {
        DocumentNode::new(node_types::PARAGRAPH).with_content(content)
    }

    pub fn heading(level: u8, content: Vec<DocumentNode>) -> Self {
        DocumentNode::new(node_types::HEADING)
            .with_attr("level", level)
            .with_content(content)
    }

    pub fn code_block(language: Option<&str>, code: &str) -> Self {
        let node = DocumentNode::new(node_types::CODE_BLOCK).with_attr(
            "language",
            language.map(|l| Value::String(l.to_string())).unwrap_or(Value::Null),
        );
        if code.is_empty() {
            node
        } else {
            node.with_content(vec![DocumentNode::text(code)])
        }
    }

    /// A plain text leaf.
    pub fn text(text: impl Into<String>) -> Self {
        DocumentNode {
            node_type: node_types::TEXT.to_string(),
            text: Some(text.into()),
            ..Default::default()
        }
    }

    /// A text leaf carrying marks, outermost first.
    pub fn marked_text(text: impl Into<String>, marks: Vec<Mark>) -> Self {
        DocumentNode {
            marks,
            ..DocumentNode::text(text)
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    pub fn with_content(mut self, content: Vec<DocumentNode>) -> Self {
        self.content = content;
        self
    }

    pub fn with_marks(mut self, marks: Vec<Mark>) -> Self {
        self.marks = marks;
        self
    }

    pub fn is(&self, node_type: &str) -> bool {
        self.node_type == node_type
    }

    pub fn is_text(&self) -> bool {
        self.node_type == node_types::TEXT
    }

    pub fn attr(&self, key: &str) -> Option<&Value> {
        self.attrs.get(key)
    }

    /// String attribute, `None` when missing, null or not a string.
    pub fn attr_str(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).and_then(Value::as_str)
    }

    pub fn attr_u64(&self, key: &str) -> Option<u64> {
        self.attrs.get(key).and_then(Value::as_u64)
    }

    pub fn attr_bool(&self, key: &str) -> Option<bool> {
        self.attrs.get(key).and_then(Value::as_bool)
    }

    pub fn has_mark(&self, mark_type: &str) -> bool {
        self.marks.iter().any(|m| m.is(mark_type))
    }

    /// Concatenated text of this node and all descendants.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        if let Some(text) = &self.text {
            out.push_str(text);
        }
        for child in &self.content {
            child.collect_text(out);
        }
    }

    /// Depth-first search for the first node of the given type.
    pub fn find(&self, node_type: &str) -> Option<&DocumentNode> {
        if self.is(node_type) {
            return Some(self);
        }
        self.content.iter().find_map(|child| child.find(node_type))
    }

    /// Number of nodes of the given type in this subtree.
    pub fn count(&self, node_type: &str) -> usize {
        let own = usize::from(self.is(node_type));
        own + self.content.iter().map(|c| c.count(node_type)).sum::<usize>()
    }
}
