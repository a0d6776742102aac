//! Import post-passes over a freshly parsed tree.
//!
//! Transforms take the tree by value and return the rewritten tree. They only
//! touch nodes they are certain about; anything else passes through unchanged.

use crate::extensions::diagram::DIAGRAM;
use crate::model::{node_types, DocumentNode};
use tracing::debug;

/// Fenced-code languages rewritten into `diagram` nodes.
pub const DIAGRAM_LANGUAGES: [&str; 5] = ["mermaid", "plantuml", "graphviz", "dot", "d2"];

/// Rewrite fenced code in a diagram language into `diagram` nodes.
///
/// A block is rewritten only when its language is one of
/// [`DIAGRAM_LANGUAGES`] (case-insensitive) and its body is not blank.
pub fn transform_diagrams(doc: DocumentNode) -> DocumentNode {
    let mut rewritten = 0usize;
    let doc = rewrite(doc, &mut rewritten);
    if rewritten > 0 {
        debug!(count = rewritten, "rewrote fenced code into diagram nodes");
    }
    doc
}

fn rewrite(mut node: DocumentNode, rewritten: &mut usize) -> DocumentNode {
    if node.is(node_types::CODE_BLOCK) {
        if let Some(language) = diagram_language(&node) {
            let code = node.text_content();
            if !code.trim().is_empty() {
                *rewritten += 1;
                return DocumentNode::new(DIAGRAM)
                    .with_attr("language", language)
                    .with_attr("code", code);
            }
        }
        return node;
    }
    node.content = std::mem::take(&mut node.content)
        .into_iter()
        .map(|child| rewrite(child, rewritten))
        .collect();
    node
}

fn diagram_language(node: &DocumentNode) -> Option<String> {
    let language = node.attr_str("language")?.trim().to_lowercase();
    DIAGRAM_LANGUAGES
        .contains(&language.as_str())
        .then_some(language)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrites_nested_diagram_fences() {
        let doc = DocumentNode::doc(vec![DocumentNode::new(node_types::BLOCKQUOTE)
            .with_content(vec![DocumentNode::code_block(
                Some("Mermaid"),
                "graph TD\nA-->B",
            )])]);
        let doc = transform_diagrams(doc);
        let diagram = doc.find(DIAGRAM).expect("diagram");
        assert_eq!(diagram.attr_str("language"), Some("mermaid"));
        assert_eq!(diagram.attr_str("code"), Some("graph TD\nA-->B"));
        assert!(diagram.content.is_empty());
    }

    #[test]
    fn leaves_other_code_alone() {
        let doc = DocumentNode::doc(vec![
            DocumentNode::code_block(Some("rust"), "fn main() {}"),
            DocumentNode::code_block(Some("d2"), "  \n"),
            DocumentNode::code_block(None, "a -> b"),
        ]);
        assert_eq!(transform_diagrams(doc.clone()), doc);
    }
}
