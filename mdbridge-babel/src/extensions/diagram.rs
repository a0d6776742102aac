//! Diagram blocks (mermaid, plantuml, graphviz, d2).
//!
//! Never produced by the tokenizer: diagrams come from the import transform,
//! which rewrites fenced code in a diagram language. On export they go back to
//! an ordinary fenced code block so any Markdown reader can show the source.

use super::{ExtensionLevel, NodeExtension};
use crate::formats::markdown::parser::ParseHelpers;
use crate::formats::markdown::serializer::SerializeHelpers;
use crate::model::{DocumentNode, Token};

pub const DIAGRAM: &str = "diagram";

#[derive(Debug, Clone, Copy, Default)]
pub struct DiagramExtension;

impl NodeExtension for DiagramExtension {
    fn name(&self) -> &str {
        DIAGRAM
    }

    fn level(&self) -> ExtensionLevel {
        ExtensionLevel::Block
    }

    fn parse(&self, token: &Token, _helpers: &ParseHelpers<'_, '_>) -> Option<DocumentNode> {
        Some(
            DocumentNode::new(DIAGRAM)
                .with_attr("language", token.attr_str("language")?)
                .with_attr("code", token.attr_str("code")?),
        )
    }

    fn serialize(&self, node: &DocumentNode, _helpers: &SerializeHelpers<'_, '_>) -> String {
        let language = node.attr_str("language").unwrap_or_default();
        let code = node.attr_str("code").unwrap_or_default().trim_end_matches('\n');
        let longest = code
            .split(|c: char| c != '`')
            .map(str::len)
            .max()
            .unwrap_or(0);
        let fence = "`".repeat((longest + 1).max(3));
        if code.is_empty() {
            format!("{fence}{language}\n{fence}")
        } else {
            format!("{fence}{language}\n{code}\n{fence}")
        }
    }
}
