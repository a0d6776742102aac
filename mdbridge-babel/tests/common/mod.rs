//! Shared helpers for the integration tests.

use mdbridge_babel::extensions::ExtensionRegistry;
use mdbridge_babel::flavor::Flavor;
use mdbridge_babel::formats::markdown::{parse_markdown, serialize_markdown};
use mdbridge_babel::model::DocumentNode;

pub fn registry() -> ExtensionRegistry {
    ExtensionRegistry::with_defaults()
}

pub fn parse(source: &str) -> DocumentNode {
    parse_markdown(source, &registry())
}

pub fn export(doc: &DocumentNode, flavor: Flavor) -> String {
    serialize_markdown(doc, &registry(), flavor.config())
}

/// Parse, serialize under `flavor`, parse again.
pub fn reparse(source: &str, flavor: Flavor) -> (DocumentNode, String, DocumentNode) {
    let first = parse(source);
    let text = export(&first, flavor);
    let second = parse(&text);
    (first, text, second)
}

pub fn text(s: &str) -> DocumentNode {
    DocumentNode::text(s)
}

pub fn paragraph(s: &str) -> DocumentNode {
    DocumentNode::paragraph(vec![text(s)])
}
