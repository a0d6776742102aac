//! Markdown parsing (Markdown → document tree)
//!
//! Two passes per scope. The block tokenizer walks the source with a single
//! cursor and produces a flat token stream, asking registered block extensions
//! first and the built-in rules second. The reducer then turns tokens into
//! nodes, dispatching custom kinds to their extension and built-in kinds to the
//! reducers in [`block`]. Inline text is scanned by [`inline`] the same way.
//!
//! Parsing is total: every input produces a `doc` node.

pub mod block;
pub mod inline;

use crate::extensions::ExtensionRegistry;
use crate::model::{DocumentNode, Token};

/// Nesting depth past which containers are read as plain paragraphs.
pub(crate) const MAX_DEPTH: usize = 64;

/// Parse Markdown into a `doc` node using the given extensions.
pub fn parse_markdown(source: &str, registry: &ExtensionRegistry) -> DocumentNode {
    MarkdownParser::new(registry).parse(source)
}

/// Block and inline parser bound to one extension registry.
pub struct MarkdownParser<'r> {
    registry: &'r ExtensionRegistry,
}

impl<'r> MarkdownParser<'r> {
    pub fn new(registry: &'r ExtensionRegistry) -> Self {
        MarkdownParser { registry }
    }

    pub fn registry(&self) -> &'r ExtensionRegistry {
        self.registry
    }

    pub fn parse(&self, source: &str) -> DocumentNode {
        let source = normalize_newlines(source);
        let tokens = self.tokenize_blocks(&source, 0);
        let mut content = self.reduce_blocks(&tokens, 0);
        if content.is_empty() {
            content.push(DocumentNode::paragraph(Vec::new()));
        }
        DocumentNode::doc(content)
    }

    /// Parse a run of inline Markdown.
    pub fn parse_inline(&self, text: &str) -> Vec<DocumentNode> {
        inline::InlineParser::new(self, text).parse()
    }
}

/// Recursion handle passed to extension parsers.
pub struct ParseHelpers<'p, 'r> {
    parser: &'p MarkdownParser<'r>,
    depth: usize,
}

impl<'p, 'r> ParseHelpers<'p, 'r> {
    pub(crate) fn new(parser: &'p MarkdownParser<'r>, depth: usize) -> Self {
        ParseHelpers { parser, depth }
    }

    /// Reduce nested block tokens through the same dispatch table.
    pub fn parse_children(&self, tokens: &[Token]) -> Vec<DocumentNode> {
        self.parser.reduce_blocks(tokens, self.depth + 1)
    }

    /// Tokenize and reduce a nested block source.
    pub fn parse_blocks(&self, source: &str) -> Vec<DocumentNode> {
        let tokens = self.parser.tokenize_blocks(source, self.depth + 1);
        self.parser.reduce_blocks(&tokens, self.depth + 1)
    }

    pub fn parse_inline(&self, text: &str) -> Vec<DocumentNode> {
        self.parser.parse_inline(text)
    }

    pub fn depth(&self) -> usize {
        self.depth
    }
}

fn normalize_newlines(source: &str) -> String {
    if source.contains('\r') {
        source.replace("\r\n", "\n").replace('\r', "\n")
    } else {
        source.to_string()
    }
}
