//! Table-of-contents placeholder: a line holding `[[toc]]` or `[toc]`.

use super::{ExtensionLevel, NodeExtension};
use crate::formats::markdown::parser::ParseHelpers;
use crate::formats::markdown::serializer::SerializeHelpers;
use crate::model::{DocumentNode, Token};

pub const TABLE_OF_CONTENTS: &str = "tableOfContents";

#[derive(Debug, Clone, Copy, Default)]
pub struct TableOfContentsExtension;

fn is_marker(line: &str) -> bool {
    let trimmed = line.trim_start_matches(' ');
    if line.len() - trimmed.len() > 3 {
        return false;
    }
    let trimmed = trimmed.trim_end();
    trimmed.eq_ignore_ascii_case("[[toc]]") || trimmed.eq_ignore_ascii_case("[toc]")
}

impl NodeExtension for TableOfContentsExtension {
    fn name(&self) -> &str {
        TABLE_OF_CONTENTS
    }

    fn level(&self) -> ExtensionLevel {
        ExtensionLevel::Block
    }

    fn start(&self, source: &str) -> Option<usize> {
        let mut offset = 0;
        for line in source.split_inclusive('\n') {
            if is_marker(line) {
                return Some(offset);
            }
            offset += line.len();
        }
        None
    }

    fn tokenize(&self, source: &str) -> Option<Token> {
        let end = source.find('\n').map_or(source.len(), |i| i + 1);
        is_marker(&source[..end]).then(|| Token::new(TABLE_OF_CONTENTS, &source[..end]))
    }

    fn parse(&self, _token: &Token, _helpers: &ParseHelpers<'_, '_>) -> Option<DocumentNode> {
        Some(DocumentNode::new(TABLE_OF_CONTENTS))
    }

    fn serialize(&self, _node: &DocumentNode, _helpers: &SerializeHelpers<'_, '_>) -> String {
        "[[toc]]".to_string()
    }
}
