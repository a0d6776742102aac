//! `@user` mentions.
//!
//! A mention starts at a word boundary: `x@alice` and `bob@example.com` stay
//! plain text. The id runs over letters, digits, `_`, `-` and `.`, with
//! trailing dots left to the surrounding sentence.

use super::{ExtensionLevel, NodeExtension};
use crate::formats::markdown::parser::ParseHelpers;
use crate::formats::markdown::serializer::SerializeHelpers;
use crate::model::{DocumentNode, Token};

pub const MENTION: &str = "mention";

#[derive(Debug, Clone, Copy, Default)]
pub struct MentionExtension;

fn id_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.')
}

impl NodeExtension for MentionExtension {
    fn name(&self) -> &str {
        MENTION
    }

    fn level(&self) -> ExtensionLevel {
        ExtensionLevel::Inline
    }

    fn start(&self, source: &str) -> Option<usize> {
        source.find('@')
    }

    fn accepts_after(&self, prev: Option<char>) -> bool {
        !prev.is_some_and(|c| c.is_alphanumeric() || c == '_')
    }

    fn absorbs(&self, following: &str) -> bool {
        let end = following
            .find(|c: char| !id_char(c))
            .unwrap_or(following.len());
        !following[..end].trim_end_matches('.').is_empty()
    }

    fn tokenize(&self, source: &str) -> Option<Token> {
        let rest = source.strip_prefix('@')?;
        let first = rest.chars().next()?;
        if !(first.is_alphanumeric() || first == '_') {
            return None;
        }
        let end = rest.find(|c: char| !id_char(c)).unwrap_or(rest.len());
        let id = rest[..end].trim_end_matches('.');
        Some(Token::new(MENTION, &source[..id.len() + 1]).with_attr("id", id))
    }

    fn parse(&self, token: &Token, _helpers: &ParseHelpers<'_, '_>) -> Option<DocumentNode> {
        let id = token.attr_str("id")?;
        Some(DocumentNode::new(MENTION).with_attr("id", id))
    }

    fn serialize(&self, node: &DocumentNode, _helpers: &SerializeHelpers<'_, '_>) -> String {
        format!("@{}", node.attr_str("id").unwrap_or_default())
    }
}
