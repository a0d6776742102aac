//! `[[target]]` and `[[target|alias]]` links.
//!
//! Flavors without wiki links get a standard inline link instead, which reads
//! back as a `link` mark rather than a `wikiLink` node.

use super::{ExtensionLevel, NodeExtension};
use crate::formats::markdown::parser::ParseHelpers;
use crate::formats::markdown::serializer::{escape_text, format_destination, SerializeHelpers};
use crate::model::{DocumentNode, Token};

pub const WIKI_LINK: &str = "wikiLink";

#[derive(Debug, Clone, Copy, Default)]
pub struct WikiLinkExtension;

impl NodeExtension for WikiLinkExtension {
    fn name(&self) -> &str {
        WIKI_LINK
    }

    fn level(&self) -> ExtensionLevel {
        ExtensionLevel::Inline
    }

    fn start(&self, source: &str) -> Option<usize> {
        source.find("[[")
    }

    fn tokenize(&self, source: &str) -> Option<Token> {
        let body = source.strip_prefix("[[")?;
        let close = body.find("]]")?;
        let inner = &body[..close];
        if inner.contains(['[', ']', '\n']) {
            return None;
        }
        let (target, alias) = match inner.split_once('|') {
            Some((target, alias)) => (target.trim(), Some(alias.trim())),
            None => (inner.trim(), None),
        };
        if target.is_empty() {
            return None;
        }
        let mut token = Token::new(WIKI_LINK, &source[..close + 4]).with_attr("target", target);
        if let Some(alias) = alias.filter(|a| !a.is_empty()) {
            token = token.with_attr("alias", alias);
        }
        Some(token)
    }

    fn parse(&self, token: &Token, _helpers: &ParseHelpers<'_, '_>) -> Option<DocumentNode> {
        let mut node = DocumentNode::new(WIKI_LINK).with_attr("target", token.attr_str("target")?);
        if let Some(alias) = token.attr_str("alias") {
            node = node.with_attr("alias", alias);
        }
        Some(node)
    }

    fn serialize(&self, node: &DocumentNode, helpers: &SerializeHelpers<'_, '_>) -> String {
        let target = node.attr_str("target").unwrap_or_default();
        let alias = node.attr_str("alias").filter(|a| !a.is_empty());
        if helpers.flavor().wiki_link_serialize {
            match alias {
                Some(alias) => format!("[[{target}|{alias}]]"),
                None => format!("[[{target}]]"),
            }
        } else {
            let label = escape_text(alias.unwrap_or(target), false, Some('['));
            format!("[{label}]({})", format_destination(target))
        }
    }
}
