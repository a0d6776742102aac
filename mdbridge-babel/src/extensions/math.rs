//! TeX math: `$$` display blocks and `$…$` inline spans.
//!
//! The LaTeX source is stored verbatim in the `latex` attribute; nothing
//! inside the delimiters is parsed or escaped.

use super::{ExtensionLevel, NodeExtension};
use crate::formats::markdown::parser::ParseHelpers;
use crate::formats::markdown::serializer::SerializeHelpers;
use crate::model::{DocumentNode, Token};

pub const MATH_BLOCK: &str = "mathBlock";
pub const MATH_INLINE: &str = "mathInline";

#[derive(Debug, Clone, Copy, Default)]
pub struct MathBlockExtension;

fn opens_block(line: &str) -> Option<&str> {
    let trimmed = line.trim_start_matches(' ');
    if line.len() - trimmed.len() > 3 {
        return None;
    }
    trimmed.strip_prefix("$$")
}

impl NodeExtension for MathBlockExtension {
    fn name(&self) -> &str {
        MATH_BLOCK
    }

    fn level(&self) -> ExtensionLevel {
        ExtensionLevel::Block
    }

    fn start(&self, source: &str) -> Option<usize> {
        let mut offset = 0;
        for line in source.split_inclusive('\n') {
            if opens_block(line).is_some() {
                return Some(offset);
            }
            offset += line.len();
        }
        None
    }

    fn tokenize(&self, source: &str) -> Option<Token> {
        let first_end = source.find('\n').unwrap_or(source.len());
        let rest = opens_block(&source[..first_end])?.trim_end();

        // $$ x $$ on one line
        if let Some(latex) = rest.strip_suffix("$$") {
            let end = (first_end + 1).min(source.len());
            return Some(Token::new(MATH_BLOCK, &source[..end]).with_attr("latex", latex.trim()));
        }

        let mut lines = Vec::new();
        if !rest.trim().is_empty() {
            lines.push(rest.trim());
        }
        let mut cursor = first_end + 1;
        while cursor < source.len() {
            let line_end = source[cursor..].find('\n').map_or(source.len(), |i| cursor + i);
            let line = source[cursor..line_end].trim_end();
            let next = (line_end + 1).min(source.len());
            if let Some(last) = line.strip_suffix("$$") {
                if !last.trim().is_empty() {
                    lines.push(last);
                }
                let latex = lines.join("\n");
                return Some(Token::new(MATH_BLOCK, &source[..next]).with_attr("latex", latex));
            }
            lines.push(line);
            cursor = next;
        }
        None
    }

    /// Multi-line openers with no `$$`-terminated line anywhere below them.
    fn unmatched_openers(&self, source: &str) -> Vec<usize> {
        let mut lines = Vec::new();
        let mut offset = 0;
        for raw in source.split_inclusive('\n') {
            lines.push((offset, raw.strip_suffix('\n').unwrap_or(raw).trim_end()));
            offset += raw.len();
        }

        let mut misses = Vec::new();
        let mut closer_below = false;
        for (start, line) in lines.into_iter().rev() {
            let one_line = opens_block(line).map(|rest| rest.trim_end().ends_with("$$"));
            if one_line == Some(false) && !closer_below {
                misses.push(start);
            }
            closer_below |= line.ends_with("$$");
        }
        misses.reverse();
        misses
    }

    fn parse(&self, token: &Token, _helpers: &ParseHelpers<'_, '_>) -> Option<DocumentNode> {
        let latex = token.attr_str("latex")?;
        Some(DocumentNode::new(MATH_BLOCK).with_attr("latex", latex))
    }

    fn serialize(&self, node: &DocumentNode, _helpers: &SerializeHelpers<'_, '_>) -> String {
        match node.attr_str("latex").map(str::trim_end) {
            Some(latex) if !latex.is_empty() => format!("$$\n{latex}\n$$"),
            _ => "$$\n$$".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MathInlineExtension;

impl NodeExtension for MathInlineExtension {
    fn name(&self) -> &str {
        MATH_INLINE
    }

    fn level(&self) -> ExtensionLevel {
        ExtensionLevel::Inline
    }

    fn start(&self, source: &str) -> Option<usize> {
        source.find('$')
    }

    fn tokenize(&self, source: &str) -> Option<Token> {
        let body = source.strip_prefix('$')?;
        let first = body.chars().next()?;
        if first == '$' || first.is_whitespace() {
            return None;
        }
        let mut chars = body.char_indices().peekable();
        let mut prev = first;
        while let Some((i, c)) = chars.next() {
            match c {
                '\\' => {
                    if let Some((_, escaped)) = chars.next() {
                        prev = escaped;
                    }
                    continue;
                }
                '$' if i > 0 && !prev.is_whitespace() => {
                    let followed_by_digit = chars.peek().is_some_and(|(_, n)| n.is_ascii_digit());
                    if !followed_by_digit {
                        let latex = &body[..i];
                        return Some(
                            Token::new(MATH_INLINE, &source[..i + 2]).with_attr("latex", latex),
                        );
                    }
                }
                _ => {}
            }
            prev = c;
        }
        None
    }

    fn parse(&self, token: &Token, _helpers: &ParseHelpers<'_, '_>) -> Option<DocumentNode> {
        let latex = token.attr_str("latex")?;
        Some(DocumentNode::new(MATH_INLINE).with_attr("latex", latex))
    }

    fn serialize(&self, node: &DocumentNode, _helpers: &SerializeHelpers<'_, '_>) -> String {
        format!("${}$", node.attr_str("latex").unwrap_or_default())
    }
}
