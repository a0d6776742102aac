//! Block-level tokenizer and reducer
//!
//! Built-in rules, tried in this order at each line start once no registered
//! block extension matched: blank lines, fenced code, ATX headings, thematic
//! breaks, blockquotes, lists, GFM tables, standalone images and finally
//! paragraphs. Setext headings, indented code and HTML blocks are not
//! recognized; their lines read as paragraph text.

use super::inline::{parse_link_tail, unescape};
use super::{MarkdownParser, ParseHelpers, MAX_DEPTH};
use crate::extensions::{CandidateCache, ExtensionLevel, NodeExtension};
use crate::model::{node_types, DocumentNode, Token};
use serde_json::Value;
use tracing::trace;

impl<'r> MarkdownParser<'r> {
    /// Tokenize a block scope into a flat token stream.
    pub(crate) fn tokenize_blocks(&self, source: &str, depth: usize) -> Vec<Token> {
        BlockTokenizer::new(self, source, depth).run()
    }

    /// Reduce block tokens to nodes.
    pub(crate) fn reduce_blocks(&self, tokens: &[Token], depth: usize) -> Vec<DocumentNode> {
        tokens
            .iter()
            .map(|token| self.reduce_block(token, depth))
            .collect()
    }

    fn reduce_block(&self, token: &Token, depth: usize) -> DocumentNode {
        if let Some(extension) = self
            .registry()
            .get(&token.kind)
            .filter(|extension| extension.level() == ExtensionLevel::Block)
        {
            let helpers = ParseHelpers::new(self, depth);
            return extension
                .parse(token, &helpers)
                .unwrap_or_else(|| self.raw_paragraph(&token.raw));
        }

        let inline = |token: &Token| {
            token
                .text
                .as_deref()
                .map(|text| self.parse_inline(text))
                .unwrap_or_default()
        };

        match token.kind.as_str() {
            node_types::PARAGRAPH => DocumentNode::paragraph(inline(token)),
            node_types::HEADING => {
                let level = token.attr_u64("level").unwrap_or(1).clamp(1, 6) as u8;
                DocumentNode::heading(level, inline(token))
            }
            node_types::CODE_BLOCK => DocumentNode::code_block(
                token.attr_str("language"),
                token.text.as_deref().unwrap_or_default(),
            ),
            node_types::HORIZONTAL_RULE => DocumentNode::new(node_types::HORIZONTAL_RULE),
            node_types::BLOCKQUOTE => DocumentNode::new(node_types::BLOCKQUOTE)
                .with_content(self.reduce_blocks(&token.tokens, depth + 1)),
            node_types::BULLET_LIST | node_types::TASK_LIST => DocumentNode::new(&token.kind)
                .with_content(self.reduce_items(&token.tokens, depth)),
            node_types::ORDERED_LIST => DocumentNode::new(node_types::ORDERED_LIST)
                .with_attr("start", token.attr_u64("start").unwrap_or(1))
                .with_content(self.reduce_items(&token.tokens, depth)),
            node_types::TABLE => {
                let rows = token
                    .tokens
                    .iter()
                    .map(|row| {
                        let cells = row
                            .tokens
                            .iter()
                            .map(|cell| {
                                DocumentNode::new(&cell.kind)
                                    .with_attr(
                                        "align",
                                        cell.attrs.get("align").cloned().unwrap_or(Value::Null),
                                    )
                                    .with_content(inline(cell))
                            })
                            .collect();
                        DocumentNode::new(node_types::TABLE_ROW).with_content(cells)
                    })
                    .collect();
                DocumentNode::new(node_types::TABLE).with_content(rows)
            }
            node_types::IMAGE => DocumentNode::new(node_types::IMAGE)
                .with_attr("src", token.attr_str("src").unwrap_or_default())
                .with_attr("alt", token.attr_str("alt").unwrap_or_default())
                .with_attr(
                    "title",
                    token.attrs.get("title").cloned().unwrap_or(Value::Null),
                ),
            _ => self.raw_paragraph(&token.raw),
        }
    }

    fn reduce_items(&self, items: &[Token], depth: usize) -> Vec<DocumentNode> {
        items
            .iter()
            .map(|item| {
                let node = DocumentNode::new(&item.kind)
                    .with_content(self.reduce_blocks(&item.tokens, depth + 1));
                match item.attr_bool("checked") {
                    Some(checked) => node.with_attr("checked", checked),
                    None => node,
                }
            })
            .collect()
    }

    /// Fallback for a token whose parser declined it.
    fn raw_paragraph(&self, raw: &str) -> DocumentNode {
        DocumentNode::paragraph(self.parse_inline(raw.trim()))
    }
}

struct BlockTokenizer<'p, 'r, 's> {
    parser: &'p MarkdownParser<'r>,
    source: &'s str,
    depth: usize,
    extensions: Vec<&'r dyn NodeExtension>,
    cache: CandidateCache<'s>,
    /// Per extension, offsets its tokenizer cannot match; filled after the first miss.
    misses: Vec<Option<Vec<usize>>>,
    tokens: Vec<Token>,
}

impl<'p, 'r, 's> BlockTokenizer<'p, 'r, 's> {
    fn new(parser: &'p MarkdownParser<'r>, source: &'s str, depth: usize) -> Self {
        let extensions = if depth < MAX_DEPTH {
            parser.registry().at_level(ExtensionLevel::Block)
        } else {
            Vec::new()
        };
        let cache = CandidateCache::new(source, extensions.len());
        let misses = vec![None; extensions.len()];
        BlockTokenizer {
            parser,
            source,
            depth,
            extensions,
            cache,
            misses,
            tokens: Vec::new(),
        }
    }

    fn run(mut self) -> Vec<Token> {
        let mut pos = 0;
        while pos < self.source.len() {
            let (line, next) = self.line_at(pos);
            if line.trim().is_empty() {
                pos = next;
                continue;
            }
            if let Some(token) = self.extension_at(pos) {
                pos += token.raw.len();
                self.tokens.push(token);
                continue;
            }
            // every built-in rule consumes at least the line at `pos`
            let (token, end) = self.builtin_at(pos);
            self.tokens.push(token);
            pos = end;
        }
        self.tokens
    }

    /// The line starting at `pos` (without its newline) and the offset after it.
    fn line_at(&self, pos: usize) -> (&'s str, usize) {
        let source = self.source;
        let rest = &source[pos..];
        match rest.find('\n') {
            Some(i) => (&rest[..i], pos + i + 1),
            None => (rest, self.source.len()),
        }
    }

    /// First registered block extension that matches at `pos`.
    fn extension_at(&mut self, pos: usize) -> Option<Token> {
        for index in 0..self.extensions.len() {
            let Some(mut token) = self.attempt(index, pos) else {
                continue;
            };
            if let Some(body) = token.block_source.as_deref() {
                token.tokens = self.parser.tokenize_blocks(body, self.depth + 1);
            }
            return Some(token);
        }
        None
    }

    fn extension_matches(&mut self, pos: usize) -> bool {
        (0..self.extensions.len()).any(|index| self.attempt(index, pos).is_some())
    }

    /// Tokenize with the extension at `index`, unless `pos` is not a
    /// candidate or is already known to be an unclosed opener.
    fn attempt(&mut self, index: usize, pos: usize) -> Option<Token> {
        let extension = self.extensions[index];
        if self.cache.candidate(index, extension, pos) != Some(pos) {
            return None;
        }
        if self.misses[index]
            .as_ref()
            .is_some_and(|misses| misses.binary_search(&pos).is_ok())
        {
            return None;
        }
        let source = self.source;
        let rest = &source[pos..];
        let token = extension
            .tokenize(rest)
            .filter(|token| token.consumes_prefix_of(rest));
        if token.is_none() && self.misses[index].is_none() {
            let misses = extension.unmatched_openers(source);
            if !misses.is_empty() {
                trace!(
                    extension = extension.name(),
                    count = misses.len(),
                    "unclosed block openers"
                );
            }
            self.misses[index] = Some(misses);
        }
        token
    }

    fn builtin_at(&mut self, pos: usize) -> (Token, usize) {
        let (line, _) = self.line_at(pos);
        let containers = self.depth < MAX_DEPTH;

        if let Some(fence) = fence_open(line) {
            return self.fenced_code(pos, fence);
        }
        if let Some((level, text)) = atx_heading(line) {
            let (_, next) = self.line_at(pos);
            let token = Token::new(node_types::HEADING, &self.source[pos..next])
                .with_attr("level", level)
                .with_text(text);
            return (token, next);
        }
        if is_thematic_break(line) {
            let (_, next) = self.line_at(pos);
            return (
                Token::new(node_types::HORIZONTAL_RULE, &self.source[pos..next]),
                next,
            );
        }
        if containers && blockquote_content(line).is_some() {
            return self.blockquote(pos);
        }
        if containers {
            if let Some(marker) = list_marker(line) {
                return self.list(pos, marker);
            }
        }
        if let Some(table) = self.table(pos) {
            return table;
        }
        if let Some(image) = self.standalone_image(pos) {
            return image;
        }
        self.paragraph(pos)
    }

    fn fenced_code(&self, pos: usize, fence: Fence<'s>) -> (Token, usize) {
        let (_, mut cursor) = self.line_at(pos);
        let mut lines = Vec::new();
        let mut end = self.source.len();
        while cursor < self.source.len() {
            let (line, next) = self.line_at(cursor);
            if closes_fence(line, &fence) {
                end = next;
                break;
            }
            lines.push(strip_indent(line, fence.indent));
            cursor = next;
            end = next;
        }
        let language = fence
            .info
            .split_whitespace()
            .next()
            .map(|word| Value::String(unescape(word)))
            .unwrap_or(Value::Null);
        let token = Token::new(node_types::CODE_BLOCK, &self.source[pos..end])
            .with_attr("language", language)
            .with_text(lines.join("\n"));
        (token, end)
    }

    fn blockquote(&mut self, pos: usize) -> (Token, usize) {
        let mut cursor = pos;
        let mut body = Vec::new();
        while cursor < self.source.len() {
            let (line, next) = self.line_at(cursor);
            match blockquote_content(line) {
                Some(content) => body.push(content),
                None => break,
            }
            cursor = next;
        }
        let body = body.join("\n");
        let tokens = self.parser.tokenize_blocks(&body, self.depth + 1);
        let token = Token::new(node_types::BLOCKQUOTE, &self.source[pos..cursor])
            .with_block_source(body)
            .with_tokens(tokens);
        (token, cursor)
    }

    fn list(&mut self, pos: usize, first: ListMarker) -> (Token, usize) {
        let (line, next) = self.line_at(pos);
        let mut items: Vec<(ListMarker, Vec<&'s str>)> =
            vec![(first, vec![line.get(first.content_offset..).unwrap_or("")])];
        let mut cursor = next;
        let mut end = next;
        let mut after_blank = false;

        while cursor < self.source.len() {
            let (line, next) = self.line_at(cursor);
            let offset = items.last().map(|(m, _)| m.content_offset).unwrap_or(0);

            if line.trim().is_empty() {
                let Some(ahead) = self.next_nonblank(next) else {
                    break;
                };
                let (ahead_line, _) = self.line_at(ahead);
                let continues = indent_of(ahead_line) >= offset;
                let next_item = list_marker(ahead_line)
                    .filter(|m| first.same_list(m) && !is_thematic_break(ahead_line));
                if continues {
                    if let Some((_, lines)) = items.last_mut() {
                        let mut blank = cursor;
                        while blank < ahead {
                            lines.push("");
                            blank = self.line_at(blank).1;
                        }
                    }
                    cursor = ahead;
                    after_blank = true;
                    continue;
                }
                if next_item.is_some() {
                    cursor = ahead;
                    after_blank = true;
                    continue;
                }
                break;
            }

            if indent_of(line) >= offset {
                if let Some((_, lines)) = items.last_mut() {
                    lines.push(strip_indent(line, offset));
                }
            } else if is_thematic_break(line) {
                break;
            } else if let Some(marker) = list_marker(line).filter(|m| first.same_list(m)) {
                items.push((marker, vec![line.get(marker.content_offset..).unwrap_or("")]));
            } else if !after_blank
                && items
                    .last()
                    .and_then(|(_, lines)| lines.last())
                    .is_some_and(|last| !last.trim().is_empty())
                && !self.interrupts_paragraph(line, cursor)
            {
                if let Some((_, lines)) = items.last_mut() {
                    lines.push(line.trim_start());
                }
            } else {
                break;
            }
            after_blank = false;
            cursor = next;
            end = next;
        }

        let is_task = !first.ordered
            && items
                .iter()
                .all(|(_, lines)| task_marker(lines.first().copied().unwrap_or("")).is_some());

        let item_tokens = items
            .into_iter()
            .map(|(_, lines)| {
                let mut body = lines.join("\n");
                let mut item = Token::new(node_types::LIST_ITEM, "");
                if is_task {
                    if let Some((checked, rest)) = task_marker(&body) {
                        body = rest.to_string();
                        item = Token::new(node_types::TASK_ITEM, "").with_attr("checked", checked);
                    }
                }
                let tokens = self.parser.tokenize_blocks(&body, self.depth + 1);
                item.raw = body.clone();
                item.with_block_source(body).with_tokens(tokens)
            })
            .collect();

        let kind = if is_task {
            node_types::TASK_LIST
        } else if first.ordered {
            node_types::ORDERED_LIST
        } else {
            node_types::BULLET_LIST
        };
        let mut token = Token::new(kind, &self.source[pos..end]).with_tokens(item_tokens);
        if first.ordered {
            token = token.with_attr("start", first.number);
        }
        (token, end)
    }

    fn next_nonblank(&self, mut pos: usize) -> Option<usize> {
        while pos < self.source.len() {
            let (line, next) = self.line_at(pos);
            if !line.trim().is_empty() {
                return Some(pos);
            }
            pos = next;
        }
        None
    }

    fn table(&self, pos: usize) -> Option<(Token, usize)> {
        let (header, next) = self.line_at(pos);
        if !header.contains('|') || next >= self.source.len() {
            return None;
        }
        let (delimiter, mut cursor) = self.line_at(next);
        let header_cells = split_row(header);
        let aligns = delimiter_row(delimiter)?;
        if aligns.len() != header_cells.len() {
            return None;
        }

        let mut rows = vec![table_row(&header_cells, &aligns, node_types::TABLE_HEADER)];
        while cursor < self.source.len() {
            let (line, next) = self.line_at(cursor);
            if line.trim().is_empty()
                || !line.contains('|')
                || fence_open(line).is_some()
                || atx_heading(line).is_some()
                || blockquote_content(line).is_some()
            {
                break;
            }
            rows.push(table_row(&split_row(line), &aligns, node_types::TABLE_CELL));
            cursor = next;
        }
        let token = Token::new(node_types::TABLE, &self.source[pos..cursor]).with_tokens(rows);
        Some((token, cursor))
    }

    fn standalone_image(&mut self, pos: usize) -> Option<(Token, usize)> {
        let (line, next) = self.line_at(pos);
        let trimmed = line.trim();
        let rest = trimmed.strip_prefix("![")?;
        let close = rest.find("](")?;
        let alt = &rest[..close];
        if alt.replace("\\[", "").replace("\\]", "").contains(['[', ']']) {
            return None;
        }
        let (src, title, consumed) = parse_link_tail(&rest[close + 1..])?;
        if close + 1 + consumed != rest.len() {
            return None;
        }
        if next < self.source.len() {
            let (following, _) = self.line_at(next);
            if !following.trim().is_empty() && !self.interrupts_paragraph(following, next) {
                return None;
            }
        }
        let token = Token::new(node_types::IMAGE, &self.source[pos..next])
            .with_attr("src", src)
            .with_attr("alt", unescape(alt))
            .with_attr("title", title.map(Value::String).unwrap_or(Value::Null));
        Some((token, next))
    }

    fn paragraph(&mut self, pos: usize) -> (Token, usize) {
        let (first, mut cursor) = self.line_at(pos);
        let mut lines = vec![first.trim_start()];
        while cursor < self.source.len() {
            let (line, next) = self.line_at(cursor);
            if line.trim().is_empty() || self.interrupts_paragraph(line, cursor) {
                break;
            }
            lines.push(line.trim_start());
            cursor = next;
        }
        let text = lines.join("\n").trim_end().to_string();
        let token = Token::new(node_types::PARAGRAPH, &self.source[pos..cursor]).with_text(text);
        (token, cursor)
    }

    /// Whether `line` (at `pos`) starts a block that ends a running paragraph.
    fn interrupts_paragraph(&mut self, line: &str, pos: usize) -> bool {
        if fence_open(line).is_some() || atx_heading(line).is_some() || is_thematic_break(line) {
            return true;
        }
        if self.depth < MAX_DEPTH {
            if blockquote_content(line).is_some() {
                return true;
            }
            if let Some(marker) = list_marker(line) {
                if !marker.empty && (!marker.ordered || marker.number == 1) {
                    return true;
                }
            }
        }
        self.extension_matches(pos)
    }
}

struct Fence<'s> {
    indent: usize,
    ch: char,
    len: usize,
    info: &'s str,
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start_matches(' ').len()
}

/// Remove up to `n` leading spaces.
fn strip_indent(line: &str, n: usize) -> &str {
    let strip = indent_of(line).min(n);
    &line[strip..]
}

fn fence_open(line: &str) -> Option<Fence<'_>> {
    let indent = indent_of(line);
    if indent > 3 {
        return None;
    }
    let rest = &line[indent..];
    let ch = rest.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let len = rest.len() - rest.trim_start_matches(ch).len();
    if len < 3 {
        return None;
    }
    let info = rest[len..].trim();
    if ch == '`' && info.contains('`') {
        return None;
    }
    Some(Fence {
        indent,
        ch,
        len,
        info,
    })
}

fn closes_fence(line: &str, fence: &Fence<'_>) -> bool {
    let indent = indent_of(line);
    if indent > 3 {
        return false;
    }
    let rest = &line[indent..];
    let run = rest.len() - rest.trim_start_matches(fence.ch).len();
    run >= fence.len && rest[run..].trim().is_empty()
}

fn atx_heading(line: &str) -> Option<(u8, String)> {
    let indent = indent_of(line);
    if indent > 3 {
        return None;
    }
    let rest = &line[indent..];
    let hashes = rest.len() - rest.trim_start_matches('#').len();
    if !(1..=6).contains(&hashes) {
        return None;
    }
    let after = &rest[hashes..];
    if !after.is_empty() && !after.starts_with([' ', '\t']) {
        return None;
    }
    let mut content = after.trim();
    let without_closing = content.trim_end_matches('#');
    if without_closing.is_empty() {
        content = "";
    } else if without_closing.len() != content.len()
        && without_closing.ends_with([' ', '\t'])
        && !without_closing.trim_end().ends_with('\\')
    {
        content = without_closing.trim_end();
    }
    Some((hashes as u8, content.to_string()))
}

fn is_thematic_break(line: &str) -> bool {
    if indent_of(line) > 3 {
        return false;
    }
    let mut marker = None;
    let mut count = 0;
    for c in line.chars() {
        match c {
            ' ' | '\t' => {}
            '-' | '*' | '_' => {
                if marker.is_some_and(|m| m != c) {
                    return false;
                }
                marker = Some(c);
                count += 1;
            }
            _ => return false,
        }
    }
    count >= 3
}

/// Content of a blockquote line with the `>` marker and one optional space removed.
fn blockquote_content(line: &str) -> Option<&str> {
    let indent = indent_of(line);
    if indent > 3 {
        return None;
    }
    let rest = line[indent..].strip_prefix('>')?;
    Some(rest.strip_prefix(' ').unwrap_or(rest))
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ListMarker {
    ordered: bool,
    symbol: char,
    number: u64,
    content_offset: usize,
    empty: bool,
}

impl ListMarker {
    fn same_list(&self, other: &ListMarker) -> bool {
        self.ordered == other.ordered && self.symbol == other.symbol
    }
}

fn list_marker(line: &str) -> Option<ListMarker> {
    let indent = indent_of(line);
    if indent > 3 {
        return None;
    }
    let rest = &line[indent..];
    let (ordered, symbol, number, marker_len) = match rest.chars().next()? {
        c @ ('-' | '*' | '+') => (false, c, 0, 1),
        c if c.is_ascii_digit() => {
            let digits = rest.len() - rest.trim_start_matches(|c: char| c.is_ascii_digit()).len();
            if digits > 9 {
                return None;
            }
            let delimiter = rest[digits..]
                .chars()
                .next()
                .filter(|c| *c == '.' || *c == ')')?;
            let number = rest[..digits].parse().ok()?;
            (true, delimiter, number, digits + 1)
        }
        _ => return None,
    };
    let after = &rest[marker_len..];
    if after.trim().is_empty() {
        return Some(ListMarker {
            ordered,
            symbol,
            number,
            content_offset: indent + marker_len + 1,
            empty: true,
        });
    }
    if !after.starts_with(' ') {
        return None;
    }
    let mut spaces = after.len() - after.trim_start_matches(' ').len();
    if spaces > 4 {
        spaces = 1;
    }
    Some(ListMarker {
        ordered,
        symbol,
        number,
        content_offset: indent + marker_len + spaces,
        empty: false,
    })
}

/// `[ ] rest` / `[x] rest` at the start of a list item.
fn task_marker(body: &str) -> Option<(bool, &str)> {
    let checked = match body.get(..3)? {
        "[ ]" => false,
        "[x]" | "[X]" => true,
        _ => return None,
    };
    let rest = &body[3..];
    if rest.is_empty() || rest.starts_with('\n') {
        return Some((checked, rest.trim_start_matches('\n')));
    }
    rest.strip_prefix(' ').map(|rest| (checked, rest))
}

fn split_row(line: &str) -> Vec<String> {
    let mut trimmed = line.trim();
    if let Some(rest) = trimmed.strip_prefix('|') {
        trimmed = rest;
    }
    if trimmed.ends_with('|') && !trimmed.ends_with("\\|") {
        trimmed = &trimmed[..trimmed.len() - 1];
    }
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut chars = trimmed.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                current.push(c);
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            '|' => cells.push(std::mem::take(&mut current).trim().to_string()),
            _ => current.push(c),
        }
    }
    cells.push(current.trim().to_string());
    cells
}

fn delimiter_row(line: &str) -> Option<Vec<Value>> {
    if !line.contains('-') {
        return None;
    }
    split_row(line)
        .iter()
        .map(|cell| {
            let left = cell.starts_with(':');
            let right = cell.ends_with(':') && cell.len() > 1;
            let dashes = cell.trim_start_matches(':').trim_end_matches(':');
            if dashes.is_empty() || !dashes.chars().all(|c| c == '-') {
                return None;
            }
            Some(match (left, right) {
                (true, true) => Value::from("center"),
                (true, false) => Value::from("left"),
                (false, true) => Value::from("right"),
                (false, false) => Value::Null,
            })
        })
        .collect()
}

fn table_row(cells: &[String], aligns: &[Value], kind: &str) -> Token {
    let tokens = aligns
        .iter()
        .enumerate()
        .map(|(i, align)| {
            let text = cells.get(i).cloned().unwrap_or_default();
            Token::new(kind, text.clone())
                .with_attr("align", align.clone())
                .with_text(text)
        })
        .collect();
    Token::new(node_types::TABLE_ROW, cells.join("|")).with_tokens(tokens)
}
