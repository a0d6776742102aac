//! Inline scanner
//!
//! Walks one block's text with a byte cursor. At every position registered
//! inline extensions get the first try (gated on their candidate offset and on
//! the character before it), then the built-in constructs: backslash escapes,
//! code spans, `*`/`_` emphasis, `~~` strike, links and hard breaks. Anything
//! unclaimed becomes text. Marks accumulate down the recursion and are copied
//! onto every text leaf and atom produced inside them.

use super::{MarkdownParser, ParseHelpers};
use crate::extensions::{CandidateCache, ExtensionLevel, NodeExtension};
use crate::model::{mark_types, node_types, DocumentNode, Mark};

/// Emphasis nesting past which delimiters are kept as text.
const MAX_NESTING: usize = 32;

const SPECIALS: &[char] = &['\\', '`', '*', '_', '~', '[', '!', '\n'];

pub(crate) struct InlineParser<'p, 'r, 's> {
    parser: &'p MarkdownParser<'r>,
    source: &'s str,
    extensions: Vec<&'r dyn NodeExtension>,
    cache: CandidateCache<'s>,
}

impl<'p, 'r, 's> InlineParser<'p, 'r, 's> {
    pub(crate) fn new(parser: &'p MarkdownParser<'r>, source: &'s str) -> Self {
        let extensions = parser.registry().at_level(ExtensionLevel::Inline);
        let cache = CandidateCache::new(source, extensions.len());
        InlineParser {
            parser,
            source,
            extensions,
            cache,
        }
    }

    pub(crate) fn parse(mut self) -> Vec<DocumentNode> {
        let mut out = InlineBuilder::default();
        self.parse_range(0, self.source.len(), &[], &mut out, 0);
        out.finish()
    }

    fn parse_range(
        &mut self,
        start: usize,
        end: usize,
        marks: &[Mark],
        out: &mut InlineBuilder,
        depth: usize,
    ) {
        let source = self.source;
        let mut pos = start;
        while pos < end {
            if let Some(len) = self.extension_at(pos, end, marks, out) {
                pos += len;
                continue;
            }
            let Some(c) = source[pos..end].chars().next() else {
                break;
            };
            let consumed = match c {
                '\\' => self.escape(pos, end, marks, out),
                '`' => Some(self.code_span(pos, end, marks, out)),
                '*' | '_' => Some(self.emphasis(pos, end, c, marks, out, depth)),
                '~' => Some(self.strike(pos, end, marks, out, depth)),
                '[' => self.link(pos, end, marks, out, depth),
                '!' => self.image_literal(pos, end, marks, out),
                '\n' => {
                    out.line_break(marks);
                    Some(1)
                }
                _ => None,
            };
            match consumed {
                Some(len) => pos += len,
                None => {
                    let stop = self.next_stop(pos + c.len_utf8(), end);
                    out.push_text(&source[pos..stop], marks);
                    pos = stop;
                }
            }
        }
    }

    /// Next offset in `from..end` where something other than plain text may start.
    fn next_stop(&mut self, from: usize, end: usize) -> usize {
        let special = self.source[from..end]
            .find(SPECIALS)
            .map_or(end, |offset| from + offset);
        match self.cache.nearest(&self.extensions, from) {
            Some(candidate) if candidate < special => candidate,
            _ => special,
        }
    }

    fn extension_at(
        &mut self,
        pos: usize,
        end: usize,
        marks: &[Mark],
        out: &mut InlineBuilder,
    ) -> Option<usize> {
        let source = self.source;
        for index in 0..self.extensions.len() {
            let extension = self.extensions[index];
            if self.cache.candidate(index, extension, pos) != Some(pos) {
                continue;
            }
            if !extension.accepts_after(source[..pos].chars().next_back()) {
                continue;
            }
            let rest = &source[pos..end];
            let Some(token) = extension.tokenize(rest) else {
                continue;
            };
            if !token.consumes_prefix_of(rest) {
                continue;
            }
            let helpers = ParseHelpers::new(self.parser, 0);
            match extension.parse(&token, &helpers) {
                Some(mut node) => {
                    if node.marks.is_empty() {
                        node.marks = marks.to_vec();
                    }
                    out.push_node(node);
                }
                None => out.push_text(&token.raw, marks),
            }
            return Some(token.raw.len());
        }
        None
    }

    fn escape(
        &self,
        pos: usize,
        end: usize,
        marks: &[Mark],
        out: &mut InlineBuilder,
    ) -> Option<usize> {
        let next = self.source[pos + 1..end].chars().next()?;
        if next == '\n' {
            out.push_node(DocumentNode::new(node_types::HARD_BREAK));
            return Some(2);
        }
        if next.is_ascii_punctuation() {
            out.push_text(&self.source[pos + 1..pos + 2], marks);
            return Some(2);
        }
        None
    }

    fn code_span(&self, pos: usize, end: usize, marks: &[Mark], out: &mut InlineBuilder) -> usize {
        let source = &self.source[..end];
        let open = run_length(source, pos, '`');
        let Some(close) = find_backtick_run(source, pos + open, open) else {
            out.push_text(&source[pos..pos + open], marks);
            return open;
        };
        let mut content = source[pos + open..close].replace('\n', " ");
        if content.len() >= 2
            && content.starts_with(' ')
            && content.ends_with(' ')
            && !content.trim().is_empty()
        {
            content = content[1..content.len() - 1].to_string();
        }
        let mut code_marks = marks.to_vec();
        code_marks.push(Mark::new(mark_types::CODE));
        out.push_text(&content, &code_marks);
        close + open - pos
    }

    fn emphasis(
        &mut self,
        pos: usize,
        end: usize,
        delimiter: char,
        marks: &[Mark],
        out: &mut InlineBuilder,
        depth: usize,
    ) -> usize {
        let full = self.source;
        let source = &full[..end];
        let run = run_length(source, pos, delimiter);
        let prev = self.source[..pos].chars().next_back();
        if depth >= MAX_NESTING || !can_open(source, pos, run, delimiter, prev) {
            out.push_text(&source[pos..pos + run], marks);
            return run;
        }
        if run >= 2 {
            let mut failed = FailedSearches::default();
            if let Some(close) = find_closer(source, pos + 2, delimiter, 2, 0, &mut failed) {
                let inner = with_mark(marks, Mark::new(mark_types::BOLD));
                self.parse_range(pos + 2, close, &inner, out, depth + 1);
                return close + 2 - pos;
            }
        }
        let mut failed = FailedSearches::default();
        if let Some(close) = find_closer(source, pos + 1, delimiter, 1, 0, &mut failed) {
            let inner = with_mark(marks, Mark::new(mark_types::ITALIC));
            self.parse_range(pos + 1, close, &inner, out, depth + 1);
            return close + 1 - pos;
        }
        out.push_text(&source[pos..pos + run], marks);
        run
    }

    fn strike(
        &mut self,
        pos: usize,
        end: usize,
        marks: &[Mark],
        out: &mut InlineBuilder,
        depth: usize,
    ) -> usize {
        let full = self.source;
        let source = &full[..end];
        let run = run_length(source, pos, '~');
        let prev = self.source[..pos].chars().next_back();
        if run == 2 && depth < MAX_NESTING && can_open(source, pos, run, '~', prev) {
            let mut failed = FailedSearches::default();
            if let Some(close) = find_closer(source, pos + 2, '~', 2, 0, &mut failed) {
                let inner = with_mark(marks, Mark::new(mark_types::STRIKE));
                self.parse_range(pos + 2, close, &inner, out, depth + 1);
                return close + 2 - pos;
            }
        }
        out.push_text(&source[pos..pos + run], marks);
        run
    }

    fn link(
        &mut self,
        pos: usize,
        end: usize,
        marks: &[Mark],
        out: &mut InlineBuilder,
        depth: usize,
    ) -> Option<usize> {
        if depth >= MAX_NESTING {
            return None;
        }
        let full = self.source;
        let source = &full[..end];
        let close = find_bracket_close(source, pos)?;
        let (href, title, consumed) = parse_link_tail(&source[close + 1..])?;
        let inner = with_mark(marks, Mark::link(href, title));
        self.parse_range(pos + 1, close, &inner, out, depth + 1);
        Some(close + 1 + consumed - pos)
    }

    /// Inline images have no node of their own; keep the source as text.
    fn image_literal(
        &self,
        pos: usize,
        end: usize,
        marks: &[Mark],
        out: &mut InlineBuilder,
    ) -> Option<usize> {
        let source = &self.source[..end];
        if !source[pos + 1..].starts_with('[') {
            return None;
        }
        let close = find_bracket_close(source, pos + 1)?;
        let (_, _, consumed) = parse_link_tail(&source[close + 1..])?;
        let stop = close + 1 + consumed;
        out.push_text(&source[pos..stop], marks);
        Some(stop - pos)
    }
}

/// Collects inline nodes, merging adjacent text leaves with equal marks.
#[derive(Default)]
struct InlineBuilder {
    nodes: Vec<DocumentNode>,
}

impl InlineBuilder {
    fn push_text(&mut self, text: &str, marks: &[Mark]) {
        if text.is_empty() {
            return;
        }
        if let Some(last) = self.nodes.last_mut() {
            if last.is_text() && last.marks == marks {
                if let Some(existing) = last.text.as_mut() {
                    existing.push_str(text);
                    return;
                }
            }
        }
        self.nodes
            .push(DocumentNode::marked_text(text, marks.to_vec()));
    }

    fn push_node(&mut self, node: DocumentNode) {
        self.nodes.push(node);
    }

    /// A newline: two trailing spaces make it a hard break, otherwise a soft break.
    fn line_break(&mut self, marks: &[Mark]) {
        let mut hard = false;
        if let Some(last) = self.nodes.last_mut() {
            if let Some(text) = last.text.as_mut() {
                let trimmed_len = text.trim_end_matches([' ', '\t']).len();
                hard = text.len() - trimmed_len >= 2 && text.ends_with("  ");
                text.truncate(trimmed_len);
            }
        }
        if self.nodes.last().is_some_and(|n| n.is_text() && n.text.as_deref() == Some("")) {
            self.nodes.pop();
        }
        if hard {
            self.push_node(DocumentNode::new(node_types::HARD_BREAK));
        } else {
            self.push_text("\n", marks);
        }
    }

    fn finish(self) -> Vec<DocumentNode> {
        self.nodes
            .into_iter()
            .filter(|node| !(node.is_text() && node.text.as_deref().unwrap_or_default().is_empty()))
            .collect()
    }
}

fn with_mark(marks: &[Mark], mark: Mark) -> Vec<Mark> {
    let mut marks = marks.to_vec();
    marks.push(mark);
    marks
}

fn run_length(source: &str, pos: usize, c: char) -> usize {
    let rest = &source[pos..];
    rest.len() - rest.trim_start_matches(c).len()
}

fn is_word(c: char) -> bool {
    c.is_alphanumeric()
}

fn can_open(source: &str, pos: usize, run: usize, delimiter: char, prev: Option<char>) -> bool {
    let next = source[pos + run..].chars().next();
    next.is_some_and(|c| !c.is_whitespace())
        && (delimiter != '_' || !prev.is_some_and(is_word))
}

/// Earliest start offset per width from which a closer search already failed.
///
/// Later searches of the same width starting at or after that offset are
/// answered as failures too, which keeps runs of unclosed openers linear.
struct FailedSearches([usize; 3]);

impl Default for FailedSearches {
    fn default() -> Self {
        FailedSearches([usize::MAX; 3])
    }
}

/// Offset of the delimiter run closing an opener of `width` whose content
/// begins at `from`. Nested openers are skipped along with their closers.
fn find_closer(
    source: &str,
    from: usize,
    delimiter: char,
    width: usize,
    nesting: usize,
    failed: &mut FailedSearches,
) -> Option<usize> {
    if from >= failed.0[width] {
        return None;
    }
    let found = scan_for_closer(source, from, delimiter, width, nesting, failed);
    if found.is_none() {
        failed.0[width] = failed.0[width].min(from);
    }
    found
}

fn scan_for_closer(
    source: &str,
    from: usize,
    delimiter: char,
    width: usize,
    nesting: usize,
    failed: &mut FailedSearches,
) -> Option<usize> {
    let mut i = from;
    while i < source.len() {
        let c = source[i..].chars().next()?;
        if c == '\\' {
            i += 1 + source[i + 1..].chars().next().map_or(0, char::len_utf8);
            continue;
        }
        if c == '`' {
            let open = run_length(source, i, '`');
            i = find_backtick_run(source, i + open, open).map_or(i + open, |close| close + open);
            continue;
        }
        if c != delimiter {
            i += c.len_utf8();
            continue;
        }

        let run = run_length(source, i, delimiter);
        let prev = source[..i].chars().next_back();
        let after = source[i + run..].chars().next();
        let can_close = i > from
            && prev.is_some_and(|p| !p.is_whitespace())
            && run >= width
            && (delimiter != '_' || !after.is_some_and(is_word));
        if can_close {
            return Some(i);
        }
        if nesting < MAX_NESTING && can_open(source, i, run, delimiter, prev) {
            let inner = if run >= 2 { 2 } else { 1 };
            if let Some(close) =
                find_closer(source, i + inner, delimiter, inner, nesting + 1, failed)
            {
                i = close + inner;
                continue;
            }
        }
        i += run;
    }
    None
}

/// Start of the next backtick run of exactly `len` at or after `from`.
fn find_backtick_run(source: &str, from: usize, len: usize) -> Option<usize> {
    let mut i = from;
    while i < source.len() {
        match source[i..].find('`') {
            Some(offset) => {
                let start = i + offset;
                let run = run_length(source, start, '`');
                if run == len {
                    return Some(start);
                }
                i = start + run;
            }
            None => return None,
        }
    }
    None
}

/// Offset of the `]` matching the `[` at `open`, honoring escapes and nesting.
pub(crate) fn find_bracket_close(source: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut chars = source[open..].char_indices();
    while let Some((offset, c)) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + offset);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parse `(destination "title")` at the start of `source`.
///
/// Returns the unescaped destination, the optional title and the number of
/// bytes consumed including both parentheses.
pub(crate) fn parse_link_tail(source: &str) -> Option<(String, Option<String>, usize)> {
    let rest = source.strip_prefix('(')?;
    let mut i = 1 + (rest.len() - rest.trim_start().len());

    let destination;
    if source[i..].starts_with('<') {
        let close = source[i + 1..].find(['>', '\n'])?;
        if !source[i + 1 + close..].starts_with('>') {
            return None;
        }
        destination = unescape(&source[i + 1..i + 1 + close]);
        i += close + 2;
    } else {
        let start = i;
        let mut parens = 0usize;
        let mut chars = source[i..].char_indices();
        let mut stop = source.len();
        while let Some((offset, c)) = chars.next() {
            match c {
                '\\' => {
                    chars.next();
                }
                '(' => parens += 1,
                ')' if parens == 0 => {
                    stop = i + offset;
                    break;
                }
                ')' => parens -= 1,
                c if c.is_whitespace() => {
                    stop = i + offset;
                    break;
                }
                _ => {}
            }
        }
        destination = unescape(&source[start..stop]);
        i = stop;
    }

    let spaced = source[i..].starts_with(char::is_whitespace);
    i += source[i..].len() - source[i..].trim_start().len();

    let mut title = None;
    if spaced {
        if let Some(quote) = source[i..].chars().next().filter(|c| matches!(c, '"' | '\'')) {
            let body_start = i + 1;
            let mut chars = source[body_start..].char_indices();
            let mut close = None;
            while let Some((offset, c)) = chars.next() {
                if c == '\\' {
                    chars.next();
                } else if c == quote {
                    close = Some(body_start + offset);
                    break;
                }
            }
            let close = close?;
            title = Some(unescape(&source[body_start..close]));
            i = close + 1;
            i += source[i..].len() - source[i..].trim_start().len();
        }
    }

    source[i..].starts_with(')').then(|| (destination, title, i + 1))
}

/// Resolve backslash escapes of ASCII punctuation.
pub(crate) fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.peek().copied().filter(char::is_ascii_punctuation) {
                out.push(next);
                chars.next();
                continue;
            }
        }
        out.push(c);
    }
    out
}
