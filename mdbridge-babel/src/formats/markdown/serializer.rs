//! Markdown serialization (document tree → Markdown)
//!
//! A recursive walk. Block siblings are separated by a blank line, list items
//! by a single newline, inline siblings are concatenated. Registered node types
//! are printed by their extension; everything else by the built-in rules here.
//! The flavor is chosen once per export and handed unchanged to every
//! extension.
//!
//! Serialization never fails. A node type nobody knows is logged and written
//! as its content, so one foreign node cannot blank the whole export.

use crate::extensions::callout::guard_bold_label;
use crate::extensions::{ExtensionLevel, ExtensionRegistry, NodeExtension};
use crate::flavor::FlavorConfig;
use crate::model::{mark_types, node_types, DocumentNode, Mark};
use tracing::warn;

/// Serialize a document to Markdown with the given extensions and flavor.
pub fn serialize_markdown(
    doc: &DocumentNode,
    registry: &ExtensionRegistry,
    flavor: FlavorConfig,
) -> String {
    MarkdownSerializer::new(registry, flavor).serialize(doc)
}

pub struct MarkdownSerializer<'r> {
    registry: &'r ExtensionRegistry,
    flavor: FlavorConfig,
}

impl<'r> MarkdownSerializer<'r> {
    pub fn new(registry: &'r ExtensionRegistry, flavor: FlavorConfig) -> Self {
        MarkdownSerializer { registry, flavor }
    }

    /// Markdown for `doc`, ending in exactly one newline (empty for an empty document).
    pub fn serialize(&self, doc: &DocumentNode) -> String {
        let body = if doc.is(node_types::DOC) {
            self.render_blocks(&doc.content, false)
        } else {
            self.render_block(doc)
        };
        let body = body.trim_end_matches('\n');
        if body.trim().is_empty() {
            String::new()
        } else {
            format!("{body}\n")
        }
    }

    fn helpers(&self) -> SerializeHelpers<'_, 'r> {
        SerializeHelpers { serializer: self }
    }

    fn render_blocks(&self, nodes: &[DocumentNode], in_list_item: bool) -> String {
        let mut out = String::new();
        let mut previous: Option<&DocumentNode> = None;
        let mut alternate = false;
        for node in nodes {
            alternate = previous.is_some_and(|p| p.node_type == node.node_type) && !alternate;
            let rendered = if is_list(node) {
                self.render_list(node, alternate)
            } else {
                self.render_block(node)
            };
            if rendered.is_empty() {
                continue;
            }
            if let Some(previous) = previous {
                out.push_str(if in_list_item && starts_tight(previous, node) {
                    "\n"
                } else {
                    "\n\n"
                });
            }
            out.push_str(&rendered);
            previous = Some(node);
        }
        out
    }

    fn render_block(&self, node: &DocumentNode) -> String {
        if let Some(extension) = self.registry.get(&node.node_type) {
            return extension.serialize(node, &self.helpers());
        }
        match node.node_type.as_str() {
            node_types::PARAGRAPH => self.render_inline(&node.content, false),
            node_types::HEADING => {
                let level = node.attr_u64("level").unwrap_or(1).clamp(1, 6) as usize;
                let text = self.render_inline(&node.content, true);
                let hashes = "#".repeat(level);
                if text.trim().is_empty() {
                    hashes
                } else {
                    format!("{hashes} {}", guard_closing_hashes(text.trim()))
                }
            }
            node_types::BLOCKQUOTE => {
                let body = guard_bold_label(&self.render_blocks(&node.content, false));
                prefix_lines(&body, "> ")
            }
            node_types::BULLET_LIST | node_types::ORDERED_LIST | node_types::TASK_LIST => {
                self.render_list(node, false)
            }
            node_types::LIST_ITEM | node_types::TASK_ITEM => {
                self.render_blocks(&node.content, true)
            }
            node_types::CODE_BLOCK => render_code_block(node),
            node_types::HORIZONTAL_RULE => "---".to_string(),
            node_types::IMAGE => render_image(node),
            node_types::TABLE => self.render_table(node),
            node_types::TEXT | node_types::HARD_BREAK => {
                self.render_inline(std::slice::from_ref(node), false)
            }
            _ => self.render_unknown(node),
        }
    }

    fn render_unknown(&self, node: &DocumentNode) -> String {
        warn!(
            node_type = %node.node_type,
            "no serializer for node type, writing its content instead"
        );
        if !node.content.is_empty() {
            if node.content.iter().all(|child| self.is_inline(child)) {
                self.render_inline(&node.content, false)
            } else {
                self.render_blocks(&node.content, false)
            }
        } else {
            node.text
                .as_deref()
                .map(|text| escape_text(text, true, None))
                .unwrap_or_default()
        }
    }

    fn is_inline(&self, node: &DocumentNode) -> bool {
        node.is_text()
            || node.is(node_types::HARD_BREAK)
            || self
                .registry
                .get(&node.node_type)
                .is_some_and(|extension| extension.level() == ExtensionLevel::Inline)
    }

    fn render_list(&self, list: &DocumentNode, alternate: bool) -> String {
        let start = list.attr_u64("start").unwrap_or(1);
        let items: Vec<String> = list
            .content
            .iter()
            .enumerate()
            .map(|(index, item)| {
                let (marker, indent) = match list.node_type.as_str() {
                    node_types::ORDERED_LIST => {
                        let delimiter = if alternate { ')' } else { '.' };
                        let marker = format!("{}{delimiter} ", start.saturating_add(index as u64));
                        let width = marker.len();
                        (marker, width)
                    }
                    node_types::TASK_LIST => {
                        let check = if item.attr_bool("checked").unwrap_or(false) {
                            'x'
                        } else {
                            ' '
                        };
                        let bullet = if alternate { '*' } else { '-' };
                        (format!("{bullet} [{check}] "), 2)
                    }
                    _ => (if alternate { "* " } else { "- " }.to_string(), 2),
                };
                let body = if item.is(node_types::LIST_ITEM) || item.is(node_types::TASK_ITEM) {
                    self.render_blocks(&item.content, true)
                } else {
                    self.render_block(item)
                };
                indent_item(&body, &marker, indent)
            })
            .collect();
        items.join("\n")
    }

    fn render_table(&self, table: &DocumentNode) -> String {
        let rows: Vec<Vec<String>> = table
            .content
            .iter()
            .map(|row| {
                row.content
                    .iter()
                    .map(|cell| self.render_inline(&cell_inlines(cell), true).trim().to_string())
                    .collect()
            })
            .collect();
        let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
        if columns == 0 {
            return String::new();
        }
        let aligns: Vec<&str> = (0..columns)
            .map(|column| {
                let align = table
                    .content
                    .first()
                    .and_then(|row| row.content.get(column))
                    .and_then(|cell| cell.attr_str("align"));
                match align {
                    Some("left") => ":---",
                    Some("center") => ":---:",
                    Some("right") => "---:",
                    _ => "---",
                }
            })
            .collect();

        let format_row = |cells: &[String]| {
            let padded: Vec<&str> = (0..columns)
                .map(|i| cells.get(i).map(String::as_str).unwrap_or(""))
                .collect();
            format!("| {} |", padded.join(" | "))
        };

        let mut lines = vec![format_row(&rows[0]), format!("| {} |", aligns.join(" | "))];
        lines.extend(rows[1..].iter().map(|row| format_row(row)));
        lines.join("\n")
    }

    /// Render inline nodes. `single_line` turns breaks into spaces for
    /// headings and table cells.
    fn render_inline(&self, nodes: &[DocumentNode], single_line: bool) -> String {
        InlineWriter::new(self, nodes, single_line).write()
    }
}

/// Recursion and context handle passed to extension serializers.
pub struct SerializeHelpers<'s, 'r> {
    serializer: &'s MarkdownSerializer<'r>,
}

impl<'s, 'r> SerializeHelpers<'s, 'r> {
    pub fn flavor(&self) -> FlavorConfig {
        self.serializer.flavor
    }

    /// Block children joined by blank lines.
    pub fn render_blocks(&self, nodes: &[DocumentNode]) -> String {
        self.serializer.render_blocks(nodes, false)
    }

    /// Each child rendered as a block, joined by `separator`.
    pub fn render_children(&self, nodes: &[DocumentNode], separator: &str) -> String {
        nodes
            .iter()
            .map(|node| self.serializer.render_block(node))
            .filter(|rendered| !rendered.is_empty())
            .collect::<Vec<_>>()
            .join(separator)
    }

    pub fn render_inline(&self, nodes: &[DocumentNode]) -> String {
        self.serializer.render_inline(nodes, false)
    }

    pub fn render_block(&self, node: &DocumentNode) -> String {
        self.serializer.render_block(node)
    }
}

fn is_list(node: &DocumentNode) -> bool {
    node.is(node_types::BULLET_LIST)
        || node.is(node_types::ORDERED_LIST)
        || node.is(node_types::TASK_LIST)
}

/// Lists that may follow a paragraph without a blank line inside a list item.
fn starts_tight(previous: &DocumentNode, node: &DocumentNode) -> bool {
    previous.is(node_types::PARAGRAPH)
        && (node.is(node_types::BULLET_LIST)
            || node.is(node_types::TASK_LIST)
            || (node.is(node_types::ORDERED_LIST) && node.attr_u64("start").unwrap_or(1) == 1))
}

/// Escape a trailing `#` run that would read back as a closing sequence.
fn guard_closing_hashes(text: &str) -> String {
    let body = text.trim_end_matches('#');
    if body.len() != text.len() && body.ends_with([' ', '\t']) {
        format!("{body}\\{}", &text[body.len()..])
    } else {
        text.to_string()
    }
}

/// Prefix every line with `prefix`; blank lines get the prefix without trailing space.
pub fn prefix_lines(text: &str, prefix: &str) -> String {
    if text.is_empty() {
        return prefix.trim_end().to_string();
    }
    text.split('\n')
        .map(|line| {
            if line.is_empty() {
                prefix.trim_end().to_string()
            } else {
                format!("{prefix}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn indent_item(body: &str, marker: &str, indent: usize) -> String {
    if body.is_empty() {
        return marker.trim_end().to_string();
    }
    let pad = " ".repeat(indent);
    body.split('\n')
        .enumerate()
        .map(|(i, line)| match (i, line.is_empty()) {
            (0, _) => format!("{marker}{line}"),
            (_, true) => String::new(),
            _ => format!("{pad}{line}"),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_code_block(node: &DocumentNode) -> String {
    let code = node.text_content();
    let language = node.attr_str("language").unwrap_or_default();
    let fence_char = if language.contains('`') { '~' } else { '`' };
    let longest = longest_run(&code, fence_char);
    let fence = fence_char.to_string().repeat((longest + 1).max(3));
    if code.is_empty() {
        format!("{fence}{language}\n{fence}")
    } else {
        format!("{fence}{language}\n{code}\n{fence}")
    }
}

fn render_image(node: &DocumentNode) -> String {
    let alt = escape_text(node.attr_str("alt").unwrap_or_default(), false, None);
    let src = format_destination(node.attr_str("src").unwrap_or_default());
    match node.attr_str("title") {
        Some(title) => format!("![{alt}]({src} \"{}\")", escape_title(title)),
        None => format!("![{alt}]({src})"),
    }
}

/// Inline content of a table cell; block children are flattened with spaces.
fn cell_inlines(cell: &DocumentNode) -> Vec<DocumentNode> {
    if cell.content.iter().all(|child| child.content.is_empty()) {
        return cell.content.clone();
    }
    let mut inlines = Vec::new();
    for (index, child) in cell.content.iter().enumerate() {
        if index > 0 {
            inlines.push(DocumentNode::text(" "));
        }
        if child.content.is_empty() {
            inlines.push(child.clone());
        } else {
            inlines.extend(child.content.iter().cloned());
        }
    }
    inlines
}

fn longest_run(text: &str, c: char) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for ch in text.chars() {
        if ch == c {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

pub(crate) fn format_destination(href: &str) -> String {
    if href.is_empty() || href.contains(|c: char| c.is_whitespace() || c == '(' || c == ')') {
        format!("<{}>", href.replace('<', "%3C").replace('>', "%3E"))
    } else {
        href.replace('\\', "\\\\")
    }
}

fn escape_title(title: &str) -> String {
    title.replace('\\', "\\\\").replace('"', "\\\"")
}

fn code_span(text: &str) -> String {
    let fence = "`".repeat(longest_run(text, '`') + 1);
    let pad = text.starts_with('`')
        || text.ends_with('`')
        || (text.starts_with(' ') && text.ends_with(' ') && !text.trim().is_empty());
    if pad {
        format!("{fence} {text} {fence}")
    } else {
        format!("{fence}{text}{fence}")
    }
}

fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Escape characters that would otherwise be read as Markdown syntax.
///
/// `line_start` says whether `text` begins at the start of a line; `prev` is
/// the character written just before it.
pub fn escape_text(text: &str, line_start: bool, prev: Option<char>) -> String {
    let mut out = String::with_capacity(text.len());
    let chars: Vec<char> = text.chars().collect();
    let mut at_line_start = line_start;
    let mut prev = prev;
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        if at_line_start {
            match c {
                '#' | '>' => out.push('\\'),
                '-' | '+' | '=' if matches!(next, None | Some(' ') | Some('\n')) => {
                    out.push('\\')
                }
                ':' if next == Some(':') && chars.get(i + 2) == Some(&':') => out.push('\\'),
                d if d.is_ascii_digit() => {
                    let digits = chars[i..].iter().take_while(|c| c.is_ascii_digit()).count();
                    let delimiter = chars.get(i + digits).copied();
                    let after = chars.get(i + digits + 1).copied();
                    if matches!(delimiter, Some('.') | Some(')'))
                        && matches!(after, None | Some(' ') | Some('\n'))
                    {
                        out.extend(&chars[i..i + digits]);
                        out.push('\\');
                        i += digits;
                        prev = chars.get(i - 1).copied();
                        at_line_start = false;
                        continue;
                    }
                }
                _ => {}
            }
        }
        match c {
            '\\' | '*' | '_' | '`' | '[' | ']' | '~' | '$' | '|' => out.push('\\'),
            '@' if !prev.is_some_and(is_word) && next.is_some_and(is_word) => out.push('\\'),
            _ => {}
        }
        out.push(c);
        at_line_start = c == '\n';
        prev = Some(c);
        i += 1;
    }
    out
}

struct OpenMark<'n> {
    mark: &'n Mark,
    close: String,
}

/// Writes a run of inline nodes, opening and closing mark delimiters as the
/// mark set changes from one leaf to the next.
struct InlineWriter<'w, 'r, 'n> {
    serializer: &'w MarkdownSerializer<'r>,
    nodes: &'n [DocumentNode],
    single_line: bool,
    out: String,
    active: Vec<OpenMark<'n>>,
    pending_space: String,
    /// Inline extension written last, and the output length right after it.
    previous_extension: Option<(&'r dyn NodeExtension, usize)>,
}

impl<'w, 'r, 'n> InlineWriter<'w, 'r, 'n> {
    fn new(
        serializer: &'w MarkdownSerializer<'r>,
        nodes: &'n [DocumentNode],
        single_line: bool,
    ) -> Self {
        InlineWriter {
            serializer,
            nodes,
            single_line,
            out: String::new(),
            active: Vec::new(),
            pending_space: String::new(),
            previous_extension: None,
        }
    }

    fn write(mut self) -> String {
        let nodes = self.nodes;
        for (index, node) in nodes.iter().enumerate() {
            let previous_extension = self.previous_extension.take();
            if node.is(node_types::HARD_BREAK) {
                self.transition(index, &[]);
                self.pending_space.clear();
                self.out.push_str(if self.single_line { " " } else { "\\\n" });
                continue;
            }
            let marks = styling_marks(node);
            if node.is_text() {
                let text = node.text.as_deref().unwrap_or_default();
                let text = if self.single_line {
                    text.replace('\n', " ")
                } else {
                    text.to_string()
                };
                if node.has_mark(mark_types::CODE) {
                    if text.is_empty() {
                        continue;
                    }
                    self.transition(index, &marks);
                    self.out.push_str(&code_span(&text));
                    continue;
                }
                let core = text.trim_matches(char::is_whitespace);
                if core.is_empty() {
                    self.pending_space.push_str(&text);
                    continue;
                }
                let lead = &text[..text.len() - text.trim_start().len()];
                let trail = &text[lead.len() + core.len()..];
                self.flush_pending_before(index, &marks, lead);
                let line_start = self.out.is_empty() || self.out.ends_with('\n');
                let mut escaped = escape_text(core, line_start, self.out.chars().next_back());
                let touches_extension = previous_extension.is_some_and(|(extension, end)| {
                    end == self.out.len() && extension.absorbs(core)
                });
                if touches_extension
                    && escaped.starts_with(|c: char| c.is_ascii_punctuation() && c != '\\')
                {
                    escaped.insert(0, '\\');
                }
                self.out.push_str(&escaped);
                self.pending_space = trail.to_string();
            } else {
                self.transition(index, &marks);
                let registry: &'r ExtensionRegistry = self.serializer.registry;
                let extension = registry.get(&node.node_type);
                let rendered = match extension {
                    Some(extension) => extension.serialize(node, &self.serializer.helpers()),
                    None if node.is(node_types::IMAGE) => render_image(node),
                    None => self.serializer.render_unknown(node),
                };
                self.out.push_str(&rendered);
                self.previous_extension = extension.map(|extension| (extension, self.out.len()));
            }
        }
        self.close_to(0);
        let pending = std::mem::take(&mut self.pending_space);
        self.out.push_str(&pending);
        self.out
    }

    /// Close marks not shared with `target`, emit pending whitespace, then open the rest.
    fn transition(&mut self, index: usize, target: &[&'n Mark]) {
        self.flush_pending_before(index, target, "");
    }

    fn flush_pending_before(&mut self, index: usize, target: &[&'n Mark], lead: &str) {
        let common = self
            .active
            .iter()
            .zip(target)
            .take_while(|(open, mark)| open.mark == **mark)
            .count();
        self.close_to(common);
        let pending = std::mem::take(&mut self.pending_space);
        self.out.push_str(&pending);
        self.out.push_str(lead);
        for (depth, mark) in target.iter().copied().enumerate().skip(common) {
            let (open, close) = self.delimiters(mark, index, depth);
            self.out.push_str(&open);
            self.active.push(OpenMark { mark, close });
        }
    }

    fn close_to(&mut self, depth: usize) {
        while self.active.len() > depth {
            if let Some(open) = self.active.pop() {
                self.out.push_str(&open.close);
            }
        }
    }

    fn delimiters(&self, mark: &Mark, index: usize, depth: usize) -> (String, String) {
        match mark.mark_type.as_str() {
            mark_types::BOLD => ("**".to_string(), "**".to_string()),
            mark_types::STRIKE => ("~~".to_string(), "~~".to_string()),
            mark_types::ITALIC => {
                let before = self.out.chars().next_back();
                let after = self.char_after_span(index, depth, mark);
                let delimiter = if before.is_some_and(char::is_alphanumeric)
                    || after.is_some_and(char::is_alphanumeric)
                {
                    "*"
                } else {
                    "_"
                };
                (delimiter.to_string(), delimiter.to_string())
            }
            mark_types::LINK => {
                let href = format_destination(mark.attr_str("href").unwrap_or_default());
                let close = match mark.attr_str("title") {
                    Some(title) => format!("]({href} \"{}\")", escape_title(title)),
                    None => format!("]({href})"),
                };
                ("[".to_string(), close)
            }
            other => {
                warn!(mark_type = %other, "no delimiter for mark type, dropping it");
                (String::new(), String::new())
            }
        }
    }

    /// First character written after the span of `mark` opened at node `index`.
    fn char_after_span(&self, index: usize, depth: usize, mark: &Mark) -> Option<char> {
        let in_span = |node: &DocumentNode| {
            !node.is(node_types::HARD_BREAK)
                && styling_marks(node).get(depth).is_some_and(|m| *m == mark)
        };
        let mut last = index;
        for (offset, node) in self.nodes[index..].iter().enumerate() {
            let whitespace_only = node.is_text()
                && !node.has_mark(mark_types::CODE)
                && node.text.as_deref().is_some_and(|t| t.trim().is_empty());
            if in_span(node) || whitespace_only {
                if !whitespace_only {
                    last = index + offset;
                }
                continue;
            }
            break;
        }
        let last_node = &self.nodes[last];
        if last_node.is_text()
            && !last_node.has_mark(mark_types::CODE)
            && last_node
                .text
                .as_deref()
                .is_some_and(|t| t.ends_with(char::is_whitespace))
        {
            return Some(' ');
        }
        let next = self.nodes.get(last + 1)?;
        if next.is(node_types::HARD_BREAK) {
            return Some('\\');
        }
        if next.is_text() && !next.has_mark(mark_types::CODE) {
            return next.text.as_deref().and_then(|t| t.chars().next());
        }
        None
    }
}

/// Marks rendered as delimiters around the text; `code` is rendered as a span instead.
fn styling_marks(node: &DocumentNode) -> Vec<&Mark> {
    node.marks
        .iter()
        .filter(|mark| !mark.is(mark_types::CODE))
        .collect()
}
