//! Callout (admonition) blocks
//!
//! Four input spellings are accepted regardless of flavor:
//!
//!     :::warning Careful         > [!WARNING]          > [!warning] Careful     > **Warning**: body
//!     body                       > body                > body
//!     :::
//!
//! The directive form accepts any type word; the blockquote forms only match
//! known callout types. Output spelling is chosen by
//! [`FlavorConfig::callout_format`](crate::flavor::FlavorConfig).

use super::{ExtensionLevel, NodeExtension};
use crate::flavor::CalloutFormat;
use crate::formats::markdown::parser::ParseHelpers;
use crate::formats::markdown::serializer::{prefix_lines, SerializeHelpers};
use crate::model::{node_types, DocumentNode, Token};

pub const CALLOUT: &str = "callout";

/// Callout types recognized by the blockquote spellings.
pub const CALLOUT_TYPES: [&str; 7] = [
    "info",
    "note",
    "tip",
    "success",
    "warning",
    "danger",
    "important",
];

#[derive(Debug, Clone, Copy, Default)]
pub struct CalloutExtension;

impl NodeExtension for CalloutExtension {
    fn name(&self) -> &str {
        CALLOUT
    }

    fn level(&self) -> ExtensionLevel {
        ExtensionLevel::Block
    }

    fn start(&self, source: &str) -> Option<usize> {
        let mut offset = 0;
        for line in source.split_inclusive('\n') {
            let trimmed = line.trim_start_matches(' ');
            if line.len() - trimmed.len() <= 3
                && (trimmed.starts_with(":::") || trimmed.starts_with('>'))
            {
                return Some(offset);
            }
            offset += line.len();
        }
        None
    }

    fn tokenize(&self, source: &str) -> Option<Token> {
        let (first, _) = split_line(source);
        if first.trim_start().starts_with(':') {
            tokenize_directive(source)
        } else {
            tokenize_quoted(source)
        }
    }

    /// Directive openers whose closer never arrives.
    ///
    /// One forward pass with a stack of open directives, counting nesting and
    /// skipping code fences the same way [`tokenize_directive`] does. An
    /// opener still on the stack at the end of input saw no closer at its own
    /// level, so its own scan would run off the end too.
    fn unmatched_openers(&self, source: &str) -> Vec<usize> {
        // (offset, fence length) of directives waiting for a closer
        let mut open: Vec<(usize, usize)> = Vec::new();
        let mut in_code: Option<char> = None;
        let mut offset = 0;
        for raw in source.split_inclusive('\n') {
            let start = offset;
            offset += raw.len();
            let line = raw.strip_suffix('\n').unwrap_or(raw);
            let trimmed = line.trim();

            if let Some(marker) = in_code {
                if trimmed.starts_with(&marker.to_string().repeat(3)) {
                    in_code = None;
                }
                continue;
            }
            if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
                in_code = trimmed.chars().next();
                continue;
            }
            if open.is_empty() {
                let indent = line.len() - line.trim_start_matches(' ').len();
                let opener = &line[indent..];
                let fence = colon_run(opener);
                if indent <= 3 && fence >= 3 && directive_header(&opener[fence..]).is_some() {
                    open.push((start, fence));
                }
                continue;
            }
            if trimmed.chars().all(|c| c == ':') && !trimmed.is_empty() {
                let run = trimmed.len();
                let closes = match open.as_slice() {
                    [(_, fence)] => run >= *fence,
                    _ => run >= 3,
                };
                if closes {
                    open.pop();
                }
            } else {
                let fence = colon_run(trimmed);
                if fence >= 3 && directive_header(&trimmed[fence..]).is_some() {
                    open.push((start, fence));
                }
            }
        }
        open.into_iter().map(|(start, _)| start).collect()
    }

    fn parse(&self, token: &Token, helpers: &ParseHelpers<'_, '_>) -> Option<DocumentNode> {
        let kind = token.attr_str("type")?;
        let mut node = DocumentNode::new(CALLOUT).with_attr("type", kind);
        if let Some(title) = token.attr_str("title") {
            node = node.with_attr("title", title);
        }
        Some(node.with_content(helpers.parse_children(&token.tokens)))
    }

    fn serialize(&self, node: &DocumentNode, helpers: &SerializeHelpers<'_, '_>) -> String {
        let kind = node.attr_str("type").unwrap_or("info");
        let title = node.attr_str("title").filter(|t| !t.trim().is_empty());

        match helpers.flavor().callout_format {
            CalloutFormat::GithubAlerts => {
                let header = match title {
                    Some(title) => format!("> [!{}] {title}", github_keyword(kind)),
                    None => format!("> [!{}]", github_keyword(kind)),
                };
                quoted(header, &helpers.render_blocks(&node.content))
            }
            CalloutFormat::ObsidianCallouts => {
                let header = match title {
                    Some(title) => format!("> [!{kind}] {title}"),
                    None => format!("> [!{kind}]"),
                };
                quoted(header, &helpers.render_blocks(&node.content))
            }
            CalloutFormat::Directives => {
                let body = helpers.render_blocks(&node.content);
                let fence = ":".repeat((longest_colon_fence(&body) + 1).max(3));
                let header = match title {
                    Some(title) => format!("{fence}{kind} {title}"),
                    None => format!("{fence}{kind}"),
                };
                if body.is_empty() {
                    format!("{header}\n{fence}")
                } else {
                    format!("{header}\n{body}\n{fence}")
                }
            }
            CalloutFormat::BlockquoteFallback => fallback(kind, node, helpers),
        }
    }
}

fn split_line(source: &str) -> (&str, usize) {
    match source.find('\n') {
        Some(i) => (&source[..i], i + 1),
        None => (source, source.len()),
    }
}

fn colon_run(line: &str) -> usize {
    line.chars().take_while(|c| *c == ':').count()
}

/// `:::type title` … `:::`, nesting aware.
fn tokenize_directive(source: &str) -> Option<Token> {
    let (first, mut cursor) = split_line(source);
    let indent = first.len() - first.trim_start_matches(' ').len();
    if indent > 3 {
        return None;
    }
    let opener = &first[indent..];
    let fence = colon_run(opener);
    if fence < 3 {
        return None;
    }
    let (kind, title) = directive_header(&opener[fence..])?;

    let mut body = Vec::new();
    let mut depth = 0usize;
    let mut in_code: Option<char> = None;
    loop {
        if cursor >= source.len() {
            return None;
        }
        let (line, next) = split_line(&source[cursor..]);
        let next = cursor + next;
        let trimmed = line.trim();

        if let Some(marker) = in_code {
            if trimmed.starts_with(&marker.to_string().repeat(3)) {
                in_code = None;
            }
        } else if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            in_code = trimmed.chars().next();
        } else if !trimmed.is_empty() && trimmed.chars().all(|c| c == ':') {
            let run = trimmed.len();
            if depth > 0 && run >= 3 {
                depth -= 1;
            } else if run >= fence {
                cursor = next;
                break;
            }
        } else if colon_run(trimmed) >= 3 && directive_header(&trimmed[colon_run(trimmed)..]).is_some()
        {
            depth += 1;
        }

        body.push(line);
        cursor = next;
    }

    let mut token = Token::new(CALLOUT, &source[..cursor])
        .with_attr("type", kind)
        .with_block_source(body.join("\n"));
    if let Some(title) = title {
        token = token.with_attr("title", title);
    }
    Some(token)
}

/// Type word and optional title after the opening colons.
fn directive_header(rest: &str) -> Option<(String, Option<String>)> {
    let rest = rest.trim_start();
    let end = rest
        .find(|c: char| !(c.is_alphanumeric() || c == '-' || c == '_'))
        .unwrap_or(rest.len());
    if end == 0 {
        return None;
    }
    let kind = rest[..end].to_lowercase();
    let mut title = rest[end..].trim();
    if let Some(inner) = title.strip_prefix('[').and_then(|t| t.strip_suffix(']')) {
        title = inner.trim();
    }
    let title = (!title.is_empty()).then(|| title.to_string());
    Some((kind, title))
}

/// `> [!TYPE] title` or `> **Type**: text` followed by `>` lines.
fn tokenize_quoted(source: &str) -> Option<Token> {
    let mut cursor = 0;
    let mut lines = Vec::new();
    while cursor < source.len() {
        let (line, next) = split_line(&source[cursor..]);
        match quote_content(line) {
            Some(content) => lines.push(content),
            None => break,
        }
        cursor += next;
    }
    let (first, rest) = lines.split_first()?;

    let (kind, title, lead) = if let Some(header) = first.trim_start().strip_prefix("[!") {
        let (kind, title) = alert_header(header)?;
        (kind, title, None)
    } else {
        let (kind, lead) = bold_label(first)?;
        (kind, None, Some(lead))
    };

    let mut body: Vec<&str> = Vec::with_capacity(lines.len());
    if let Some(lead) = lead.filter(|l| !l.is_empty()) {
        body.push(lead);
    }
    body.extend(rest.iter().copied());

    let mut token = Token::new(CALLOUT, &source[..cursor])
        .with_attr("type", kind)
        .with_block_source(body.join("\n"));
    if let Some(title) = title {
        token = token.with_attr("title", title);
    }
    Some(token)
}

fn quote_content(line: &str) -> Option<&str> {
    let trimmed = line.trim_start_matches(' ');
    if line.len() - trimmed.len() > 3 {
        return None;
    }
    let rest = trimmed.strip_prefix('>')?;
    Some(rest.strip_prefix(' ').unwrap_or(rest))
}

/// The part after `[!`: `KEYWORD]`, an optional fold marker, an optional title.
fn alert_header(header: &str) -> Option<(String, Option<String>)> {
    let close = header.find(']')?;
    let keyword = &header[..close];
    if keyword.is_empty() || !keyword.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let kind = if keyword.chars().all(|c| c.is_ascii_uppercase()) {
        github_type(keyword)?
    } else {
        known_type(keyword)?
    };
    let after = header[close + 1..].trim_start_matches(['-', '+']).trim();
    let title = (!after.is_empty()).then(|| after.to_string());
    Some((kind.to_string(), title))
}

/// `**Type**: rest`, with the colon inside or outside the bold run.
fn bold_label(line: &str) -> Option<(String, &str)> {
    let inner = line.trim_start().strip_prefix("**")?;
    let close = inner.find("**")?;
    let label = inner[..close].trim();
    let after = &inner[close + 2..];
    let (label, rest) = match label.strip_suffix(':') {
        Some(label) => (label.trim(), after),
        None => (label, after.strip_prefix(':')?),
    };
    let kind = known_type(label)?;
    Some((kind.to_string(), rest.trim()))
}

/// Escape the colon of a `**Type**:` first line so a plain blockquote body
/// does not read back as a callout.
pub(crate) fn guard_bold_label(body: &str) -> String {
    let (first, _) = split_line(body);
    if bold_label(first).is_none() {
        return body.to_string();
    }
    let open = first.len() - first.trim_start().len() + 2;
    let Some(close) = first[open..].find("**").map(|i| open + i) else {
        return body.to_string();
    };
    let label = first[..close].trim_end();
    let colon = if label.ends_with(':') {
        label.len() - 1
    } else {
        close + 2
    };
    let mut guarded = body.to_string();
    guarded.insert(colon, '\\');
    guarded
}

fn known_type(word: &str) -> Option<&'static str> {
    let lower = word.to_lowercase();
    CALLOUT_TYPES.iter().copied().find(|known| *known == lower)
}

/// GitHub has five alert keywords for seven types, so `note` and `success`
/// come back from a gfm export as `info` and `tip`.
fn github_type(keyword: &str) -> Option<&'static str> {
    match keyword {
        "NOTE" => Some("info"),
        "TIP" => Some("tip"),
        "IMPORTANT" => Some("important"),
        "WARNING" => Some("warning"),
        "CAUTION" => Some("danger"),
        _ => None,
    }
}

fn github_keyword(kind: &str) -> &'static str {
    match kind {
        "tip" | "success" => "TIP",
        "important" => "IMPORTANT",
        "warning" => "WARNING",
        "danger" => "CAUTION",
        _ => "NOTE",
    }
}

fn quoted(header: String, body: &str) -> String {
    if body.is_empty() {
        header
    } else {
        format!("{header}\n{}", prefix_lines(body, "> "))
    }
}

/// Longest colon-only or colon-led run at a line start of `body`.
fn longest_colon_fence(body: &str) -> usize {
    body.lines()
        .map(|line| colon_run(line.trim_start()))
        .max()
        .unwrap_or(0)
}

fn fallback(kind: &str, node: &DocumentNode, helpers: &SerializeHelpers<'_, '_>) -> String {
    let label = capitalize(kind);
    let (lead, rest) = match node.content.split_first() {
        Some((first, rest)) if first.is(node_types::PARAGRAPH) => {
            (helpers.render_inline(&first.content), rest)
        }
        _ => (String::new(), node.content.as_slice()),
    };

    let mut lines = lead.split('\n');
    let mut out = match lines.next().filter(|l| !l.is_empty()) {
        Some(line) => format!("> **{label}**: {line}"),
        None => format!("> **{label}**:"),
    };
    for line in lines {
        out.push('\n');
        out.push_str(&prefix_lines(line, "> "));
    }
    let rest = helpers.render_blocks(rest);
    if !rest.is_empty() {
        out.push_str("\n>\n");
        out.push_str(&prefix_lines(&rest, "> "));
    }
    out
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
