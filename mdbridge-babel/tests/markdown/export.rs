//! Export tests for Markdown format (tree → Markdown)
//!
//! These tests check exported Markdown by reading it back with Comrak, an
//! independent CommonMark/GFM implementation, and inspecting its AST.

use crate::common::{export, paragraph, text};
use comrak::nodes::{AstNode, ListType, NodeValue};
use comrak::{parse_document, Arena, Options};
use mdbridge_babel::flavor::Flavor;
use mdbridge_babel::model::{mark_types, node_types, DocumentNode, Mark};

fn comrak_options() -> Options<'static> {
    let mut options = Options::default();
    options.extension.table = true;
    options.extension.strikethrough = true;
    options.extension.tasklist = true;
    options
}

fn to_comrak<'a>(doc: &DocumentNode, arena: &'a Arena<AstNode<'a>>) -> &'a AstNode<'a> {
    let md = export(doc, Flavor::Gfm);
    parse_document(arena, &md, &comrak_options())
}

/// Concatenated text and code literals below `node`.
fn literal_text<'a>(node: &'a AstNode<'a>) -> String {
    let mut out = String::new();
    for descendant in node.descendants() {
        match &descendant.data.borrow().value {
            NodeValue::Text(t) => out.push_str(t),
            NodeValue::Code(code) => out.push_str(&code.literal),
            NodeValue::SoftBreak => out.push('\n'),
            _ => {}
        }
    }
    out
}

fn top_level_kinds<'a>(root: &'a AstNode<'a>) -> Vec<&'static str> {
    root.children()
        .map(|child| match &child.data.borrow().value {
            NodeValue::Paragraph => "paragraph",
            NodeValue::Heading(_) => "heading",
            NodeValue::List(_) => "list",
            NodeValue::CodeBlock(_) => "code",
            NodeValue::BlockQuote => "blockquote",
            NodeValue::ThematicBreak => "rule",
            NodeValue::Table(_) => "table",
            _ => "other",
        })
        .collect()
}

#[test]
fn test_syntax_characters_are_escaped() {
    for literal in [
        "# not a heading",
        "1. not a list",
        "- not a bullet",
        "> not a quote",
        "*stars* and _underscores_ and `ticks`",
        "[brackets](not-a-link)",
        "~~not struck~~",
    ] {
        let arena = Arena::new();
        let root = to_comrak(&DocumentNode::doc(vec![paragraph(literal)]), &arena);
        assert_eq!(top_level_kinds(root), vec!["paragraph"], "{literal}");
        assert_eq!(literal_text(root), literal);
    }
}

#[test]
fn test_marks_survive() {
    let doc = DocumentNode::doc(vec![DocumentNode::paragraph(vec![
        DocumentNode::marked_text("strong", vec![Mark::new(mark_types::BOLD)]),
        text(" "),
        DocumentNode::marked_text("struck", vec![Mark::new(mark_types::STRIKE)]),
        text(" "),
        DocumentNode::marked_text(
            "link",
            vec![Mark::link("https://example.com/a_(b)", None)],
        ),
    ])]);
    let arena = Arena::new();
    let root = to_comrak(&doc, &arena);

    let mut strong = false;
    let mut struck = false;
    let mut url = None;
    for node in root.descendants() {
        match &node.data.borrow().value {
            NodeValue::Strong => strong = true,
            NodeValue::Strikethrough => struck = true,
            NodeValue::Link(link) => url = Some(link.url.clone()),
            _ => {}
        }
    }
    assert!(strong);
    assert!(struck);
    assert_eq!(url.as_deref(), Some("https://example.com/a_(b)"));
}

#[test]
fn test_heading_levels() {
    let doc = DocumentNode::doc(vec![
        DocumentNode::heading(2, vec![text("Two")]),
        DocumentNode::heading(5, vec![text("Five")]),
    ]);
    let arena = Arena::new();
    let root = to_comrak(&doc, &arena);
    let levels: Vec<u8> = root
        .children()
        .filter_map(|child| match &child.data.borrow().value {
            NodeValue::Heading(heading) => Some(heading.level),
            _ => None,
        })
        .collect();
    assert_eq!(levels, vec![2, 5]);
}

#[test]
fn test_code_fence_outgrows_content() {
    let code = "```\ninner\n```";
    let doc = DocumentNode::doc(vec![DocumentNode::code_block(Some("md"), code)]);
    let arena = Arena::new();
    let root = to_comrak(&doc, &arena);
    let block = root.first_child().expect("code block");
    match &block.data.borrow().value {
        NodeValue::CodeBlock(cb) => {
            assert_eq!(cb.info, "md");
            assert_eq!(cb.literal, format!("{code}\n"));
        }
        other => panic!("expected code block, got {other:?}"),
    };
}

#[test]
fn test_lists_and_tasks() {
    let item = |s: &str| DocumentNode::new(node_types::LIST_ITEM).with_content(vec![paragraph(s)]);
    let task = |s: &str, checked: bool| {
        DocumentNode::new(node_types::TASK_ITEM)
            .with_attr("checked", checked)
            .with_content(vec![paragraph(s)])
    };
    let doc = DocumentNode::doc(vec![
        DocumentNode::new(node_types::ORDERED_LIST)
            .with_attr("start", 4)
            .with_content(vec![item("four"), item("five")]),
        DocumentNode::new(node_types::TASK_LIST)
            .with_content(vec![task("open", false), task("closed", true)]),
    ]);
    let arena = Arena::new();
    let root = to_comrak(&doc, &arena);
    assert_eq!(top_level_kinds(root), vec!["list", "list"]);

    let first = root.first_child().expect("ordered list");
    match &first.data.borrow().value {
        NodeValue::List(list) => {
            assert_eq!(list.list_type, ListType::Ordered);
            assert_eq!(list.start, 4);
        }
        other => panic!("expected list, got {other:?}"),
    };
    let tasks = root
        .descendants()
        .filter(|n| matches!(n.data.borrow().value, NodeValue::TaskItem(_)))
        .count();
    assert_eq!(tasks, 2);
}

#[test]
fn test_adjacent_lists_stay_separate() {
    let bullet = |s: &str| {
        DocumentNode::new(node_types::BULLET_LIST).with_content(vec![DocumentNode::new(
            node_types::LIST_ITEM,
        )
        .with_content(vec![paragraph(s)])])
    };
    let doc = DocumentNode::doc(vec![bullet("a"), bullet("b")]);
    let md = export(&doc, Flavor::Gfm);
    assert_eq!(md, "- a\n\n* b\n");

    let arena = Arena::new();
    let root = parse_document(&arena, &md, &comrak_options());
    assert_eq!(top_level_kinds(root), vec!["list", "list"]);
}

#[test]
fn test_table_exports_as_gfm_table() {
    let cell = |kind: &str, s: &str| {
        DocumentNode::new(kind)
            .with_attr("align", serde_json::Value::Null)
            .with_content(vec![text(s)])
    };
    let doc = DocumentNode::doc(vec![DocumentNode::new(node_types::TABLE).with_content(vec![
        DocumentNode::new(node_types::TABLE_ROW).with_content(vec![
            cell(node_types::TABLE_HEADER, "a|b"),
            cell(node_types::TABLE_HEADER, "c"),
        ]),
        DocumentNode::new(node_types::TABLE_ROW).with_content(vec![
            cell(node_types::TABLE_CELL, "1"),
            cell(node_types::TABLE_CELL, "2"),
        ]),
    ])]);
    let arena = Arena::new();
    let root = to_comrak(&doc, &arena);
    assert_eq!(top_level_kinds(root), vec!["table"]);
    let cells = root
        .descendants()
        .filter(|n| matches!(n.data.borrow().value, NodeValue::TableCell))
        .count();
    assert_eq!(cells, 4);
    assert_eq!(literal_text(root), "a|bc12");
}

#[test]
fn test_gfm_callout_reads_as_blockquote() {
    let doc = DocumentNode::doc(vec![DocumentNode::new("callout")
        .with_attr("type", "warning")
        .with_content(vec![paragraph("Careful")])]);
    let arena = Arena::new();
    let root = to_comrak(&doc, &arena);
    assert_eq!(top_level_kinds(root), vec!["blockquote"]);
    assert!(literal_text(root).contains("Careful"));
}
