//! Import tests for Markdown format (Markdown → tree)

use crate::common::{paragraph, parse, text};
use mdbridge_babel::model::{mark_types, node_types, DocumentNode, Mark};
use serde_json::Value;

#[test]
fn test_headings_and_paragraphs() {
    let doc = parse("# Title\n\nFirst line\nsecond line\n\n### Deep ###\n");
    assert_eq!(
        doc.content,
        vec![
            DocumentNode::heading(1, vec![text("Title")]),
            paragraph("First line\nsecond line"),
            DocumentNode::heading(3, vec![text("Deep")]),
        ]
    );
}

#[test]
fn test_inline_marks() {
    let doc = parse("**bold** _it_ ~~gone~~ `code` [site](https://example.com \"Home\")");
    let inlines = &doc.content[0].content;
    let marked = |s: &str, mark: Mark| DocumentNode::marked_text(s, vec![mark]);
    assert_eq!(
        inlines,
        &vec![
            marked("bold", Mark::new(mark_types::BOLD)),
            text(" "),
            marked("it", Mark::new(mark_types::ITALIC)),
            text(" "),
            marked("gone", Mark::new(mark_types::STRIKE)),
            text(" "),
            marked("code", Mark::new(mark_types::CODE)),
            text(" "),
            marked(
                "site",
                Mark::link("https://example.com", Some("Home".to_string()))
            ),
        ]
    );
}

#[test]
fn test_nested_lists() {
    let doc = parse("- one\n  - inner\n- two\n");
    let list = &doc.content[0];
    assert!(list.is(node_types::BULLET_LIST));
    assert_eq!(list.content.len(), 2);
    let first = &list.content[0];
    assert!(first.content[0].is(node_types::PARAGRAPH));
    assert!(first.content[1].is(node_types::BULLET_LIST));
    assert_eq!(first.content[1].text_content(), "inner");
}

#[test]
fn test_ordered_list_keeps_start() {
    let doc = parse("3. three\n4. four\n");
    let list = &doc.content[0];
    assert!(list.is(node_types::ORDERED_LIST));
    assert_eq!(list.attr_u64("start"), Some(3));
    assert_eq!(list.content.len(), 2);
}

#[test]
fn test_task_list_needs_every_checkbox() {
    let doc = parse("- [ ] todo\n- [x] done\n");
    let list = &doc.content[0];
    assert!(list.is(node_types::TASK_LIST));
    assert_eq!(list.content[0].attr_bool("checked"), Some(false));
    assert_eq!(list.content[1].attr_bool("checked"), Some(true));
    assert_eq!(list.content[1].text_content(), "done");

    let mixed = parse("- [ ] todo\n- plain\n");
    assert!(mixed.content[0].is(node_types::BULLET_LIST));
}

#[test]
fn test_code_block_is_verbatim() {
    let doc = parse("```rust\nlet x = *y;\n\n// [not a link]\n```\n");
    assert_eq!(
        doc.content,
        vec![DocumentNode::code_block(
            Some("rust"),
            "let x = *y;\n\n// [not a link]"
        )]
    );
}

#[test]
fn test_blockquote_nests_blocks() {
    let doc = parse("> # Quoted\n>\n> body\n");
    let quote = &doc.content[0];
    assert!(quote.is(node_types::BLOCKQUOTE));
    assert!(quote.content[0].is(node_types::HEADING));
    assert_eq!(quote.content[1], paragraph("body"));
}

#[test]
fn test_table_with_alignment() {
    let doc = parse("| Name | Qty |\n| :--- | ---: |\n| pen | 2 |\n");
    let table = &doc.content[0];
    assert!(table.is(node_types::TABLE));
    assert_eq!(table.content.len(), 2);
    let header = &table.content[0].content;
    assert!(header[0].is(node_types::TABLE_HEADER));
    assert_eq!(header[0].attr_str("align"), Some("left"));
    assert_eq!(header[1].attr_str("align"), Some("right"));
    let body = &table.content[1].content;
    assert!(body[1].is(node_types::TABLE_CELL));
    assert_eq!(body[1].text_content(), "2");
}

#[test]
fn test_standalone_image_is_a_block() {
    let doc = parse("![A cat](cat.png \"Cat\")\n\nText with ![inline](x.png) image\n");
    let image = &doc.content[0];
    assert!(image.is(node_types::IMAGE));
    assert_eq!(image.attr_str("src"), Some("cat.png"));
    assert_eq!(image.attr_str("alt"), Some("A cat"));
    assert_eq!(image.attr_str("title"), Some("Cat"));
    assert_eq!(
        doc.content[1].text_content(),
        "Text with ![inline](x.png) image"
    );
}

#[test]
fn test_hard_breaks() {
    let doc = parse("one  \ntwo\\\nthree");
    let kinds: Vec<&str> = doc.content[0]
        .content
        .iter()
        .map(|n| n.node_type.as_str())
        .collect();
    assert_eq!(
        kinds,
        vec!["text", "hardBreak", "text", "hardBreak", "text"]
    );
}

#[test]
fn test_thematic_break_between_paragraphs() {
    let doc = parse("above\n\n***\n\nbelow");
    assert!(doc.content[1].is(node_types::HORIZONTAL_RULE));
    assert_eq!(doc.content.len(), 3);
}

#[test]
fn test_code_block_without_language_is_null() {
    let doc = parse("```\nplain\n```");
    assert_eq!(doc.content[0].attr("language"), Some(&Value::Null));
}
