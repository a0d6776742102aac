//! Callout spelling across flavors

use crate::common::{export, paragraph, parse};
use mdbridge_babel::flavor::Flavor;
use mdbridge_babel::model::DocumentNode;

fn callout(kind: &str, body: Vec<DocumentNode>) -> DocumentNode {
    DocumentNode::new("callout")
        .with_attr("type", kind)
        .with_content(body)
}

#[test]
fn test_directive_parses_the_same_under_every_flavor() {
    // parsing takes no flavor at all; the input is read the same way whatever
    // the export flavor will be
    let doc = parse(":::info\nHello\n:::\n");
    let node = &doc.content[0];
    assert!(node.is("callout"));
    assert_eq!(node.attr_str("type"), Some("info"));
    assert_eq!(node.text_content(), "Hello");
}

#[test]
fn test_four_spellings_of_one_callout() {
    let doc = DocumentNode::doc(vec![callout("info", vec![paragraph("Hello")])]);

    let gfm = export(&doc, Flavor::Gfm);
    assert!(gfm.contains("> [!NOTE]"));
    assert!(gfm.contains("Hello"));

    let obsidian = export(&doc, Flavor::Obsidian);
    assert!(obsidian.contains("> [!info]"));

    let docusaurus = export(&doc, Flavor::Docusaurus);
    assert!(docusaurus.starts_with(":::info"));
    assert!(docusaurus.trim_end().ends_with(":::"));

    let commonmark = export(&doc, Flavor::CommonMark);
    assert!(commonmark.contains("> **Info**:"));
}

#[test]
fn test_all_input_spellings_are_accepted() {
    let sources = [
        ":::warning\nMind the step\n:::",
        "> [!WARNING]\n> Mind the step",
        "> [!warning]\n> Mind the step",
        "> **Warning**: Mind the step",
    ];
    for source in sources {
        let doc = parse(source);
        assert_eq!(
            doc.content,
            vec![callout("warning", vec![paragraph("Mind the step")])],
            "{source}"
        );
    }
}

#[test]
fn test_multi_block_body_survives_every_flavor() {
    let doc = DocumentNode::doc(vec![callout(
        "tip",
        vec![
            paragraph("First"),
            DocumentNode::code_block(Some("sh"), "make test"),
            paragraph("Last"),
        ],
    )]);
    for flavor in Flavor::ALL {
        let text = export(&doc, flavor);
        assert_eq!(parse(&text), doc, "{flavor}:\n{text}");
    }
}

#[test]
fn test_titles_survive_obsidian_and_docusaurus() {
    let doc = DocumentNode::doc(vec![callout("danger", vec![paragraph("Hot")])
        .with_attr("title", "Stove")]);
    for flavor in [Flavor::Obsidian, Flavor::Docusaurus] {
        let text = export(&doc, flavor);
        assert_eq!(parse(&text), doc, "{flavor}:\n{text}");
    }
}

#[test]
fn test_callout_inside_a_list_item() {
    let doc = parse("- item\n\n  :::note\n  inside\n  :::\n");
    let item = &doc.content[0].content[0];
    assert!(item.content[1].is("callout"));
    assert_eq!(item.content[1].text_content(), "inside");
}
