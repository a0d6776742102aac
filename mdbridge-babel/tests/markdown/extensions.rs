//! Custom node types: the shipped set and caller-defined ones

use crate::common::{export, parse, reparse};
use mdbridge_babel::extensions::{
    default_extensions, ExtensionLevel, ExtensionRegistry, NodeExtension,
};
use mdbridge_babel::flavor::{Flavor, FlavorConfig};
use mdbridge_babel::formats::markdown::{
    parse_markdown, serialize_markdown, ParseHelpers, SerializeHelpers,
};
use mdbridge_babel::model::{node_types, DocumentNode, Token};

/// `==text==` highlight, an inline atom carrying its text in an attribute.
struct Highlight;

impl NodeExtension for Highlight {
    fn name(&self) -> &str {
        "highlight"
    }
    fn level(&self) -> ExtensionLevel {
        ExtensionLevel::Inline
    }
    fn start(&self, source: &str) -> Option<usize> {
        source.find("==")
    }
    fn tokenize(&self, source: &str) -> Option<Token> {
        let body = source.strip_prefix("==")?;
        let close = body.find("==")?;
        (close > 0).then(|| {
            Token::new("highlight", &source[..close + 4]).with_attr("text", &body[..close])
        })
    }
    fn parse(&self, token: &Token, _helpers: &ParseHelpers<'_, '_>) -> Option<DocumentNode> {
        Some(DocumentNode::new("highlight").with_attr("text", token.attr_str("text")?))
    }
    fn serialize(&self, node: &DocumentNode, _helpers: &SerializeHelpers<'_, '_>) -> String {
        format!("=={}==", node.attr_str("text").unwrap_or_default())
    }
}

/// A block that claims any line starting with `!!!`, declining empty ones at parse time.
struct Banner(&'static str);

impl NodeExtension for Banner {
    fn name(&self) -> &str {
        self.0
    }
    fn level(&self) -> ExtensionLevel {
        ExtensionLevel::Block
    }
    fn start(&self, source: &str) -> Option<usize> {
        source.find("!!!")
    }
    fn tokenize(&self, source: &str) -> Option<Token> {
        let end = source.find('\n').map_or(source.len(), |i| i + 1);
        let line = source[..end].strip_prefix("!!!")?;
        Some(Token::new(self.0, &source[..end]).with_attr("text", line.trim()))
    }
    fn parse(&self, token: &Token, helpers: &ParseHelpers<'_, '_>) -> Option<DocumentNode> {
        let text = token.attr_str("text").filter(|t| !t.is_empty())?;
        Some(DocumentNode::new(self.0).with_content(helpers.parse_inline(text)))
    }
    fn serialize(&self, node: &DocumentNode, helpers: &SerializeHelpers<'_, '_>) -> String {
        format!("!!! {}", helpers.render_inline(&node.content))
    }
}

fn registry_with(extra: Vec<Box<dyn NodeExtension>>) -> ExtensionRegistry {
    let mut extensions = default_extensions();
    extensions.extend(extra);
    ExtensionRegistry::new(extensions)
}

#[test]
fn test_mention_needs_a_word_boundary() {
    let doc = parse("x@alice");
    assert_eq!(doc.count("mention"), 0);
    assert_eq!(doc.text_content(), "x@alice");

    let doc = parse("hi @alice");
    assert_eq!(
        doc.find("mention").and_then(|m| m.attr_str("id")),
        Some("alice")
    );
}

#[test]
fn test_shipped_types_round_trip() {
    let sources = [
        "[[toc]]\n",
        "$$\nx^2\n$$\n",
        "Inline $a+b$ math\n",
        "Hello @sam.\n",
        "> [!TIP]\n> Use the tests\n",
    ];
    for source in sources {
        let (first, text, second) = reparse(source, Flavor::Gfm);
        assert_eq!(text, source);
        assert_eq!(first, second, "{source}");
    }
}

#[test]
fn test_wiki_links_round_trip_under_obsidian() {
    let (first, text, second) = reparse("See [[Roadmap|the plan]] today\n", Flavor::Obsidian);
    assert_eq!(text, "See [[Roadmap|the plan]] today\n");
    assert_eq!(first, second);
    assert_eq!(first.count("wikiLink"), 1);
}

#[test]
fn test_diagram_exports_as_plain_code() {
    let doc = DocumentNode::doc(vec![DocumentNode::new("diagram")
        .with_attr("language", "mermaid")
        .with_attr("code", "graph LR\nA-->B")]);
    let text = export(&doc, Flavor::Gfm);
    assert_eq!(text, "```mermaid\ngraph LR\nA-->B\n```\n");
    assert!(parse(&text).content[0].is(node_types::CODE_BLOCK));
}

#[test]
fn test_caller_defined_inline_type() {
    let registry = registry_with(vec![Box::new(Highlight)]);
    let doc = parse_markdown("a ==marked== _b_", &registry);
    let highlight = doc.find("highlight").expect("highlight node");
    assert_eq!(highlight.attr_str("text"), Some("marked"));

    let text = serialize_markdown(&doc, &registry, FlavorConfig::default());
    assert_eq!(text, "a ==marked== _b_\n");
}

#[test]
fn test_custom_block_wins_over_paragraph_and_may_decline() {
    let registry = registry_with(vec![Box::new(Banner("banner"))]);
    let doc = parse_markdown("intro\n!!! **Loud**\n\n!!!\n", &registry);
    assert!(doc.content[0].is(node_types::PARAGRAPH));
    assert!(doc.content[1].is("banner"));
    assert_eq!(doc.content[1].text_content(), "Loud");
    // declined at parse time, so the raw text becomes a paragraph
    assert!(doc.content[2].is(node_types::PARAGRAPH));
    assert_eq!(doc.content[2].text_content(), "!!!");
}

#[test]
fn test_registration_order_breaks_ties() {
    let registry = ExtensionRegistry::new(vec![
        Box::new(Banner("first")),
        Box::new(Banner("second")),
    ]);
    let doc = parse_markdown("!!! hello", &registry);
    assert!(doc.content[0].is("first"));

    let registry = ExtensionRegistry::new(vec![
        Box::new(Banner("second")),
        Box::new(Banner("first")),
    ]);
    let doc = parse_markdown("!!! hello", &registry);
    assert!(doc.content[0].is("second"));
}

#[test]
fn test_unregistered_types_degrade_to_content() {
    let registry = ExtensionRegistry::empty();
    let doc = DocumentNode::doc(vec![DocumentNode::new("callout")
        .with_attr("type", "info")
        .with_content(vec![DocumentNode::paragraph(vec![DocumentNode::text(
            "kept",
        )])])]);
    let text = serialize_markdown(&doc, &registry, FlavorConfig::default());
    assert_eq!(text, "kept\n");

    // without the callout extension the directive is just text
    let parsed = parse_markdown(":::info\nkept\n:::", &registry);
    assert_eq!(parsed.count("callout"), 0);
}
