//! Fallback safety: any input parses, and exports, without panicking

use crate::common::{export, parse};
use mdbridge_babel::flavor::Flavor;
use mdbridge_babel::model::node_types;
use proptest::prelude::*;
use std::time::{Duration, Instant};

/// Strings dense in Markdown syntax characters.
fn markdownish() -> impl Strategy<Value = String> {
    proptest::collection::vec(
        prop_oneof![
            Just("\n".to_string()),
            Just("\n\n".to_string()),
            Just("  ".to_string()),
            Just(":::".to_string()),
            Just("> ".to_string()),
            Just("[!NOTE]".to_string()),
            Just("- ".to_string()),
            Just("1. ".to_string()),
            Just("```".to_string()),
            Just("$$".to_string()),
            Just("[[".to_string()),
            Just("]]".to_string()),
            Just("|".to_string()),
            "[*_`~$@\\[\\]()!#\\\\]{1,3}",
            "[a-z ]{1,6}",
        ],
        0..40,
    )
    .prop_map(|parts| parts.concat())
}

#[test]
fn test_unclosed_block_openers_parse_in_linear_time() {
    for line in [":::a\n", "$$a\n"] {
        let source = line.repeat(4000);
        let started = Instant::now();
        let doc = parse(&source);
        let elapsed = started.elapsed();
        assert!(
            elapsed < Duration::from_secs(2),
            "{line:?} x 4000 took {elapsed:?}"
        );
        assert_eq!(doc.content.len(), 1);
        assert!(doc.content[0].is(node_types::PARAGRAPH));
    }
}

#[test]
fn test_closed_inner_directive_survives_unclosed_outer() {
    let doc = parse(":::note\n:::tip\ninner\n:::\n");
    assert!(doc.content[0].is(node_types::PARAGRAPH));
    assert_eq!(doc.content[1].attr_str("type"), Some("tip"));
}

proptest! {
    #[test]
    fn any_input_parses_and_exports(source in markdownish()) {
        let doc = parse(&source);
        prop_assert!(doc.is(node_types::DOC));
        prop_assert!(!doc.content.is_empty());
        for flavor in Flavor::ALL {
            let _ = export(&doc, flavor);
        }
    }

    #[test]
    fn arbitrary_unicode_never_panics(source in "\\PC{0,80}") {
        let doc = parse(&source);
        prop_assert!(!doc.content.is_empty());
        let _ = export(&doc, Flavor::Gfm);
    }

    #[test]
    fn plain_words_become_one_paragraph(words in "[a-z]{1,8}( [a-z]{1,8}){0,6}") {
        let doc = parse(&words);
        prop_assert_eq!(doc.content.len(), 1);
        prop_assert!(doc.content[0].is(node_types::PARAGRAPH));
        prop_assert_eq!(doc.content[0].text_content(), words);
    }
}
