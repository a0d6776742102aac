//! Flavor purity: flavors change output only

use crate::common::{export, parse};
use mdbridge_babel::flavor::{resolve, CalloutFormat, Flavor, FlavorConfig};

const SAMPLE: &str = "\
# Notes

> [!TIP]
> Read [[Index|the index]] first.

:::danger Stop
Ask @ops before deploying.
:::
";

#[test]
fn test_parse_does_not_depend_on_flavor() {
    let doc = parse(SAMPLE);
    for flavor in Flavor::ALL {
        let text = export(&doc, flavor);
        assert!(!text.is_empty(), "{flavor}");
    }
    // every flavor's output reads back to the same callouts
    for flavor in Flavor::ALL {
        let reread = parse(&export(&doc, flavor));
        assert_eq!(reread.count("callout"), 2, "{flavor}");
    }
}

#[test]
fn test_only_callouts_and_wiki_links_differ() {
    let doc = parse(SAMPLE);
    let gfm = export(&doc, Flavor::Gfm);
    let obsidian = export(&doc, Flavor::Obsidian);
    assert!(gfm.contains("[the index](Index)"));
    assert!(obsidian.contains("[[Index|the index]]"));
    assert!(gfm.starts_with("# Notes\n\n"));
    assert!(obsidian.starts_with("# Notes\n\n"));
}

#[test]
fn test_unknown_flavor_names_resolve_to_gfm() {
    assert_eq!(resolve(Some("asciidoc")), FlavorConfig::default());
    assert_eq!(resolve(None), Flavor::Gfm.config());
    assert_eq!(
        resolve(Some(" Docusaurus ")).callout_format,
        CalloutFormat::Directives
    );
    assert!(!resolve(Some("commonmark")).wiki_link_serialize);
}
