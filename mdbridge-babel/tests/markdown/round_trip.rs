//! Round trips: Markdown → tree → Markdown
//!
//! The snapshots show the normalized spelling; the tree assertions check that
//! normalizing loses nothing the flavor can express.

use crate::common::{export, parse, reparse};
use insta::assert_snapshot;
use mdbridge_babel::flavor::Flavor;

const MIXED: &str = "#  Release notes  \n\n\
* first item\n\
* second item with **bold**\n\n\
1) step one\n\
2) step two\n\n\
> quoted *text*\n\n\
***\n\n\
```\nplain\n```\n\n\
:::info Heads up\n\
Body with @alice and $x$.\n\
:::\n";

#[test]
fn test_normalize_gfm() {
    let output = export(&parse(MIXED), Flavor::Gfm);
    assert_snapshot!(output.trim_end(), @r###"
    # Release notes

    - first item
    - second item with **bold**

    1. step one
    2. step two

    > quoted _text_

    ---

    ```
    plain
    ```

    > [!NOTE] Heads up
    > Body with @alice and $x$.
    "###);
}

#[test]
fn test_normalize_docusaurus() {
    let output = export(&parse(MIXED), Flavor::Docusaurus);
    assert!(output.ends_with(":::info Heads up\nBody with @alice and $x$.\n:::\n"));
}

#[test]
fn test_tree_survives_lossless_flavors() {
    for flavor in [Flavor::Gfm, Flavor::Obsidian, Flavor::Docusaurus] {
        let (first, text, second) = reparse(MIXED, flavor);
        assert_eq!(first, second, "{flavor}:\n{text}");
    }
}

#[test]
fn test_export_is_idempotent() {
    for flavor in Flavor::ALL {
        let once = export(&parse(MIXED), flavor);
        let twice = export(&parse(&once), flavor);
        assert_eq!(once, twice, "{flavor}");
    }
}

#[test]
fn test_nested_containers() {
    let source = "- outer\n\n  > [!WARNING]\n  > deep\n  >\n  > - inner\n\n- next\n";
    let (first, text, second) = reparse(source, Flavor::Gfm);
    assert_eq!(first, second, "{text}");
    assert_snapshot!(text.trim_end(), @r###"
    - outer

      > [!WARNING]
      > deep
      >
      > - inner
    - next
    "###);
}

#[test]
fn test_escapes_round_trip() {
    let source = "\\# not heading, 5 \\* 3, a\\_b, \\[x\\], \\$9, \\@handle\n";
    let (first, text, second) = reparse(source, Flavor::Gfm);
    assert_eq!(first, second, "{text}");
    assert_eq!(
        first.text_content(),
        "# not heading, 5 * 3, a_b, [x], $9, @handle"
    );
}

#[test]
fn test_lookalike_syntax_round_trips() {
    for source in [
        "# a \\#\n",
        "## Tickets \\#\\#\n",
        "@bob\\-x met @amy\\.z\n",
        "> **Warning**\\: x\n",
        "> **Danger\\:** hot\n",
    ] {
        for flavor in Flavor::ALL {
            let (first, text, second) = reparse(source, flavor);
            assert_eq!(first, second, "{flavor}: {text}");
        }
    }
}
