//! Markdown format implementation
//!
//! Hand-written tokenizer and serializer for the node vocabulary this crate
//! round-trips, extended through the [`ExtensionRegistry`].
//!
//! # Element Mapping Table
//!
//! | Node              | Markdown                          | Import notes                            |
//! |-------------------|-----------------------------------|-----------------------------------------|
//! | paragraph         | text lines                        | soft breaks kept as `\n` in text        |
//! | heading           | `#` … `######`                    | ATX only, closing `#`s stripped          |
//! | blockquote        | `> `                              | no lazy continuation lines              |
//! | bulletList        | `- item` (`*` for a second list)  | `-`, `*`, `+` accepted                  |
//! | orderedList       | `1. item` (`1)` for a second list)| `start` taken from the first item       |
//! | taskList          | `- [ ] item` / `- [x] item`       | only when every item has a checkbox     |
//! | codeBlock         | fenced with backticks             | first info word is the language         |
//! | horizontalRule    | `---`                             | `***`, `___` accepted                   |
//! | image             | `![alt](src "title")` on its line | inline images stay literal text         |
//! | table             | GFM pipe table                    | alignment from the delimiter row        |
//! | bold / italic     | `**x**` / `_x_` (`*x*` in words)  | both delimiter styles                   |
//! | strike / code     | `~~x~~` / `` `x` ``               |                                         |
//! | link              | `[x](href "title")`               | `<href>` form accepted                  |
//! | hardBreak         | `\` + newline                     | two trailing spaces also accepted       |
//!
//! Custom node types (callouts, mentions, math, ...) are documented with their
//! extensions in [`crate::extensions`].
//!
//! # Lossy Conversions
//!
//! - Leading indentation of paragraph lines is dropped.
//! - Setext headings, indented code and raw HTML read as paragraph text.
//! - Emphasis on whitespace at the edge of a run moves outside the delimiters.

pub mod parser;
pub mod serializer;

use crate::error::ConvertError;
use crate::extensions::ExtensionRegistry;
use crate::flavor::Flavor;
use crate::format::Format;
use crate::model::DocumentNode;
use crate::transforms::transform_diagrams;
use std::collections::HashMap;
use std::sync::Arc;

pub use parser::{parse_markdown, MarkdownParser, ParseHelpers};
pub use serializer::{serialize_markdown, MarkdownSerializer, SerializeHelpers};

/// Format implementation for Markdown
pub struct MarkdownFormat {
    extensions: Arc<ExtensionRegistry>,
    flavor: Flavor,
    transform_diagrams: bool,
}

impl MarkdownFormat {
    pub fn new(extensions: Arc<ExtensionRegistry>, flavor: Flavor) -> Self {
        MarkdownFormat {
            extensions,
            flavor,
            transform_diagrams: true,
        }
    }

    /// Whether parsing rewrites diagram code fences into diagram nodes.
    pub fn with_diagram_transform(mut self, enabled: bool) -> Self {
        self.transform_diagrams = enabled;
        self
    }

    pub fn flavor(&self) -> Flavor {
        self.flavor
    }
}

impl Default for MarkdownFormat {
    fn default() -> Self {
        Self::new(Arc::new(ExtensionRegistry::with_defaults()), Flavor::default())
    }
}

impl Format for MarkdownFormat {
    fn name(&self) -> &str {
        "markdown"
    }

    fn description(&self) -> &str {
        "Markdown with callouts, mentions, math, wiki links and diagrams"
    }

    fn file_extensions(&self) -> &[&str] {
        &["md", "markdown"]
    }

    fn supports_parsing(&self) -> bool {
        true
    }

    fn supports_serialization(&self) -> bool {
        true
    }

    fn parse(&self, source: &str) -> Result<DocumentNode, ConvertError> {
        let doc = parse_markdown(source, &self.extensions);
        Ok(if self.transform_diagrams {
            transform_diagrams(doc)
        } else {
            doc
        })
    }

    fn serialize(&self, doc: &DocumentNode) -> Result<String, ConvertError> {
        Ok(serialize_markdown(doc, &self.extensions, self.flavor.config()))
    }

    /// Accepts a `flavor` parameter overriding the configured flavor.
    fn serialize_with_options(
        &self,
        doc: &DocumentNode,
        options: &HashMap<String, String>,
    ) -> Result<String, ConvertError> {
        if let Some(key) = options.keys().find(|key| key.as_str() != "flavor") {
            return Err(ConvertError::NotSupported(format!(
                "Format 'markdown' has no parameter '{key}'"
            )));
        }
        let flavor = options
            .get("flavor")
            .map(|name| Flavor::parse_lenient(name))
            .unwrap_or(self.flavor);
        Ok(serialize_markdown(doc, &self.extensions, flavor.config()))
    }
}
