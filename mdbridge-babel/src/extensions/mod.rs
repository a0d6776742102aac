//! Custom node types
//!
//!     Every node type outside the built-in vocabulary is contributed by a
//!     [`NodeExtension`]: one object that knows where its syntax may begin
//!     (`start`), how to recognize it (`tokenize`), how to turn the match into a
//!     node (`parse`) and how to print the node back (`serialize`).
//!
//!     Extensions are handed to an [`ExtensionRegistry`] as an explicit ordered
//!     list. Order matters in one place only: when two extensions match at the
//!     same offset, the one registered first wins. Registered extensions are
//!     always tried before the built-in Markdown rules at a given position, so a
//!     custom block whose trigger overlaps a built-in construct (a `> [!NOTE]`
//!     alert looks like a blockquote) is recognized as the custom type.
//!
//!     Tokenizers and parsers signal "no match" with `None`; they must never
//!     panic. The drivers fall back to plain text for anything left unclaimed.

pub mod callout;
pub mod diagram;
pub mod math;
pub mod mention;
pub mod toc;
pub mod wiki_link;

pub use callout::CalloutExtension;
pub use diagram::DiagramExtension;
pub use math::{MathBlockExtension, MathInlineExtension};
pub use mention::MentionExtension;
pub use toc::TableOfContentsExtension;
pub use wiki_link::WikiLinkExtension;

use crate::formats::markdown::parser::ParseHelpers;
use crate::formats::markdown::serializer::SerializeHelpers;
use crate::model::{DocumentNode, Token};

/// Whether an extension scans across lines or within a single block's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtensionLevel {
    Block,
    Inline,
}

/// Tokenize, parse and serialize rules for one custom node type.
pub trait NodeExtension: Send + Sync {
    /// The node type this extension produces and serializes.
    fn name(&self) -> &str;

    fn level(&self) -> ExtensionLevel;

    /// Earliest byte offset in `source` at which this extension might match.
    ///
    /// Used to skip ahead cheaply; a candidate that does not tokenize is
    /// simply passed over. The default never proposes a candidate, which makes
    /// the extension serialize-only.
    fn start(&self, _source: &str) -> Option<usize> {
        None
    }

    /// Try to match at offset 0 of `source`.
    fn tokenize(&self, _source: &str) -> Option<Token> {
        None
    }

    /// Line-start offsets in `source` where [`NodeExtension::tokenize`] is
    /// certain to fail, found in a single pass.
    ///
    /// Block extensions whose closer may lie anywhere below the opener
    /// override this. The block tokenizer asks once per scope, after the
    /// first failed attempt, and never probes the returned offsets again.
    /// Offsets must be ascending.
    fn unmatched_openers(&self, _source: &str) -> Vec<usize> {
        Vec::new()
    }

    /// Inline extensions may refuse a candidate based on the character before it.
    fn accepts_after(&self, _prev: Option<char>) -> bool {
        true
    }

    /// Whether `following`, written directly after this inline node, would be
    /// read back as part of it. The serializer then escapes its first character.
    fn absorbs(&self, _following: &str) -> bool {
        false
    }

    /// Turn a token produced by [`NodeExtension::tokenize`] into a node.
    fn parse(&self, token: &Token, helpers: &ParseHelpers<'_, '_>) -> Option<DocumentNode>;

    /// Render a node of this type as Markdown.
    ///
    /// Block extensions return the block without surrounding blank lines;
    /// inline extensions return the inline text without marks.
    fn serialize(&self, node: &DocumentNode, helpers: &SerializeHelpers<'_, '_>) -> String;
}

/// Ordered table of custom node types, looked up by name.
pub struct ExtensionRegistry {
    extensions: Vec<Box<dyn NodeExtension>>,
}

impl ExtensionRegistry {
    /// Create a registry from an explicit registration order.
    ///
    /// A name that appears twice replaces the earlier extension in place.
    pub fn new(extensions: Vec<Box<dyn NodeExtension>>) -> Self {
        let mut registry = Self::empty();
        for extension in extensions {
            registry.register_boxed(extension);
        }
        registry
    }

    pub fn empty() -> Self {
        ExtensionRegistry {
            extensions: Vec::new(),
        }
    }

    /// Registry holding every custom node type this crate ships.
    pub fn with_defaults() -> Self {
        Self::new(default_extensions())
    }

    pub fn register<E: NodeExtension + 'static>(&mut self, extension: E) {
        self.register_boxed(Box::new(extension));
    }

    pub fn register_boxed(&mut self, extension: Box<dyn NodeExtension>) {
        match self
            .extensions
            .iter()
            .position(|existing| existing.name() == extension.name())
        {
            Some(index) => self.extensions[index] = extension,
            None => self.extensions.push(extension),
        }
    }

    pub fn get(&self, name: &str) -> Option<&dyn NodeExtension> {
        self.extensions
            .iter()
            .find(|extension| extension.name() == name)
            .map(|extension| extension.as_ref())
    }

    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Registered names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.extensions.iter().map(|e| e.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    /// Extensions of one level, in registration order.
    pub fn at_level(&self, level: ExtensionLevel) -> Vec<&dyn NodeExtension> {
        self.extensions
            .iter()
            .filter(|extension| extension.level() == level)
            .map(|extension| extension.as_ref())
            .collect()
    }
}

impl Default for ExtensionRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl std::fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// The shipped custom node types in their default registration order.
pub fn default_extensions() -> Vec<Box<dyn NodeExtension>> {
    vec![
        Box::new(CalloutExtension),
        Box::new(TableOfContentsExtension),
        Box::new(MathBlockExtension),
        Box::new(DiagramExtension),
        Box::new(MentionExtension),
        Box::new(WikiLinkExtension),
        Box::new(MathInlineExtension),
    ]
}

/// Per-extension cache of the next candidate offset.
///
/// Offsets are absolute within the scanned source. A cached candidate is
/// reused until the cursor moves past it, so each `start` call scans forward
/// from the cursor at most once per candidate.
pub(crate) struct CandidateCache<'a> {
    source: &'a str,
    entries: Vec<CacheEntry>,
}

#[derive(Clone, Copy)]
struct CacheEntry {
    searched_from: usize,
    candidate: Option<usize>,
    fresh: bool,
}

impl<'a> CandidateCache<'a> {
    pub(crate) fn new(source: &'a str, count: usize) -> Self {
        CandidateCache {
            source,
            entries: vec![
                CacheEntry {
                    searched_from: 0,
                    candidate: None,
                    fresh: false,
                };
                count
            ],
        }
    }

    /// Next candidate offset `>= at` for the extension at `index`.
    pub(crate) fn candidate(
        &mut self,
        index: usize,
        extension: &dyn NodeExtension,
        at: usize,
    ) -> Option<usize> {
        let entry = self.entries[index];
        if entry.fresh && entry.searched_from <= at {
            match entry.candidate {
                Some(offset) if offset >= at => return Some(offset),
                None => return None,
                _ => {}
            }
        }
        let candidate = self
            .source
            .get(at..)
            .and_then(|rest| extension.start(rest))
            .map(|offset| at + offset)
            .filter(|offset| self.source.is_char_boundary(*offset));
        self.entries[index] = CacheEntry {
            searched_from: at,
            candidate,
            fresh: true,
        };
        candidate
    }

    /// Smallest candidate `>= at` across all extensions.
    pub(crate) fn nearest(&mut self, extensions: &[&dyn NodeExtension], at: usize) -> Option<usize> {
        let mut nearest: Option<usize> = None;
        for (index, extension) in extensions.iter().enumerate() {
            if let Some(offset) = self.candidate(index, *extension, at) {
                nearest = Some(nearest.map_or(offset, |n: usize| n.min(offset)));
            }
        }
        nearest
    }
}
