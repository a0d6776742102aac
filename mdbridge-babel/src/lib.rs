//! Markdown interchange for structured editor documents
//!
//!     This crate converts a structured document tree (the node/mark model editors such as
//!     ProseMirror and Tiptap use) to and from Markdown, and keeps a Markdown rendering of a live
//!     document loosely in sync with edits to it.
//!
//!     TLDR:
//!         - Parsing is flavor independent: every spelling of every supported construct is accepted.
//!         - Serializing takes a flavor, which only changes how callouts and wiki links are written.
//!         - Custom node types are NodeExtensions handed to an ExtensionRegistry in an explicit order.
//!         - Nothing in the conversion path fails: unknown syntax reads as text, unknown nodes are
//!           written as their content.
//!
//!     This is a pure lib, it powers mdbridge-cli but is shell agnostic: no code here prints,
//!     reads env vars or touches the filesystem.
//!
//! Architecture
//!
//!     .
//!     ├── error.rs                # ConvertError, for the outer surfaces only
//!     ├── flavor.rs               # Flavor → FlavorConfig
//!     ├── model                   # DocumentNode, Mark and the intermediate Token
//!     ├── extensions              # NodeExtension trait, ExtensionRegistry, shipped custom types
//!     ├── formats
//!     │   ├── markdown
//!     │   │   ├── parser          # block tokenizer + reducer, inline scanner
//!     │   │   └── serializer.rs
//!     │   └── json                # the tree as editor JSON
//!     ├── transforms.rs           # import post-passes (diagrams)
//!     ├── sync                    # SyncController, DocumentEngine, clocks
//!     ├── format.rs               # Format trait
//!     └── registry.rs             # FormatRegistry
//!
//! Core Algorithms
//!
//!     Parsing is two passes per scope. A block tokenizer walks the text line by line asking
//!     registered block extensions first and the built-in rules second, producing a flat token
//!     stream; nested scopes (blockquotes, list items, callout bodies) are tokenized recursively.
//!     A reducer then maps tokens to nodes. Inline text goes through the same
//!     extensions-then-built-ins scan, with emphasis resolved by delimiter matching.
//!
//!     Serializing is a recursive walk threading one FlavorConfig through every node. Escaping is
//!     done once, by the leaf text writer, so any tree the parser produces prints back to Markdown
//!     that parses to the same tree.
//!
//! Testing
//!
//!     tests
//!     ├── lib.rs
//!     ├── markdown
//!     │   └── <area>.rs
//!     └── sync
//!
//!     Rust does not discover tests in subdirectories by default, so tests/lib.rs includes them.
pub mod error;
pub mod extensions;
pub mod flavor;
pub mod format;
pub mod formats;
pub mod model;
pub mod registry;
pub mod sync;
pub mod transforms;

pub use error::ConvertError;
pub use extensions::{ExtensionLevel, ExtensionRegistry, NodeExtension};
pub use flavor::{CalloutFormat, Flavor, FlavorConfig};
pub use format::Format;
pub use formats::markdown::{parse_markdown, serialize_markdown};
pub use model::{DocumentNode, Mark, Token};
pub use registry::FormatRegistry;
pub use sync::{DocumentEngine, MemoryEngine, SyncController, SyncOptions};
