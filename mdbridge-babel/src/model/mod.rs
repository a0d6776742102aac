//! Document tree and token types shared by both conversion directions.
//!
//!     The document tree ([`DocumentNode`]) is the editor-facing model: a recursive
//!     `{type, attrs, marks, content, text}` record that serializes to the same JSON
//!     shape editors exchange. Tokens ([`Token`]) are the short-lived match records
//!     produced by tokenizers and consumed by parsers within a single parse call.

pub mod node;
pub mod token;

pub use node::{mark_types, node_types, Attrs, DocumentNode, Mark};
pub use token::Token;
