//! Format implementations
//!
//! Each format converts between a text representation and the document tree.

pub mod json;
pub mod markdown;

pub use json::JsonFormat;
pub use markdown::MarkdownFormat;
