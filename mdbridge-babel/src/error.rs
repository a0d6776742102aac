//! Error types for the outer conversion surfaces
//!
//! The Markdown parser and serializer never fail: malformed syntax degrades to
//! text and unknown nodes degrade to their text content. Errors only exist where
//! a caller asks for something that cannot be produced at all, such as a format
//! that is not registered or a JSON tree that does not deserialize.

use std::fmt;

/// Errors that can occur while converting between formats
#[derive(Debug, Clone, PartialEq)]
pub enum ConvertError {
    /// Format not found in the registry
    FormatNotFound(String),
    /// Input could not be read as a document (JSON trees only)
    ParseError(String),
    /// Output could not be produced
    SerializationError(String),
    /// Format does not support the requested direction or option
    NotSupported(String),
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConvertError::FormatNotFound(name) => write!(f, "Unknown format '{name}'"),
            ConvertError::ParseError(msg) => write!(f, "Could not read document: {msg}"),
            ConvertError::SerializationError(msg) => {
                write!(f, "Could not write document: {msg}")
            }
            ConvertError::NotSupported(msg) => write!(f, "Operation not supported: {msg}"),
        }
    }
}

impl std::error::Error for ConvertError {}

impl From<serde_json::Error> for ConvertError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_data() || err.is_syntax() || err.is_eof() {
            ConvertError::ParseError(err.to_string())
        } else {
            ConvertError::SerializationError(err.to_string())
        }
    }
}
