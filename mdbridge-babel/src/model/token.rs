//! Tokenizer output.

use super::node::Attrs;
use serde_json::Value;

/// A match produced by a tokenizer and consumed by the parser of the same kind.
///
/// `raw` is the exact source consumed, always a prefix of the text the
/// tokenizer was given. A tokenizer that wants its body parsed as blocks sets
/// `block_source`; the driver then fills `tokens` with the block tokens of that
/// text before the token reaches its parser. Inline text to be parsed later goes
/// in `text`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Token {
    pub kind: String,
    pub raw: String,
    pub attrs: Attrs,
    pub text: Option<String>,
    pub block_source: Option<String>,
    pub tokens: Vec<Token>,
}

impl Token {
    pub fn new(kind: impl Into<String>, raw: impl Into<String>) -> Self {
        Token {
            kind: kind.into(),
            raw: raw.into(),
            ..Default::default()
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_block_source(mut self, source: impl Into<String>) -> Self {
        self.block_source = Some(source.into());
        self
    }

    pub fn with_tokens(mut self, tokens: Vec<Token>) -> Self {
        self.tokens = tokens;
        self
    }

    pub fn attr_str(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).and_then(Value::as_str)
    }

    pub fn attr_u64(&self, key: &str) -> Option<u64> {
        self.attrs.get(key).and_then(Value::as_u64)
    }

    pub fn attr_bool(&self, key: &str) -> Option<bool> {
        self.attrs.get(key).and_then(Value::as_bool)
    }

    /// Whether `raw` is a usable match against `source`: non-empty, a true
    /// prefix, and ending on a character boundary.
    pub(crate) fn consumes_prefix_of(&self, source: &str) -> bool {
        !self.raw.is_empty()
            && self.raw.len() <= source.len()
            && source.is_char_boundary(self.raw.len())
            && source.starts_with(self.raw.as_str())
    }
}
