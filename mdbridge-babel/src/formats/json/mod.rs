//! JSON document trees
//!
//! The document tree in the `{type, attrs, marks, content, text}` shape
//! editors exchange. Useful for feeding Markdown into an editor from the
//! command line and for inspecting what the parser produced.

use crate::error::ConvertError;
use crate::format::Format;
use crate::model::DocumentNode;
use std::collections::HashMap;

/// Format implementation for JSON document trees
pub struct JsonFormat {
    pretty: bool,
}

impl JsonFormat {
    pub fn new(pretty: bool) -> Self {
        JsonFormat { pretty }
    }

    fn write(&self, doc: &DocumentNode, pretty: bool) -> Result<String, ConvertError> {
        let mut json = if pretty {
            serde_json::to_string_pretty(doc)
        } else {
            serde_json::to_string(doc)
        }
        .map_err(|e| ConvertError::SerializationError(e.to_string()))?;
        json.push('\n');
        Ok(json)
    }
}

impl Default for JsonFormat {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Format for JsonFormat {
    fn name(&self) -> &str {
        "json"
    }

    fn description(&self) -> &str {
        "Editor document tree as JSON"
    }

    fn file_extensions(&self) -> &[&str] {
        &["json"]
    }

    fn supports_parsing(&self) -> bool {
        true
    }

    fn supports_serialization(&self) -> bool {
        true
    }

    fn parse(&self, source: &str) -> Result<DocumentNode, ConvertError> {
        Ok(serde_json::from_str(source)?)
    }

    fn serialize(&self, doc: &DocumentNode) -> Result<String, ConvertError> {
        self.write(doc, self.pretty)
    }

    /// Accepts `pretty=true|false`.
    fn serialize_with_options(
        &self,
        doc: &DocumentNode,
        options: &HashMap<String, String>,
    ) -> Result<String, ConvertError> {
        let mut pretty = self.pretty;
        for (key, value) in options {
            match (key.as_str(), value.as_str()) {
                ("pretty", "true") => pretty = true,
                ("pretty", "false") => pretty = false,
                _ => {
                    return Err(ConvertError::NotSupported(format!(
                        "Format 'json' has no parameter '{key}={value}'"
                    )))
                }
            }
        }
        self.write(doc, pretty)
    }
}
