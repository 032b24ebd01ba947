//! Response parsing.
//!
//! Model output is usually wrapped in markdown fences and sometimes carries
//! YAML document markers. The parser strips those, parses the remainder in the
//! declared format, and reports how many items a top-level list holds. The
//! parsed value itself is only used for that count.

use crate::error::ParseError;
use crate::types::ResponseFormat;
use serde_json::Value;

/// Result of parsing a raw response.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedResponse {
    /// JSON or YAML content, normalized to a JSON value
    Structured(Value),
    /// Format is not parsed; the raw text stands as-is
    Unparsed,
}

impl ParsedResponse {
    /// Length of a top-level list; `None` for anything else.
    pub fn item_count(&self) -> Option<usize> {
        match self {
            Self::Structured(Value::Array(items)) => Some(items.len()),
            _ => None,
        }
    }
}

/// Remove markdown fences and literal `\n` escape sequences.
pub fn clean_json(raw: &str) -> String {
    raw.replace("```json", "")
        .replace("```", "")
        .replace("\\n", "")
}

/// Remove markdown fences and `---` document markers.
pub fn clean_yaml(raw: &str) -> String {
    let unfenced = raw
        .replace("```yaml", "")
        .replace("```yml", "")
        .replace("```", "");
    unfenced
        .lines()
        .map(|line| match line.trim_start().strip_prefix("---") {
            Some(rest) => rest,
            None => line,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parse `raw` according to `format`.
///
/// YAML is deserialized straight into a JSON value: duplicate mapping keys
/// are accepted (last one wins) and scalars are not type-checked.
pub fn parse_response(raw: &str, format: &ResponseFormat) -> Result<ParsedResponse, ParseError> {
    match format {
        ResponseFormat::Json => serde_json::from_str::<Value>(&clean_json(raw))
            .map(ParsedResponse::Structured)
            .map_err(|e| ParseError {
                format: format.to_string(),
                message: e.to_string(),
            }),
        ResponseFormat::Yaml => serde_yaml::from_str::<Value>(&clean_yaml(raw))
            .map(ParsedResponse::Structured)
            .map_err(|e| ParseError {
                format: format.to_string(),
                message: e.to_string(),
            }),
        ResponseFormat::Literal(_) => Ok(ParsedResponse::Unparsed),
    }
}
