//! Core data types for a sweep: the enumerable axes, loaded test cases,
//! per-combination outcomes and the flattened tabular record.

use crate::config::TestCaseConfig;
use crate::error::{BenchError, Result};
use crate::llm::ImageInput;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Requested number of items in a model response.
///
/// `-1` in configuration and output maps to [`ItemCount::All`], meaning no
/// count constraint is put in the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum ItemCount {
    /// Return every item the model finds
    All,
    /// Return exactly this many items
    Exactly(u32),
}

impl ItemCount {
    /// Wire value of [`ItemCount::All`].
    pub const SENTINEL: i64 = -1;

    pub fn as_i64(self) -> i64 {
        match self {
            Self::All => Self::SENTINEL,
            Self::Exactly(n) => i64::from(n),
        }
    }
}

impl TryFrom<i64> for ItemCount {
    type Error = String;

    fn try_from(value: i64) -> std::result::Result<Self, Self::Error> {
        if value == Self::SENTINEL {
            return Ok(Self::All);
        }
        u32::try_from(value)
            .map(Self::Exactly)
            .map_err(|_| format!("item count {value} is invalid (use -1 for all items)"))
    }
}

impl From<ItemCount> for i64 {
    fn from(count: ItemCount) -> Self {
        count.as_i64()
    }
}

impl fmt::Display for ItemCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_i64())
    }
}

/// Output format the model is asked to produce.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ResponseFormat {
    Json,
    Yaml,
    /// Any other identifier: passed through to the prompt, never parsed
    Literal(String),
}

impl ResponseFormat {
    /// Parse a format identifier (case-insensitive for the structured formats).
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            "yaml" => Self::Yaml,
            _ => Self::Literal(s.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
            Self::Literal(s) => s,
        }
    }
}

impl From<String> for ResponseFormat {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<ResponseFormat> for String {
    fn from(format: ResponseFormat) -> Self {
        format.as_str().to_string()
    }
}

impl fmt::Display for ResponseFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A test case with its image read and encoded, ready for transmission.
#[derive(Debug, Clone)]
pub struct TestCase {
    pub name: String,
    /// Prompt template; the count and format clauses are appended to it
    pub prompt: String,
    /// Where the image was read from (recorded in the results table)
    pub image_path: PathBuf,
    pub image: ImageInput,
}

impl TestCase {
    /// Read the image once and keep it base64-encoded for the whole run.
    pub fn load(config: &TestCaseConfig, base_dir: &Path) -> Result<Self> {
        let image_path = crate::config::resolve_path(base_dir, &config.image);
        let bytes = std::fs::read(&image_path).map_err(|source| BenchError::Asset {
            name: config.name.clone(),
            path: image_path.clone(),
            source,
        })?;
        let extension = image_path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("jpeg")
            .to_lowercase();
        tracing::debug!(
            "Loaded image for '{}' ({} bytes) from {:?}",
            config.name,
            bytes.len(),
            image_path
        );

        Ok(Self {
            name: config.name.clone(),
            prompt: config.prompt.clone(),
            image: ImageInput::from_bytes(&bytes, &extension),
            image_path,
        })
    }
}

/// One point of the sweep: (test case, model, requested count, format).
#[derive(Debug, Clone, Copy)]
pub struct Combination<'a> {
    pub test: &'a TestCase,
    pub model: &'a str,
    pub count: ItemCount,
    pub format: &'a ResponseFormat,
}

/// What a single model invocation produced. Lives only until recorded.
#[derive(Debug, Clone)]
pub struct InvocationOutcome {
    pub raw_content: String,
    pub requested_item_count: ItemCount,
    /// `None` when the format is not parsed or parsing failed
    pub parsed_item_count: Option<usize>,
    pub content_length: usize,
    pub execution_time_ms: f64,
}

/// One row of the results table.
///
/// The raw response is written to its own file and never duplicated here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub format: String,
    pub model: String,
    pub count: i64,
    pub name: String,
    pub prompt: String,
    pub image: String,
    pub requested_item_count: i64,
    pub parsed_item_count: Option<usize>,
    pub content_length: usize,
    pub execution_time_ms: f64,
}

impl ResultRecord {
    /// Column names, in field order.
    pub const HEADERS: [&'static str; 10] = [
        "format",
        "model",
        "count",
        "name",
        "prompt",
        "image",
        "requested_item_count",
        "parsed_item_count",
        "content_length",
        "execution_time_ms",
    ];

    pub fn new(combination: &Combination<'_>, outcome: &InvocationOutcome) -> Self {
        Self {
            format: combination.format.to_string(),
            model: combination.model.to_string(),
            count: combination.count.as_i64(),
            name: combination.test.name.clone(),
            prompt: combination.test.prompt.clone(),
            image: combination.test.image_path.display().to_string(),
            requested_item_count: outcome.requested_item_count.as_i64(),
            parsed_item_count: outcome.parsed_item_count,
            content_length: outcome.content_length,
            execution_time_ms: outcome.execution_time_ms,
        }
    }
}
