//! Sub-configuration structs with defaults matching the reference sweep.

use crate::types::{ItemCount, ResponseFormat};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Root directory for per-combination response files
    pub output_root: PathBuf,

    /// CSV file receiving one row per combination
    pub results_file: PathBuf,

    /// Optional JSON-lines mirror of the results table
    pub stats_file: Option<PathBuf>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output_root: PathBuf::from("./output"),
            results_file: PathBuf::from("./output/output.csv"),
            stats_file: None,
        }
    }
}

/// The enumerable axes of the sweep (besides the test cases).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    /// Model identifiers, in sweep order
    pub models: Vec<String>,

    /// Output formats, in sweep order
    pub formats: Vec<ResponseFormat>,

    /// Requested item counts, in sweep order (-1 = all items)
    pub item_counts: Vec<ItemCount>,

    /// Abort the run on the first unparseable response instead of
    /// recording an empty item count
    pub fail_on_parse_error: bool,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            models: vec![
                "gemini-1.5-pro-001".to_string(),
                "gemini-1.5-flash-001".to_string(),
            ],
            formats: vec![ResponseFormat::Json, ResponseFormat::Yaml],
            item_counts: vec![
                ItemCount::Exactly(1),
                ItemCount::Exactly(5),
                ItemCount::Exactly(10),
                ItemCount::Exactly(20),
                ItemCount::All,
            ],
            fail_on_parse_error: false,
        }
    }
}

/// Rate-limit backoff settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Fixed delay before the single retry after HTTP 429, in seconds
    pub backoff_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { backoff_secs: 60 }
    }
}

/// Vertex AI connection settings.
///
/// Values support `${ENV_VAR}` syntax and are resolved once at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VertexConfig {
    /// Google Cloud project identifier
    pub project: String,

    /// Region, e.g. "us-central1"
    pub location: String,

    /// OAuth access token (e.g. from `gcloud auth print-access-token`)
    pub access_token: String,

    /// Override for the API base URL; empty means the regional endpoint
    pub endpoint: String,
}

impl Default for VertexConfig {
    fn default() -> Self {
        Self {
            project: "${GOOGLE_CLOUD_PROJECT}".to_string(),
            location: "${GOOGLE_CLOUD_LOCATION}".to_string(),
            access_token: "${VERTEX_ACCESS_TOKEN}".to_string(),
            endpoint: String::new(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// A test case as written in the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCaseConfig {
    /// Identity; also the first directory level of the response files
    pub name: String,

    /// Image sent with every prompt of this test
    pub image: PathBuf,

    /// Prompt template
    pub prompt: String,
}

/// The two reference test cases.
pub fn default_tests() -> Vec<TestCaseConfig> {
    vec![
        TestCaseConfig {
            name: "animal".to_string(),
            image: PathBuf::from("./images/Animal Icons.jpg"),
            prompt: "Return all animals in this image, including name and description."
                .to_string(),
        },
        TestCaseConfig {
            name: "menu".to_string(),
            image: PathBuf::from("./images/McDonalds-menu.jpg"),
            prompt: "Return all menu items in this image, including name, description and price."
                .to_string(),
        },
    ]
}
