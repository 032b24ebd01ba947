//! vbench Core - parameter-sweep benchmarking for vision-capable models.
//!
//! Given a few (image, prompt) test cases, vbench calls every combination of
//! model, output format and requested item count, and records each response
//! together with its timing and size.
//!
//! # Architecture
//!
//! The sweep is strictly sequential:
//!
//! ```text
//! SweepPlan → build_prompt → RetryPolicy(ModelClient) → parse_response → ResultRecorder
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use vbench_core::{Config, ResultRecorder, RetryPolicy, SweepDriver, SweepOptions, SweepPlan};
//! use vbench_core::llm::{VertexClient, VertexSettings};
//!
//! #[tokio::main]
//! async fn main() -> vbench_core::Result<()> {
//!     let config = Config::load()?;
//!     let settings = VertexSettings::resolve(&config.vertex)?;
//!     let client = VertexClient::new(&settings);
//!
//!     let plan = SweepPlan::from_config(&config)?;
//!     let recorder = ResultRecorder::create(&config.output_root(), &config.results_file(), None)?;
//!     let driver = SweepDriver::new(&client, RetryPolicy::default(), SweepOptions::default());
//!     let summary = driver.run(&plan, recorder, |_| {}).await?;
//!     println!("Recorded {} combinations", summary.recorded);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod llm;
pub mod output;
pub mod parse;
pub mod prompt;
pub mod sweep;
pub mod types;

// Re-exports for convenient access
pub use config::Config;
pub use error::{BenchError, ConfigError, ModelError, ParseError, Result};
pub use llm::{ModelClient, RetryPolicy};
pub use output::ResultRecorder;
pub use parse::{parse_response, ParsedResponse};
pub use prompt::build_prompt;
pub use sweep::{SweepDriver, SweepOptions, SweepPlan, SweepProgress, SweepSummary};
pub use types::{Combination, InvocationOutcome, ItemCount, ResponseFormat, ResultRecord, TestCase};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
