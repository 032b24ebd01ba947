//! Command handlers.

pub mod config;
pub mod plan;
pub mod run;

use std::path::Path;
use vbench_core::{Config, ConfigError};

/// Load the explicit config file if one was given, otherwise the default lookup.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}
