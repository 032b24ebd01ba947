//! Configuration validation.

use crate::error::ConfigError;
use std::collections::HashSet;

use super::Config;

impl Config {
    /// Validate that the sweep is non-empty, its axes hold no repeats, and
    /// every name that becomes a path component is safe to use as one.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.tests.is_empty() {
            return Err(ConfigError::ValidationError(
                "at least one [[tests]] entry is required".into(),
            ));
        }
        if self.sweep.models.is_empty() {
            return Err(ConfigError::ValidationError(
                "sweep.models must not be empty".into(),
            ));
        }
        if self.sweep.formats.is_empty() {
            return Err(ConfigError::ValidationError(
                "sweep.formats must not be empty".into(),
            ));
        }
        if self.sweep.item_counts.is_empty() {
            return Err(ConfigError::ValidationError(
                "sweep.item_counts must not be empty".into(),
            ));
        }

        let mut models = HashSet::new();
        for model in &self.sweep.models {
            check_component("sweep.models", model)?;
            if !models.insert(model.as_str()) {
                return Err(duplicate("sweep.models", model));
            }
        }
        // Compared after normalization, so "json" and "JSON" collide
        let mut formats = HashSet::new();
        for format in &self.sweep.formats {
            check_component("sweep.formats", format.as_str())?;
            if !formats.insert(format.as_str()) {
                return Err(duplicate("sweep.formats", format.as_str()));
            }
        }
        let mut counts = HashSet::new();
        for count in &self.sweep.item_counts {
            if !counts.insert(*count) {
                return Err(duplicate("sweep.item_counts", count));
            }
        }

        let mut seen = HashSet::new();
        for test in &self.tests {
            check_component("tests.name", &test.name)?;
            if !seen.insert(test.name.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "tests.name '{}' is defined more than once",
                    test.name
                )));
            }
            if test.prompt.trim().is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "tests.prompt for '{}' must not be empty",
                    test.name
                )));
            }
        }
        Ok(())
    }
}

fn duplicate(field: &str, value: impl std::fmt::Display) -> ConfigError {
    ConfigError::ValidationError(format!("{field} value '{value}' is listed more than once"))
}

/// A value used as a single directory or file-name component.
fn check_component(field: &str, value: &str) -> Result<(), ConfigError> {
    let invalid = value.trim().is_empty()
        || value == "."
        || value == ".."
        || value.contains(['/', '\\'])
        || value.chars().any(char::is_control);
    if invalid {
        return Err(ConfigError::ValidationError(format!(
            "{field} value '{value}' cannot be used as a path component"
        )));
    }
    Ok(())
}
