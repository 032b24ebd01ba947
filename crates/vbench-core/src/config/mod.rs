//! Configuration management for vbench.
//!
//! The sweep is described by a static TOML file: test cases, models, formats,
//! item counts and output locations. Every section has defaults reproducing
//! the reference sweep, so an empty file is a valid configuration.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name looked up in the working directory before the platform config dir.
pub const LOCAL_CONFIG_FILE: &str = "vbench.toml";

/// Root configuration structure for vbench.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Sweep axes
    pub sweep: SweepConfig,

    /// Rate-limit backoff
    pub retry: RetryConfig,

    /// Model service connection
    pub vertex: VertexConfig,

    /// Logging settings
    pub logging: LoggingConfig,

    /// Test cases, in sweep order
    pub tests: Vec<TestCaseConfig>,

    /// Directory relative paths are resolved against
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            sweep: SweepConfig::default(),
            retry: RetryConfig::default(),
            vertex: VertexConfig::default(),
            logging: LoggingConfig::default(),
            tests: default_tests(),
            base_dir: PathBuf::new(),
        }
    }
}

impl Config {
    /// Load configuration from `./vbench.toml` or the platform config file.
    ///
    /// Returns default configuration if neither exists.
    pub fn load() -> Result<Self, ConfigError> {
        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            return Self::load_from(&local);
        }
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    ///
    /// Relative paths inside the file resolve against the file's directory.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;
        config.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories:
    /// - macOS: ~/Library/Application Support/com.vbench.vbench/config.toml
    /// - Linux: ~/.config/vbench/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\vbench\config\config.toml
    ///
    /// Falls back to ~/.vbench/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "vbench", "vbench")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".vbench").join("config.toml")
            })
    }

    /// Resolved root directory for per-combination response files.
    pub fn output_root(&self) -> PathBuf {
        resolve_path(&self.base_dir, &self.general.output_root)
    }

    /// Resolved path of the CSV results file.
    pub fn results_file(&self) -> PathBuf {
        resolve_path(&self.base_dir, &self.general.results_file)
    }

    /// Resolved path of the JSON-lines stats mirror, if configured.
    pub fn stats_file(&self) -> Option<PathBuf> {
        self.general
            .stats_file
            .as_ref()
            .map(|p| resolve_path(&self.base_dir, p))
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

/// Expand `~` and anchor relative paths at `base_dir`.
pub fn resolve_path(base_dir: &Path, path: &Path) -> PathBuf {
    let path_str = path.to_string_lossy();
    let expanded = PathBuf::from(shellexpand::tilde(&path_str).into_owned());
    if expanded.is_absolute() {
        expanded
    } else {
        base_dir.join(expanded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ItemCount, ResponseFormat};

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.sweep.models.len(), 2);
        assert_eq!(
            config.sweep.formats,
            vec![ResponseFormat::Json, ResponseFormat::Yaml]
        );
        assert_eq!(config.sweep.item_counts.last(), Some(&ItemCount::All));
        assert_eq!(config.retry.backoff_secs, 60);
        assert_eq!(config.tests.len(), 2);
        assert_eq!(config.sweep.item_counts.len(), 5);
    }

    #[test]
    fn test_config_to_toml() {
        let config = Config::default();
        let toml = config.to_toml().unwrap();
        assert!(toml.contains("[general]"));
        assert!(toml.contains("[sweep]"));
        assert!(toml.contains("[[tests]]"));
        assert!(toml.contains("-1"));
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.sweep.models, Config::default().sweep.models);
        assert_eq!(config.tests.len(), 2);
    }

    #[test]
    fn test_load_from_resolves_relative_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vbench.toml");
        std::fs::write(
            &path,
            r#"
[general]
output_root = "out"
results_file = "out/results.csv"

[sweep]
models = ["gemini-1.5-flash-001"]
formats = ["json"]
item_counts = [3, -1]

[[tests]]
name = "shapes"
image = "shapes.png"
prompt = "Return all shapes."
"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.output_root(), dir.path().join("out"));
        assert_eq!(config.results_file(), dir.path().join("out/results.csv"));
        assert_eq!(config.stats_file(), None);
        assert_eq!(config.tests[0].name, "shapes");
        assert_eq!(
            config.sweep.item_counts,
            vec![ItemCount::Exactly(3), ItemCount::All]
        );
    }

    #[test]
    fn test_load_from_rejects_invalid_count() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vbench.toml");
        std::fs::write(&path, "[sweep]\nitem_counts = [-5]\n").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_resolve_path_absolute_untouched() {
        let abs = std::env::temp_dir().join("x.csv");
        assert_eq!(resolve_path(Path::new("base"), &abs), abs);
        assert_eq!(
            resolve_path(Path::new("base"), Path::new("x.csv")),
            PathBuf::from("base/x.csv")
        );
    }
}
