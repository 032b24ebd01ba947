//! The `vbench config` command for configuration management.

use clap::{Args, Subcommand};
use std::path::{Path, PathBuf};
use vbench_core::config::LOCAL_CONFIG_FILE;
use vbench_core::{Config, ConfigError};

/// Arguments for the `config` command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Subcommands for configuration management.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Display current configuration
    Show,

    /// Show the config file path in effect
    Path,

    /// Write a config file with the default sweep
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,

        /// Write to the platform config dir instead of ./vbench.toml
        #[arg(long)]
        global: bool,
    },
}

/// Execute the config command.
pub fn execute(
    args: ConfigArgs,
    explicit: Option<&Path>,
    loaded: Result<Config, ConfigError>,
) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::Show => {
            let config = loaded?;
            let toml = config.to_toml()?;
            println!("{}", toml);
        }

        ConfigCommand::Path => {
            println!("{}", effective_path(explicit).display());
        }

        ConfigCommand::Init { force, global } => {
            let path = match (explicit, global) {
                (Some(path), _) => path.to_path_buf(),
                (None, true) => Config::default_path(),
                (None, false) => PathBuf::from(LOCAL_CONFIG_FILE),
            };

            if path.exists() && !force {
                anyhow::bail!(
                    "Config file already exists at: {}\nUse --force to overwrite.",
                    path.display()
                );
            }

            // Ensure parent directory exists
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }

            // Write default config
            let config = Config::default();
            let toml = config.to_toml()?;
            std::fs::write(&path, toml)?;

            tracing::info!("Config file created at: {}", path.display());
            println!("Configuration initialized at: {}", path.display());
        }
    }

    Ok(())
}

/// The file `Config::load` would read, in lookup order.
fn effective_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    let local = PathBuf::from(LOCAL_CONFIG_FILE);
    if local.exists() {
        local
    } else {
        Config::default_path()
    }
}
