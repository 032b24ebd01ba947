//! vbench CLI - parameter-sweep benchmarking for vision-capable models.
//!
//! Runs every combination of test case, model, output format and requested
//! item count against the model service, writing each raw response to its own
//! file and one metrics row per combination to a CSV table.
//!
//! # Usage
//!
//! ```bash
//! # Run the sweep described by ./vbench.toml
//! vbench run
//!
//! # Only one model, custom results file
//! vbench run --model gemini-1.5-flash-001 --results flash.csv
//!
//! # List the combinations without calling the model
//! vbench plan
//!
//! # View configuration
//! vbench config show
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;
mod logging;

/// vbench - parameter-sweep benchmarking for vision-capable generative models.
#[derive(Parser, Debug)]
#[command(name = "vbench")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Config file (defaults to ./vbench.toml, then the platform config dir)
    #[arg(short, long, global = true, env = "VBENCH_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the sweep and record every combination
    Run(cli::run::RunArgs),

    /// List the combinations a run would execute
    Plan(cli::plan::PlanArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet; a broken config still gets default logging
    // so the error below is reported the usual way.
    let loaded = cli::load_config(cli.config.as_deref());
    let logging_config = loaded
        .as_ref()
        .map(|c| c.logging.clone())
        .unwrap_or_default();
    logging::init_from_config(&logging_config, cli.verbose, cli.json_logs);

    tracing::debug!("vbench v{}", vbench_core::VERSION);

    // Dispatch to the appropriate command handler
    match cli.command {
        Commands::Run(args) => cli::run::execute(args, loaded?).await,
        Commands::Plan(args) => cli::plan::execute(args, loaded?),
        Commands::Config(args) => cli::config::execute(args, cli.config.as_deref(), loaded),
    }
}
