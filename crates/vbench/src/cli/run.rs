//! The `vbench run` command.

use clap::Args;
use std::path::{Path, PathBuf};
use std::time::Duration;
use vbench_core::llm::{VertexClient, VertexSettings};
use vbench_core::{
    Config, ResultRecorder, RetryPolicy, SweepDriver, SweepOptions, SweepPlan, SweepSummary,
};

/// Arguments for the `run` command.
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Root directory for per-combination response files
    #[arg(long)]
    pub output_root: Option<PathBuf>,

    /// CSV results file
    #[arg(long)]
    pub results: Option<PathBuf>,

    /// Also write every row as JSON lines to this file
    #[arg(long)]
    pub stats: Option<PathBuf>,

    /// Only run these configured models (repeatable)
    #[arg(short, long = "model")]
    pub models: Vec<String>,

    /// Seconds to wait before retrying a rate-limited call
    #[arg(long)]
    pub backoff_secs: Option<u64>,

    /// Abort the run on the first response that does not parse
    #[arg(long)]
    pub fail_on_parse_error: bool,

    /// Disable the progress bar
    #[arg(long)]
    pub no_progress: bool,
}

/// Execute the run command.
pub async fn execute(args: RunArgs, mut config: Config) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;
    apply_overrides(&mut config, &args, &cwd)?;

    // Project, region and token are read from the environment exactly once
    let settings = VertexSettings::resolve(&config.vertex)?;
    tracing::info!(
        "Using Vertex AI project {} in {}",
        settings.project,
        settings.location
    );
    let client = VertexClient::new(&settings);

    let plan = SweepPlan::from_config(&config)?;
    tracing::info!(
        "Sweeping {} combination(s): {} test(s) x {} model(s) x {} count(s) x {} format(s)",
        plan.len(),
        plan.tests.len(),
        plan.models.len(),
        plan.item_counts.len(),
        plan.formats.len()
    );

    let results_file = config.results_file();
    let recorder = ResultRecorder::create(
        &config.output_root(),
        &results_file,
        config.stats_file().as_deref(),
    )?;
    let driver = SweepDriver::new(
        &client,
        RetryPolicy::new(Duration::from_secs(config.retry.backoff_secs)),
        SweepOptions {
            fail_on_parse_error: config.sweep.fail_on_parse_error,
        },
    );

    let progress = if args.no_progress {
        None
    } else {
        Some(create_progress_bar(plan.len() as u64)?)
    };

    let result = driver
        .run(&plan, recorder, |p| {
            if let Some(pb) = &progress {
                pb.inc(1);
                pb.set_message(format!(
                    "{} / {} / {} / {}",
                    p.combination.test.name,
                    p.combination.model,
                    p.combination.count,
                    p.combination.format
                ));
            }
        })
        .await;

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    let summary = result?;
    print_summary(&summary, &results_file);
    Ok(())
}

/// Fold CLI flags into the loaded config. CLI paths are relative to `cwd`.
fn apply_overrides(config: &mut Config, args: &RunArgs, cwd: &Path) -> anyhow::Result<()> {
    if let Some(ref root) = args.output_root {
        config.general.output_root = cwd.join(root);
    }
    if let Some(ref results) = args.results {
        config.general.results_file = cwd.join(results);
    }
    if let Some(ref stats) = args.stats {
        config.general.stats_file = Some(cwd.join(stats));
    }
    if let Some(secs) = args.backoff_secs {
        config.retry.backoff_secs = secs;
    }
    if args.fail_on_parse_error {
        config.sweep.fail_on_parse_error = true;
    }

    if !args.models.is_empty() {
        if let Some(unknown) = args
            .models
            .iter()
            .find(|m| !config.sweep.models.contains(*m))
        {
            anyhow::bail!(
                "Model '{unknown}' is not in sweep.models.\n\n  Configured: {}",
                config.sweep.models.join(", ")
            );
        }
        config.sweep.models.retain(|m| args.models.contains(m));
    }
    Ok(())
}

/// Create a progress bar for the sweep.
fn create_progress_bar(total: u64) -> anyhow::Result<indicatif::ProgressBar> {
    use indicatif::{ProgressBar, ProgressStyle};

    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
            )?
            .progress_chars("##-"),
    );
    pb.set_message("starting...");
    Ok(pb)
}

/// Print a short summary after the sweep.
fn print_summary(summary: &SweepSummary, results_file: &Path) {
    eprintln!();
    eprintln!("  Sweep complete");
    eprintln!("  ──────────────────────────────");
    eprintln!("  Recorded:        {:>6}", summary.recorded);
    eprintln!("  Parse failures:  {:>6}", summary.parse_failures);
    eprintln!(
        "  Duration:        {:>6.1}s",
        summary.elapsed.as_secs_f64()
    );
    eprintln!("  Results:         {}", results_file.display());
    eprintln!();
}
