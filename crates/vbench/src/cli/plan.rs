//! The `vbench plan` command: list combinations without calling the model.

use clap::Args;
use vbench_core::output::content_path;
use vbench_core::{build_prompt, Config, SweepPlan};

/// Arguments for the `plan` command.
#[derive(Args, Debug, Default)]
pub struct PlanArgs {
    /// Also print the composed prompt for each combination
    #[arg(long)]
    pub prompts: bool,
}

/// Execute the plan command.
///
/// Loads every test image, so a missing asset is reported here rather than
/// midway through a run.
pub fn execute(args: PlanArgs, config: Config) -> anyhow::Result<()> {
    let plan = SweepPlan::from_config(&config)?;
    let output_root = config.output_root();

    for line in render(&plan, &output_root, args.prompts) {
        println!("{line}");
    }
    tracing::info!("{} combination(s)", plan.len());
    Ok(())
}

/// One tab-separated line per combination, in sweep order.
fn render(plan: &SweepPlan, output_root: &std::path::Path, prompts: bool) -> Vec<String> {
    plan.combinations()
        .enumerate()
        .map(|(i, c)| {
            let mut line = format!(
                "{}\t{}\t{}\t{}\t{}\t{}",
                i + 1,
                c.test.name,
                c.model,
                c.count,
                c.format,
                content_path(output_root, &c).display()
            );
            if prompts {
                line.push('\t');
                line.push_str(&build_prompt(&c.test.prompt, c.count, c.format));
            }
            line
        })
        .collect()
}
