//! ptrun driver: resolves the toolchain, builds the plan, runs it.
pub mod cli;

use anyhow::Context;
use cli::Cli;
use ptrun_core::env::{self, EnvOverrides};
use ptrun_core::{EngineTuning, ExecutionContext, PipelineRun, RunConfig};
use ptrun_stages::analysis_pipeline;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Report written into the working directory after a successful run
pub const REPORT_FILE: &str = "run-report.json";

/// `RUST_LOG` wins; otherwise `info`, or `debug` with `--verbose`.
pub fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Directory the driver binary lives in; the default engine home.
pub fn controller_dir() -> anyhow::Result<PathBuf> {
    let exe = std::env::current_exe().context("cannot locate the driver executable")?;
    Ok(exe.parent().map(Path::to_path_buf).unwrap_or_default())
}

pub fn load_tuning(path: Option<&Path>) -> anyhow::Result<EngineTuning> {
    let Some(path) = path else {
        return Ok(EngineTuning::default());
    };
    let yaml = std::fs::read_to_string(path)
        .with_context(|| format!("reading tuning file {}", path.display()))?;
    EngineTuning::from_yaml(&yaml)
        .map_err(|e| anyhow::anyhow!("invalid tuning file {}: {}", path.display(), e))
}

/// Builds the execution context from the command line and environment.
pub fn prepare(cli: &Cli, overrides: &EnvOverrides) -> anyhow::Result<ExecutionContext> {
    let toolchain = env::resolve(overrides, &controller_dir()?)?;
    let root = std::env::current_dir().context("cannot read the current directory")?;

    let config = RunConfig::new(root)
        .with_work_dir(&cli.work_dir)
        .with_tuning(load_tuning(cli.config.as_deref())?)
        .with_cleanup(!cli.no_cleanup)
        .with_strict(cli.strict)
        .with_stage_timeout(cli.stage_timeout());
    Ok(ExecutionContext::new(toolchain, config))
}

/// Runs the whole pipeline and prints the analysis output.
pub async fn run(cli: &Cli, ctx: &ExecutionContext) -> anyhow::Result<PipelineRun> {
    let runner = analysis_pipeline(&cli.plan());
    tracing::info!(run_id = %ctx.run_id, "running {}", runner.pipeline_id());

    let run = match runner.run(ctx).await {
        Ok(run) => run,
        Err(e) => {
            if let Some(output) = e.captured_output() {
                eprintln!("{}", output);
            }
            return Err(e.into());
        }
    };

    for id in ["solve", "pql"] {
        if let Some(process) = run.outcome(id).and_then(|o| o.process.as_ref()) {
            println!("{}", process.output_text());
        }
    }

    let report_path = ctx.work_dir().join(REPORT_FILE);
    run.report.write_json(&report_path)?;
    tracing::info!(report = %report_path.display(), "done");
    Ok(run)
}
