//! Binary entrypoint for the ptrun driver.
use clap::Parser;
use ptrun_cli::cli::Cli;
use ptrun_cli::{init_tracing, prepare, run};
use ptrun_core::EnvOverrides;
use std::process::ExitCode;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Usage errors exit with 1 like every other failure; --help and
    // --version still exit 0.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if e.use_stderr() => {
            let _ = e.print();
            return ExitCode::FAILURE;
        }
        Err(e) => e.exit(),
    };
    init_tracing(cli.verbose);

    let outcome = match prepare(&cli, &EnvOverrides::from_process_env()) {
        Ok(ctx) => run(&cli, &ctx).await.map(|_| ()),
        Err(e) => Err(e),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
