//! ptrun core: Stage trait, runner, process invoker and toolchain resolution
//!
//! Generic, domain-free plumbing for running an external engine as a
//! strictly sequential series of subprocesses.

pub mod command;
pub mod context;
pub mod data_model;
pub mod env;
pub mod error;
pub mod process;
pub mod runner;
pub mod stage;
pub mod tuning;

pub use command::EngineCommand;
pub use context::{ExecutionContext, RunConfig};
pub use data_model::{ProcessResult, RunReport, StageReport, ToolchainLocation};
pub use env::EnvOverrides;
pub use error::{PipelineError, Result};
pub use process::{ProcessInvoker, StderrMode};
pub use runner::{PipelineRun, PipelineRunner};
pub use stage::{Stage, StageOutcome};
pub use tuning::EngineTuning;

/// Driver version
pub const PTRUN_VERSION: &str = env!("CARGO_PKG_VERSION");
