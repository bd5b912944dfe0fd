//! Execution Context: immutable state shared by every stage of a run
use crate::data_model::ToolchainLocation;
use crate::error::{PipelineError, Result};
use crate::process::ProcessInvoker;
use crate::tuning::EngineTuning;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default working directory, relative to the run root
pub const DEFAULT_WORK_DIR: &str = "results";

#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Directory subprocesses run in
    pub root: PathBuf,
    /// Directory holding every intermediate artifact
    pub work_dir: PathBuf,
    pub tuning: EngineTuning,
    /// Delete materialized program files after each invocation
    pub cleanup: bool,
    /// Treat a failing numbering or solver run as fatal
    pub strict: bool,
    pub stage_timeout: Option<Duration>,
}

impl RunConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let work_dir = root.join(DEFAULT_WORK_DIR);
        Self {
            root,
            work_dir,
            tuning: EngineTuning::default(),
            cleanup: true,
            strict: false,
            stage_timeout: None,
        }
    }

    /// Relative paths are taken from the run root.
    pub fn with_work_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.work_dir = self.root.join(dir);
        self
    }

    pub fn with_tuning(mut self, tuning: EngineTuning) -> Self {
        self.tuning = tuning;
        self
    }

    pub fn with_cleanup(mut self, cleanup: bool) -> Self {
        self.cleanup = cleanup;
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_stage_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.stage_timeout = timeout;
        self
    }

    /// Rejects a working directory that is the run root or one of its
    /// ancestors; the prepare stage wipes the working directory.
    pub fn validate(&self) -> Result<()> {
        let root = resolve_path(&self.root)?;
        let work_dir = resolve_path(&self.work_dir)?;
        if root.starts_with(&work_dir) {
            return Err(PipelineError::Configuration(format!(
                "working directory {} contains the run root {}",
                self.work_dir.display(),
                self.root.display()
            )));
        }
        Ok(())
    }
}

/// Canonical form of `path`; components that do not exist yet are appended
/// to the canonical form of their nearest existing ancestor.
fn resolve_path(path: &Path) -> Result<PathBuf> {
    let mut missing = Vec::new();
    let mut current = path;
    loop {
        match current.canonicalize() {
            Ok(mut resolved) => {
                resolved.extend(missing.iter().rev());
                return Ok(resolved);
            }
            Err(e) => match (current.file_name(), current.parent()) {
                (Some(name), Some(parent)) => {
                    missing.push(name);
                    current = if parent.as_os_str().is_empty() { Path::new(".") } else { parent };
                }
                _ => return Err(PipelineError::io(path, e)),
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub toolchain: ToolchainLocation,
    pub config: RunConfig,
    pub run_id: String,
    invoker: ProcessInvoker,
}

impl ExecutionContext {
    pub fn new(toolchain: ToolchainLocation, config: RunConfig) -> Self {
        let invoker = ProcessInvoker::new(config.stage_timeout);
        Self {
            toolchain,
            config,
            run_id: uuid::Uuid::new_v4().to_string(),
            invoker,
        }
    }

    pub fn invoker(&self) -> &ProcessInvoker {
        &self.invoker
    }

    pub fn work_dir(&self) -> &Path {
        &self.config.work_dir
    }
}
