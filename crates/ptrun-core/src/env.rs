//! Environment Resolver: finds the engine installation before anything runs.
use crate::data_model::ToolchainLocation;
use crate::error::{PipelineError, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

pub const HOME_VAR: &str = "PQLHOME";
pub const RUNTIME_VAR: &str = "JAVA_HOME";
pub const CLASSPATH_VAR: &str = "CLASSPATH";

pub const PQL_JAR: &str = "PQL-0.2.jar";
pub const JLINE_JAR: &str = "jline.jar";

/// Raw overrides, normally read from the process environment.
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    pub home: Option<PathBuf>,
    pub runtime_home: Option<PathBuf>,
    pub classpath: Option<OsString>,
}

impl EnvOverrides {
    pub fn from_process_env() -> Self {
        Self {
            home: std::env::var_os(HOME_VAR).map(PathBuf::from),
            runtime_home: std::env::var_os(RUNTIME_VAR).map(PathBuf::from),
            classpath: std::env::var_os(CLASSPATH_VAR),
        }
    }
}

/// Resolves and validates the toolchain.
///
/// `controller_dir` is where the driver itself lives; it stands in for the
/// engine home and the classpath when those are not overridden.
pub fn resolve(overrides: &EnvOverrides, controller_dir: &Path) -> Result<ToolchainLocation> {
    let runtime_home = overrides.runtime_home.as_ref().ok_or_else(|| {
        PipelineError::Configuration(format!(
            "{} is not set; point it at the JVM installation",
            RUNTIME_VAR
        ))
    })?;

    let home = overrides
        .home
        .clone()
        .unwrap_or_else(|| controller_dir.to_path_buf());
    if !home.is_dir() {
        return Err(PipelineError::Configuration(format!(
            "engine home {} does not exist (set {})",
            home.display(),
            HOME_VAR
        )));
    }

    let pql_jar = require_file(&home, PQL_JAR)?;
    let jline_jar = require_file(&home, JLINE_JAR)?;

    let base_classpath = match &overrides.classpath {
        Some(raw) if !raw.is_empty() => std::env::split_paths(raw).collect(),
        _ => vec![controller_dir.to_path_buf()],
    };

    let toolchain = ToolchainLocation {
        runtime: runtime_home.join("bin").join("java"),
        home,
        pql_jar,
        jline_jar,
        base_classpath,
    };
    tracing::info!(
        home = %toolchain.home.display(),
        runtime = %toolchain.runtime.display(),
        "toolchain resolved, base classpath {:?}",
        toolchain.base_classpath
    );
    Ok(toolchain)
}

fn require_file(home: &Path, name: &str) -> Result<PathBuf> {
    let path = home.join(name);
    if path.is_file() {
        Ok(path)
    } else {
        Err(PipelineError::Configuration(format!(
            "{} not found in {} (set {} to the engine installation)",
            name,
            home.display(),
            HOME_VAR
        )))
    }
}
