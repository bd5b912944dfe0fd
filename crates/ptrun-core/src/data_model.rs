//! Data Model: ToolchainLocation, ProcessResult, RunReport
use crate::error::{PipelineError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Resolved engine installation, validated once at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolchainLocation {
    /// Engine installation directory (PQLHOME)
    pub home: PathBuf,
    /// Main engine archive
    pub pql_jar: PathBuf,
    /// Console support archive
    pub jline_jar: PathBuf,
    /// JVM launcher (`$JAVA_HOME/bin/java`)
    pub runtime: PathBuf,
    /// Extra classpath entries for the analyzed program
    pub base_classpath: Vec<PathBuf>,
}

/// Captured result of one engine invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessResult {
    /// Standard output, with standard error interleaved when merged
    pub output: Vec<u8>,
    /// Standard error, only when it was kept separate
    pub stderr: Vec<u8>,
    /// Exit code; `None` if the process died from a signal
    pub code: Option<i32>,
    pub success: bool,
}

impl ProcessResult {
    pub fn output_text(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }

    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }

    pub fn status_text(&self) -> String {
        match self.code {
            Some(code) => format!("exit code {}", code),
            None => "termination by signal".to_string(),
        }
    }

    /// Turns a non-zero exit into a `StageFailure` carrying the output.
    pub fn ensure_success(&self, stage: &str) -> Result<()> {
        if self.success {
            return Ok(());
        }
        Err(PipelineError::StageFailure {
            stage: stage.to_string(),
            status: self.status_text(),
            output: self.output_text(),
        })
    }
}

/// Per-stage entry of the run report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageReport {
    pub id: String,
    pub exit_code: Option<i32>,
    pub success: bool,
    pub latency_ms: u64,
    /// blake3 digest of the captured output
    pub output_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,
    pub pipeline_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub stages: Vec<StageReport>,
}

impl RunReport {
    pub fn stage(&self, id: &str) -> Option<&StageReport> {
        self.stages.iter().find(|s| s.id == id)
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json =
            serde_json::to_vec_pretty(self).map_err(|e| PipelineError::Report(e.to_string()))?;
        std::fs::write(path, json).map_err(|e| PipelineError::io(path, e))
    }
}
