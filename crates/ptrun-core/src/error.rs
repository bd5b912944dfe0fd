//! Unified Error Model
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    /// Pre-flight failure: nothing has been launched yet.
    #[error("CONFIG/{0}")]
    Configuration(String),

    #[error("INVOKE/{label}: could not start {program}: {source}")]
    Invocation {
        label: String,
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The engine ran but reported failure. `output` is the captured text.
    #[error("STAGE/{stage}: engine exited with {status}")]
    StageFailure {
        stage: String,
        status: String,
        output: String,
    },

    #[error("TIMEOUT/{stage}: no exit after {}s", .after.as_secs())]
    StageTimeout { stage: String, after: Duration },

    #[error("IO/{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("BOUND/context count {0} does not fit in 64 bits")]
    BoundOverflow(String),

    #[error("TUPLE/{}:{line}: not an index: {content:?}", .path.display())]
    TupleFormat {
        path: PathBuf,
        line: usize,
        content: String,
    },

    #[error("REPORT/{0}")]
    Report(String),
}

impl PipelineError {
    /// Wraps an I/O error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Captured engine output attached to the error, if any.
    pub fn captured_output(&self) -> Option<&str> {
        match self {
            Self::StageFailure { output, .. } => Some(output),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
