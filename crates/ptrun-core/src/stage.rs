//! Stage Trait: one contract for every pipeline stage
use crate::context::ExecutionContext;
use crate::data_model::ProcessResult;
use crate::error::Result;
use async_trait::async_trait;

/// A stage prepares files in the working directory, runs at most a few
/// engine processes, and leaves its results on disk for the next stage.
#[async_trait]
pub trait Stage: Send + Sync {
    /// Short unique id (ex: "count", "solve")
    fn id(&self) -> &'static str;

    /// Executes the stage
    async fn run(&self, ctx: &ExecutionContext) -> Result<StageOutcome>;
}

/// What a stage hands back to the runner.
#[derive(Debug, Clone, Default)]
pub struct StageOutcome {
    /// Output of the stage's main engine invocation
    pub process: Option<ProcessResult>,
    /// One-line human summary
    pub summary: Option<String>,
}

impl StageOutcome {
    pub fn from_process(process: ProcessResult) -> Self {
        Self {
            process: Some(process),
            summary: None,
        }
    }

    pub fn summary(text: impl Into<String>) -> Self {
        Self {
            process: None,
            summary: Some(text.into()),
        }
    }

    pub fn with_summary(mut self, text: impl Into<String>) -> Self {
        self.summary = Some(text.into());
        self
    }
}
