//! Context numbering against the patched domain file.
use crate::programs;
use crate::solver::{check_exit, solve_text};
use async_trait::async_trait;
use ptrun_core::{ExecutionContext, Result, Stage, StageOutcome, StderrMode};

pub const NUMBERING_FILE: &str = "numbering.dtl";

pub struct NumberingStage;

#[async_trait]
impl Stage for NumberingStage {
    fn id(&self) -> &'static str {
        "number"
    }

    async fn run(&self, ctx: &ExecutionContext) -> Result<StageOutcome> {
        let text = programs::render(programs::NUMBERING, ctx.work_dir());
        let result = solve_text(ctx, self.id(), NUMBERING_FILE, &text, StderrMode::Merge).await?;
        check_exit(ctx, self.id(), &result)?;
        Ok(StageOutcome::from_process(result))
    }
}
