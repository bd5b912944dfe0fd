//! PQL queries: compile the query to Datalog with the engine, then solve it.
use crate::programs;
use crate::solver::{check_exit, solve_text};
use async_trait::async_trait;
use ptrun_core::{EngineCommand, ExecutionContext, Result, Stage, StageOutcome, StderrMode};
use std::path::PathBuf;

pub const GENERATOR_CLASS: &str = "net.sf.pql.datalog.DatalogGenerator";
pub const DUMP_TYPES_FILE: &str = "dumpat.dtl";
pub const TRANSLATED_FILE: &str = "pql_conv.dtl";

pub struct PqlStage {
    query: PathBuf,
}

impl PqlStage {
    pub fn new(query: impl Into<PathBuf>) -> Self {
        Self {
            query: query.into(),
        }
    }

    pub fn generator_command(&self, ctx: &ExecutionContext) -> Result<EngineCommand> {
        let tc = &ctx.toolchain;
        Ok(EngineCommand::java(self.id(), tc)
            .classpath(&[&tc.home, &tc.pql_jar])?
            .property("pql.datalog.pacs", "no")
            .arg(GENERATOR_CLASS)
            .arg(&self.query))
    }
}

#[async_trait]
impl Stage for PqlStage {
    fn id(&self) -> &'static str {
        "pql"
    }

    async fn run(&self, ctx: &ExecutionContext) -> Result<StageOutcome> {
        let dump = programs::render(programs::DUMP_TYPES, ctx.work_dir());
        let types = solve_text(ctx, self.id(), DUMP_TYPES_FILE, &dump, StderrMode::Merge).await?;
        check_exit(ctx, self.id(), &types)?;

        tracing::info!(query = %self.query.display(), "translating query");
        let generated = ctx
            .invoker()
            .invoke(&self.generator_command(ctx)?, &ctx.config.root, StderrMode::Separate)
            .await?;
        let problems = generated.stderr_text();
        if !problems.trim().is_empty() {
            tracing::warn!("query translation reported:\n{}", problems);
        }
        generated.ensure_success(self.id())?;

        let program = generated.output_text();
        let result = solve_text(ctx, self.id(), TRANSLATED_FILE, &program, StderrMode::Merge).await?;
        check_exit(ctx, self.id(), &result)?;
        Ok(StageOutcome::from_process(result)
            .with_summary(format!("translated {} lines of Datalog", program.lines().count())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::context;

    #[test]
    fn test_generator_command() {
        let ctx = context("/run");
        let cmd = PqlStage::new("queries/leak.pql").generator_command(&ctx).unwrap();
        let args: Vec<String> = cmd.args.iter().map(|a| a.to_string_lossy().into_owned()).collect();

        assert_eq!(args[0], "-cp");
        assert!(args[1].starts_with("/pql"));
        assert_eq!(
            &args[2..],
            ["-Dpql.datalog.pacs=no", GENERATOR_CLASS, "queries/leak.pql"]
        );
    }
}
