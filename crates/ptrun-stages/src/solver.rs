//! Solver invocation shared by every Datalog stage, and the final solve.
use crate::workdir::ProgramFile;
use async_trait::async_trait;
use ptrun_core::{
    EngineCommand, ExecutionContext, ProcessResult, Result, Stage, StageOutcome, StderrMode,
};
use std::path::{Path, PathBuf};

pub const SOLVER_CLASS: &str = "net.sf.bddbddb.Solver";

/// `java -cp pql:home -mx.. -D<tuning>.. net.sf.bddbddb.Solver <program>`
pub fn solver_command(ctx: &ExecutionContext, label: &str, program: &Path) -> Result<EngineCommand> {
    let tc = &ctx.toolchain;
    let tuning = &ctx.config.tuning;

    let mut cmd = EngineCommand::java(label, tc)
        .classpath(&[&tc.pql_jar, &tc.home])?
        .arg(format!("-mx{}", tuning.max_heap))
        .dir_property("basedir", ctx.work_dir());
    for (key, value) in tuning.solver_properties() {
        cmd = cmd.property(key, value);
    }
    Ok(cmd.arg(SOLVER_CLASS).arg(program))
}

/// Writes `text` to `<work_dir>/<file_name>`, solves it, and removes the
/// file again unless cleanup is off.
pub async fn solve_text(
    ctx: &ExecutionContext,
    label: &str,
    file_name: &str,
    text: &str,
    stderr: StderrMode,
) -> Result<ProcessResult> {
    let program = ProgramFile::materialize(ctx.work_dir().join(file_name), text, ctx.config.cleanup)?;
    let cmd = solver_command(ctx, label, program.path())?;
    ctx.invoker().invoke(&cmd, &ctx.config.root, stderr).await
}

/// Non-zero solver exits are warnings unless the run is strict.
pub fn check_exit(ctx: &ExecutionContext, label: &str, result: &ProcessResult) -> Result<()> {
    if ctx.config.strict {
        return result.ensure_success(label);
    }
    if !result.success {
        tracing::warn!(stage = label, "{}", exit_warning(result));
    }
    Ok(())
}

/// Warning text for a tolerated solver failure, including what it printed.
pub fn exit_warning(result: &ProcessResult) -> String {
    format!("solver exited with {}:\n{}", result.status_text(), result.output_text())
}

/// Runs the user's analysis program against the prepared working directory.
pub struct SolveStage {
    program: PathBuf,
}

impl SolveStage {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait]
impl Stage for SolveStage {
    fn id(&self) -> &'static str {
        "solve"
    }

    async fn run(&self, ctx: &ExecutionContext) -> Result<StageOutcome> {
        tracing::info!(program = %self.program.display(), "running analysis");
        let cmd = solver_command(ctx, self.id(), &self.program)?;
        let result = ctx
            .invoker()
            .invoke(&cmd, &ctx.config.root, StderrMode::Merge)
            .await?;
        check_exit(ctx, self.id(), &result)?;
        Ok(StageOutcome::from_process(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::context;
    use std::ffi::OsString;

    #[test]
    fn test_solver_command_shape() {
        let ctx = context("/run");
        let cmd = solver_command(&ctx, "solve", Path::new("query.dtl")).unwrap();

        assert_eq!(cmd.program, PathBuf::from("/jdk/bin/java"));
        let args: Vec<String> = cmd.args.iter().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(args[0], "-cp");
        assert!(args[1].starts_with("/pql/PQL-0.2.jar"));
        assert_eq!(args[2], "-mx1024m");
        assert!(args.contains(&"-Dbddnodes=40000000".to_string()));
        assert!(args.contains(&"-Dnumberingtype=scc".to_string()));
        assert!(args.contains(&"-Dsingleignore=yes".to_string()));
        assert_eq!(args[args.len() - 2], SOLVER_CLASS);
        assert_eq!(cmd.args.last(), Some(&OsString::from("query.dtl")));
    }

    #[test]
    fn test_exit_warning_carries_output() {
        let failed = ProcessResult {
            output: b"Exception in thread main".to_vec(),
            code: Some(2),
            ..Default::default()
        };
        let warning = exit_warning(&failed);
        assert!(warning.contains(&failed.status_text()));
        assert!(warning.ends_with("Exception in thread main"));
    }

    #[test]
    fn test_check_exit_strictness() {
        let failed = ProcessResult {
            code: Some(1),
            ..Default::default()
        };

        let lenient = context("/run");
        assert!(check_exit(&lenient, "solve", &failed).is_ok());

        let mut strict = context("/run");
        strict.config.strict = true;
        assert!(check_exit(&strict, "solve", &failed).is_err());
    }
}
