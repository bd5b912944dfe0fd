//! Relation generation: dumps the analyzed program's relations and maps.
use crate::workdir::move_prefixed;
use async_trait::async_trait;
use ptrun_core::{
    EngineCommand, ExecutionContext, PipelineError, Result, Stage, StageOutcome, StderrMode,
};
use std::path::PathBuf;

pub const GEN_RELATIONS_CLASS: &str = "joeq.Main.GenRelations";
pub const EQUIVALENCE_CLASS: &str = "net.sf.bddbddb.BuildEquivalenceRelation";

/// Generated names and the canonical names later stages read.
pub const RENAMES: [(&str, &str); 2] = [
    ("unmunged_method.map", "method.map"),
    ("unmunged_name.map", "name.map"),
];

/// Prefix of the equivalence maps written to the run root
const MAP_PREFIX: &str = "map_";

pub struct RelationStage {
    entry_point: String,
}

impl RelationStage {
    /// `entry_point` is the fully qualified main class of the analyzed program.
    pub fn new(entry_point: impl Into<String>) -> Self {
        Self {
            entry_point: entry_point.into(),
        }
    }

    fn classpath(ctx: &ExecutionContext) -> Vec<PathBuf> {
        let tc = &ctx.toolchain;
        let mut entries = vec![tc.home.clone(), tc.pql_jar.clone()];
        entries.extend(tc.base_classpath.iter().cloned());
        entries
    }

    pub fn dump_command(&self, ctx: &ExecutionContext) -> Result<EngineCommand> {
        Ok(EngineCommand::java(self.id(), &ctx.toolchain)
            .classpath(&Self::classpath(ctx))?
            .arg(format!("-Xmx{}", ctx.config.tuning.max_heap))
            .dir_property("pa.dumppath", ctx.work_dir())
            .property("pa.specialmapinfo", "yes")
            .property("pa.dumpunmunged", "yes")
            .property("pa.signaturesinlocs", "yes")
            .arg(GEN_RELATIONS_CLASS)
            .arg(&self.entry_point))
    }

    pub fn equivalence_command(&self, ctx: &ExecutionContext) -> Result<EngineCommand> {
        Ok(EngineCommand::java(self.id(), &ctx.toolchain)
            .arg(format!("-mx{}", ctx.config.tuning.max_heap))
            .dir_property("basedir", ctx.work_dir())
            .dir_property("resultdir", ctx.work_dir())
            .property("pa.discovercallgraph", "yes")
            .classpath(&Self::classpath(ctx))?
            .arg(EQUIVALENCE_CLASS)
            .args(["H0", "H0", "heap.map", "I0", "invoke.map"]))
    }
}

#[async_trait]
impl Stage for RelationStage {
    fn id(&self) -> &'static str {
        "relations"
    }

    async fn run(&self, ctx: &ExecutionContext) -> Result<StageOutcome> {
        let root = &ctx.config.root;
        let work_dir = ctx.work_dir();
        std::fs::create_dir_all(work_dir).map_err(|e| PipelineError::io(work_dir, e))?;

        tracing::info!(entry = %self.entry_point, "generating relations");
        let mut dump = ctx
            .invoker()
            .invoke(&self.dump_command(ctx)?, root, StderrMode::Merge)
            .await?;
        dump.ensure_success(self.id())?;

        tracing::info!("building heap/invoke equivalence relations");
        let equiv = ctx
            .invoker()
            .invoke(&self.equivalence_command(ctx)?, root, StderrMode::Merge)
            .await?;
        equiv.ensure_success(self.id())?;

        let moved = move_prefixed(root, MAP_PREFIX, work_dir)?;
        tracing::debug!("moved {} {}* files into {}", moved, MAP_PREFIX, work_dir.display());

        tracing::info!("de-munging names");
        for (from, to) in RENAMES {
            let (from, to) = (work_dir.join(from), work_dir.join(to));
            std::fs::rename(&from, &to).map_err(|e| PipelineError::io(&from, e))?;
        }

        dump.output.extend_from_slice(&equiv.output);
        Ok(StageOutcome::from_process(dump).with_summary(format!(
            "relations for {} in {}",
            self.entry_point,
            work_dir.display()
        )))
    }
}
