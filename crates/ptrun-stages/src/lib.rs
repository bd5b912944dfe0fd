//! ptrun stages: the context-sensitive pointer-analysis pipeline.
//!
//! Each stage runs the external engine once or twice and communicates with
//! the next one only through files in the working directory.
//!
//! # Pipeline Flow
//!
//! ```text
//! prepare → relations → count → number → solve | pql → [map]
//!    ↓          ↓          ↓        ↓         ↓          ↓
//!  clean     *.bdd,     VC size  IEnum    *.tuples    names
//!            *.map      patched
//! ```
//!
//! Fast mode swaps the clean for a tuple sweep and skips `relations`.

pub mod context_size;
pub mod numbering;
pub mod pql;
pub mod programs;
pub mod relations;
pub mod solver;
pub mod tuple_map;
pub mod workdir;

pub use context_size::{extract_context_count, patch_domain_file, ContextCount, ContextSizeStage};
pub use numbering::NumberingStage;
pub use pql::PqlStage;
pub use relations::RelationStage;
pub use solver::SolveStage;
pub use tuple_map::{map_tuples, MapSummary, TupleMapStage};
pub use workdir::{PrepareStage, RunMode};

use ptrun_core::{PipelineRunner, Stage};
use std::path::PathBuf;

/// How the final analysis program is given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Analysis {
    /// A Datalog program file, solved as is
    Datalog(PathBuf),
    /// A PQL query, compiled to Datalog first
    Pql(PathBuf),
}

/// Tuple mapping requested after the analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapRequest {
    pub tuples: PathBuf,
    pub names: PathBuf,
    pub dest: PathBuf,
}

/// Everything that decides which stages run.
#[derive(Debug, Clone)]
pub struct PipelinePlan {
    pub entry_point: String,
    pub analysis: Analysis,
    pub mode: RunMode,
    pub map: Option<MapRequest>,
}

impl PipelinePlan {
    pub fn new(entry_point: impl Into<String>, analysis: Analysis) -> Self {
        Self {
            entry_point: entry_point.into(),
            analysis,
            mode: RunMode::Full,
            map: None,
        }
    }

    pub fn fast(mut self, fast: bool) -> Self {
        self.mode = if fast { RunMode::Fast } else { RunMode::Full };
        self
    }

    pub fn with_map(mut self, map: MapRequest) -> Self {
        self.map = Some(map);
        self
    }
}

/// Builds the stage sequence for a plan.
pub fn analysis_pipeline(plan: &PipelinePlan) -> PipelineRunner {
    let mut stages: Vec<Box<dyn Stage>> = vec![Box::new(PrepareStage::new(plan.mode))];

    if plan.mode == RunMode::Full {
        stages.push(Box::new(RelationStage::new(plan.entry_point.clone())));
    }
    stages.push(Box::new(ContextSizeStage));
    stages.push(Box::new(NumberingStage));

    match &plan.analysis {
        Analysis::Datalog(program) => stages.push(Box::new(SolveStage::new(program.clone()))),
        Analysis::Pql(query) => stages.push(Box::new(PqlStage::new(query.clone()))),
    }

    if let Some(map) = &plan.map {
        stages.push(Box::new(TupleMapStage::new(
            map.tuples.clone(),
            map.names.clone(),
            map.dest.clone(),
        )));
    }

    PipelineRunner::new(stages)
}

#[cfg(test)]
pub(crate) mod test_support {
    use ptrun_core::{ExecutionContext, RunConfig, ToolchainLocation};
    use std::path::PathBuf;

    pub fn context(root: &str) -> ExecutionContext {
        let toolchain = ToolchainLocation {
            home: PathBuf::from("/pql"),
            pql_jar: PathBuf::from("/pql/PQL-0.2.jar"),
            jline_jar: PathBuf::from("/pql/jline.jar"),
            runtime: PathBuf::from("/jdk/bin/java"),
            base_classpath: vec![PathBuf::from("/app/classes")],
        };
        ExecutionContext::new(toolchain, RunConfig::new(root))
    }
}
