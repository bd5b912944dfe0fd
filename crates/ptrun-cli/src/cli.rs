//! Command-line surface of the driver.
use clap::Parser;
use ptrun_core::context::DEFAULT_WORK_DIR;
use ptrun_stages::{Analysis, MapRequest, PipelinePlan};
use std::path::PathBuf;
use std::time::Duration;

/// Run the context-sensitive pointer analysis on a Java program.
#[derive(Debug, Parser)]
#[command(name = "ptrun", version)]
pub struct Cli {
    /// Fully qualified main class of the analyzed program
    pub entry_point: String,

    /// Datalog program (or PQL query with --pql) to run on the relations
    pub program: PathBuf,

    /// Reuse relations from a previous full run
    #[arg(long)]
    pub fast: bool,

    /// Treat PROGRAM as a PQL query and compile it to Datalog first
    #[arg(long)]
    pub pql: bool,

    /// YAML file overriding engine tuning
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Working directory for generated files
    #[arg(long, value_name = "DIR", default_value = DEFAULT_WORK_DIR)]
    pub work_dir: PathBuf,

    /// Keep generated program files for debugging
    #[arg(long)]
    pub no_cleanup: bool,

    /// Fail the run when numbering or the analysis exits non-zero
    #[arg(long)]
    pub strict: bool,

    /// Kill any engine process running longer than this
    #[arg(long, value_name = "SECS")]
    pub stage_timeout: Option<u64>,

    /// Map a tuple file to names after the analysis
    #[arg(long, num_args = 3, value_names = ["TUPLES", "NAMES", "DEST"])]
    pub map: Option<Vec<PathBuf>>,

    /// Debug logging, including all engine output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn plan(&self) -> PipelinePlan {
        let analysis = if self.pql {
            Analysis::Pql(self.program.clone())
        } else {
            Analysis::Datalog(self.program.clone())
        };
        let plan = PipelinePlan::new(self.entry_point.clone(), analysis).fast(self.fast);

        match self.map.as_deref() {
            Some([tuples, names, dest]) => plan.with_map(MapRequest {
                tuples: tuples.clone(),
                names: names.clone(),
                dest: dest.clone(),
            }),
            _ => plan,
        }
    }

    pub fn stage_timeout(&self) -> Option<Duration> {
        self.stage_timeout.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ptrun_stages::RunMode;

    #[test]
    fn test_minimal_arguments() {
        let cli = Cli::try_parse_from(["ptrun", "test.Main", "pa.dtl"]).unwrap();
        let plan = cli.plan();

        assert_eq!(plan.entry_point, "test.Main");
        assert_eq!(plan.analysis, Analysis::Datalog("pa.dtl".into()));
        assert_eq!(plan.mode, RunMode::Full);
        assert!(plan.map.is_none());
        assert_eq!(cli.work_dir, PathBuf::from("results"));
        assert!(cli.stage_timeout().is_none());
    }

    #[test]
    fn test_fast_pql_and_map() {
        let cli = Cli::try_parse_from([
            "ptrun", "test.Main", "leak.pql", "--fast", "--pql", "--stage-timeout", "600",
            "--map", "r.tuples", "name.map", "out.txt",
        ])
        .unwrap();
        let plan = cli.plan();

        assert_eq!(plan.mode, RunMode::Fast);
        assert_eq!(plan.analysis, Analysis::Pql("leak.pql".into()));
        assert_eq!(plan.map.unwrap().dest, PathBuf::from("out.txt"));
        assert_eq!(cli.stage_timeout(), Some(Duration::from_secs(600)));
    }

    #[test]
    fn test_missing_program_is_rejected() {
        assert!(Cli::try_parse_from(["ptrun", "test.Main"]).is_err());
    }
}
