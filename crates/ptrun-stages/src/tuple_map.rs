//! Tuple mapping: turns integer-indexed tuples back into names.
use async_trait::async_trait;
use ptrun_core::{ExecutionContext, PipelineError, Result, Stage, StageOutcome};
use std::path::{Path, PathBuf};

const COMMENT: char = '#';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapSummary {
    pub written: usize,
    /// Indices past the end of the name list, including ones too large to parse
    pub skipped: usize,
}

/// Maps every index in `tuples` through `names` into `dest`, one name per
/// line, in input order. Out-of-range indices are dropped.
pub fn map_tuples(tuples: &Path, names: &Path, dest: &Path) -> Result<MapSummary> {
    let names_text = std::fs::read_to_string(names).map_err(|e| PipelineError::io(names, e))?;
    let names_list: Vec<&str> = names_text.lines().map(str::trim).collect();
    let tuples_text = std::fs::read_to_string(tuples).map_err(|e| PipelineError::io(tuples, e))?;

    let mut out = String::new();
    let mut summary = MapSummary { written: 0, skipped: 0 };

    for (number, line) in tuples_text.lines().enumerate() {
        let entry = line.trim();
        if entry.is_empty() || line.starts_with(COMMENT) {
            continue;
        }
        // Digits too large for usize are out of range like any other index.
        let index = match entry.parse::<usize>() {
            Ok(index) => Some(index),
            Err(_) if entry.bytes().all(|b| b.is_ascii_digit()) => None,
            Err(_) => {
                return Err(PipelineError::TupleFormat {
                    path: tuples.to_path_buf(),
                    line: number + 1,
                    content: line.to_string(),
                })
            }
        };
        match index.and_then(|i| names_list.get(i)) {
            Some(name) => {
                out.push_str(name);
                out.push('\n');
                summary.written += 1;
            }
            None => summary.skipped += 1,
        }
    }

    std::fs::write(dest, out).map_err(|e| PipelineError::io(dest, e))?;
    Ok(summary)
}

/// Optional last stage; relative inputs are read from the working directory.
pub struct TupleMapStage {
    tuples: PathBuf,
    names: PathBuf,
    dest: PathBuf,
}

impl TupleMapStage {
    pub fn new(tuples: impl Into<PathBuf>, names: impl Into<PathBuf>, dest: impl Into<PathBuf>) -> Self {
        Self {
            tuples: tuples.into(),
            names: names.into(),
            dest: dest.into(),
        }
    }
}

#[async_trait]
impl Stage for TupleMapStage {
    fn id(&self) -> &'static str {
        "map"
    }

    async fn run(&self, ctx: &ExecutionContext) -> Result<StageOutcome> {
        let tuples = ctx.work_dir().join(&self.tuples);
        let names = ctx.work_dir().join(&self.names);
        let dest = ctx.config.root.join(&self.dest);

        let summary = map_tuples(&tuples, &names, &dest)?;
        if summary.skipped > 0 {
            tracing::debug!("{} tuple indices had no name", summary.skipped);
        }
        Ok(StageOutcome::summary(format!(
            "{} names written to {}",
            summary.written,
            dest.display()
        )))
    }
}
