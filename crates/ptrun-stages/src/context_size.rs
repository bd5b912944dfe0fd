//! Context-size solver.
//!
//! The numbering program needs an upper bound on the number of calling
//! contexts, which is only known after running it once. The probe run
//! prints `paths = <n>` (and then fails, since the `VC` domain is still
//! too small); `n` is installed as the `VC` domain size in the domain
//! file before the real numbering run.

use crate::programs::{self, DOMAIN_FILE};
use crate::solver::solve_text;
use crate::workdir::write_atomic;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use ptrun_core::{ExecutionContext, PipelineError, Result, Stage, StageOutcome, StderrMode};
use regex::Regex;
use std::path::Path;

/// Tag of the context-variable domain
pub const CONTEXT_DOMAIN: &str = "VC";

/// Program file of the probe run
pub const PROBE_FILE: &str = "number.dtl";

static PATHS: Lazy<Regex> = Lazy::new(|| Regex::new(r"paths = ([0-9]+)").unwrap());

/// Outcome of scanning the probe output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextCount {
    PatternFound(u64),
    /// Expected when the engine stops before counting; the bound already
    /// on disk is used.
    PatternAbsent,
}

/// Finds the first `paths = <n>` in the engine output.
pub fn extract_context_count(output: &str) -> Result<ContextCount> {
    let digits = match PATHS.captures(output).and_then(|c| c.get(1)) {
        Some(m) => m.as_str(),
        None => return Ok(ContextCount::PatternAbsent),
    };
    digits
        .parse::<u64>()
        .map(ContextCount::PatternFound)
        .map_err(|_| PipelineError::BoundOverflow(digits.to_string()))
}

/// Replaces the size of every `VC` line, copying all other lines verbatim.
pub fn patch_domain_text(text: &str, bound: u64) -> (String, usize) {
    let mut patched = String::with_capacity(text.len() + 8);
    let mut replaced = 0;

    for line in text.split_inclusive('\n') {
        let body = line.trim_end_matches(['\n', '\r']);
        if body.split_whitespace().next() == Some(CONTEXT_DOMAIN) {
            patched.push_str(&format!("{} {}", CONTEXT_DOMAIN, bound));
            patched.push_str(&line[body.len()..]);
            replaced += 1;
        } else {
            patched.push_str(line);
        }
    }
    (patched, replaced)
}

/// Read-all, patch in memory, write-all through an atomic rename.
pub fn patch_domain_file(path: &Path, bound: u64) -> Result<usize> {
    let text = std::fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))?;
    let (patched, replaced) = patch_domain_text(&text, bound);
    if replaced == 0 {
        tracing::warn!(file = %path.display(), "no {} domain line to patch", CONTEXT_DOMAIN);
        return Ok(0);
    }
    write_atomic(path, patched.as_bytes())?;
    Ok(replaced)
}

/// Runs the probe and installs the bound it reports.
pub struct ContextSizeStage;

#[async_trait]
impl Stage for ContextSizeStage {
    fn id(&self) -> &'static str {
        "count"
    }

    async fn run(&self, ctx: &ExecutionContext) -> Result<StageOutcome> {
        let text = programs::render(programs::NUMBERING, ctx.work_dir());
        let result = solve_text(ctx, self.id(), PROBE_FILE, &text, StderrMode::Merge).await?;

        // The probe's exit status is not meaningful; only its output is.
        let summary = match extract_context_count(&result.output_text())? {
            ContextCount::PatternFound(paths) => {
                tracing::info!("requires {} paths", paths);
                patch_domain_file(&ctx.work_dir().join(DOMAIN_FILE), paths)?;
                format!("{} domain set to {}", CONTEXT_DOMAIN, paths)
            }
            ContextCount::PatternAbsent => {
                tracing::info!("probe reported no path count, keeping the current {} bound", CONTEXT_DOMAIN);
                "no path count reported".to_string()
            }
        };
        Ok(StageOutcome::from_process(result).with_summary(summary))
    }
}
