//! Working directory housekeeping and the prepare stage.
use async_trait::async_trait;
use ptrun_core::{ExecutionContext, PipelineError, Result, Stage, StageOutcome};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Extension of relation tuple files the solver emits
pub const TUPLES_EXT: &str = "tuples";

/// Removes everything under `dir` and recreates it empty.
pub fn clean(dir: &Path) -> Result<usize> {
    let mut removed = 0;
    if dir.exists() {
        removed = count_files(dir)?;
        std::fs::remove_dir_all(dir).map_err(|e| PipelineError::io(dir, e))?;
    }
    std::fs::create_dir_all(dir).map_err(|e| PipelineError::io(dir, e))?;
    Ok(removed)
}

fn count_files(dir: &Path) -> Result<usize> {
    let mut total = 0;
    for entry in std::fs::read_dir(dir).map_err(|e| PipelineError::io(dir, e))? {
        let entry = entry.map_err(|e| PipelineError::io(dir, e))?;
        let path = entry.path();
        if path.is_dir() {
            total += count_files(&path)?;
        } else {
            total += 1;
        }
    }
    Ok(total)
}

/// Deletes stale `*.tuples` files, leaving relations in place.
pub fn clear_tuples(dir: &Path) -> Result<usize> {
    let mut removed = 0;
    for path in files_matching(dir, |p| p.extension().map_or(false, |e| e == TUPLES_EXT))? {
        std::fs::remove_file(&path).map_err(|e| PipelineError::io(&path, e))?;
        removed += 1;
    }
    Ok(removed)
}

/// Moves every file in `from` whose name starts with `prefix` into `to`.
pub fn move_prefixed(from: &Path, prefix: &str, to: &Path) -> Result<usize> {
    let matches = files_matching(from, |p| {
        p.file_name()
            .and_then(|n| n.to_str())
            .map_or(false, |n| n.starts_with(prefix))
    })?;
    for path in &matches {
        if let Some(name) = path.file_name() {
            let target = to.join(name);
            std::fs::rename(path, &target).map_err(|e| PipelineError::io(path, e))?;
        }
    }
    Ok(matches.len())
}

fn files_matching(dir: &Path, keep: impl Fn(&Path) -> bool) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut found = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(|e| PipelineError::io(dir, e))? {
        let path = entry.map_err(|e| PipelineError::io(dir, e))?.path();
        if path.is_file() && keep(&path) {
            found.push(path);
        }
    }
    found.sort();
    Ok(found)
}

/// Replaces `path` with `contents` via a sibling temp file and a rename,
/// so readers see either the old file or the new one.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| PipelineError::io(dir, e))?;
    tmp.write_all(contents)
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| PipelineError::io(tmp.path(), e))?;
    if let Ok(meta) = std::fs::metadata(path) {
        tmp.as_file()
            .set_permissions(meta.permissions())
            .map_err(|e| PipelineError::io(tmp.path(), e))?;
    }
    tmp.persist(path)
        .map_err(|e| PipelineError::io(path, e.error))?;
    Ok(())
}

/// A program file that lives for exactly one engine invocation.
///
/// Removed on drop when cleanup is enabled, whatever the invocation's
/// outcome; kept for inspection otherwise.
pub struct ProgramFile {
    path: PathBuf,
    cleanup: bool,
}

impl ProgramFile {
    pub fn materialize(path: PathBuf, text: &str, cleanup: bool) -> Result<Self> {
        std::fs::write(&path, text).map_err(|e| PipelineError::io(&path, e))?;
        tracing::debug!(path = %path.display(), "program materialized");
        Ok(Self { path, cleanup })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ProgramFile {
    fn drop(&mut self) {
        if !self.cleanup {
            return;
        }
        if let Err(e) = std::fs::remove_file(&self.path) {
            tracing::warn!(path = %self.path.display(), "could not remove program file: {}", e);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Wipe the working directory and regenerate relations
    Full,
    /// Reuse relations from a previous full run
    Fast,
}

/// Clean (full) or clear stale tuples (fast).
pub struct PrepareStage {
    mode: RunMode,
}

impl PrepareStage {
    pub fn new(mode: RunMode) -> Self {
        Self { mode }
    }
}

#[async_trait]
impl Stage for PrepareStage {
    fn id(&self) -> &'static str {
        "prepare"
    }

    async fn run(&self, ctx: &ExecutionContext) -> Result<StageOutcome> {
        let dir = ctx.work_dir();
        match self.mode {
            RunMode::Full => {
                ctx.config.validate()?;
                tracing::info!(dir = %dir.display(), "cleaning working directory");
                let removed = clean(dir)?;
                Ok(StageOutcome::summary(format!("removed {} files", removed)))
            }
            RunMode::Fast => {
                if !dir.is_dir() {
                    return Err(PipelineError::Configuration(format!(
                        "fast mode needs relations from a previous full run, but {} does not exist",
                        dir.display()
                    )));
                }
                let removed = clear_tuples(dir)?;
                Ok(StageOutcome::summary(format!("removed {} stale tuple files", removed)))
            }
        }
    }
}
