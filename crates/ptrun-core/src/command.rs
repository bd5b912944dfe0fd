//! Structured engine commands.
//!
//! A command is an executable plus an argument vector; nothing is ever
//! joined into a shell string, so paths with spaces or quotes pass through
//! untouched.

use crate::data_model::ToolchainLocation;
use crate::error::{PipelineError, Result};
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf, MAIN_SEPARATOR};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineCommand {
    /// Stage label used in logs and errors
    pub label: String,
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

impl EngineCommand {
    pub fn new(label: impl Into<String>, program: impl Into<PathBuf>) -> Self {
        Self {
            label: label.into(),
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// A JVM command for the given toolchain.
    pub fn java(label: impl Into<String>, toolchain: &ToolchainLocation) -> Self {
        Self::new(label, &toolchain.runtime)
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// `-cp <entries joined by the platform separator>`
    pub fn classpath<P: AsRef<Path>>(self, entries: &[P]) -> Result<Self> {
        let joined = std::env::join_paths(entries.iter().map(|p| p.as_ref()))
            .map_err(|e| PipelineError::Configuration(format!("invalid classpath entry: {}", e)))?;
        Ok(self.arg("-cp").arg(joined))
    }

    /// `-D<key>=<value>`
    pub fn property(self, key: &str, value: impl AsRef<OsStr>) -> Self {
        let mut arg = OsString::from(format!("-D{}=", key));
        arg.push(value.as_ref());
        self.arg(arg)
    }

    /// `-D<key>=<dir>/`, the engine concatenates file names onto it.
    pub fn dir_property(self, key: &str, dir: &Path) -> Self {
        let mut value = dir.as_os_str().to_os_string();
        if !value.to_string_lossy().ends_with(MAIN_SEPARATOR) {
            value.push(MAIN_SEPARATOR.to_string());
        }
        self.property(key, value)
    }

    /// Human-readable rendering for logs. Not meant to be re-parsed.
    pub fn display(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().map(|a| a.to_string_lossy().into_owned()));
        parts.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_and_dir_property() {
        let cmd = EngineCommand::new("solve", "/usr/bin/java")
            .property("bddcache", "1500000")
            .dir_property("basedir", Path::new("/work/results"))
            .dir_property("resultdir", Path::new("/work/results/"));

        assert_eq!(
            cmd.args,
            vec![
                OsString::from("-Dbddcache=1500000"),
                OsString::from(format!("-Dbasedir=/work/results{}", MAIN_SEPARATOR)),
                OsString::from("-Dresultdir=/work/results/"),
            ]
        );
    }

    #[test]
    fn test_classpath_keeps_spaces_in_one_argument() {
        let cmd = EngineCommand::new("relations", "java")
            .classpath(&["/opt/my engine/PQL-0.2.jar", "/home/u/classes"])
            .unwrap()
            .arg("joeq.Main.GenRelations");

        assert_eq!(cmd.args.len(), 3);
        assert_eq!(cmd.args[0], OsString::from("-cp"));
        assert!(cmd.args[1].to_string_lossy().contains("/opt/my engine/PQL-0.2.jar"));
        assert_eq!(cmd.display().split(' ').last(), Some("joeq.Main.GenRelations"));
    }

    #[cfg(unix)]
    #[test]
    fn test_classpath_rejects_separator_in_entry() {
        let result = EngineCommand::new("x", "java").classpath(&["/a:/b"]);
        assert!(matches!(result, Err(PipelineError::Configuration(_))));
    }
}
