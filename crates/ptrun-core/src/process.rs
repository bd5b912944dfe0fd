//! Process Invoker: runs one engine command and captures what it prints.
//!
//! Output is drained while the child runs so a chatty engine can never
//! fill a pipe and stall. With `StderrMode::Merge` both streams land in
//! one buffer in arrival order.

use crate::command::EngineCommand;
use crate::data_model::ProcessResult;
use crate::error::{PipelineError, Result};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};

const CHUNK: usize = 8192;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StderrMode {
    /// Interleave into the captured output
    Merge,
    /// Send to the null device
    Discard,
    /// Capture into `ProcessResult::stderr`
    Separate,
}

#[derive(Debug, Clone, Default)]
pub struct ProcessInvoker {
    timeout: Option<Duration>,
}

impl ProcessInvoker {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Runs `cmd` in `cwd` and waits for it to exit.
    ///
    /// A non-zero exit is returned as a normal result; only failure to
    /// start the process or an exceeded timeout are errors.
    pub async fn invoke(
        &self,
        cmd: &EngineCommand,
        cwd: &Path,
        stderr: StderrMode,
    ) -> Result<ProcessResult> {
        tracing::debug!(stage = %cmd.label, cwd = %cwd.display(), "exec {}", cmd.display());

        let mut command = Command::new(&cmd.program);
        command
            .args(&cmd.args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(match stderr {
                StderrMode::Discard => Stdio::null(),
                StderrMode::Merge | StderrMode::Separate => Stdio::piped(),
            })
            .kill_on_drop(true);

        let mut child = command.spawn().map_err(|source| PipelineError::Invocation {
            label: cmd.label.clone(),
            program: cmd.program.display().to_string(),
            source,
        })?;

        let outcome = {
            let run = collect(&mut child, stderr);
            match self.timeout {
                Some(limit) => tokio::time::timeout(limit, run).await.ok(),
                None => Some(run.await),
            }
        };

        match outcome {
            Some(result) => result.map_err(|source| PipelineError::Invocation {
                label: cmd.label.clone(),
                program: cmd.program.display().to_string(),
                source,
            }),
            None => {
                let after = self.timeout.unwrap_or_default();
                tracing::warn!(stage = %cmd.label, "killing engine after {}s", after.as_secs());
                if let Err(e) = child.kill().await {
                    tracing::warn!(stage = %cmd.label, "kill failed: {}", e);
                }
                Err(PipelineError::StageTimeout {
                    stage: cmd.label.clone(),
                    after,
                })
            }
        }
    }
}

async fn collect(child: &mut Child, mode: StderrMode) -> std::io::Result<ProcessResult> {
    let mut stdout = child.stdout.take();
    let mut stderr = child.stderr.take();

    let mut output = Vec::new();
    let mut errors = Vec::new();
    let mut out_buf = [0u8; CHUNK];
    let mut err_buf = [0u8; CHUNK];
    let mut out_open = stdout.is_some();
    let mut err_open = stderr.is_some();

    while out_open || err_open {
        tokio::select! {
            read = read_some(&mut stdout, &mut out_buf), if out_open => {
                let n = read?;
                if n == 0 {
                    out_open = false;
                } else {
                    output.extend_from_slice(&out_buf[..n]);
                }
            }
            read = read_some(&mut stderr, &mut err_buf), if err_open => {
                let n = read?;
                if n == 0 {
                    err_open = false;
                } else if mode == StderrMode::Merge {
                    output.extend_from_slice(&err_buf[..n]);
                } else {
                    errors.extend_from_slice(&err_buf[..n]);
                }
            }
        }
    }

    let status = child.wait().await?;
    Ok(ProcessResult {
        output,
        stderr: errors,
        code: status.code(),
        success: status.success(),
    })
}

async fn read_some<R>(stream: &mut Option<R>, buf: &mut [u8]) -> std::io::Result<usize>
where
    R: AsyncRead + Unpin,
{
    match stream {
        Some(reader) => reader.read(buf).await,
        None => Ok(0),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(label: &str, script: &str) -> EngineCommand {
        EngineCommand::new(label, "/bin/sh").arg("-c").arg(script)
    }

    #[tokio::test]
    async fn test_merge_captures_both_streams() {
        let invoker = ProcessInvoker::default();
        let result = invoker
            .invoke(&sh("t", "echo out; echo err 1>&2"), Path::new("/"), StderrMode::Merge)
            .await
            .unwrap();

        let text = result.output_text();
        assert!(text.contains("out"));
        assert!(text.contains("err"));
        assert!(result.stderr.is_empty());
        assert!(result.success);
    }

    #[tokio::test]
    async fn test_discard_and_separate() {
        let invoker = ProcessInvoker::default();
        let cmd = sh("t", "echo out; echo err 1>&2");

        let discarded = invoker.invoke(&cmd, Path::new("/"), StderrMode::Discard).await.unwrap();
        assert_eq!(discarded.output_text(), "out\n");

        let separate = invoker.invoke(&cmd, Path::new("/"), StderrMode::Separate).await.unwrap();
        assert_eq!(separate.output_text(), "out\n");
        assert_eq!(separate.stderr_text(), "err\n");
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_not_an_error() {
        let invoker = ProcessInvoker::default();
        let result = invoker
            .invoke(&sh("t", "echo boom; exit 3"), Path::new("/"), StderrMode::Merge)
            .await
            .unwrap();

        assert!(!result.success);
        assert_eq!(result.code, Some(3));
    }

    #[tokio::test]
    async fn test_runs_in_working_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("marker"), "x").unwrap();

        let result = ProcessInvoker::default()
            .invoke(&sh("t", "ls"), dir.path(), StderrMode::Merge)
            .await
            .unwrap();
        assert!(result.output_text().contains("marker"));
    }

    #[tokio::test]
    async fn test_missing_binary_is_invocation_error() {
        let cmd = EngineCommand::new("relations", "/nonexistent/bin/java");
        let err = ProcessInvoker::default()
            .invoke(&cmd, Path::new("/"), StderrMode::Merge)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Invocation { .. }));
    }

    #[tokio::test]
    async fn test_timeout_kills_engine() {
        let invoker = ProcessInvoker::new(Some(Duration::from_millis(200)));
        let err = invoker
            .invoke(&sh("solve", "sleep 10"), Path::new("/"), StderrMode::Merge)
            .await
            .unwrap_err();

        match err {
            PipelineError::StageTimeout { stage, .. } => assert_eq!(stage, "solve"),
            other => panic!("unexpected error: {}", other),
        }
    }
}
