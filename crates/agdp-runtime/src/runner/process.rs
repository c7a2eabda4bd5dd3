//! Runner that executes the generated Python in a child process.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::str::FromStr;

use agdp_generator::ArtifactTarget;
use agdp_store::types::LogLevel;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};

use super::{ArtifactRunner, RunContext, TRACING_TARGET};
use crate::{Error, Result};

/// Number of trailing stdout lines kept as the output preview.
const PREVIEW_LINES: usize = 5;

/// Writes the artifacts to disk and runs the Python entry point.
///
/// Files land in `<storage_path>/<pipeline_id>/<execution_id>/`, which is
/// also the working directory of the child. Stdout lines are logged at
/// `info`, stderr lines at `warning`. The child is killed on cancellation.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    interpreter: String,
}

impl ProcessRunner {
    /// Creates a runner using the given interpreter.
    pub fn new(interpreter: impl Into<String>) -> Self {
        Self {
            interpreter: interpreter.into(),
        }
    }

    /// Returns the working directory for an execution.
    pub fn work_dir(ctx: &RunContext) -> PathBuf {
        ctx.settings()
            .storage_path
            .join(ctx.pipeline().id.to_string())
            .join(ctx.execution_id().to_string())
    }

    /// Writes every known artifact into `dir` and returns the entry point.
    async fn materialize(ctx: &RunContext, dir: &Path) -> Result<PathBuf> {
        tokio::fs::create_dir_all(dir).await.map_err(|e| {
            Error::execution_failed(format!("Failed to create {}: {e}", dir.display()))
        })?;

        let mut entry_point = None;
        for (name, source) in &ctx.pipeline().artifacts {
            let Ok(target) = ArtifactTarget::from_str(name) else {
                continue;
            };
            let path = dir.join(target.file_name());
            tokio::fs::write(&path, source).await.map_err(|e| {
                Error::execution_failed(format!("Failed to write {}: {e}", path.display()))
            })?;
            if target == ArtifactTarget::Python {
                entry_point = Some(path);
            }
        }

        entry_point.ok_or_else(|| Error::execution_failed("pipeline has no python artifact"))
    }

    fn spawn(&self, entry_point: &Path, dir: &Path) -> Result<Child> {
        Command::new(&self.interpreter)
            .arg(entry_point)
            .current_dir(dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                Error::execution_failed(format!("Failed to start {}: {e}", self.interpreter))
            })
    }
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new("python3")
    }
}

#[async_trait::async_trait]
impl ArtifactRunner for ProcessRunner {
    fn name(&self) -> &'static str {
        "process"
    }

    async fn run(&self, ctx: &RunContext) -> Result<Option<String>> {
        let dir = Self::work_dir(ctx);
        let entry_point = Self::materialize(ctx, &dir).await?;
        ctx.info(format!("Artifacts written to {}", dir.display())).await;

        let mut child = self.spawn(&entry_point, &dir)?;
        tracing::debug!(
            target: TRACING_TARGET,
            execution_id = %ctx.execution_id(),
            interpreter = %self.interpreter,
            pid = child.id(),
            "Child process started",
        );

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::execution_failed("child stdout is not captured"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::execution_failed("child stderr is not captured"))?;

        let mut stdout = BufReader::new(stdout).split(b'\n');
        let mut stderr = BufReader::new(stderr).split(b'\n');
        let (mut stdout_open, mut stderr_open) = (true, true);
        let mut preview = VecDeque::with_capacity(PREVIEW_LINES);

        while stdout_open || stderr_open {
            tokio::select! {
                () = ctx.cancelled() => {
                    terminate(&mut child, ctx).await;
                    return Err(Error::Cancelled);
                }
                line = stdout.next_segment(), if stdout_open => match line {
                    Ok(Some(line)) => {
                        let line = decode_line(&line);
                        ctx.log(LogLevel::Info, line.clone()).await;
                        if preview.len() == PREVIEW_LINES {
                            preview.pop_front();
                        }
                        preview.push_back(line);
                    }
                    Ok(None) => stdout_open = false,
                    Err(error) => {
                        stream_failed(ctx, "stdout", &error);
                        stdout_open = false;
                    }
                },
                line = stderr.next_segment(), if stderr_open => match line {
                    Ok(Some(line)) => {
                        ctx.log(LogLevel::Warning, decode_line(&line)).await;
                    }
                    Ok(None) => stderr_open = false,
                    Err(error) => {
                        stream_failed(ctx, "stderr", &error);
                        stderr_open = false;
                    }
                },
            }
        }

        let waited = tokio::select! {
            () = ctx.cancelled() => None,
            status = child.wait() => Some(status),
        };
        let Some(status) = waited else {
            terminate(&mut child, ctx).await;
            return Err(Error::Cancelled);
        };
        let status = status.map_err(|e| {
            Error::execution_failed(format!("Failed to wait for the child process: {e}"))
        })?;

        if !status.success() {
            return Err(Error::execution_failed(format!("Process exited with {status}")));
        }

        let preview: Vec<String> = preview.into();
        Ok((!preview.is_empty()).then(|| preview.join("\n")))
    }
}

/// Decodes one output line, replacing invalid UTF-8.
fn decode_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

fn stream_failed(ctx: &RunContext, stream: &'static str, error: &std::io::Error) {
    tracing::warn!(
        target: TRACING_TARGET,
        execution_id = %ctx.execution_id(),
        stream,
        error = %error,
        "Failed to read child output",
    );
}

async fn terminate(child: &mut Child, ctx: &RunContext) {
    if let Err(error) = child.kill().await {
        tracing::warn!(
            target: TRACING_TARGET,
            execution_id = %ctx.execution_id(),
            error = %error,
            "Failed to kill child process",
        );
    }
}
