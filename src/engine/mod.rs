//! Process engine: owns the lifecycle of one external-tool invocation.
//!
//! Spawns the tool with piped stdio, streams stdout/stderr line by line as
//! [`ToolEvent`]s, and resolves to a [`RunOutcome`] when the process exits.
//! One invocation at a time per runner; concurrent starts are rejected, not
//! queued.

pub mod argv;

use crate::model::{RunOutcome, StreamKind, ToolEvent};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicU8, Ordering};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;

#[derive(Debug, Clone)]
pub enum EngineControl {
    /// Kill the running tool process.
    Cancel,
}

#[derive(Debug, Error)]
pub enum RunError {
    /// The tool binary is missing or unlaunchable. Surfaced to the caller
    /// before any event is streamed, so "tool missing" is distinguishable
    /// from "tool ran and failed".
    #[error("failed to start `{tool}`: {source}")]
    Start {
        tool: String,
        #[source]
        source: std::io::Error,
    },
    /// A run is already in flight on this runner.
    #[error("a generation is already running")]
    AlreadyRunning,
    #[error("failed to wait for `{tool}`: {source}")]
    Wait {
        tool: String,
        #[source]
        source: std::io::Error,
    },
}

const IDLE: u8 = 0;
const RUNNING: u8 = 1;

/// Resets the runner state when a run finishes, errors, or is dropped.
struct StateGuard<'a>(&'a AtomicU8);

impl Drop for StateGuard<'_> {
    fn drop(&mut self) {
        self.0.store(IDLE, Ordering::Release);
    }
}

/// Runs the external tool. At most one invocation may be in flight per
/// runner; the guard is a compare-and-swap on an explicit Idle/Running state
/// so there is no window between check and set.
pub struct ToolRunner {
    tool: PathBuf,
    state: AtomicU8,
}

impl ToolRunner {
    pub fn new(tool: impl Into<PathBuf>) -> Self {
        Self {
            tool: tool.into(),
            state: AtomicU8::new(IDLE),
        }
    }

    pub fn is_running(&self) -> bool {
        self.state.load(Ordering::Acquire) == RUNNING
    }

    /// Run the tool to completion, streaming each non-empty output line as it
    /// arrives and emitting a single `Exited` event after the process
    /// terminates. Start failures return synchronously without streaming
    /// anything.
    pub async fn run(
        &self,
        args: &[String],
        event_tx: mpsc::UnboundedSender<ToolEvent>,
        mut control_rx: mpsc::UnboundedReceiver<EngineControl>,
    ) -> Result<RunOutcome, RunError> {
        self.state
            .compare_exchange(IDLE, RUNNING, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| RunError::AlreadyRunning)?;
        let _guard = StateGuard(&self.state);

        log::debug!("spawning {} {}", self.tool.display(), argv::render(args));
        let mut child = Command::new(&self.tool)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| RunError::Start {
                tool: self.tool.display().to_string(),
                source,
            })?;

        // Both pipes were requested above, so take() cannot return None.
        let stdout = child.stdout.take().expect("child stdout is piped");
        let stderr = child.stderr.take().expect("child stderr is piped");
        let out_task = tokio::spawn(read_lines(stdout, StreamKind::Stdout, event_tx.clone()));
        let err_task = tokio::spawn(read_lines(stderr, StreamKind::Stderr, event_tx.clone()));

        let mut cancelled = false;
        let mut control_open = true;
        let status = loop {
            tokio::select! {
                ctrl = control_rx.recv(), if control_open => {
                    match ctrl {
                        Some(EngineControl::Cancel) => {
                            cancelled = true;
                            let _ = child.start_kill();
                        }
                        None => control_open = false,
                    }
                }
                status = child.wait() => break status,
            }
        };
        let status = status.map_err(|source| RunError::Wait {
            tool: self.tool.display().to_string(),
            source,
        })?;

        let stdout_lines = out_task.await.unwrap_or_default();
        let stderr_lines = err_task.await.unwrap_or_default();

        let exit_code = status.code();
        let _ = event_tx.send(ToolEvent::Exited { code: exit_code });

        Ok(RunOutcome {
            exit_code,
            cancelled,
            stdout: stdout_lines,
            stderr: stderr_lines,
        })
    }
}

/// Stream one pipe line by line, forwarding non-empty lines as events and
/// collecting them for the final outcome.
async fn read_lines<R: AsyncRead + Unpin>(
    reader: R,
    stream: StreamKind,
    tx: mpsc::UnboundedSender<ToolEvent>,
) -> Vec<String> {
    let mut lines = BufReader::new(reader).lines();
    let mut collected = Vec::new();
    while let Ok(Some(line)) = lines.next_line().await {
        if line.is_empty() {
            continue;
        }
        let _ = tx.send(ToolEvent::Line {
            stream,
            text: line.clone(),
        });
        collected.push(line);
    }
    collected
}

/// Explicit tool-availability query: resolve `name` against PATH, or verify
/// it directly when it already carries a directory component.
pub fn locate_tool(name: &str) -> Option<PathBuf> {
    locate_tool_in(name, std::env::var_os("PATH").as_deref())
}

fn locate_tool_in(name: &str, path_var: Option<&std::ffi::OsStr>) -> Option<PathBuf> {
    let as_path = Path::new(name);
    if as_path.components().count() > 1 {
        return is_executable(as_path).then(|| as_path.to_path_buf());
    }
    for dir in std::env::split_paths(path_var?) {
        if dir.as_os_str().is_empty() {
            continue;
        }
        let candidate = dir.join(name);
        if is_executable(&candidate) {
            return Some(candidate);
        }
        #[cfg(windows)]
        {
            let with_exe = dir.join(format!("{name}.exe"));
            if is_executable(&with_exe) {
                return Some(with_exe);
            }
        }
    }
    None
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.is_file()
        && path
            .metadata()
            .map(|m| m.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
