//! Supervision of one ffmpeg child process: spawn, drain both output pipes,
//! report clamped progress, honor cancellation, resolve to a typed outcome.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::watch;

use crate::command::CommandPlan;
use crate::error::{RenderError, Result};
use crate::locate::ensure_executable;
use crate::progress::parse_progress;

/// Receives progress percentages in `[0, 100]`. Intermediate samples are
/// clamped to 99; 100 is reported exactly once, after the child has exited
/// cleanly. ffmpeg's own reports can reach the nominal duration before the
/// output file is fully flushed, so an early 100 would be a lie.
pub type ProgressFn = Box<dyn Fn(f64) + Send>;

/// Execution configuration for one supervised run.
#[derive(Default)]
pub struct ExecOptions {
    /// Working directory override for the child.
    pub cwd: Option<PathBuf>,

    /// Expected output duration in seconds, used to turn elapsed-time samples
    /// into percentages. Zero or negative disables percentage reporting.
    pub total_secs: f64,

    pub progress: Option<ProgressFn>,

    pub cancel: Option<CancelToken>,
}

/// Captured output of a completed run. Immutable once produced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExecOutcome {
    pub stdout: String,
    pub stderr: String,
    pub code: i32,
}

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

/// Create a linked cancellation handle/token pair. The token is cheap to
/// clone; cancelling the handle wakes every token.
pub fn cancel_pair() -> (CancelHandle, CancelToken) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelToken { rx })
}

pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

#[derive(Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once cancellation is requested. Never resolves if the handle
    /// is dropped without cancelling.
    pub async fn cancelled(&mut self) {
        if self.rx.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

// ---------------------------------------------------------------------------
// Supervisor
// ---------------------------------------------------------------------------

/// Run ffmpeg to completion.
///
/// Both output pipes are drained concurrently; every line is accumulated in
/// full and fed to the progress parser. Cancellation requests graceful
/// termination (SIGTERM) and then resolves through the normal exit path, so a
/// child that exits 0 despite a late cancel request still counts as success.
pub async fn execute_ffmpeg(
    ffmpeg: &Path,
    plan: CommandPlan,
    mut opts: ExecOptions,
) -> Result<ExecOutcome> {
    ensure_executable(ffmpeg)?;

    let mut cmd = Command::new(ffmpeg);
    cmd.args(plan.args())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(dir) = &opts.cwd {
        cmd.current_dir(dir);
    }

    tracing::debug!(ffmpeg = %ffmpeg.display(), args = plan.args().len(), "spawning ffmpeg");
    let mut child = cmd.spawn().map_err(|e| RenderError::Spawn(e.to_string()))?;

    // Pipes are configured above; take() cannot fail here.
    let mut stdout_lines = BufReader::new(child.stdout.take().unwrap()).lines();
    let mut stderr_lines = BufReader::new(child.stderr.take().unwrap()).lines();

    let mut stdout_buf = String::new();
    let mut stderr_buf = String::new();
    let mut stdout_done = false;
    let mut stderr_done = false;
    let mut cancel = opts.cancel.take();
    let mut cancelled = false;

    while !(stdout_done && stderr_done) {
        tokio::select! {
            line = stdout_lines.next_line(), if !stdout_done => {
                match line {
                    Ok(Some(line)) => {
                        stdout_buf.push_str(&line);
                        stdout_buf.push('\n');
                        report_line(&line, &opts);
                    }
                    _ => stdout_done = true,
                }
            }
            line = stderr_lines.next_line(), if !stderr_done => {
                match line {
                    Ok(Some(line)) => {
                        stderr_buf.push_str(&line);
                        stderr_buf.push('\n');
                        report_line(&line, &opts);
                    }
                    _ => stderr_done = true,
                }
            }
            _ = wait_for_cancel(&mut cancel), if !cancelled => {
                cancelled = true;
                tracing::info!("cancellation requested, terminating ffmpeg");
                request_termination(&mut child);
            }
        }
    }

    let status = child.wait().await?;
    let code = status.code().unwrap_or(-1);

    if status.success() {
        if let Some(progress) = &opts.progress {
            progress(100.0);
        }
        tracing::debug!("ffmpeg finished");
        return Ok(ExecOutcome {
            stdout: stdout_buf,
            stderr: stderr_buf,
            code,
        });
    }

    if cancelled {
        return Err(RenderError::Cancelled { stderr: stderr_buf });
    }
    Err(RenderError::FfmpegFailed {
        code,
        stderr: stderr_buf,
    })
}

fn report_line(line: &str, opts: &ExecOptions) {
    let Some(progress) = &opts.progress else {
        return;
    };
    if let Some(elapsed) = parse_progress(line) {
        progress(percent_of(elapsed, opts.total_secs));
    }
}

/// Elapsed seconds as a percentage, clamped to 99 until the exit path
/// reports the final 100.
fn percent_of(elapsed: f64, total_secs: f64) -> f64 {
    if total_secs > 0.0 {
        (elapsed / total_secs * 100.0).min(99.0)
    } else {
        0.0
    }
}

async fn wait_for_cancel(token: &mut Option<CancelToken>) {
    match token {
        Some(token) => token.cancelled().await,
        None => std::future::pending().await,
    }
}

/// Ask the child to stop. SIGTERM lets ffmpeg tear down its muxer; the exit
/// status then resolves through the normal wait path.
fn request_termination(child: &mut Child) {
    #[cfg(unix)]
    {
        if let Some(pid) = child.id() {
            // SAFETY: plain kill(2) on a pid we own.
            unsafe {
                libc::kill(pid as libc::pid_t, libc::SIGTERM);
            }
            return;
        }
    }
    let _ = child.start_kill();
}
