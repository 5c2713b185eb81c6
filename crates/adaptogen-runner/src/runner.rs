//! Executes command lines through a shell and normalizes the outcome.
//!
//! [`run_command`] never returns an error: spawn failures, nonzero exits and
//! output overflow are all recorded in the returned [`ExecutionResult`] with
//! `ok = false`.

use std::process::Stdio;

use adaptogen_core::{completion_time, ExecutionResult};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::sync::Notify;

use crate::command_line::build_command_line;

const DEFAULT_SHELL: &str = "/bin/sh";
const DEFAULT_MAX_OUTPUT_BYTES: usize = 1024 * 1024;
const FALLBACK_EXIT_CODE: i32 = 1;

/// Execution settings shared by live requests and scheduled ticks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Shell invoked as `<shell> -c <command line>`.
    pub shell: String,
    /// Capture ceiling applied to stdout and stderr independently.
    pub max_output_bytes: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            shell: DEFAULT_SHELL.to_string(),
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
        }
    }
}

impl RunnerConfig {
    #[must_use]
    pub fn from_app_config(config: &adaptogen_core::AppConfig) -> Self {
        Self {
            shell: config.shell.clone(),
            max_output_bytes: config.max_output_bytes,
        }
    }
}

#[derive(Debug, Default)]
struct Captured {
    stdout: String,
    stderr: String,
}

#[derive(Debug)]
struct Failure {
    captured: Captured,
    reason: String,
    exit_code: Option<i32>,
}

#[derive(Debug, Default)]
struct StreamCapture {
    bytes: Vec<u8>,
    overflowed: bool,
}

/// Run `command` with `keys` appended as quoted arguments.
///
/// The returned record carries the original `command` and `keys`, not the
/// assembled command line.
pub async fn run_command(config: &RunnerConfig, command: &str, keys: &[String]) -> ExecutionResult {
    let line = build_command_line(command, keys);
    tracing::debug!(command, keys = keys.len(), "runner: starting command");

    let (ok, captured, exit_code) = match execute(config, &line).await {
        Ok(captured) => (true, captured, 0),
        Err(failure) => {
            let Failure {
                mut captured,
                reason,
                exit_code,
            } = failure;
            if captured.stderr.is_empty() {
                captured.stderr = reason;
            }
            (false, captured, exit_code.unwrap_or(FALLBACK_EXIT_CODE))
        }
    };

    if ok {
        tracing::info!(command, exit_code, "runner: command succeeded");
    } else {
        tracing::warn!(command, exit_code, "runner: command failed");
    }

    ExecutionResult {
        ok,
        command: command.to_string(),
        keys: keys.to_vec(),
        stdout: captured.stdout.trim_end().to_string(),
        stderr: captured.stderr.trim_end().to_string(),
        exit_code,
        ran_at: completion_time(),
    }
}

async fn execute(config: &RunnerConfig, line: &str) -> Result<Captured, Failure> {
    let mut child = Command::new(&config.shell)
        .arg("-c")
        .arg(line)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| Failure {
            captured: Captured::default(),
            reason: format!("failed to spawn {}: {e}", config.shell),
            exit_code: None,
        })?;

    let limit = config.max_output_bytes;
    let overflow = Notify::new();
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let reads = async {
        tokio::join!(
            read_capped(stdout, limit, &overflow),
            read_capped(stderr, limit, &overflow)
        )
    };
    tokio::pin!(reads);

    let (out, err) = tokio::select! {
        captured = &mut reads => captured,
        () = overflow.notified() => {
            if let Err(e) = child.start_kill() {
                tracing::debug!(error = %e, "runner: failed to kill overflowing command");
            }
            reads.await
        }
    };

    let overflowed = out.overflowed || err.overflowed;
    if overflowed {
        // The select above may have finished before the overflow branch ran.
        if let Err(e) = child.start_kill() {
            tracing::debug!(error = %e, "runner: kill after overflow failed");
        }
    }
    let status = child.wait().await;

    let captured = Captured {
        stdout: String::from_utf8_lossy(&out.bytes).into_owned(),
        stderr: String::from_utf8_lossy(&err.bytes).into_owned(),
    };

    if overflowed {
        return Err(Failure {
            captured,
            reason: format!("maxBuffer exceeded: output larger than {limit} bytes"),
            exit_code: None,
        });
    }

    match status {
        Ok(status) if status.success() => Ok(captured),
        Ok(status) => Err(Failure {
            captured,
            reason: format!("Command failed: {line}"),
            exit_code: status.code(),
        }),
        Err(e) => Err(Failure {
            captured,
            reason: format!("failed to wait for command: {e}"),
            exit_code: None,
        }),
    }
}

/// Read a stream up to `limit` bytes, signalling `overflow` if it had more.
async fn read_capped<R>(reader: Option<R>, limit: usize, overflow: &Notify) -> StreamCapture
where
    R: AsyncRead + Unpin,
{
    let Some(reader) = reader else {
        return StreamCapture::default();
    };

    let ceiling = u64::try_from(limit).unwrap_or(u64::MAX).saturating_add(1);
    let mut bytes = Vec::new();
    if let Err(e) = reader.take(ceiling).read_to_end(&mut bytes).await {
        tracing::debug!(error = %e, "runner: output stream read failed");
    }

    let overflowed = bytes.len() > limit;
    if overflowed {
        bytes.truncate(limit);
        overflow.notify_one();
    }
    StreamCapture { bytes, overflowed }
}
