//! Child process execution with a wall-clock limit.

use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::process::Command;

use dojo_core::error::EvaluationError;
use dojo_core::traits::EvaluationOutput;

/// Environment for the scoring script: plain output, no pager, no colours.
pub fn script_env() -> Vec<(&'static str, &'static str)> {
    vec![
        ("NO_COLOR", "1"),
        ("TERM", "dumb"),
        ("PAGER", "cat"),
        ("KUBECTL_EXTERNAL_DIFF", ""),
    ]
}

/// Run `cmd` to completion, capturing stdout and stderr.
///
/// If `timeout` passes first the child and everything it started are killed
/// and `TimedOut` is returned.
pub async fn run_captured(
    mut cmd: Command,
    timeout: Duration,
) -> Result<EvaluationOutput, EvaluationError> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    #[cfg(unix)]
    cmd.process_group(0);

    let start = Instant::now();
    let child = cmd
        .spawn()
        .map_err(|e| EvaluationError::Launch(e.to_string()))?;
    let pid = child.id();

    // Dropping the wait future on timeout drops the child, which kills it.
    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(result) => result.map_err(|e| EvaluationError::Launch(e.to_string()))?,
        Err(_) => {
            if let Some(pid) = pid {
                kill_group(pid);
            }
            tracing::warn!(timeout = ?timeout, "scoring script timed out");
            return Err(EvaluationError::TimedOut(timeout));
        }
    };

    let duration_ms = start.elapsed().as_millis() as u64;
    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

    tracing::debug!(
        exit_code = ?output.status.code(),
        duration_ms,
        stdout_bytes = stdout.len(),
        "scoring script exited"
    );

    Ok(EvaluationOutput {
        stdout,
        stderr,
        exit_code: output.status.code(),
        duration_ms,
    })
}

/// Kill the process group led by `pid` (the script and its children).
#[cfg(unix)]
fn kill_group(pid: u32) {
    let group = format!("-{pid}");
    let status = std::process::Command::new("kill")
        .args(["-KILL", "--", group.as_str()])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
    if let Err(e) = status {
        tracing::warn!("failed to kill process group {pid}: {e}");
    }
}

#[cfg(not(unix))]
fn kill_group(_pid: u32) {}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str) -> Command {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(script);
        cmd
    }

    #[tokio::test]
    async fn captures_both_streams() {
        let out = run_captured(sh("echo out; echo err >&2"), Duration::from_secs(10))
            .await
            .unwrap();
        assert_eq!(out.stdout, "out\n");
        assert_eq!(out.stderr, "err\n");
        assert!(out.exited_cleanly());
    }

    #[tokio::test]
    async fn reports_exit_code() {
        let out = run_captured(sh("exit 3"), Duration::from_secs(10))
            .await
            .unwrap();
        assert_eq!(out.exit_code, Some(3));
        assert!(!out.exited_cleanly());
    }

    #[tokio::test]
    async fn times_out() {
        let err = run_captured(sh("sleep 5"), Duration::from_millis(200))
            .await
            .unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(err.to_string(), "Scoring script timed out after 200ms");
    }

    /// Alive and not a zombie awaiting its reaper.
    #[cfg(target_os = "linux")]
    fn is_running(pid: &str) -> bool {
        match std::fs::read_to_string(format!("/proc/{pid}/stat")) {
            Ok(stat) => stat
                .rsplit_once(") ")
                .is_some_and(|(_, rest)| !rest.starts_with('Z')),
            Err(_) => false,
        }
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn timeout_kills_grandchildren() {
        let dir = tempfile::tempdir().unwrap();
        let pid_file = dir.path().join("sleep.pid");
        let script = format!("sleep 30 & echo $! > {}; wait", pid_file.display());

        let err = run_captured(sh(&script), Duration::from_millis(500))
            .await
            .unwrap_err();
        assert!(err.is_timeout());

        let pid = std::fs::read_to_string(&pid_file).unwrap();
        let pid = pid.trim();
        for _ in 0..20 {
            if !is_running(pid) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        panic!("background sleep {pid} outlived the timeout");
    }

    #[tokio::test]
    async fn launch_failure() {
        let cmd = Command::new("/definitely/not/a/binary");
        let err = run_captured(cmd, Duration::from_secs(1)).await.unwrap_err();
        assert!(matches!(err, EvaluationError::Launch(_)));
    }
}
