// src/exec/task_runner.rs

//! Child process runner for `cmd` task bodies.

use std::collections::VecDeque;
use std::path::Path;
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Number of trailing stderr lines kept for diagnostics.
const STDERR_TAIL: usize = 20;

/// How a command ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
    pub success: bool,
    /// `None` when the process was killed by a signal or by the timeout.
    pub exit_code: Option<i32>,
    pub timed_out: bool,
    /// Last lines written to stderr.
    pub stderr_tail: Vec<String>,
}

/// Build a shell command appropriate for the platform.
fn shell(cmd: &str) -> Command {
    if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(cmd);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(cmd);
        c
    }
}

/// Kills the whole process group of a spawned shell when armed.
///
/// `kill_on_drop` only reaches the shell itself; anything it forked keeps
/// running unless the group goes down with it.
struct GroupKill {
    pgid: Option<u32>,
}

impl GroupKill {
    fn new(pgid: Option<u32>) -> Self {
        Self { pgid }
    }

    /// The shell exited on its own; leave the group alone.
    fn disarm(&mut self) {
        self.pgid = None;
    }

    fn kill(&mut self) {
        if let Some(pgid) = self.pgid.take() {
            kill_group(pgid);
        }
    }
}

impl Drop for GroupKill {
    fn drop(&mut self) {
        self.kill();
    }
}

#[cfg(unix)]
fn kill_group(pgid: u32) {
    // The shell was spawned with process_group(0), so its pid is the pgid.
    let rc = unsafe { libc::kill(-(pgid as libc::pid_t), libc::SIGKILL) };
    if rc != 0 {
        debug!(pgid, error = %std::io::Error::last_os_error(), "process group already gone");
    }
}

#[cfg(not(unix))]
fn kill_group(_pgid: u32) {}

/// Run `cmd` through the shell in `cwd`, killing it after `timeout`.
///
/// On unix the shell leads its own process group, and a timeout (or
/// dropping the returned future) kills every process in it. Stdout lines
/// are logged at info, stderr lines at warn. Errors are only returned when
/// the process cannot be spawned or waited on.
pub async fn run_command(task: &str, cmd: &str, cwd: &Path, timeout: Duration) -> Result<CommandOutcome> {
    info!(task = %task, cmd = %cmd, "starting task process");

    let mut command = shell(cmd);
    command
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.as_std_mut().process_group(0);
    }

    let mut child = command
        .spawn()
        .with_context(|| format!("spawning process for task '{task}'"))?;
    let mut group = GroupKill::new(child.id());

    let mut readers = Vec::new();

    if let Some(stdout) = child.stdout.take() {
        let task = task.to_string();
        readers.push(tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                info!(task = %task, "{}", line);
            }
        }));
    }

    let tail = Arc::new(Mutex::new(VecDeque::with_capacity(STDERR_TAIL)));
    if let Some(stderr) = child.stderr.take() {
        let task = task.to_string();
        let tail = Arc::clone(&tail);
        readers.push(tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                warn!(task = %task, "{}", line);
                let mut tail = tail.lock().unwrap_or_else(|e| e.into_inner());
                if tail.len() == STDERR_TAIL {
                    tail.pop_front();
                }
                tail.push_back(line);
            }
        }));
    }

    let (status, timed_out) = tokio::select! {
        status = child.wait() => {
            let status = status.with_context(|| format!("waiting for process of task '{task}'"))?;
            group.disarm();
            (Some(status), false)
        }
        _ = tokio::time::sleep(timeout) => {
            warn!(task = %task, ?timeout, "task timed out; killing process group");
            group.kill();
            if let Err(e) = child.kill().await {
                warn!(task = %task, error = %e, "failed to kill timed-out process");
            }
            (None, true)
        }
    };

    // Let the readers drain what the process wrote before it exited. A
    // grandchild holding the pipes open must not block us past the timeout.
    for reader in readers {
        if timed_out {
            reader.abort();
        } else if tokio::time::timeout(Duration::from_secs(1), reader).await.is_err() {
            debug!(task = %task, "output reader still busy after exit; detaching");
        }
    }

    let exit_code = status.and_then(|s| s.code());
    let success = status.is_some_and(|s| s.success());
    let stderr_tail = tail
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .iter()
        .cloned()
        .collect();

    info!(task = %task, exit_code = ?exit_code, success, timed_out, "task process exited");

    Ok(CommandOutcome {
        success,
        exit_code,
        timed_out,
        stderr_tail,
    })
}
