//! External command execution with a deadline.
//!
//! Privileged hardware queries (dmidecode, lshw, PowerShell) can hang. A
//! command that overruns its timeout is killed and reaped before the call
//! returns, so repeated polls never pile up stray processes.

use crate::{Error, Result};
use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::debug;

/// How often a running child is checked for exit.
const WAIT_STEP: Duration = Duration::from_millis(10);

/// Runs `cmd` with `args` and returns its stdout.
///
/// Fails with [`Error::CommandTimeout`] once `timeout` elapses; the child is
/// killed at that point.
pub fn run_with_timeout(cmd: &str, args: &[&str], timeout: Duration) -> Result<String> {
    let failed = |reason: String| Error::CommandFailed {
        command: cmd.to_string(),
        reason,
    };

    let mut child = Command::new(cmd)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| failed(e.to_string()))?;

    // Pipes are drained concurrently so a chatty child cannot stall on a full buffer.
    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    let deadline = Instant::now() + timeout;
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {
                let now = Instant::now();
                if now >= deadline {
                    debug!("{} still running after {:?}, killing it", cmd, timeout);
                    reap(&mut child);
                    return Err(Error::CommandTimeout {
                        command: cmd.to_string(),
                        timeout,
                    });
                }
                thread::sleep(WAIT_STEP.min(deadline - now));
            }
            Err(e) => {
                reap(&mut child);
                return Err(failed(e.to_string()));
            }
        }
    };

    let out = collect(stdout);
    if status.success() {
        Ok(out)
    } else {
        Err(failed(format!("{}: {}", status, collect(stderr).trim())))
    }
}

fn reap(child: &mut Child) {
    if let Err(e) = child.kill() {
        debug!("Failed to kill pid {}: {}", child.id(), e);
    }
    let _ = child.wait();
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<String>> {
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            String::from_utf8_lossy(&buf).into_owned()
        })
    })
}

fn collect(reader: Option<JoinHandle<String>>) -> String {
    reader
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default()
}
