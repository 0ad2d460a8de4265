//! Subprocess runner with a wall-clock timeout

use super::ArtifactError;
use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Captured output of a finished tool
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
    /// Exit code, `None` when killed by a signal
    pub status: Option<i32>,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }
}

/// Run `cmd` and wait at most `timeout` for it to finish.
///
/// A zero timeout waits forever. Output pipes are drained on their own
/// threads so a chatty process cannot block on a full pipe while we poll.
pub fn run_tool(cmd: &[&str], timeout: Duration) -> Result<ToolOutput, ArtifactError> {
    let Some((program, args)) = cmd.split_first() else {
        return Err(ArtifactError::ToolFailed {
            tool: String::new(),
            message: "empty command".to_string(),
        });
    };

    debug!("Running {} {:?}", program, args);

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ArtifactError::ToolMissing {
                    tool: program.to_string(),
                }
            } else {
                ArtifactError::ToolFailed {
                    tool: program.to_string(),
                    message: e.to_string(),
                }
            }
        })?;

    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    let status = wait(&mut child, program, timeout)?;

    Ok(ToolOutput {
        stdout: stdout.join().unwrap_or_default(),
        stderr: stderr.join().unwrap_or_default(),
        status,
    })
}

fn drain(pipe: Option<impl Read + Send + 'static>) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}

fn wait(child: &mut Child, program: &str, timeout: Duration) -> Result<Option<i32>, ArtifactError> {
    if timeout.is_zero() {
        return child
            .wait()
            .map(|s| s.code())
            .map_err(|e| ArtifactError::ToolFailed {
                tool: program.to_string(),
                message: e.to_string(),
            });
    }

    let start = Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(status.code()),
            Ok(None) => {
                if start.elapsed() > timeout {
                    let _ = child.kill();
                    let _ = child.wait();
                    warn!("{} timed out after {}s", program, timeout.as_secs());
                    return Err(ArtifactError::Timeout {
                        tool: program.to_string(),
                        secs: timeout.as_secs(),
                    });
                }
                thread::sleep(Duration::from_millis(20));
            }
            Err(e) => {
                return Err(ArtifactError::ToolFailed {
                    tool: program.to_string(),
                    message: e.to_string(),
                })
            }
        }
    }
}
