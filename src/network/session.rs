//! Live capture session
//!
//! Owns the engine subprocess for one run. Stdout is read on demand, one
//! record per line; stderr is discarded because the probe already looked
//! at it and it would corrupt the live display.

use std::io;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use tokio::io::{AsyncBufReadExt, BufReader, Split};
use tokio::process::{Child, ChildStdout, Command};
use tokio::time::timeout;

use super::RecordStream;

/// Where a supervised process is in its shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Running,
    Terminating,
    Exited(ExitStatus),
    Killed,
}

/// The process operations shutdown needs.
#[allow(async_fn_in_trait)]
pub trait ChildControl {
    /// Ask the process to exit (SIGTERM).
    fn request_stop(&mut self) -> io::Result<()>;

    /// Force the process down (SIGKILL).
    fn force_kill(&mut self) -> io::Result<()>;

    async fn reap(&mut self) -> io::Result<ExitStatus>;
}

/// Process group led by `child`, or `None` once it was reaped.
fn group_of(child: &Child) -> io::Result<Option<Pid>> {
    let Some(pid) = child.id() else {
        return Ok(None);
    };
    let pid = i32::try_from(pid).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    Ok(Some(Pid::from_raw(pid)))
}

// The engine leads its own process group (see `CaptureSession::spawn`), so
// signals go to the whole group and reach helpers such as dumpcap.
impl ChildControl for Child {
    fn request_stop(&mut self) -> io::Result<()> {
        if let Some(group) = group_of(self)? {
            signal::killpg(group, Signal::SIGTERM)?;
        }
        Ok(())
    }

    fn force_kill(&mut self) -> io::Result<()> {
        if let Some(group) = group_of(self)? {
            if let Err(e) = signal::killpg(group, Signal::SIGKILL) {
                tracing::debug!(error = %e, "process group kill failed");
            }
        }
        self.start_kill()
    }

    async fn reap(&mut self) -> io::Result<ExitStatus> {
        self.wait().await
    }
}

/// Running -> Terminating -> Exited | Killed.
pub async fn shutdown<P: ChildControl>(child: &mut P, grace: Duration) -> io::Result<Lifecycle> {
    let mut state = Lifecycle::Running;
    loop {
        state = match state {
            Lifecycle::Running => {
                if let Err(e) = child.request_stop() {
                    tracing::warn!(error = %e, "terminate request failed");
                }
                Lifecycle::Terminating
            }
            Lifecycle::Terminating => match timeout(grace, child.reap()).await {
                Ok(status) => Lifecycle::Exited(status?),
                Err(_) => {
                    tracing::warn!(?grace, "capture engine ignored terminate, killing");
                    child.force_kill()?;
                    child.reap().await?;
                    Lifecycle::Killed
                }
            },
            done => return Ok(done),
        };
        tracing::debug!(?state, "capture shutdown");
    }
}

pub struct CaptureSession {
    child: Child,
    records: Split<BufReader<ChildStdout>>,
}

impl CaptureSession {
    /// Spawn `command` with piped stdout and discarded stderr.
    pub fn spawn(mut command: Command) -> io::Result<Self> {
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        // Own process group: a terminal Ctrl-C reaches only us, and shutdown
        // signals the whole group.
        #[cfg(unix)]
        command.process_group(0);

        let mut child = command.spawn()?;
        let stdout = child.stdout.take().ok_or_else(|| {
            io::Error::new(io::ErrorKind::BrokenPipe, "capture engine stdout unavailable")
        })?;

        tracing::debug!(pid = child.id(), "capture engine running");
        Ok(Self {
            child,
            records: BufReader::new(stdout).split(b'\n'),
        })
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        // kill_on_drop only reaches the leader.
        if let Ok(Some(group)) = group_of(&self.child) {
            let _ = signal::killpg(group, Signal::SIGKILL);
        }
    }
}

impl RecordStream for CaptureSession {
    async fn next_record(&mut self) -> io::Result<Option<String>> {
        let segment = self.records.next_segment().await?;
        Ok(segment.map(|bytes| String::from_utf8_lossy(&bytes).into_owned()))
    }

    async fn shutdown(&mut self, grace: Duration) -> io::Result<Lifecycle> {
        shutdown(&mut self.child, grace).await
    }

    async fn wait(&mut self) -> io::Result<Lifecycle> {
        Ok(Lifecycle::Exited(self.child.wait().await?))
    }
}
