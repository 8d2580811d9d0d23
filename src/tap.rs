//! Packet tap run loop
//!
//! probe -> start -> pull records -> decode -> render, until the engine
//! exits or the operator cancels.

use std::future::Future;
use std::io::{self, Write};
use std::net::IpAddr;
use std::time::Duration;

use crate::config::{FALLBACK_INTERFACE, SHUTDOWN_GRACE};
use crate::decoder::decode;
use crate::display::Presenter;
use crate::error::{Error, Result};
use crate::model::{CaptureTarget, DisplayMode};
use crate::network::{interface_for_address, CaptureEngine, InterfaceSource, RecordStream};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The engine closed its output (count limit or exit).
    Completed { packets: u64 },
    /// The operator stopped the run.
    Interrupted { packets: u64 },
}

impl RunOutcome {
    pub fn packets(&self) -> u64 {
        match *self {
            RunOutcome::Completed { packets } | RunOutcome::Interrupted { packets } => packets,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TapOptions {
    /// Also print the display filter and engine invocation.
    pub debug: bool,
    pub grace: Duration,
}

impl Default for TapOptions {
    fn default() -> Self {
        Self {
            debug: false,
            grace: SHUTDOWN_GRACE,
        }
    }
}

/// How the capture interface for an explicit source address was chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterfaceChoice {
    Explicit(String),
    Matched(String),
    Fallback,
}

impl InterfaceChoice {
    pub fn name(&self) -> &str {
        match self {
            InterfaceChoice::Explicit(name) | InterfaceChoice::Matched(name) => name,
            InterfaceChoice::Fallback => FALLBACK_INTERFACE,
        }
    }
}

/// An explicit `--interface` wins; otherwise the UE interface carrying
/// `address`, otherwise the catch-all interface.
pub fn choose_interface(
    address: IpAddr,
    explicit: Option<String>,
    source: &impl InterfaceSource,
    prefix: &str,
) -> InterfaceChoice {
    if let Some(name) = explicit.filter(|name| !name.is_empty()) {
        return InterfaceChoice::Explicit(name);
    }
    match interface_for_address(source, prefix, address) {
        Some(iface) => InterfaceChoice::Matched(iface.name),
        None => {
            tracing::warn!(%address, "no local UE interface has this address");
            InterfaceChoice::Fallback
        }
    }
}

pub async fn ensure_engine(engine: &impl CaptureEngine) -> Result<()> {
    if engine.is_available().await {
        Ok(())
    } else {
        Err(Error::EngineMissing(engine.name().to_string()))
    }
}

/// Decode and render records until the stream ends or `cancel` fires.
/// Records that do not decode are skipped silently.
pub async fn stream_packets<S, W, C>(
    records: &mut S,
    presenter: &mut Presenter<W>,
    mode: DisplayMode,
    cancel: C,
) -> io::Result<RunOutcome>
where
    S: RecordStream,
    W: Write,
    C: Future<Output = ()>,
{
    tokio::pin!(cancel);
    loop {
        tokio::select! {
            biased;
            _ = &mut cancel => {
                return Ok(RunOutcome::Interrupted { packets: presenter.count() });
            }
            record = records.next_record() => match record? {
                Some(line) => {
                    if let Some(tuple) = decode(&line, mode) {
                        presenter.packet(&tuple)?;
                    }
                }
                None => return Ok(RunOutcome::Completed { packets: presenter.count() }),
            },
        }
    }
}

/// Probe, start, stream, and tear down one monitoring run.
pub async fn run_tap<E, W, C>(
    engine: &E,
    target: &CaptureTarget,
    presenter: &mut Presenter<W>,
    options: TapOptions,
    cancel: C,
) -> Result<RunOutcome>
where
    E: CaptureEngine,
    W: Write,
    C: Future<Output = ()>,
{
    tokio::pin!(cancel);

    // An interrupt during setup ends the run before the live capture starts.
    let probe = tokio::select! {
        biased;
        _ = &mut cancel => return stopped_before_start(presenter),
        probe = engine.probe(&target.interface) => probe,
    };
    if !probe.ok {
        return Err(Error::CaptureDenied {
            interface: target.interface.clone(),
            message: probe.message,
        });
    }

    presenter.banner(target)?;
    if options.debug {
        presenter.debug_invocation(&target.display_filter(), &engine.describe(target))?;
    }

    let mut records = tokio::select! {
        biased;
        _ = &mut cancel => return stopped_before_start(presenter),
        records = engine.start(target) => records?,
    };
    let outcome = match stream_packets(&mut records, presenter, target.mode, &mut cancel).await {
        Ok(outcome) => outcome,
        Err(e) => {
            if let Err(stop) = records.shutdown(options.grace).await {
                tracing::warn!(error = %stop, "capture shutdown after read error failed");
            }
            return Err(e.into());
        }
    };

    match outcome {
        RunOutcome::Completed { .. } => {
            let state = records.wait().await?;
            tracing::debug!(?state, "capture engine finished");
            presenter.finished()?;
        }
        RunOutcome::Interrupted { .. } => {
            presenter.interrupted()?;
            let state = records.shutdown(options.grace).await?;
            tracing::info!(?state, "capture stopped by user");
        }
    }
    Ok(outcome)
}

fn stopped_before_start<W: Write>(presenter: &mut Presenter<W>) -> Result<RunOutcome> {
    tracing::info!("interrupted before capture started");
    presenter.interrupted()?;
    Ok(RunOutcome::Interrupted { packets: 0 })
}
