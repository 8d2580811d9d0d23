//! Capture engine plumbing
//!
//! The packet capture engine is an external process. [`CaptureEngine`]
//! is the narrow seam the tap drives: check it exists, probe an
//! interface, then start a live run that yields raw text records.

pub mod discovery;
pub mod probe;
pub mod session;

use std::io;
use std::time::Duration;

use tokio::process::Command;

use crate::config::{FIELD_SEPARATOR, PROBE_CAPTURE_SECS, PROBE_TIMEOUT, VERSION_CHECK_TIMEOUT};
use crate::model::CaptureTarget;

pub use discovery::{
    active_interfaces, candidate_interfaces, candidate_names, interface_for_address, HostInterfaces,
    InterfaceSource, StaticInterfaces,
};
pub use probe::{classify, ProbeOutcome, ProbeRun};
pub use session::{shutdown, CaptureSession, ChildControl, Lifecycle};

/// Pull-based stream of raw records from a running capture.
#[allow(async_fn_in_trait)]
pub trait RecordStream {
    /// Next record, or `None` once the engine closed its output.
    async fn next_record(&mut self) -> io::Result<Option<String>>;

    /// Two-phase stop: terminate, wait up to `grace`, then kill.
    async fn shutdown(&mut self, grace: Duration) -> io::Result<Lifecycle>;

    /// Reap an engine that ended on its own.
    async fn wait(&mut self) -> io::Result<Lifecycle>;
}

#[allow(async_fn_in_trait)]
pub trait CaptureEngine {
    type Records: RecordStream;

    fn name(&self) -> &str;

    /// Human-readable invocation for a live run.
    fn describe(&self, target: &CaptureTarget) -> String;

    async fn is_available(&self) -> bool;

    async fn probe(&self, interface: &str) -> ProbeOutcome;

    async fn start(&self, target: &CaptureTarget) -> io::Result<Self::Records>;
}

/// tshark, driven through its field-extraction output.
#[derive(Debug, Clone)]
pub struct Tshark {
    program: String,
}

impl Tshark {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// One packet or one second, whichever comes first.
    pub fn probe_args(interface: &str) -> Vec<String> {
        let duration = format!("duration:{}", PROBE_CAPTURE_SECS);
        [
            "-i", interface, "-a", duration.as_str(), "-c", "1", "-n", "-T", "fields", "-e", "ip.src",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    pub fn live_args(target: &CaptureTarget) -> Vec<String> {
        let mut args = vec![
            "-i".to_string(),
            target.interface.clone(),
            "-Y".to_string(),
            target.display_filter(),
            "-n".to_string(),
            "-l".to_string(),
            "-T".to_string(),
            "fields".to_string(),
        ];

        for field in target.mode.fields() {
            args.push("-e".to_string());
            args.push(field.to_string());
        }

        args.push("-E".to_string());
        args.push(format!("separator={}", FIELD_SEPARATOR));
        args.push("-E".to_string());
        args.push("occurrence=f".to_string());

        if let Some(limit) = target.limit {
            args.push("-c".to_string());
            args.push(limit.to_string());
        }

        args
    }
}

impl Default for Tshark {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_ENGINE)
    }
}

impl CaptureEngine for Tshark {
    type Records = CaptureSession;

    fn name(&self) -> &str {
        &self.program
    }

    fn describe(&self, target: &CaptureTarget) -> String {
        let mut parts = vec![self.program.clone()];
        parts.extend(Self::live_args(target));
        parts.join(" ")
    }

    async fn is_available(&self) -> bool {
        probe::engine_responds(&self.program, VERSION_CHECK_TIMEOUT).await
    }

    async fn probe(&self, interface: &str) -> ProbeOutcome {
        let run = probe::run_probe(&self.program, &Self::probe_args(interface), PROBE_TIMEOUT).await;
        let outcome = classify(run, &self.program);
        tracing::debug!(interface, ok = outcome.ok, "permission probe finished");
        outcome
    }

    async fn start(&self, target: &CaptureTarget) -> io::Result<CaptureSession> {
        let mut command = Command::new(&self.program);
        command.args(Self::live_args(target));
        tracing::info!(interface = %target.interface, filter = %target.display_filter(), "starting capture");
        CaptureSession::spawn(command)
    }
}
