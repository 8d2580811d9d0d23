//! Throughput sampler
//!
//! Polls the kernel's per-interface counters and turns consecutive reads
//! into deltas. A missing counter file is "stats unavailable" for that
//! interface, never an error.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Local};

use crate::config::{STAT_RX_BYTES, STAT_RX_PACKETS, STAT_TX_BYTES, STAT_TX_PACKETS};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    pub rx_packets: u64,
    pub rx_bytes: u64,
    pub tx_packets: u64,
    pub tx_bytes: u64,
}

impl Counters {
    /// Change since `earlier`. A counter that went backwards (interface
    /// re-created) counts as zero.
    pub fn since(&self, earlier: &Counters) -> Counters {
        Counters {
            rx_packets: self.rx_packets.saturating_sub(earlier.rx_packets),
            rx_bytes: self.rx_bytes.saturating_sub(earlier.rx_bytes),
            tx_packets: self.tx_packets.saturating_sub(earlier.tx_packets),
            tx_bytes: self.tx_bytes.saturating_sub(earlier.tx_bytes),
        }
    }
}

pub trait CounterSource {
    fn has_interface(&self, name: &str) -> bool;

    fn read_stat(&self, name: &str, stat: &str) -> Option<u64>;

    /// All four counters, or `None` if any one is unreadable.
    fn read(&self, name: &str) -> Option<Counters> {
        Some(Counters {
            rx_packets: self.read_stat(name, STAT_RX_PACKETS)?,
            rx_bytes: self.read_stat(name, STAT_RX_BYTES)?,
            tx_packets: self.read_stat(name, STAT_TX_PACKETS)?,
            tx_bytes: self.read_stat(name, STAT_TX_BYTES)?,
        })
    }
}

/// `<root>/<iface>/statistics/<stat>` files.
#[derive(Debug, Clone)]
pub struct SysfsCounters {
    root: PathBuf,
}

impl SysfsCounters {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl CounterSource for SysfsCounters {
    fn has_interface(&self, name: &str) -> bool {
        self.root.join(name).exists()
    }

    fn read_stat(&self, name: &str, stat: &str) -> Option<u64> {
        let path = self.root.join(name).join("statistics").join(stat);
        fs::read_to_string(path).ok()?.trim().parse().ok()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterfaceSample {
    Unavailable {
        name: String,
    },
    Available {
        name: String,
        totals: Counters,
        delta: Counters,
    },
}

impl InterfaceSample {
    pub fn name(&self) -> &str {
        match self {
            InterfaceSample::Unavailable { name } | InterfaceSample::Available { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Snapshot {
    pub sample: u64,
    pub taken_at: DateTime<Local>,
    pub interval: Duration,
    pub rows: Vec<InterfaceSample>,
}

/// Keep only interfaces the kernel knows about.
pub fn monitored_interfaces(requested: Vec<String>, source: &impl CounterSource) -> Result<Vec<String>> {
    if requested.is_empty() {
        return Err(Error::NoInterfaces);
    }

    let (present, missing): (Vec<String>, Vec<String>) =
        requested.into_iter().partition(|name| source.has_interface(name));
    if !missing.is_empty() {
        tracing::warn!(?missing, "skipping interfaces without kernel statistics");
    }
    if present.is_empty() {
        return Err(Error::NoInterfaces);
    }
    Ok(present)
}

pub struct Sampler {
    interfaces: Vec<String>,
    interval: Duration,
    previous: HashMap<String, Counters>,
    samples: u64,
}

impl Sampler {
    pub fn new(interfaces: Vec<String>, interval: Duration) -> Self {
        Self {
            interfaces,
            interval,
            previous: HashMap::new(),
            samples: 0,
        }
    }

    pub fn interfaces(&self) -> &[String] {
        &self.interfaces
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn samples(&self) -> u64 {
        self.samples
    }

    /// Baseline read. Unreadable counters start at zero.
    pub fn prime(&mut self, source: &impl CounterSource) {
        for name in &self.interfaces {
            let baseline = Counters {
                rx_packets: source.read_stat(name, STAT_RX_PACKETS).unwrap_or(0),
                rx_bytes: source.read_stat(name, STAT_RX_BYTES).unwrap_or(0),
                tx_packets: source.read_stat(name, STAT_TX_PACKETS).unwrap_or(0),
                tx_bytes: source.read_stat(name, STAT_TX_BYTES).unwrap_or(0),
            };
            self.previous.insert(name.clone(), baseline);
        }
    }

    pub fn sample(&mut self, source: &impl CounterSource) -> Snapshot {
        self.samples += 1;
        let mut rows = Vec::with_capacity(self.interfaces.len());

        for name in &self.interfaces {
            let Some(current) = source.read(name) else {
                rows.push(InterfaceSample::Unavailable { name: name.clone() });
                continue;
            };
            let earlier = self.previous.get(name).copied().unwrap_or(current);
            rows.push(InterfaceSample::Available {
                name: name.clone(),
                totals: current,
                delta: current.since(&earlier),
            });
            self.previous.insert(name.clone(), current);
        }

        Snapshot {
            sample: self.samples,
            taken_at: Local::now(),
            interval: self.interval,
            rows,
        }
    }

    /// True once `limit` samples were taken; zero means never.
    pub fn done(&self, limit: u64) -> bool {
        limit > 0 && self.samples >= limit
    }
}
