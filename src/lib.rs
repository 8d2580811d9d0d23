//! UE traffic monitors
//!
//! Two tools for emulated-UE test hosts:
//!
//! - a packet tap that follows one UE's source address through an
//!   external capture engine and prints each packet's addressing tuple
//! - a throughput sampler over the kernel's per-interface counters

pub mod cli;
pub mod config;
pub mod dashboard;
pub mod decoder;
pub mod display;
pub mod error;
pub mod interrupt;
pub mod logging;
pub mod model;
pub mod network;
pub mod select;
pub mod stats;
pub mod tap;

pub use error::{Error, Result};
pub use model::{CaptureTarget, DisplayMode, Interface, PacketTuple};
