use std::time::Duration;

pub const DEFAULT_ENGINE: &str = "tshark";
pub const DEFAULT_IFACE_PREFIX: &str = "val";
pub const DEFAULT_SYSFS_NET: &str = "/sys/class/net";

/// Interface used when a source address has no local UE interface.
pub const FALLBACK_INTERFACE: &str = "any";

/// Never appears in an address or a port.
pub const FIELD_SEPARATOR: char = '|';

pub const VERSION_CHECK_TIMEOUT: Duration = Duration::from_secs(2);
pub const PROBE_CAPTURE_SECS: u64 = 1;
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(4);
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

pub const STAT_RX_PACKETS: &str = "rx_packets";
pub const STAT_RX_BYTES: &str = "rx_bytes";
pub const STAT_TX_PACKETS: &str = "tx_packets";
pub const STAT_TX_BYTES: &str = "tx_bytes";
