use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser};

use crate::config::{DEFAULT_ENGINE, DEFAULT_IFACE_PREFIX, DEFAULT_SYSFS_NET};
use crate::logging::LogFormat;
use crate::model::DisplayMode;

const PACKET_MONITOR_EXAMPLES: &str = "\
Examples:
  # Interactive UE selection with simple format
  sudo ue-packet-monitor --select

  # Specify IP with 5-tuple details
  sudo ue-packet-monitor --src-ip 10.61.0.1 --5-tuple

  # Simple format capturing 100 packets
  sudo ue-packet-monitor --src-ip 10.61.0.1 --count 100

Note: requires tshark. Run with sudo if permission errors occur.";

const TRAFFIC_MONITOR_EXAMPLES: &str = "\
Examples:
  ue-traffic-monitor
  ue-traffic-monitor -i 2
  ue-traffic-monitor --interfaces val0000000001 val0000000002";

/// Host facilities shared by both tools.
#[derive(Args, Debug, Clone)]
pub struct HostArgs {
    /// Name prefix of UE interfaces
    #[arg(long, env = "UE_MONITOR_IFACE_PREFIX", default_value = DEFAULT_IFACE_PREFIX)]
    pub iface_prefix: String,

    /// Kernel network interface directory
    #[arg(long, env = "UE_MONITOR_SYSFS_NET", default_value = DEFAULT_SYSFS_NET)]
    pub sysfs_net: PathBuf,

    /// Log output format (logs go to stderr)
    #[arg(long, value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

#[derive(Parser, Debug)]
#[command(
    name = "ue-packet-monitor",
    version = env!("CARGO_PKG_VERSION"),
    about = "Monitor packet destinations from a specific UE by source IP",
    after_help = PACKET_MONITOR_EXAMPLES
)]
pub struct PacketMonitorCli {
    /// Source IP address to monitor
    #[arg(long = "src-ip", value_name = "IP")]
    pub src_ip: Option<IpAddr>,

    /// Select UE interactively
    #[arg(long)]
    pub select: bool,

    /// Show 5-tuple format (IP:Port)
    #[arg(long = "5-tuple", conflicts_with = "simple")]
    pub five_tuple: bool,

    /// Show simple format (IP only) [default]
    #[arg(long)]
    pub simple: bool,

    /// Capture interface (default: auto-detect from UE)
    #[arg(long, value_name = "IFACE")]
    pub interface: Option<String>,

    /// Stop after N packets
    #[arg(long, value_name = "N")]
    pub count: Option<u64>,

    /// Show debug information
    #[arg(long)]
    pub debug: bool,

    /// Capture engine executable
    #[arg(long, env = "UE_MONITOR_TSHARK", default_value = DEFAULT_ENGINE)]
    pub engine: String,

    #[command(flatten)]
    pub host: HostArgs,
}

impl PacketMonitorCli {
    pub fn mode(&self) -> DisplayMode {
        if self.five_tuple {
            DisplayMode::FiveTuple
        } else {
            DisplayMode::Simple
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "ue-traffic-monitor",
    version = env!("CARGO_PKG_VERSION"),
    about = "Monitor UE rx/tx packets and bytes per interface",
    after_help = TRAFFIC_MONITOR_EXAMPLES
)]
pub struct TrafficMonitorCli {
    /// Poll interval in seconds
    #[arg(short, long, default_value = "1", value_parser = parse_interval)]
    pub interval: Duration,

    /// Number of samples to show (0 = run until Ctrl-C)
    #[arg(short = 'n', long, default_value_t = 0)]
    pub count: u64,

    /// Interfaces to monitor (default: auto-detect by prefix)
    #[arg(long, num_args = 1..)]
    pub interfaces: Vec<String>,

    /// Full-screen live table instead of scrolling output
    #[arg(long)]
    pub dashboard: bool,

    #[command(flatten)]
    pub host: HostArgs,
}

fn parse_interval(s: &str) -> Result<Duration, String> {
    let secs: f64 = s.parse().map_err(|_| format!("`{}` is not a number", s))?;
    if secs <= 0.0 {
        return Err("interval must be greater than zero".to_string());
    }
    Duration::try_from_secs_f64(secs).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definitions() {
        PacketMonitorCli::command().debug_assert();
        TrafficMonitorCli::command().debug_assert();
    }

    #[test]
    fn test_packet_monitor_args() {
        let cli = PacketMonitorCli::try_parse_from([
            "ue-packet-monitor",
            "--src-ip",
            "10.61.0.1",
            "--5-tuple",
            "--count",
            "3",
        ])
        .unwrap();
        assert_eq!(cli.src_ip, Some("10.61.0.1".parse().unwrap()));
        assert_eq!(cli.mode(), DisplayMode::FiveTuple);
        assert_eq!(cli.count, Some(3));
        assert!(!cli.select);

        let cli = PacketMonitorCli::try_parse_from(["ue-packet-monitor", "--select"]).unwrap();
        assert_eq!(cli.mode(), DisplayMode::Simple);
        assert_eq!(cli.src_ip, None);
    }

    #[test]
    fn test_packet_monitor_rejects_bad_input() {
        assert!(PacketMonitorCli::try_parse_from(["ue-packet-monitor", "--src-ip", "nope"]).is_err());
        assert!(
            PacketMonitorCli::try_parse_from(["ue-packet-monitor", "--simple", "--5-tuple"]).is_err()
        );
    }

    #[test]
    fn test_traffic_monitor_args() {
        let cli = TrafficMonitorCli::try_parse_from([
            "ue-traffic-monitor",
            "-i",
            "0.5",
            "-n",
            "4",
            "--interfaces",
            "val01",
            "val02",
        ])
        .unwrap();
        assert_eq!(cli.interval, Duration::from_millis(500));
        assert_eq!(cli.count, 4);
        assert_eq!(cli.interfaces, ["val01", "val02"]);

        let cli = TrafficMonitorCli::try_parse_from(["ue-traffic-monitor"]).unwrap();
        assert_eq!(cli.interval, Duration::from_secs(1));
        assert!(cli.interfaces.is_empty());

        assert!(TrafficMonitorCli::try_parse_from(["ue-traffic-monitor", "-i", "0"]).is_err());
    }
}
