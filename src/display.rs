//! Terminal output for both monitors.

use std::fmt::Display;
use std::io::{self, Write};
use std::time::Duration;

use crossterm::style::{Color, Stylize};

use crate::model::{CaptureTarget, DisplayMode, PacketTuple};
use crate::stats::{InterfaceSample, Snapshot};

const TABLE_WIDTH: usize = 120;

/// One packet line. Counter right-aligned in six columns, endpoints padded
/// to the mode's width.
pub fn format_line(count: u64, tuple: &PacketTuple, mode: DisplayMode) -> String {
    render_line(count, tuple, mode, &tuple.protocol)
}

fn render_line(count: u64, tuple: &PacketTuple, mode: DisplayMode, protocol: &dyn Display) -> String {
    let width = mode.endpoint_width();
    let (source, destination) = match mode {
        DisplayMode::Simple => (tuple.source_address.clone(), tuple.destination_address.clone()),
        DisplayMode::FiveTuple => (tuple.source_endpoint(), tuple.destination_endpoint()),
    };
    format!(
        "{:>6}  {:<width$} ---> {:<width$}  [{}]",
        count,
        source,
        destination,
        protocol,
        width = width
    )
}

fn protocol_color(protocol: &str) -> Color {
    match protocol {
        "TCP" => Color::Cyan,
        "UDP" => Color::Green,
        "ICMP" | "ICMPv6" => Color::Yellow,
        _ => Color::Grey,
    }
}

/// Renders the live packet feed and keeps the running count.
pub struct Presenter<W: Write> {
    out: W,
    mode: DisplayMode,
    count: u64,
    color: bool,
}

impl<W: Write> Presenter<W> {
    pub fn new(out: W, mode: DisplayMode) -> Self {
        Self {
            out,
            mode,
            count: 0,
            color: false,
        }
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Packets rendered so far.
    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn rule(&self, ch: char) -> String {
        ch.to_string().repeat(self.mode.rule_width())
    }

    fn notice(&self, text: &str, color: Color) -> String {
        if self.color {
            text.with(color).to_string()
        } else {
            text.to_string()
        }
    }

    pub fn banner(&mut self, target: &CaptureTarget) -> io::Result<()> {
        let width = self.mode.endpoint_width();
        let (source, destination) = match self.mode {
            DisplayMode::Simple => ("Source IP", "Destination IP"),
            DisplayMode::FiveTuple => ("Source", "Destination"),
        };

        writeln!(self.out, "\n{}", self.rule('='))?;
        writeln!(self.out, "Monitoring packets from: {}", target.source_address)?;
        writeln!(self.out, "Display mode: {}", self.mode.description())?;
        writeln!(self.out, "Interface: {}", target.interface)?;
        writeln!(self.out, "Press Ctrl-C to stop")?;
        writeln!(self.out, "{}", self.rule('='))?;
        writeln!(
            self.out,
            "{:>6}  {:<width$}      {:<width$}  Protocol",
            "#",
            source,
            destination,
            width = width
        )?;
        writeln!(self.out, "{}", self.rule('-'))?;
        self.out.flush()
    }

    pub fn debug_invocation(&mut self, filter: &str, command: &str) -> io::Result<()> {
        writeln!(self.out, "Debug: Display filter = {}", filter)?;
        writeln!(self.out, "Debug: Command = {}", command)?;
        self.out.flush()
    }

    /// Count and print one packet, flushed immediately.
    pub fn packet(&mut self, tuple: &PacketTuple) -> io::Result<()> {
        self.count += 1;
        let line = if self.color {
            let tag = tuple.protocol.as_str().with(protocol_color(&tuple.protocol));
            render_line(self.count, tuple, self.mode, &tag)
        } else {
            format_line(self.count, tuple, self.mode)
        };
        writeln!(self.out, "{}", line)?;
        self.out.flush()
    }

    /// End of stream. Says so explicitly when nothing was seen.
    pub fn finished(&mut self) -> io::Result<()> {
        if self.count == 0 {
            let notice = self.notice("⚠ No packets were captured", Color::Yellow);
            writeln!(self.out, "\n{}", self.rule('='))?;
            writeln!(self.out, "{}", notice)?;
            writeln!(self.out, "{}", self.rule('='))?;
        }
        self.out.flush()
    }

    pub fn interrupted(&mut self) -> io::Result<()> {
        let summary = format!("Stopped by user. Total packets captured: {}", self.count);
        let summary = self.notice(&summary, Color::Cyan);
        writeln!(self.out, "\n{}", self.rule('='))?;
        writeln!(self.out, "{}", summary)?;
        writeln!(self.out, "{}", self.rule('='))?;
        self.out.flush()
    }
}

/// 1024-based size with one decimal, e.g. `1.5KB`.
pub fn human_bytes(n: f64) -> String {
    let mut n = n;
    for unit in ["B", "KB", "MB", "GB", "TB"] {
        if n.abs() < 1024.0 {
            return format!("{:3.1}{}", n, unit);
        }
        n /= 1024.0;
    }
    format!("{:.1}PB", n)
}

/// Per-second rate with thousands grouping, e.g. `1,234.5/s`.
pub fn format_rate(delta: u64, interval: Duration) -> String {
    let secs = interval.as_secs_f64();
    if secs <= 0.0 {
        return "0/s".to_string();
    }
    format!("{}/s", group_thousands(delta as f64 / secs))
}

fn group_thousands(value: f64) -> String {
    let formatted = format!("{:.1}", value);
    let (whole, fraction) = formatted.split_once('.').unwrap_or((formatted.as_str(), "0"));
    let (sign, digits) = match whole.strip_prefix('-') {
        Some(digits) => ("-", digits),
        None => ("", whole),
    };

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{}{}.{}", sign, grouped, fraction)
}

/// Display columns for one sampled interface, in table order after the name.
pub fn sample_columns(row: &InterfaceSample, interval: Duration) -> [String; 10] {
    match row {
        InterfaceSample::Unavailable { .. } => std::array::from_fn(|_| "N/A".to_string()),
        InterfaceSample::Available { totals, delta, .. } => [
            totals.rx_packets.to_string(),
            format_rate(delta.rx_packets, interval),
            human_bytes(delta.rx_bytes as f64),
            format_rate(delta.rx_bytes, interval),
            human_bytes(totals.rx_bytes as f64),
            totals.tx_packets.to_string(),
            format_rate(delta.tx_packets, interval),
            human_bytes(delta.tx_bytes as f64),
            format_rate(delta.tx_bytes, interval),
            human_bytes(totals.tx_bytes as f64),
        ],
    }
}

pub const SAMPLE_HEADERS: [&str; 11] = [
    "Interface", "RX pkts", "r/s", "RX Δ", "rb/s", "RX B", "TX pkts", "t/s", "TX Δ", "tb/s", "TX B",
];

fn sample_row(name: &str, cells: &[String]) -> String {
    let widths = [10, 10, 12, 10, 12, 10, 10, 12, 10, 12];
    let mut line = format!("{:<20}", name);
    for (cell, width) in cells.iter().zip(widths) {
        line.push_str(&format!("{:>width$}", cell, width = width));
    }
    line
}

/// Plain-text table for one sampler snapshot.
pub fn render_snapshot(snapshot: &Snapshot) -> String {
    let mut lines = Vec::with_capacity(snapshot.rows.len() + 7);
    let headers: Vec<String> = SAMPLE_HEADERS[1..].iter().map(|h| h.to_string()).collect();

    lines.push(format!("\n{}", "=".repeat(TABLE_WIDTH)));
    lines.push(format!(
        "Time: {}   Sample: {}",
        snapshot.taken_at.format("%Y-%m-%d %H:%M:%S"),
        snapshot.sample
    ));
    lines.push("-".repeat(TABLE_WIDTH));
    lines.push(sample_row(SAMPLE_HEADERS[0], &headers));
    lines.push("-".repeat(TABLE_WIDTH));
    for row in &snapshot.rows {
        lines.push(sample_row(row.name(), &sample_columns(row, snapshot.interval)));
    }
    lines.push("=".repeat(TABLE_WIDTH));

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::Counters;
    use chrono::{Local, TimeZone};

    fn tuple(src: &str, sport: Option<&str>, dst: &str, dport: Option<&str>, proto: &str) -> PacketTuple {
        PacketTuple {
            source_address: src.into(),
            source_port: sport.map(Into::into),
            destination_address: dst.into(),
            destination_port: dport.map(Into::into),
            protocol: proto.into(),
        }
    }

    #[test]
    fn test_simple_line_layout() {
        let line = format_line(1, &tuple("10.0.0.1", None, "10.0.0.2", None, "TCP"), DisplayMode::Simple);
        assert_eq!(line, "     1  10.0.0.1        ---> 10.0.0.2         [TCP]");
    }

    #[test]
    fn test_five_tuple_line_layout() {
        let t = tuple("10.61.0.1", Some("43512"), "93.184.216.34", Some("443"), "TCP");
        let line = format_line(12, &t, DisplayMode::FiveTuple);
        assert_eq!(
            line,
            "    12  10.61.0.1:43512        ---> 93.184.216.34:443       [TCP]"
        );

        let icmp = tuple("10.61.0.1", None, "8.8.8.8", None, "ICMP");
        let line = format_line(3, &icmp, DisplayMode::FiveTuple);
        assert_eq!(
            line,
            "     3  10.61.0.1              ---> 8.8.8.8                 [ICMP]"
        );
    }

    #[test]
    fn test_presenter_counts_and_notices() {
        let mut presenter = Presenter::new(Vec::new(), DisplayMode::Simple);
        presenter.finished().unwrap();
        let out = String::from_utf8(presenter.into_inner()).unwrap();
        assert!(out.contains("No packets were captured"));

        let mut presenter = Presenter::new(Vec::new(), DisplayMode::Simple);
        let t = tuple("10.0.0.1", None, "10.0.0.2", None, "UDP");
        presenter.packet(&t).unwrap();
        presenter.packet(&t).unwrap();
        presenter.finished().unwrap();
        assert_eq!(presenter.count(), 2);
        let out = String::from_utf8(presenter.into_inner()).unwrap();
        assert!(!out.contains("No packets were captured"));
        assert!(out.starts_with("     1  "));
        assert!(out.contains("\n     2  "));
    }

    #[test]
    fn test_interrupt_summary() {
        let mut presenter = Presenter::new(Vec::new(), DisplayMode::FiveTuple);
        presenter.packet(&tuple("a", None, "b", None, "IP")).unwrap();
        presenter.interrupted().unwrap();
        let out = String::from_utf8(presenter.into_inner()).unwrap();
        assert!(out.contains("Stopped by user. Total packets captured: 1"));
        assert!(out.contains(&"=".repeat(100)));
    }

    #[test]
    fn test_banner() {
        let target = CaptureTarget::new("10.61.0.1".parse().unwrap(), "val0000000001", DisplayMode::Simple);
        let mut presenter = Presenter::new(Vec::new(), DisplayMode::Simple);
        presenter.banner(&target).unwrap();
        let out = String::from_utf8(presenter.into_inner()).unwrap();
        assert!(out.contains("Monitoring packets from: 10.61.0.1"));
        assert!(out.contains("Display mode: Simple (IP -> IP)"));
        assert!(out.contains("Interface: val0000000001"));
        assert!(out.contains("     #  Source IP            Destination IP   Protocol"));
    }

    #[test]
    fn test_colored_line_keeps_layout() {
        let mut presenter = Presenter::new(Vec::new(), DisplayMode::Simple).with_color(true);
        presenter.packet(&tuple("10.0.0.1", None, "10.0.0.2", None, "TCP")).unwrap();
        let out = String::from_utf8(presenter.into_inner()).unwrap();
        assert!(out.starts_with("     1  10.0.0.1        ---> 10.0.0.2         ["));
        assert!(out.contains("\u{1b}["));
    }

    #[test]
    fn test_human_bytes() {
        assert_eq!(human_bytes(0.0), "0.0B");
        assert_eq!(human_bytes(512.0), "512.0B");
        assert_eq!(human_bytes(1536.0), "1.5KB");
        assert_eq!(human_bytes(5.0 * 1024.0 * 1024.0), "5.0MB");
        assert_eq!(human_bytes(2.0 * 1024f64.powi(5)), "2.0PB");
    }

    #[test]
    fn test_format_rate() {
        assert_eq!(format_rate(10, Duration::from_secs(1)), "10.0/s");
        assert_eq!(format_rate(5, Duration::from_secs(2)), "2.5/s");
        assert_eq!(format_rate(1_234_567, Duration::from_secs(1)), "1,234,567.0/s");
        assert_eq!(format_rate(100, Duration::ZERO), "0/s");
    }

    #[test]
    fn test_render_snapshot() {
        let snapshot = Snapshot {
            sample: 3,
            taken_at: Local.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap(),
            interval: Duration::from_secs(1),
            rows: vec![
                InterfaceSample::Available {
                    name: "val0000000001".into(),
                    totals: Counters {
                        rx_packets: 100,
                        rx_bytes: 2048,
                        tx_packets: 50,
                        tx_bytes: 1024,
                    },
                    delta: Counters {
                        rx_packets: 10,
                        rx_bytes: 1024,
                        tx_packets: 5,
                        tx_bytes: 512,
                    },
                },
                InterfaceSample::Unavailable {
                    name: "val0000000002".into(),
                },
            ],
        };

        let table = render_snapshot(&snapshot);
        assert!(table.contains("Time: 2024-05-01 12:30:00   Sample: 3"));
        assert!(table.contains(
            "val0000000001              100    10.0/s       1.0KB 1,024.0/s       2.0KB        50     5.0/s      512.0B   512.0/s       1.0KB"
        ));
        let na_row = table.lines().find(|l| l.starts_with("val0000000002")).unwrap();
        assert_eq!(na_row.matches("N/A").count(), 10);
        assert!(table.lines().any(|l| l.starts_with("Interface") && l.contains("RX Δ")));
    }
}
