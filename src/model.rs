// src/model.rs
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};

/// A host network interface, as seen by discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interface {
    pub name: String,
    pub ipv4: Option<Ipv4Addr>,
}

impl Interface {
    pub fn new(name: impl Into<String>, ipv4: Option<Ipv4Addr>) -> Self {
        Self {
            name: name.into(),
            ipv4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayMode {
    #[default]
    Simple,
    FiveTuple,
}

impl DisplayMode {
    /// Fields requested from the capture engine, in record order.
    pub fn fields(self) -> &'static [&'static str] {
        match self {
            DisplayMode::Simple => &[
                "ip.src", "ipv6.src", "ip.dst", "ipv6.dst", "ip.proto", "ipv6.nxt",
            ],
            DisplayMode::FiveTuple => &[
                "ip.src",
                "ipv6.src",
                "tcp.srcport",
                "udp.srcport",
                "ip.dst",
                "ipv6.dst",
                "tcp.dstport",
                "udp.dstport",
                "ip.proto",
                "ipv6.nxt",
            ],
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            DisplayMode::Simple => "Simple (IP -> IP)",
            DisplayMode::FiveTuple => "5-tuple (IP:Port -> IP:Port, Protocol)",
        }
    }

    /// Column width of an endpoint in a rendered line.
    pub fn endpoint_width(self) -> usize {
        match self {
            DisplayMode::Simple => 15,
            DisplayMode::FiveTuple => 22,
        }
    }

    pub fn rule_width(self) -> usize {
        match self {
            DisplayMode::Simple => 80,
            DisplayMode::FiveTuple => 100,
        }
    }
}

/// Everything one monitoring run needs; fixed for the run's lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureTarget {
    pub source_address: IpAddr,
    pub interface: String,
    pub mode: DisplayMode,
    pub limit: Option<u64>,
}

impl CaptureTarget {
    pub fn new(source_address: IpAddr, interface: impl Into<String>, mode: DisplayMode) -> Self {
        Self {
            source_address,
            interface: interface.into(),
            mode,
            limit: None,
        }
    }

    /// A limit of zero means unbounded.
    pub fn with_limit(mut self, limit: Option<u64>) -> Self {
        self.limit = limit.filter(|&n| n > 0);
        self
    }

    pub fn display_filter(&self) -> String {
        match self.source_address {
            IpAddr::V4(addr) => format!("ip.src == {}", addr),
            IpAddr::V6(addr) => format!("ipv6.src == {}", addr),
        }
    }
}

/// One decoded packet. Addresses are never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketTuple {
    pub source_address: String,
    pub source_port: Option<String>,
    pub destination_address: String,
    pub destination_port: Option<String>,
    pub protocol: String,
}

impl PacketTuple {
    pub fn source_endpoint(&self) -> String {
        endpoint(&self.source_address, self.source_port.as_deref())
    }

    pub fn destination_endpoint(&self) -> String {
        endpoint(&self.destination_address, self.destination_port.as_deref())
    }
}

fn endpoint(address: &str, port: Option<&str>) -> String {
    match port {
        Some(port) => format!("{}:{}", address, port),
        None => address.to_string(),
    }
}

impl fmt::Display for PacketTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ---> {} [{}]",
            self.source_endpoint(),
            self.destination_endpoint(),
            self.protocol
        )
    }
}
