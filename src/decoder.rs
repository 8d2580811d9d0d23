//! Record decoder
//!
//! Turns one separator-delimited engine record into a [`PacketTuple`].
//! Every logical value has an IPv4 field and an IPv6 (or TCP and UDP)
//! field; the first non-empty one wins.

use crate::config::FIELD_SEPARATOR;
use crate::model::{DisplayMode, PacketTuple};

/// Positions of each field pair within a record.
struct Layout {
    source: (usize, usize),
    source_port: Option<(usize, usize)>,
    destination: (usize, usize),
    destination_port: Option<(usize, usize)>,
    protocol: (usize, usize),
    /// Records shorter than this carry no destination and are dropped.
    min_fields: usize,
}

const SIMPLE: Layout = Layout {
    source: (0, 1),
    source_port: None,
    destination: (2, 3),
    destination_port: None,
    protocol: (4, 5),
    min_fields: 4,
};

const FIVE_TUPLE: Layout = Layout {
    source: (0, 1),
    source_port: Some((2, 3)),
    destination: (4, 5),
    destination_port: Some((6, 7)),
    protocol: (8, 9),
    min_fields: 8,
};

fn layout(mode: DisplayMode) -> &'static Layout {
    match mode {
        DisplayMode::Simple => &SIMPLE,
        DisplayMode::FiveTuple => &FIVE_TUPLE,
    }
}

/// Decode one raw record. Returns `None` for blank, short or address-less
/// records; those are background noise, not errors.
pub fn decode(line: &str, mode: DisplayMode) -> Option<PacketTuple> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let parts: Vec<&str> = line.split(FIELD_SEPARATOR).collect();
    let layout = layout(mode);
    if parts.len() < layout.min_fields {
        tracing::trace!(fields = parts.len(), "short record dropped");
        return None;
    }

    let source = resolve(&parts, layout.source)?;
    let destination = resolve(&parts, layout.destination)?;
    let protocol = resolve(&parts, layout.protocol).unwrap_or("");

    Some(PacketTuple {
        source_address: source.to_string(),
        source_port: layout
            .source_port
            .and_then(|pair| resolve(&parts, pair))
            .map(str::to_string),
        destination_address: destination.to_string(),
        destination_port: layout
            .destination_port
            .and_then(|pair| resolve(&parts, pair))
            .map(str::to_string),
        protocol: map_protocol(protocol),
    })
}

fn resolve<'a>(parts: &[&'a str], (primary, fallback): (usize, usize)) -> Option<&'a str> {
    [primary, fallback]
        .into_iter()
        .filter_map(|i| parts.get(i).copied())
        .find(|value| !value.is_empty())
}

/// Map an IP protocol number to its mnemonic.
pub fn map_protocol(number: &str) -> String {
    match number {
        "1" => "ICMP".to_string(),
        "6" => "TCP".to_string(),
        "17" => "UDP".to_string(),
        "58" => "ICMPv6".to_string(),
        "" => "IP".to_string(),
        other => other.to_string(),
    }
}
