//! UE interface discovery

use std::fs;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use pnet::datalink;

use crate::model::Interface;

/// Where interface names and addresses come from.
pub trait InterfaceSource {
    fn interface_names(&self) -> Vec<String>;

    fn ipv4_address(&self, name: &str) -> Option<Ipv4Addr>;
}

/// The running host: names from the kernel's interface directory,
/// addresses from the OS interface table.
#[derive(Debug, Clone)]
pub struct HostInterfaces {
    sysfs_root: PathBuf,
}

impl HostInterfaces {
    pub fn new(sysfs_root: impl Into<PathBuf>) -> Self {
        Self {
            sysfs_root: sysfs_root.into(),
        }
    }
}

impl InterfaceSource for HostInterfaces {
    fn interface_names(&self) -> Vec<String> {
        match fs::read_dir(&self.sysfs_root) {
            Ok(entries) => entries
                .filter_map(|entry| entry.ok())
                .filter_map(|entry| entry.file_name().into_string().ok())
                .collect(),
            Err(e) => {
                tracing::debug!(path = %self.sysfs_root.display(), error = %e, "cannot list interfaces");
                Vec::new()
            }
        }
    }

    fn ipv4_address(&self, name: &str) -> Option<Ipv4Addr> {
        datalink::interfaces()
            .into_iter()
            .find(|iface| iface.name == name)?
            .ips
            .iter()
            .find_map(|network| match network.ip() {
                IpAddr::V4(addr) => Some(addr),
                IpAddr::V6(_) => None,
            })
    }
}

/// A fixed interface table.
#[derive(Debug, Clone, Default)]
pub struct StaticInterfaces(pub Vec<Interface>);

impl InterfaceSource for StaticInterfaces {
    fn interface_names(&self) -> Vec<String> {
        self.0.iter().map(|iface| iface.name.clone()).collect()
    }

    fn ipv4_address(&self, name: &str) -> Option<Ipv4Addr> {
        self.0.iter().find(|iface| iface.name == name)?.ipv4
    }
}

/// Names starting with `prefix`, sorted and deduplicated.
pub fn candidate_names(source: &impl InterfaceSource, prefix: &str) -> Vec<String> {
    let mut names: Vec<String> = source
        .interface_names()
        .into_iter()
        .filter(|name| name.starts_with(prefix))
        .collect();
    names.sort();
    names.dedup();
    names
}

/// Interfaces named with `prefix`, sorted by name, with their IPv4 address
/// when one is assigned.
pub fn candidate_interfaces(source: &impl InterfaceSource, prefix: &str) -> Vec<Interface> {
    candidate_names(source, prefix)
        .into_iter()
        .map(|name| {
            let ipv4 = source.ipv4_address(&name);
            Interface { name, ipv4 }
        })
        .collect()
}

/// Candidates that have an address, i.e. usable capture targets.
pub fn active_interfaces(source: &impl InterfaceSource, prefix: &str) -> Vec<Interface> {
    let active: Vec<Interface> = candidate_interfaces(source, prefix)
        .into_iter()
        .filter(|iface| iface.ipv4.is_some())
        .collect();
    tracing::debug!(count = active.len(), prefix, "active UE interfaces");
    active
}

/// The active interface carrying `address`, if any.
pub fn interface_for_address(
    source: &impl InterfaceSource,
    prefix: &str,
    address: IpAddr,
) -> Option<Interface> {
    active_interfaces(source, prefix)
        .into_iter()
        .find(|iface| iface.ipv4.map(IpAddr::V4) == Some(address))
}
