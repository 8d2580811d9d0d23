use std::fs;
use std::path::Path;
use std::time::Duration;

use ue_monitor::display::render_snapshot;
use ue_monitor::network::{candidate_names, HostInterfaces};
use ue_monitor::stats::{monitored_interfaces, Sampler, SysfsCounters};

fn write_stats(root: &Path, iface: &str, rx_packets: u64, rx_bytes: u64, tx_packets: u64, tx_bytes: u64) {
    let dir = root.join(iface).join("statistics");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("rx_packets"), rx_packets.to_string()).unwrap();
    fs::write(dir.join("rx_bytes"), rx_bytes.to_string()).unwrap();
    fs::write(dir.join("tx_packets"), tx_packets.to_string()).unwrap();
    fs::write(dir.join("tx_bytes"), tx_bytes.to_string()).unwrap();
}

#[test]
fn test_discovered_interfaces_are_sampled() {
    let root = tempfile::tempdir().unwrap();
    write_stats(root.path(), "val0000000002", 0, 0, 0, 0);
    write_stats(root.path(), "val0000000001", 90, 2048, 40, 512);
    fs::create_dir(root.path().join("eth0")).unwrap();

    let names = candidate_names(&HostInterfaces::new(root.path()), "val");
    assert_eq!(names, ["val0000000001", "val0000000002"]);

    let counters = SysfsCounters::new(root.path());
    let interfaces = monitored_interfaces(names, &counters).unwrap();
    let mut sampler = Sampler::new(interfaces, Duration::from_secs(2));
    sampler.prime(&counters);

    write_stats(root.path(), "val0000000001", 100, 4096, 50, 1536);
    fs::remove_file(root.path().join("val0000000002/statistics/rx_bytes")).unwrap();

    let snapshot = sampler.sample(&counters);
    let table = render_snapshot(&snapshot);
    let rows: Vec<&str> = table.lines().filter(|line| line.starts_with("val")).collect();

    assert!(table.contains("Sample: 1"));
    assert_eq!(rows.len(), 2);
    // 10 packets and 2 KiB over a two second interval.
    assert!(rows[0].contains("5.0/s"));
    assert!(rows[0].contains("2.0KB"));
    assert!(rows[0].contains("1,024.0/s"));
    assert_eq!(rows[1].matches("N/A").count(), 10);
    assert!(!sampler.done(0));
    assert!(sampler.done(1));
}

#[test]
fn test_no_interfaces_is_an_error() {
    let root = tempfile::tempdir().unwrap();
    let counters = SysfsCounters::new(root.path());

    let names = candidate_names(&HostInterfaces::new(root.path()), "val");
    let err = monitored_interfaces(names, &counters).unwrap_err();
    assert_eq!(err.to_string(), "no valid interfaces found");
}
