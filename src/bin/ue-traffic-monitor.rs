use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use ue_monitor::cli::TrafficMonitorCli;
use ue_monitor::display::render_snapshot;
use ue_monitor::interrupt::Interrupt;
use ue_monitor::network::{candidate_names, HostInterfaces};
use ue_monitor::stats::{monitored_interfaces, Sampler, SysfsCounters};
use ue_monitor::{dashboard, logging};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = TrafficMonitorCli::parse();
    logging::init(cli.host.log_format, false);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{:#}. Exit.", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: TrafficMonitorCli) -> anyhow::Result<()> {
    let interrupt = Interrupt::ctrl_c().context("cannot listen for Ctrl-C")?;
    let counters = SysfsCounters::new(&cli.host.sysfs_net);
    let requested = if cli.interfaces.is_empty() {
        candidate_names(&HostInterfaces::new(&cli.host.sysfs_net), &cli.host.iface_prefix)
    } else {
        cli.interfaces
    };
    let interfaces = monitored_interfaces(requested, &counters)?;

    println!(
        "Monitoring {} interface(s): {}",
        interfaces.len(),
        interfaces.join(", ")
    );

    let mut sampler = Sampler::new(interfaces, cli.interval);
    sampler.prime(&counters);

    if cli.dashboard {
        let limit = cli.count;
        let last = tokio::task::spawn_blocking(move || dashboard::run(&mut sampler, &counters, limit))
            .await??;
        if let Some(snapshot) = last {
            println!("{}", render_snapshot(&snapshot));
        }
        return Ok(());
    }

    println!("Press Ctrl-C to stop");
    let mut ticks = interval_at(Instant::now() + sampler.interval(), sampler.interval());
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = interrupt.wait() => {
                println!("\nStopped by user");
                return Ok(());
            }
            _ = ticks.tick() => {}
        }

        let snapshot = sampler.sample(&counters);
        println!("{}", render_snapshot(&snapshot));
        if sampler.done(cli.count) {
            return Ok(());
        }
    }
}
