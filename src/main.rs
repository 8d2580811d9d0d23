use std::io::{self, IsTerminal};
use std::net::IpAddr;
use std::process::ExitCode;

use anyhow::Context;
use clap::{CommandFactory, Parser};
use ue_monitor::cli::PacketMonitorCli;
use ue_monitor::display::Presenter;
use ue_monitor::error::Error;
use ue_monitor::interrupt::Interrupt;
use ue_monitor::network::{active_interfaces, HostInterfaces, Tshark};
use ue_monitor::select::{select_interface, Selection};
use ue_monitor::tap::{choose_interface, ensure_engine, run_tap, InterfaceChoice, TapOptions};
use ue_monitor::{logging, CaptureTarget};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = PacketMonitorCli::parse();
    logging::init(cli.host.log_format, cli.debug);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report(&e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: PacketMonitorCli) -> anyhow::Result<()> {
    let interrupt = Interrupt::ctrl_c().context("cannot listen for Ctrl-C")?;
    let engine = Tshark::new(cli.engine.clone());
    ensure_engine(&engine).await?;

    let host = HostInterfaces::new(&cli.host.sysfs_net);
    let Some((address, interface)) = resolve_target(&cli, &host, &interrupt).await? else {
        return Ok(());
    };

    if !nix::unistd::geteuid().is_root() {
        println!("Warning: not running as root, packet capture may fail. Try running with sudo.");
    }

    let target = CaptureTarget::new(address, interface, cli.mode()).with_limit(cli.count);
    tracing::debug!(?target, "starting capture");

    let stdout = io::stdout();
    let color = stdout.is_terminal();
    let mut presenter = Presenter::new(stdout, target.mode).with_color(color);
    let options = TapOptions {
        debug: cli.debug,
        ..TapOptions::default()
    };

    let outcome = run_tap(&engine, &target, &mut presenter, options, interrupt.wait()).await?;
    tracing::debug!(?outcome, "monitoring finished");
    Ok(())
}

/// Source address and capture interface, or `None` when the operator quit
/// the selector.
async fn resolve_target(
    cli: &PacketMonitorCli,
    host: &HostInterfaces,
    interrupt: &Interrupt,
) -> anyhow::Result<Option<(IpAddr, String)>> {
    let prefix = cli.host.iface_prefix.as_str();

    if cli.select {
        let ues = active_interfaces(host, prefix);
        if ues.is_empty() {
            return Err(Error::NoActiveInterfaces.into());
        }

        let menu = tokio::task::spawn_blocking(move || {
            select_interface(&ues, io::stdin().lock(), io::stdout())
        });
        let selection = tokio::select! {
            choice = menu => choice.context("selector task failed")??,
            _ = interrupt.wait() => {
                println!("\nCancelled by user");
                // The blocking stdin read cannot be cancelled; leave now.
                std::process::exit(0)
            }
        };

        let iface = match selection {
            Selection::Chosen(iface) => iface,
            Selection::Quit => return Ok(None),
        };
        let Some(addr) = iface.ipv4 else {
            return Err(Error::NoActiveInterfaces.into());
        };
        println!("\nSelected UE: {}", iface.name);
        println!("Selected UE IP: {}", addr);

        let interface = cli.interface.clone().unwrap_or(iface.name);
        return Ok(Some((IpAddr::V4(addr), interface)));
    }

    if let Some(address) = cli.src_ip {
        let choice = choose_interface(address, cli.interface.clone(), host, prefix);
        match &choice {
            InterfaceChoice::Matched(name) if cli.debug => {
                println!("Auto-detected interface '{}' for src-ip {}", name, address);
            }
            InterfaceChoice::Fallback => {
                println!(
                    "Warning: no local {}* interface has IP {}; using capture interface '{}'.",
                    prefix,
                    address,
                    choice.name()
                );
                println!(
                    "If this IP belongs to a UE, run with --select to pick the correct interface or pass --interface <iface>."
                );
            }
            _ => {}
        }
        return Ok(Some((address, choice.name().to_string())));
    }

    PacketMonitorCli::command().print_help()?;
    Err(Error::NoTarget.into())
}

fn report(e: &anyhow::Error) {
    match e.downcast_ref::<Error>() {
        Some(Error::CaptureDenied { interface, message }) => {
            eprintln!("\nError: Unable to open capture interface '{}'.", interface);
            if !message.is_empty() {
                eprintln!("tshark error: {}", message);
            }
        }
        _ => eprintln!("\nError: {:#}", e),
    }
    if let Some(remedy) = e.downcast_ref::<Error>().and_then(Error::remedy) {
        eprintln!("{}", remedy);
    }
}
