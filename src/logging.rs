use std::io;

use clap::ValueEnum;
use tracing_subscriber::{filter::Directive, fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum LogFormat {
    // Single-line, the default
    #[default]
    Compact,

    // Multi-line, human-readable
    Pretty,

    // For machine parsing
    Json,
}

/// Install the global subscriber. Logs go to stderr; stdout belongs to the
/// live display. `RUST_LOG` is honoured, `debug` raises this crate to DEBUG.
pub fn init(format: LogFormat, debug: bool) {
    let mut filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    if debug {
        if let Ok(directive) = "ue_monitor=debug".parse::<Directive>() {
            filter = filter.add_directive(directive);
        }
    }

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Compact => registry
            .with(fmt::layer().compact().with_target(false).with_writer(io::stderr))
            .init(),
        LogFormat::Pretty => registry
            .with(fmt::layer().pretty().with_writer(io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(io::stderr))
            .init(),
    }
}
