//! Subscriber setup for the crate's own diagnostics.
//!
//! The facility reports write failures, rotation failures and queue
//! overflow through `tracing`. Applications that already install a
//! subscriber get those events for free; others can call
//! [`init_diagnostics`] to print them on stderr.

use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::DiagnosticsConfig;
use crate::{Error, Result};

/// Install a global `tracing` subscriber for diagnostics.
///
/// `verbose` raises this crate's level the way repeated `-v` flags do.
pub fn init_diagnostics(config: &DiagnosticsConfig, verbose: Option<u8>) -> Result<()> {
    let spec = effective_filter_spec(config, verbose);
    let env_filter = EnvFilter::try_new(&spec).map_err(|e| Error::Init(e.to_string()))?;

    if !config.console {
        return tracing_subscriber::registry()
            .with(env_filter)
            .try_init()
            .map_err(|e| Error::Init(e.to_string()));
    }

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_names(true);
    let fmt_layer = if config.format == "json" {
        fmt_layer.json().boxed()
    } else {
        fmt_layer.boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| Error::Init(e.to_string()))
}

/// Determine the filter spec, considering `RUST_LOG` and verbosity.
fn effective_filter_spec(config: &DiagnosticsConfig, verbose: Option<u8>) -> String {
    // RUST_LOG takes precedence over everything
    if let Ok(rust_log) = std::env::var("RUST_LOG")
        && !rust_log.is_empty()
    {
        return rust_log;
    }

    if let Some(verbose) = verbose {
        return match verbose {
            0 => config.level.clone(),
            1 => format!("{},levelsplit=debug", config.level),
            2 => format!("{},levelsplit=trace", config.level),
            _ => "trace".to_string(),
        };
    }

    if config.level.is_empty() {
        "warn,levelsplit=warn".to_string()
    } else {
        format!("{},levelsplit={}", config.level, config.level)
    }
}
