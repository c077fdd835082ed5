//! Diagnostic tracing.
//!
//! Filtered by `RUST_LOG`, default `warn`. The workflow owns the terminal in
//! raw mode, so `--log-file` sends events to a file instead of stderr.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber.
///
/// # Example
/// ```bash
/// RUST_LOG=gemmit=debug gemmit --log-file /tmp/gemmit.log
/// ```
pub fn init(log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let registry = tracing_subscriber::registry().with(filter);

    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("open log file {}", path.display()))?;
            registry
                .with(
                    fmt::layer()
                        .with_writer(Mutex::new(file))
                        .with_ansi(false)
                        .compact(),
                )
                .try_init()
                .context("install tracing subscriber")?;
        }
        None => {
            registry
                .with(fmt::layer().with_writer(std::io::stderr).compact())
                .try_init()
                .context("install tracing subscriber")?;
        }
    }
    Ok(())
}
