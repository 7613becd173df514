//! # copilot-history-logging
//!
//! Tracing setup for the copilot-history tools.
//!
//! Diagnostics always go to stderr so that stdout stays reserved for query
//! output (`--json` in particular).
//!
//! ## Log Formats
//!
//! - `Pretty` - Human-readable multi-line output
//! - `JSON` - Structured JSON lines
//! - `Compact` - Minimal single-line output

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable format
    #[default]
    Pretty,
    /// JSON lines format for machine consumption
    Json,
    /// Compact single-line format
    Compact,
}

/// Initialize tracing for the application
///
/// `RUST_LOG` wins over `level` when set.
pub fn init_tracing(level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);
    let result = match format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_target(false).with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Pretty => registry
            .with(fmt::layer().pretty().with_target(false).with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Compact => registry
            .with(fmt::layer().compact().with_target(false).with_writer(std::io::stderr))
            .try_init(),
    };

    if let Err(e) = result {
        eprintln!("Tracing already initialized: {}", e);
    }
}
