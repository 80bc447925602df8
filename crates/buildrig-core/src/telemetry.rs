//! Log output for build runs.
//!
//! Interactive runs get coloured text on the terminal. Unattended CI runs
//! get plain text, or one JSON object per line with `--json` so a log
//! collector can index the structured fields (`platform`, `run_id`,
//! `elapsed_ms`) attached to each event. Only the first [`init_tracing`]
//! call installs a subscriber.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines.
    Text,
    /// Newline-delimited JSON for log aggregation.
    Json,
}

/// Initialise the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `level`. `ansi` should be off for
/// unattended runs so CI logs stay free of escape codes.
pub fn init_tracing(format: LogFormat, level: Level, ansi: bool) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(false).json())
            .try_init()
            .ok(),
        LogFormat::Text => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(false).with_ansi(ansi))
            .try_init()
            .ok(),
    };
}
