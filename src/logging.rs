//! Structured logging for peerwatch
//!
//! Logs go to stderr so that the summary printed on stdout stays clean when
//! piped. Fields are structured so JSON output can be filtered downstream.
//!
//! # Field Conventions
//!
//! - `selector`: torrent selector being sampled ("all" or an id)
//! - `address`: peer address
//! - `address_count`: addresses extracted in a round
//! - `unique_addresses`: distinct peers seen so far
//! - `failed_selectors`: selectors skipped in a round
//!
//! # Examples
//!
//! ```rust
//! use tracing::warn;
//!
//! let selector = "all";
//! warn!(selector, error = "exit status 1", "sampling failed, skipping selector this round");
//! ```

use std::{fmt as std_fmt, io};
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{
    fmt::{self, format::Writer},
    prelude::*,
    EnvFilter,
};

/// Custom formatter that shows "peerwatch" instead of full module path
struct PeerwatchFormatter {
    with_ansi: bool,
}

impl<S, N> FormatEvent<S, N> for PeerwatchFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std_fmt::Result {
        let meta = event.metadata();

        write!(
            writer,
            "{} ",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.6f%:z")
        )?;

        if self.with_ansi {
            let level_style = match *meta.level() {
                tracing::Level::ERROR => "\x1b[31m", // Red
                tracing::Level::WARN => "\x1b[33m",  // Yellow
                tracing::Level::INFO => "\x1b[32m",  // Green
                tracing::Level::DEBUG => "\x1b[34m", // Blue
                tracing::Level::TRACE => "\x1b[35m", // Magenta
            };
            write!(
                writer,
                "{}{:5}(peerwatch)\x1b[0m: ",
                level_style,
                meta.level()
            )?;
        } else {
            write!(writer, "{:5}(peerwatch): ", meta.level())?;
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;

        writeln!(writer)
    }
}

/// Log format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable format (default on a terminal)
    Pretty,
    /// Same layout without colours (for CI and service managers)
    Compact,
    /// JSON format (for log aggregation systems)
    Json,
}

impl LogFormat {
    /// Parse from environment variable (PEERWATCH_LOG_FORMAT)
    pub fn from_env() -> Self {
        match std::env::var("PEERWATCH_LOG_FORMAT")
            .unwrap_or_default()
            .to_lowercase()
            .as_str()
        {
            "json" => Self::Json,
            "compact" => Self::Compact,
            "pretty" => Self::Pretty,
            _ => {
                if std::env::var("CI").is_ok() || std::env::var("INVOCATION_ID").is_ok() {
                    // CI runners and systemd units
                    Self::Compact
                } else {
                    Self::Pretty
                }
            }
        }
    }
}

/// Initialize the global tracing subscriber
///
/// `default_level` applies when `RUST_LOG` is unset. Calling this more than
/// once is harmless; only the first call installs a subscriber. Any other
/// installation failure is reported on stderr.
///
/// # Environment Variables
///
/// - `RUST_LOG`: Set log level (e.g., "debug", "peerwatch=trace")
/// - `PEERWATCH_LOG_FORMAT`: Set format ("pretty", "compact", "json")
/// - `CI`: If set, defaults to compact format
pub fn init(default_level: &str) {
    // Tests and repeated init calls keep the first subscriber
    if tracing::dispatcher::has_been_set() {
        return;
    }

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let result = match LogFormat::from_env() {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .event_format(PeerwatchFormatter { with_ansi: true })
                    .with_writer(io::stderr),
            )
            .try_init(),
        LogFormat::Compact => tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .event_format(PeerwatchFormatter { with_ansi: false })
                    .with_writer(io::stderr),
            )
            .try_init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_file(false)
                    .with_line_number(false)
                    .with_ansi(false)
                    .with_writer(io::stderr)
                    .json(),
            )
            .try_init(),
    };

    if let Err(e) = result {
        eprintln!("peerwatch: failed to initialise logging: {}", e);
    }
}
