//! Logging configuration for geoattend.
//!
//! Diagnostics go through `tracing`; user-facing messages are printed by the
//! CLI. This module installs the subscriber once at startup.

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Verbosity level for logging output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Suppress all output except errors.
    Quiet,
    /// Warnings and errors only; keeps the interactive prompt readable.
    #[default]
    Normal,
    /// Informational output.
    Verbose,
    /// Debug and trace output.
    Trace,
}

impl Verbosity {
    /// Convert verbosity to tracing level filter.
    #[must_use]
    pub fn to_level_filter(&self) -> Level {
        match self {
            Self::Quiet => Level::ERROR,
            Self::Normal => Level::WARN,
            Self::Verbose => Level::INFO,
            Self::Trace => Level::TRACE,
        }
    }
}

/// Target of the background location logger.
const LOGGER_TARGET: &str = "geoattend::logger";

/// Build the default filter directives for `verbosity`.
///
/// Delivery failures from the background location logger are best-effort and
/// arrive every few minutes, so below [`Verbosity::Verbose`] they are held back
/// to errors and never break up the interactive prompt.
#[must_use]
pub fn default_directives(verbosity: Verbosity) -> String {
    let level = verbosity.to_level_filter();
    match verbosity {
        Verbosity::Quiet | Verbosity::Normal => {
            format!("geoattend={level},{LOGGER_TARGET}={}", Level::ERROR)
        }
        Verbosity::Verbose | Verbosity::Trace => format!("geoattend={level}"),
    }
}

/// Initialize the logging system.
///
/// Call once at startup. The level comes from:
/// 1. The `verbosity` parameter (see [`default_directives`])
/// 2. The `RUST_LOG` environment variable (takes precedence)
///
/// Log lines go to stderr so they never interleave with command output.
///
/// # Examples
///
/// ```no_run
/// use geoattend::{init_logging, logging::Verbosity};
///
/// // Show session events such as "Attendance recorded"
/// init_logging(Verbosity::Verbose);
/// ```
pub fn init_logging(verbosity: Verbosity) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbosity)));

    let subscriber = tracing_subscriber::registry().with(env_filter).with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false),
    );

    // Ignore the error if a subscriber is already set
    let _ = subscriber.try_init();
}

/// Initialize logging for tests.
#[cfg(test)]
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}
