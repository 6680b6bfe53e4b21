//! Logging setup
//!
//! The library logs through `tracing` macros with structured fields. The
//! binary installs a `tracing-subscriber` fmt subscriber before anything
//! else runs and adjusts its level once the config file has been read.
//! `RUST_LOG` takes precedence over the configured level when set.

use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, reload, EnvFilter, Registry};

/// Log levels, from quietest to noisiest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Nothing,
    Error,
    Warning,
    Info,
    Debug,
    All,
}

impl LogLevel {
    /// Parse a level name as used in config files and on the command line
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "off" | "nothing" | "none" => Some(LogLevel::Nothing),
            "error" => Some(LogLevel::Error),
            "warn" | "warning" => Some(LogLevel::Warning),
            "info" => Some(LogLevel::Info),
            "debug" => Some(LogLevel::Debug),
            "trace" | "all" => Some(LogLevel::All),
            _ => None,
        }
    }

    /// Directive understood by `EnvFilter`
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Nothing => "off",
            LogLevel::Error => "error",
            LogLevel::Warning => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::All => "trace",
        }
    }
}

/// Build the filter: `RUST_LOG` when present and valid, otherwise `level`
pub fn env_filter(level: LogLevel) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_filter()))
}

/// Changes the level of an installed subscriber
#[derive(Clone)]
pub struct LogHandle(reload::Handle<EnvFilter, Registry>);

impl LogHandle {
    pub fn set_level(&self, level: LogLevel) {
        match self.0.reload(env_filter(level)) {
            Ok(()) => tracing::debug!(level = level.as_filter(), "Log level set"),
            Err(e) => tracing::warn!(error = %e, "Could not change log level"),
        }
    }
}

/// A fmt subscriber writing to `writer`, with a handle to change its level
pub fn subscriber<W>(
    level: LogLevel,
    writer: W,
) -> (impl tracing::Subscriber + Send + Sync, LogHandle)
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let (filter, handle) = reload::Layer::new(env_filter(level));
    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(writer));
    (subscriber, LogHandle(handle))
}

/// Install the global subscriber, logging to stderr.
///
/// Returns `None` if a subscriber was already installed (tests, embedding).
pub fn init(level: LogLevel) -> Option<LogHandle> {
    let (subscriber, handle) = subscriber(level, std::io::stderr);
    match tracing::subscriber::set_global_default(subscriber) {
        Ok(()) => {
            tracing::debug!(level = level.as_filter(), "Logging initialized");
            Some(handle)
        }
        Err(_) => None,
    }
}
