//! Logging setup using `tracing` + `tracing-subscriber`.
//!
//! Priority for the filter:
//! 1. `--log-level` CLI flag
//! 2. `TASKCHAIN_LOG` environment variable (any `EnvFilter` directive, e.g. "taskchain=debug")
//! 3. `warn`
//!
//! Logs go to stderr so that stdout stays machine-readable.

use clap::ValueEnum;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "TASKCHAIN_LOG";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn directive(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

fn filter(cli_level: Option<LogLevel>) -> EnvFilter {
    match cli_level {
        Some(level) => EnvFilter::new(level.directive()),
        None => EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")),
    }
}

/// Install the global subscriber. A second call is a no-op.
pub fn init_logging(cli_level: Option<LogLevel>) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter(cli_level))
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::filter::LevelFilter;

    #[test]
    fn cli_level_sets_max_level() {
        assert_eq!(
            filter(Some(LogLevel::Debug)).max_level_hint(),
            Some(LevelFilter::DEBUG)
        );
        assert_eq!(
            filter(Some(LogLevel::Error)).max_level_hint(),
            Some(LevelFilter::ERROR)
        );
    }

    #[test]
    fn repeated_init_does_not_panic() {
        init_logging(Some(LogLevel::Warn));
        init_logging(Some(LogLevel::Trace));
    }
}
