//! Structured diagnostics on standard error.
//!
//! Standard output belongs to the protocol: every byte written there must be
//! a reply the harness can parse. The subscriber built here therefore writes
//! to standard error only, whatever the configured format.

use std::io::{self, IsTerminal};

use glomers_config::{Config, LogFormat};
use once_cell::sync::OnceCell;
use tracing::Subscriber;
use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::UtcTime;

static INSTALLED: OnceCell<()> = OnceCell::new();

/// Proof that the node's diagnostics subscriber is in place.
#[derive(Debug, Default, Clone, Copy)]
pub struct TelemetryHandle;

/// Reasons the diagnostics subscriber could not be set up.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// `--log-filter` is not a valid `EnvFilter` expression.
    #[error("invalid log filter `{expression}`: {reason}")]
    Filter {
        /// Expression as configured.
        expression: String,
        /// Parser diagnostic.
        reason: String,
    },
    /// Another global subscriber was installed first.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(SetGlobalDefaultError),
}

/// Installs the node's diagnostics subscriber.
///
/// Only the first call touches global state; later calls succeed without
/// reinstalling.
///
/// # Errors
///
/// Returns [`TelemetryError::Filter`] for an unparsable filter and
/// [`TelemetryError::Subscriber`] when a foreign subscriber is already
/// installed.
pub fn initialise(config: &Config) -> Result<TelemetryHandle, TelemetryError> {
    INSTALLED
        .get_or_try_init(|| {
            let subscriber = node_subscriber(config)?;
            tracing::subscriber::set_global_default(subscriber)
                .map_err(TelemetryError::Subscriber)
        })
        .map(|_| TelemetryHandle)
}

/// Builds the stderr subscriber described by `config` without installing it.
fn node_subscriber(config: &Config) -> Result<Box<dyn Subscriber + Send + Sync>, TelemetryError> {
    let filter = parse_filter(config.log_filter())?;
    let base = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_timer(UtcTime::rfc_3339())
        .with_target(true)
        .with_thread_names(false);

    let subscriber: Box<dyn Subscriber + Send + Sync> = match config.log_format() {
        LogFormat::Compact => Box::new(base.compact().finish()),
        LogFormat::Json => Box::new(base.json().flatten_event(true).finish()),
    };
    Ok(subscriber)
}

fn parse_filter(expression: &str) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(expression).map_err(|error| TelemetryError::Filter {
        expression: expression.to_owned(),
        reason: error.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn config_with(log_filter: &str, log_format: LogFormat) -> Config {
        Config {
            log_filter: log_filter.to_owned(),
            log_format,
            ..Config::default()
        }
    }

    #[test]
    fn rejects_unparsable_filters() {
        let config = config_with("glomers_node=loud", LogFormat::Compact);
        let error = node_subscriber(&config).err().expect("invalid filter");
        assert!(matches!(
            &error,
            TelemetryError::Filter { expression, .. } if expression == "glomers_node=loud"
        ));
    }

    #[rstest]
    #[case::compact(LogFormat::Compact)]
    #[case::json(LogFormat::Json)]
    fn builds_every_format(#[case] format: LogFormat) {
        let config = config_with("glomers_node::dispatch=debug,info", format);
        assert!(node_subscriber(&config).is_ok());
    }
}
