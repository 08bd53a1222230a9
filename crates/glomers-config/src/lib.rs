//! Shared configuration for the cluster node runtime.
//!
//! Settings come from command-line flags with environment variable
//! fallbacks, so a test harness that launches the node without arguments
//! still gets sensible defaults:
//!
//! | Flag | Environment | Default |
//! |---|---|---|
//! | `--machine-id` | `GLOMERS_MACHINE_ID` | derived from the process id |
//! | `--log-filter` | `GLOMERS_LOG_FILTER` | `info` |
//! | `--log-format` | `GLOMERS_LOG_FORMAT` | `compact` |
//! | `--max-frame-bytes` | `GLOMERS_MAX_FRAME_BYTES` | 1 MiB |

mod defaults;
mod logging;

use std::ffi::OsString;

use clap::Parser;
use thiserror::Error;

pub use defaults::{
    DEFAULT_LOG_FILTER, DEFAULT_MAX_FRAME_BYTES, MAX_MACHINE_ID, default_log_format,
};
pub use logging::{LogFormat, LogFormatParseError};

/// Resolved node configuration.
#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(
    name = "glomers-node",
    version,
    about = "Runs one node of a message-passing cluster over stdin and stdout"
)]
pub struct Config {
    /// Machine id stamped into generated identifiers (0-1023). Defaults to
    /// the low ten bits of the process id.
    #[arg(
        long,
        env = "GLOMERS_MACHINE_ID",
        value_parser = clap::value_parser!(u16).range(0..=i64::from(MAX_MACHINE_ID))
    )]
    pub machine_id: Option<u16>,

    /// Tracing filter expression, for example `info` or `glomers_node=debug`.
    #[arg(long, env = "GLOMERS_LOG_FILTER", default_value = DEFAULT_LOG_FILTER)]
    pub log_filter: String,

    /// Diagnostic output format written to standard error.
    #[arg(long, env = "GLOMERS_LOG_FORMAT", default_value_t = default_log_format())]
    pub log_format: LogFormat,

    /// Largest inbound JSON object, in bytes, before it is dropped.
    #[arg(
        long,
        env = "GLOMERS_MAX_FRAME_BYTES",
        default_value_t = DEFAULT_MAX_FRAME_BYTES,
        value_parser = parse_frame_limit
    )]
    pub max_frame_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            machine_id: None,
            log_filter: DEFAULT_LOG_FILTER.to_owned(),
            log_format: default_log_format(),
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
        }
    }
}

impl Config {
    /// Loads configuration from the process arguments and environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when a flag or environment value is
    /// invalid, or when help or version output was requested.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_iter(std::env::args_os())
    }

    /// Loads configuration from an explicit argument list. The first item is
    /// the program name.
    ///
    /// # Errors
    ///
    /// See [`Config::load`].
    pub fn load_from_iter<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Self::try_parse_from(args).map_err(ConfigError::Parse)
    }

    /// Explicit machine id, if one was configured.
    #[must_use]
    pub const fn machine_id(&self) -> Option<u16> {
        self.machine_id
    }

    /// Tracing filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Diagnostic output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Inbound frame size limit in bytes.
    #[must_use]
    pub const fn max_frame_bytes(&self) -> usize {
        self.max_frame_bytes
    }
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Arguments or environment values failed to parse.
    #[error("failed to parse configuration: {0}")]
    Parse(#[source] clap::Error),
}

impl ConfigError {
    /// Prints the clap diagnostic (or help/version text) and exits with
    /// clap's status code.
    pub fn exit(&self) -> ! {
        match self {
            Self::Parse(error) => error.exit(),
        }
    }
}

fn parse_frame_limit(raw: &str) -> Result<usize, String> {
    match raw.parse::<usize>() {
        Ok(0) => Err("frame limit must be at least one byte".to_owned()),
        Ok(limit) => Ok(limit),
        Err(error) => Err(error.to_string()),
    }
}
