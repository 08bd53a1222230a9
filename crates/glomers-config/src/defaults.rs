use crate::logging::LogFormat;

/// Default log filter expression used by the node binary.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default upper bound on the size of one inbound JSON object.
pub const DEFAULT_MAX_FRAME_BYTES: usize = 1024 * 1024;

/// Largest machine id the generator layout can carry.
pub const MAX_MACHINE_ID: u16 = 1023;

/// Default logging format for the node binary.
///
/// Compact lines keep the harness's per-node stderr logs readable.
pub const fn default_log_format() -> LogFormat {
    LogFormat::Compact
}
