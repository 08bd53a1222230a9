//! Errors reported by the identifier generator.

use thiserror::Error;

/// Failures surfaced by [`crate::SnowflakeGenerator::generate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GeneratorError {
    /// The clock reading does not fit in the 41-bit timestamp field.
    ///
    /// Raised when the clock sits more than roughly 69.7 years after the
    /// epoch. Readings before the epoch are behind the last issue and are
    /// waited out instead. No identifier is emitted and the generator state
    /// is left untouched.
    #[error("timestamp {timestamp} ms is outside the 41-bit range 0..={max}")]
    TimestampOutOfRange {
        /// Milliseconds since the generator epoch.
        timestamp: i64,
        /// Largest representable timestamp.
        max: i64,
    },
}
