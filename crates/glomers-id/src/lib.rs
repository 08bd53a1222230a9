//! Snowflake-style identifier generation for cluster nodes.
//!
//! Every identifier packs three fields into the low 63 bits of a `u64`:
//!
//! ```text
//!  63   62                    22 21        12 11          0
//! ┌───┬────────────────────────┬────────────┬─────────────┐
//! │ 0 │ timestamp (41 bits, ms) │ machine(10) │ sequence(12) │
//! └───┴────────────────────────┴────────────┴─────────────┘
//! ```
//!
//! The timestamp counts milliseconds since a fixed epoch, the machine id
//! distinguishes generators running in different processes, and the
//! sequence disambiguates identifiers issued within the same millisecond.
//! A single [`SnowflakeGenerator`] therefore issues at most 4096 identifiers
//! per millisecond; callers beyond that budget wait for the next tick.
//!
//! The generator is safe to share between threads. Its mutex guards only the
//! timestamp and sequence pair, and waits for clock advancement happen with
//! the lock released.

mod clock;
mod error;
mod generator;
mod layout;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::GeneratorError;
pub use generator::SnowflakeGenerator;
pub use layout::{
    DEFAULT_EPOCH_UNIX_MS, MACHINE_ID_BITS, MAX_TIMESTAMP, MachineId, SEQUENCE_BITS, SnowflakeId,
    TIMESTAMP_BITS,
};
