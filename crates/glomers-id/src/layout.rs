//! Bit layout shared by the generator and identifier decoding.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Width of the millisecond timestamp field.
pub const TIMESTAMP_BITS: u32 = 41;
/// Width of the machine id field.
pub const MACHINE_ID_BITS: u32 = 10;
/// Width of the per-millisecond sequence field.
pub const SEQUENCE_BITS: u32 = 12;

pub(crate) const MACHINE_SHIFT: u32 = SEQUENCE_BITS;
pub(crate) const TIMESTAMP_SHIFT: u32 = MACHINE_ID_BITS + SEQUENCE_BITS;

pub(crate) const SEQUENCE_MASK: u16 = (1 << SEQUENCE_BITS) - 1;
pub(crate) const MACHINE_ID_MASK: u16 = (1 << MACHINE_ID_BITS) - 1;
const TIMESTAMP_MASK: u64 = (1 << TIMESTAMP_BITS) - 1;

/// Largest timestamp, in milliseconds since the epoch, that fits the layout.
pub const MAX_TIMESTAMP: i64 = (1 << TIMESTAMP_BITS) - 1;

/// Default generator epoch: 2025-08-30T00:00:00Z as Unix milliseconds.
pub const DEFAULT_EPOCH_UNIX_MS: i64 = 1_756_512_000_000;

/// A 10-bit machine identifier.
///
/// Values wider than ten bits are masked on construction, so two ids that
/// differ only above bit 9 collapse to the same machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct MachineId(u16);

impl MachineId {
    /// Builds a machine id from the low ten bits of `raw`.
    #[must_use]
    pub const fn new(raw: u16) -> Self {
        Self(raw & MACHINE_ID_MASK)
    }

    /// Derives a machine id from a process id.
    #[must_use]
    pub const fn from_process_id(pid: u32) -> Self {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "the value is masked to ten bits first"
        )]
        let low = (pid & MACHINE_ID_MASK as u32) as u16;
        Self(low)
    }

    /// Returns the masked value.
    #[must_use]
    pub const fn get(self) -> u16 {
        self.0
    }
}

impl fmt::Display for MachineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A generated identifier.
///
/// Ordering follows the numeric value, which for identifiers from a single
/// generator matches issue order. Serialises as a plain JSON number.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SnowflakeId(u64);

impl SnowflakeId {
    /// Packs the three fields into an identifier.
    ///
    /// Each field is masked to its width; callers are expected to have range
    /// checked `timestamp` beforehand.
    #[must_use]
    pub const fn from_parts(timestamp: u64, machine: MachineId, sequence: u16) -> Self {
        let packed = (timestamp & TIMESTAMP_MASK) << TIMESTAMP_SHIFT
            | ((machine.get() & MACHINE_ID_MASK) as u64) << MACHINE_SHIFT
            | (sequence & SEQUENCE_MASK) as u64;
        Self(packed)
    }

    /// Wraps a raw value, for example one read back from the wire.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw 64-bit value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Milliseconds since the generator epoch.
    #[must_use]
    pub const fn timestamp(self) -> u64 {
        (self.0 >> TIMESTAMP_SHIFT) & TIMESTAMP_MASK
    }

    /// Machine id embedded in the identifier.
    #[must_use]
    pub const fn machine_id(self) -> MachineId {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "the value is masked to ten bits"
        )]
        let raw = ((self.0 >> MACHINE_SHIFT) & MACHINE_ID_MASK as u64) as u16;
        MachineId(raw)
    }

    /// Sequence number within the millisecond.
    #[must_use]
    pub const fn sequence(self) -> u16 {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "the value is masked to twelve bits"
        )]
        let raw = (self.0 & SEQUENCE_MASK as u64) as u16;
        raw
    }
}

impl fmt::Display for SnowflakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<SnowflakeId> for u64 {
    fn from(id: SnowflakeId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::zero(0, 0)]
    #[case::in_range(513, 513)]
    #[case::max(1023, 1023)]
    #[case::wraps(1024, 0)]
    #[case::high_bits(0xFFFF, 1023)]
    fn machine_id_masks_to_ten_bits(#[case] raw: u16, #[case] expected: u16) {
        assert_eq!(MachineId::new(raw).get(), expected);
    }

    #[test]
    fn machine_id_from_process_id_keeps_low_bits() {
        assert_eq!(MachineId::from_process_id(0x1_2345).get(), 0x345);
    }

    #[test]
    fn from_parts_places_fields() {
        let id = SnowflakeId::from_parts(5, MachineId::new(3), 7);
        assert_eq!(id.as_u64(), (5 << 22) | (3 << 12) | 7);
        assert_eq!(id.timestamp(), 5);
        assert_eq!(id.machine_id(), MachineId::new(3));
        assert_eq!(id.sequence(), 7);
    }

    #[test]
    fn maximal_fields_leave_sign_bit_clear() {
        let max = u64::try_from(MAX_TIMESTAMP).expect("positive");
        let id = SnowflakeId::from_parts(max, MachineId::new(1023), SEQUENCE_MASK);
        assert_eq!(id.as_u64() >> 63, 0);
        assert_eq!(id.as_u64(), u64::MAX >> 1);
    }

    #[test]
    fn distinct_machines_never_share_bits() {
        let a = SnowflakeId::from_parts(42, MachineId::new(1), 9);
        let b = SnowflakeId::from_parts(42, MachineId::new(2), 9);
        assert_ne!(a, b);
    }

    #[test]
    fn serialises_as_plain_number() {
        let id = SnowflakeId::from_raw(4_194_305);
        let json = serde_json::to_string(&id).expect("serialise");
        assert_eq!(json, "4194305");
    }
}
