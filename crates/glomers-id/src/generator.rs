//! The lock-guarded snowflake generator.

use std::hint;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use tracing::{trace, warn};

use crate::clock::{Clock, SystemClock};
use crate::error::GeneratorError;
use crate::layout::{DEFAULT_EPOCH_UNIX_MS, MAX_TIMESTAMP, MachineId, SEQUENCE_MASK, SnowflakeId};

/// Tracing target for generator events.
const GENERATOR_TARGET: &str = "glomers_id::generator";

/// Busy-poll iterations before the clock wait starts sleeping between reads.
const SPIN_ITERATIONS: u32 = 2_000;

/// Sleep between clock reads once spinning has given up.
const WAIT_BACKOFF: Duration = Duration::from_micros(50);

/// Mutable generator state. Only this pair sits behind the lock.
#[derive(Debug)]
struct TickState {
    /// Milliseconds since the epoch of the most recent issue.
    last_timestamp: i64,
    /// Sequence number issued at `last_timestamp`.
    sequence: u16,
}

/// Outcome of one attempt under the lock.
enum Attempt {
    Issued(SnowflakeId),
    /// The caller must wait until the clock passes this timestamp.
    WaitAfter(i64),
}

/// Issues unique, per-instance increasing [`SnowflakeId`]s.
///
/// # Examples
///
/// ```
/// use glomers_id::{MachineId, SnowflakeGenerator};
///
/// let generator = SnowflakeGenerator::new(MachineId::new(7));
/// let first = generator.generate().expect("clock within range");
/// let second = generator.generate().expect("clock within range");
/// assert!(second > first);
/// assert_eq!(first.machine_id(), MachineId::new(7));
/// ```
#[derive(Debug)]
pub struct SnowflakeGenerator<C = SystemClock> {
    clock: C,
    epoch_unix_ms: i64,
    machine_id: MachineId,
    state: Mutex<TickState>,
}

impl SnowflakeGenerator<SystemClock> {
    /// Creates a generator on the system clock and the default epoch.
    #[must_use]
    pub fn new(machine_id: MachineId) -> Self {
        Self::with_clock(machine_id, SystemClock, DEFAULT_EPOCH_UNIX_MS)
    }
}

impl<C: Clock> SnowflakeGenerator<C> {
    /// Creates a generator reading `clock`, measuring time from
    /// `epoch_unix_ms`.
    ///
    /// The last-issued timestamp starts at the current reading, floored at
    /// zero when the clock sits before the epoch.
    pub fn with_clock(machine_id: MachineId, clock: C, epoch_unix_ms: i64) -> Self {
        let now = clock.unix_millis().saturating_sub(epoch_unix_ms).max(0);
        Self {
            clock,
            epoch_unix_ms,
            machine_id,
            state: Mutex::new(TickState {
                last_timestamp: now,
                sequence: 0,
            }),
        }
    }

    /// The machine id stamped into every identifier.
    pub const fn machine_id(&self) -> MachineId {
        self.machine_id
    }

    /// Issues the next identifier.
    ///
    /// Blocks briefly when the 4096-per-millisecond budget is spent or when
    /// the clock has moved behind the last issued timestamp; the wait happens
    /// without holding the lock and ends only once the clock strictly passes
    /// that timestamp.
    ///
    /// A reading behind the last issue, including one before the epoch, is
    /// waited out rather than rejected.
    ///
    /// # Errors
    ///
    /// Returns [`GeneratorError::TimestampOutOfRange`] when the clock reading
    /// lies past the 41-bit horizon. The generator state is not modified in
    /// that case.
    pub fn generate(&self) -> Result<SnowflakeId, GeneratorError> {
        let mut timestamp = self.now();
        loop {
            match self.try_issue(timestamp)? {
                Attempt::Issued(id) => {
                    trace!(
                        target: GENERATOR_TARGET,
                        id = id.as_u64(),
                        timestamp,
                        sequence = id.sequence(),
                        "issued id"
                    );
                    return Ok(id);
                }
                Attempt::WaitAfter(last) => {
                    timestamp = self.wait_until_after(last);
                }
            }
        }
    }

    fn try_issue(&self, timestamp: i64) -> Result<Attempt, GeneratorError> {
        let mut state = self.lock_state();
        let last = state.last_timestamp;

        if timestamp < last {
            warn!(
                target: GENERATOR_TARGET,
                observed = timestamp,
                last,
                "clock moved backwards; waiting for it to catch up"
            );
            return Ok(Attempt::WaitAfter(last));
        }

        // `last` is never negative, so only the horizon can be crossed here.
        if !(0..=MAX_TIMESTAMP).contains(&timestamp) {
            return Err(GeneratorError::TimestampOutOfRange {
                timestamp,
                max: MAX_TIMESTAMP,
            });
        }

        if timestamp == last {
            let next = state.sequence.wrapping_add(1) & SEQUENCE_MASK;
            if next == 0 {
                return Ok(Attempt::WaitAfter(last));
            }
            state.sequence = next;
        } else {
            state.sequence = 0;
            state.last_timestamp = timestamp;
        }

        Ok(Attempt::Issued(SnowflakeId::from_parts(
            timestamp.unsigned_abs(),
            self.machine_id,
            state.sequence,
        )))
    }

    /// Polls the clock until it reads strictly later than `after`.
    fn wait_until_after(&self, after: i64) -> i64 {
        let mut spins = 0_u32;
        loop {
            let now = self.now();
            if now > after {
                return now;
            }
            if spins < SPIN_ITERATIONS {
                spins += 1;
                hint::spin_loop();
            } else {
                thread::sleep(WAIT_BACKOFF);
            }
        }
    }

    fn now(&self) -> i64 {
        self.clock.unix_millis().saturating_sub(self.epoch_unix_ms)
    }

    // The guarded pair is always left consistent, so a poisoned lock is
    // still safe to reuse.
    fn lock_state(&self) -> MutexGuard<'_, TickState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::mpsc;

    use rstest::{fixture, rstest};

    use super::*;
    use crate::clock::ManualClock;

    const EPOCH: i64 = 1_000_000;

    type ManualGenerator = SnowflakeGenerator<Arc<ManualClock>>;

    struct Harness {
        clock: Arc<ManualClock>,
        generator: Arc<ManualGenerator>,
    }

    impl Harness {
        fn at(offset: i64) -> Self {
            let clock = Arc::new(ManualClock::new(EPOCH + offset));
            let generator = Arc::new(SnowflakeGenerator::with_clock(
                MachineId::new(5),
                Arc::clone(&clock),
                EPOCH,
            ));
            Self { clock, generator }
        }

        /// Runs `generate` on a helper thread and hands back the receiver.
        fn generate_in_background(&self) -> mpsc::Receiver<Result<SnowflakeId, GeneratorError>> {
            let (tx, rx) = mpsc::channel();
            let generator = Arc::clone(&self.generator);
            thread::spawn(move || {
                let _ = tx.send(generator.generate());
            });
            rx
        }
    }

    #[fixture]
    fn harness() -> Harness {
        Harness::at(100)
    }

    #[rstest]
    fn same_tick_as_construction_starts_at_sequence_one(harness: Harness) {
        let id = harness.generator.generate().expect("in range");
        assert_eq!(id.timestamp(), 100);
        assert_eq!(id.sequence(), 1);
        assert_eq!(id.machine_id(), MachineId::new(5));
    }

    #[rstest]
    fn sequence_resets_when_the_clock_advances(harness: Harness) {
        harness.generator.generate().expect("in range");
        harness.generator.generate().expect("in range");
        harness.clock.advance(1);
        let id = harness.generator.generate().expect("in range");
        assert_eq!(id.timestamp(), 101);
        assert_eq!(id.sequence(), 0);
    }

    #[rstest]
    fn sequential_ids_strictly_increase(harness: Harness) {
        let mut previous = harness.generator.generate().expect("in range");
        for step in 0..10_000 {
            if step % 1_000 == 0 {
                harness.clock.advance(1);
            }
            let current = harness.generator.generate().expect("in range");
            assert!(current > previous, "{current} should exceed {previous}");
            previous = current;
        }
    }

    #[rstest]
    fn a_fresh_tick_holds_4096_ids_then_waits(harness: Harness) {
        harness.clock.advance(1);
        let ids: Vec<_> = (0..4096)
            .map(|_| harness.generator.generate().expect("in range"))
            .collect();
        let sequences: Vec<u16> = ids.iter().map(|id| id.sequence()).collect();
        assert_eq!(sequences, (0..4096).collect::<Vec<u16>>());
        assert!(ids.iter().all(|id| id.timestamp() == 101));

        let pending = harness.generate_in_background();
        assert!(
            pending.recv_timeout(Duration::from_millis(50)).is_err(),
            "the 4097th id must wait for the next tick"
        );

        harness.clock.advance(1);
        let next = pending
            .recv_timeout(Duration::from_secs(5))
            .expect("generator wakes after the tick")
            .expect("in range");
        assert_eq!(next.timestamp(), 102);
        assert_eq!(next.sequence(), 0);
    }

    #[rstest]
    fn clock_regression_waits_until_the_clock_passes_the_last_issue(harness: Harness) {
        harness.clock.advance(100);
        let before = harness.generator.generate().expect("in range");
        assert_eq!(before.timestamp(), 200);

        harness.clock.set(EPOCH + 150);
        let pending = harness.generate_in_background();
        assert!(
            pending.recv_timeout(Duration::from_millis(50)).is_err(),
            "no id may be issued while the clock is behind"
        );

        harness.clock.set(EPOCH + 200);
        assert!(
            pending.recv_timeout(Duration::from_millis(50)).is_err(),
            "reaching the last timestamp is not enough"
        );

        harness.clock.set(EPOCH + 201);
        let after = pending
            .recv_timeout(Duration::from_secs(5))
            .expect("generator wakes once the clock recovers")
            .expect("in range");
        assert!(after > before);
        assert_eq!(after.timestamp(), 201);
    }

    #[test]
    fn past_horizon_timestamps_are_rejected() {
        let harness = Harness::at(0);
        harness.clock.set(EPOCH + MAX_TIMESTAMP + 1);
        let error = harness.generator.generate().expect_err("out of range");
        assert_eq!(
            error,
            GeneratorError::TimestampOutOfRange {
                timestamp: MAX_TIMESTAMP + 1,
                max: MAX_TIMESTAMP,
            }
        );
    }

    #[rstest]
    fn regression_before_the_epoch_is_waited_out(harness: Harness) {
        let before = harness.generator.generate().expect("in range");
        assert_eq!(before.timestamp(), 100);

        harness.clock.set(EPOCH - 5);
        let pending = harness.generate_in_background();
        assert!(
            pending.recv_timeout(Duration::from_millis(50)).is_err(),
            "a pre-epoch reading behind the last issue must wait"
        );

        harness.clock.set(EPOCH + 101);
        let after = pending
            .recv_timeout(Duration::from_secs(5))
            .expect("generator wakes once the clock recovers")
            .expect("in range");
        assert_eq!(after.timestamp(), 101);
        assert!(after > before);
    }

    #[test]
    fn fresh_generator_before_the_epoch_waits_for_it() {
        let harness = Harness::at(-50);
        let pending = harness.generate_in_background();
        assert!(
            pending.recv_timeout(Duration::from_millis(50)).is_err(),
            "no id may be issued before the epoch"
        );

        harness.clock.set(EPOCH + 1);
        let id = pending
            .recv_timeout(Duration::from_secs(5))
            .expect("generator wakes after the epoch")
            .expect("in range");
        assert_eq!(id.timestamp(), 1);
        assert_eq!(id.sequence(), 0);
    }

    #[test]
    fn rejected_readings_leave_state_untouched() {
        let harness = Harness::at(10);
        harness.clock.set(EPOCH + MAX_TIMESTAMP + 5);
        assert!(harness.generator.generate().is_err());

        harness.clock.set(EPOCH + 11);
        let id = harness.generator.generate().expect("in range");
        assert_eq!(id.timestamp(), 11);
        assert_eq!(id.sequence(), 0);
    }

    #[test]
    fn horizon_timestamp_is_still_issued() {
        let harness = Harness::at(MAX_TIMESTAMP - 1);
        harness.clock.set(EPOCH + MAX_TIMESTAMP);
        let id = harness.generator.generate().expect("last representable tick");
        assert_eq!(id.timestamp(), u64::try_from(MAX_TIMESTAMP).expect("positive"));
    }

    #[test]
    fn construction_before_epoch_floors_at_zero() {
        let harness = Harness::at(-500);
        harness.clock.set(EPOCH);
        let id = harness.generator.generate().expect("in range");
        assert_eq!(id.timestamp(), 0);
        assert_eq!(id.sequence(), 1);
    }
}
