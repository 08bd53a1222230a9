//! Millisecond clock sources consumed by the generator.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// A source of wall-clock time in Unix milliseconds.
///
/// Readings may move backwards (NTP slews, VM migration); the generator
/// tolerates that by waiting rather than trusting the clock to be monotonic.
pub trait Clock: Send + Sync {
    /// Returns the current time as milliseconds since the Unix epoch.
    fn unix_millis(&self) -> i64;
}

/// The system wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn unix_millis(&self) -> i64 {
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(elapsed) => i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX),
            Err(before) => i64::try_from(before.duration().as_millis())
                .map_or(i64::MIN, |millis| -millis),
        }
    }
}

/// A clock that only moves when told to.
///
/// Used to drive the generator through clock regressions, exhausted
/// sequences and out-of-range timestamps without depending on real time.
#[derive(Debug, Default)]
pub struct ManualClock {
    millis: AtomicI64,
}

impl ManualClock {
    /// Creates a clock frozen at `millis`.
    #[must_use]
    pub const fn new(millis: i64) -> Self {
        Self {
            millis: AtomicI64::new(millis),
        }
    }

    /// Moves the clock to `millis`, which may be earlier than the current
    /// reading.
    pub fn set(&self, millis: i64) {
        self.millis.store(millis, Ordering::SeqCst);
    }

    /// Advances the clock by `delta` milliseconds.
    pub fn advance(&self, delta: i64) {
        self.millis.fetch_add(delta, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn unix_millis(&self) -> i64 {
        self.millis.load(Ordering::SeqCst)
    }
}

impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
    fn unix_millis(&self) -> i64 {
        (**self).unix_millis()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_is_after_default_epoch() {
        assert!(SystemClock.unix_millis() > crate::DEFAULT_EPOCH_UNIX_MS);
    }

    #[test]
    fn manual_clock_moves_both_ways() {
        let clock = ManualClock::new(100);
        clock.advance(5);
        assert_eq!(clock.unix_millis(), 105);
        clock.set(90);
        assert_eq!(clock.unix_millis(), 90);
    }
}
