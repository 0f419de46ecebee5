//! Time sources
//!
//! Ledger components never read the wall clock directly; they hold an
//! `Arc<dyn Clock>` so tests can pin timestamps and stake ages.

use parking_lot::Mutex;

pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Seconds since the Unix epoch, fractional.
pub trait Clock: Send + Sync {
    fn now(&self) -> f64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Mutex<f64>,
}

impl ManualClock {
    pub fn new(start: f64) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, secs: f64) {
        *self.now.lock() = secs;
    }

    pub fn advance(&self, secs: f64) {
        *self.now.lock() += secs;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        *self.now.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_moves_only_when_told() {
        let clock = ManualClock::new(1_000.0);
        assert_eq!(clock.now(), 1_000.0);
        clock.advance(SECONDS_PER_DAY);
        assert_eq!(clock.now(), 1_000.0 + SECONDS_PER_DAY);
        clock.set(5.0);
        assert_eq!(clock.now(), 5.0);
    }

    #[test]
    fn test_system_clock_is_after_2020() {
        assert!(SystemClock.now() > 1_577_836_800.0);
    }
}
