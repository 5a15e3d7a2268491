//! Monotonic time for the flight pipeline
//!
//! The control code itself takes timestamps as plain `u64` microseconds; a
//! `TimeSource` is what the integration layer reads them from.

use core::cell::Cell;

/// Monotonic microsecond clock since boot
///
/// # Example
///
/// ```
/// use kolibri_core::traits::{MockTime, TimeSource};
///
/// fn link_lost<T: TimeSource>(time: &T, last_rc_us: u64) -> bool {
///     time.elapsed_since(last_rc_us) >= 500_000
/// }
///
/// let time = MockTime::new();
/// time.advance(400_000);
/// assert!(!link_lost(&time, 0));
/// time.advance(100_000);
/// assert!(link_lost(&time, 0));
/// ```
pub trait TimeSource: Clone + Send + Sync {
    fn now_ms(&self) -> u64;

    fn now_us(&self) -> u64;

    /// Microseconds since `reference_us`, zero if the reference is ahead
    fn elapsed_since(&self, reference_us: u64) -> u64 {
        self.now_us().saturating_sub(reference_us)
    }
}

/// Hand-driven clock for host tests and the SITL harness
#[derive(Clone, Default)]
pub struct MockTime {
    current_us: Cell<u64>,
}

// Safety: MockTime is only shared inside single-threaded tests and the
// simulator; the Send + Sync bounds exist for the embedded time source.
unsafe impl Send for MockTime {}
unsafe impl Sync for MockTime {}

impl MockTime {
    pub fn new() -> Self {
        Self {
            current_us: Cell::new(0),
        }
    }

    pub fn with_initial(us: u64) -> Self {
        Self {
            current_us: Cell::new(us),
        }
    }

    pub fn set(&self, us: u64) {
        self.current_us.set(us);
    }

    pub fn advance(&self, us: u64) {
        self.current_us.set(self.current_us.get() + us);
    }

    /// Advance by one period of a loop running at `rate_hz`
    pub fn tick(&self, rate_hz: u32) {
        self.advance(1_000_000 / rate_hz.max(1) as u64);
    }
}

impl TimeSource for MockTime {
    fn now_ms(&self) -> u64 {
        self.current_us.get() / 1000
    }

    fn now_us(&self) -> u64 {
        self.current_us.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_time_starts_at_zero() {
        let time = MockTime::new();
        assert_eq!(time.now_us(), 0);
        assert_eq!(time.now_ms(), 0);
    }

    #[test]
    fn test_mock_time_initial_and_set() {
        let time = MockTime::with_initial(5_000_000);
        assert_eq!(time.now_ms(), 5000);
        time.set(1_999);
        assert_eq!(time.now_ms(), 1);
    }

    #[test]
    fn test_mock_time_tick_at_gyro_rate() {
        let time = MockTime::new();
        for _ in 0..3200 {
            time.tick(3200);
        }
        // 312 us per tick at 3200 Hz
        assert_eq!(time.now_us(), 998_400);
    }

    #[test]
    fn test_elapsed_since_saturates() {
        let time = MockTime::with_initial(1_000);
        assert_eq!(time.elapsed_since(300), 700);
        assert_eq!(time.elapsed_since(5_000), 0);
    }
}
