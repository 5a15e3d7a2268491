//! Embassy-backed clock
//!
//! `TimeSource` and `MockTime` live in `kolibri_core::traits`; this adds the
//! implementation that reads the Embassy time driver.

#[cfg(feature = "embassy")]
use kolibri_core::traits::TimeSource;

/// Time source on the Embassy time driver
///
/// ```ignore
/// use kolibri::traits::{EmbassyTime, TimeSource};
///
/// let now = EmbassyTime.now_us();
/// ```
#[cfg(feature = "embassy")]
#[derive(Clone, Copy, Default)]
pub struct EmbassyTime;

#[cfg(feature = "embassy")]
impl TimeSource for EmbassyTime {
    fn now_ms(&self) -> u64 {
        embassy_time::Instant::now().as_millis()
    }

    fn now_us(&self) -> u64 {
        embassy_time::Instant::now().as_micros()
    }
}
