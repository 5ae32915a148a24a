//! Time sources for the blocking polling loops.
//!
//! Sleeping goes through [`embedded_hal::delay::DelayNs`], supplied by the HAL. Measuring
//! how long a poll has been running needs a monotonic "now", which embedded-hal does not
//! provide, so it is abstracted here as [`Clock`].
//!
//! With the `std` feature, `StdClock` implements it on top of `std::time::Instant`.

use core::time::Duration;

/// A monotonic time source.
pub trait Clock {
    /// Time elapsed since an arbitrary, fixed origin.
    fn now(&mut self) -> Duration;
}

impl<T: Clock + ?Sized> Clock for &mut T {
    fn now(&mut self) -> Duration {
        (**self).now()
    }
}

/// Whole seconds between `start` and `now`. Zero if `now` is before `start`.
pub fn elapsed_secs(start: Duration, now: Duration) -> u64 {
    now.saturating_sub(start).as_secs()
}

/// Wall clock backed by [`std::time::Instant`].
#[cfg(feature = "std")]
#[derive(Debug, Clone, Copy)]
pub struct StdClock {
    origin: std::time::Instant,
}

#[cfg(feature = "std")]
impl StdClock {
    /// Creates a clock whose origin is the current instant.
    pub fn new() -> Self {
        Self {
            origin: std::time::Instant::now(),
        }
    }
}

#[cfg(feature = "std")]
impl Default for StdClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl Clock for StdClock {
    fn now(&mut self) -> Duration {
        self.origin.elapsed()
    }
}
