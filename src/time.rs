//! Time source seam.
//!
//! [`AthleteClock`](crate::clock::AthleteClock) measures elapsed wall time
//! between control operations. The [`TimeSource`] trait decouples that
//! measurement from the host clock so tests can drive time by hand.

use parking_lot::Mutex;
use std::time::{Duration, Instant};

/// Monotonic time since some fixed origin.
///
/// Only differences between readings matter; the origin itself is arbitrary.
pub trait TimeSource: Send + Sync {
    fn now(&self) -> Duration;
}

/// Wall-clock time source backed by [`Instant`].
pub struct SystemTimeSource {
    origin: Instant,
}

impl SystemTimeSource {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Hand-driven time source for deterministic tests.
pub struct ManualTimeSource {
    now: Mutex<Duration>,
}

impl ManualTimeSource {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, delta: Duration) {
        *self.now.lock() += delta;
    }

    pub fn advance_hours(&self, hours: f64) {
        self.advance(Duration::from_secs_f64(hours * 3600.0));
    }
}

impl Default for ManualTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> Duration {
        *self.now.lock()
    }
}
