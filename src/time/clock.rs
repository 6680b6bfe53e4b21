// Clocks for the animation domain
// Time is expressed as f64 seconds since the clock's origin

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// A monotonic time source
pub trait Clock: Send + Sync {
    /// Seconds elapsed since this clock's origin
    fn now(&self) -> f64;
}

/// Wall-clock time based on `Instant`
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Virtual clock advanced explicitly by tests
///
/// Clones share the same time, so a test can keep one handle while the
/// scheduler owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<Mutex<f64>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a clock starting at `seconds`
    pub fn starting_at(seconds: f64) -> Self {
        Self {
            now: Arc::new(Mutex::new(seconds)),
        }
    }

    /// Move time forward
    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by.as_secs_f64();
    }

    /// Move time forward by fractional seconds
    pub fn advance_secs(&self, seconds: f64) {
        *self.now.lock() += seconds;
    }

    /// Jump to an absolute time. Going backwards is ignored.
    pub fn set(&self, seconds: f64) {
        let mut now = self.now.lock();
        if seconds > *now {
            *now = seconds;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        *self.now.lock()
    }
}
