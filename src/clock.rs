//! Clock injection for the frame loop.
//!
//! The scoring engine never reads time itself. The monitor asks a `Clock` for
//! `now` once per tick and hands the instant to `ScoringSession::tick`.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Source of monotonic instants.
pub trait Clock: Send {
    fn now(&self) -> Instant;

    /// Wait out the remainder of a frame interval.
    ///
    /// Real clocks sleep; simulated clocks advance instead.
    fn pace(&self, interval: Duration);
}

/// Wall-clock backed by `Instant::now`.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn pace(&self, interval: Duration) {
        std::thread::sleep(interval);
    }
}

/// Simulated clock. Clones share the same current instant.
#[derive(Clone, Debug)]
pub struct ManualClock {
    current: Arc<Mutex<Instant>>,
}

impl ManualClock {
    pub fn new(start: Instant) -> Self {
        Self {
            current: Arc::new(Mutex::new(start)),
        }
    }

    pub fn starting_now() -> Self {
        Self::new(Instant::now())
    }

    pub fn advance(&self, by: Duration) {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        *current += by;
    }

    pub fn set(&self, to: Instant) {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        *current = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.current.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn pace(&self, interval: Duration) {
        self.advance(interval);
    }
}
