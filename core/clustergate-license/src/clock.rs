//! Time source for validity-window checks.

use std::sync::atomic::{AtomicI64, Ordering};

/// Supplies "now" as UTC epoch seconds.
pub trait Clock: Send + Sync {
    /// Current time, UTC epoch seconds.
    fn now(&self) -> i64;
}

/// Wall clock. A wrong system clock is not detected.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

/// A settable clock for tests and replay.
#[derive(Debug, Default)]
pub struct FixedClock {
    now: AtomicI64,
}

impl FixedClock {
    /// Creates a clock frozen at `now`.
    #[must_use]
    pub fn new(now: i64) -> Self {
        Self {
            now: AtomicI64::new(now),
        }
    }

    /// Moves the clock to `now`.
    pub fn set(&self, now: i64) {
        self.now.store(now, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}
