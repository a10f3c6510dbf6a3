//! Wall-clock time used for pending-capture expiry
//!
//! - `Clock` - source of the current time in milliseconds
//! - `SystemClock` - real time via chrono
//! - `ManualClock` - hand-advanced time for tests and replays

use chrono::Utc;
use std::sync::atomic::{AtomicI64, Ordering};

/// Milliseconds since the Unix epoch
pub type Millis = i64;

/// Source of the current time
pub trait Clock: Send + Sync {
    /// Current time in milliseconds
    fn now_ms(&self) -> Millis;
}

/// Real wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> Millis {
        Utc::now().timestamp_millis()
    }
}

/// A clock that only moves when told to
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    /// Create a clock stopped at `start` milliseconds
    pub fn new(start: Millis) -> Self {
        Self {
            now: AtomicI64::new(start),
        }
    }

    /// Move the clock forward
    pub fn advance(&self, millis: Millis) {
        self.now.fetch_add(millis, Ordering::SeqCst);
    }

    /// Jump to an absolute time
    pub fn set(&self, millis: Millis) {
        self.now.store(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> Millis {
        self.now.load(Ordering::SeqCst)
    }
}
