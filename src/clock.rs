use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;

/// Monotonic, non-decreasing timestamp source consumed by the scheduler.
pub trait TimeSource {
    fn now(&self) -> Duration;
}

/// Wall clock measured from the moment the clock was created.
#[derive(Debug, Clone, Copy)]
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

impl TimeSource for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Clock that only moves when told to. Clones share the same timeline.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<RwLock<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(now: Duration) -> Self {
        Self {
            now: Arc::new(RwLock::new(now)),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.now.write() += by;
    }

    pub fn advance_secs(&self, secs: f64) {
        self.advance(Duration::from_secs_f64(secs));
    }

    /// Moves the clock to `now`. Earlier timestamps are ignored so the clock never runs backwards.
    pub fn set(&self, now: Duration) {
        let mut guard = self.now.write();
        if now > *guard {
            *guard = now;
        }
    }
}

impl TimeSource for ManualClock {
    fn now(&self) -> Duration {
        *self.now.read()
    }
}

impl<T> TimeSource for Arc<T>
where
    T: TimeSource + ?Sized,
{
    fn now(&self) -> Duration {
        (**self).now()
    }
}
