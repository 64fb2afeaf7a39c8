//! Time sources.
//!
//! Two readings: wall-clock time for timestamps people read (log records,
//! watermarks), and monotonic time for everything that measures intervals
//! (debounce, burst windows, task deadlines). The wall clock may step
//! backwards; the monotonic one never does.

use std::cell::Cell;
use std::rc::Rc;

use web_time::Instant;

/// Millisecond time source used by the guard.
pub trait Clock {
    /// Milliseconds since the Unix epoch.
    fn now_ms(&self) -> f64;

    /// Milliseconds since an arbitrary origin. Never decreases.
    fn monotonic_ms(&self) -> f64;
}

/// Browser `Date.now()` / `performance.now()` on wasm32, `SystemTime` /
/// `Instant` elsewhere.
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

impl Clock for SystemClock {
    fn now_ms(&self) -> f64 {
        #[cfg(target_arch = "wasm32")]
        {
            js_sys::Date::now()
        }
        #[cfg(not(target_arch = "wasm32"))]
        {
            use std::time::{SystemTime, UNIX_EPOCH};
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_millis() as f64
        }
    }

    fn monotonic_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1_000.0
    }
}

/// Manually driven clock. Clones share the same time.
///
/// [`advance`](ManualClock::advance) moves both readings; [`set`](ManualClock::set)
/// steps only the wall clock, the way an NTP correction would.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    wall: Rc<Cell<f64>>,
    monotonic: Rc<Cell<f64>>,
}

impl ManualClock {
    pub fn new(start_ms: f64) -> Self {
        Self {
            wall: Rc::new(Cell::new(start_ms)),
            monotonic: Rc::new(Cell::new(0.0)),
        }
    }

    pub fn set(&self, ms: f64) {
        self.wall.set(ms);
    }

    pub fn advance(&self, ms: f64) {
        self.wall.set(self.wall.get() + ms);
        self.monotonic.set(self.monotonic.get() + ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        self.wall.get()
    }

    fn monotonic_ms(&self) -> f64 {
        self.monotonic.get()
    }
}
