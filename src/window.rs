//! Bounded time window: append, evict expired, count.

use std::collections::VecDeque;

/// Timestamps younger than a fixed horizon.
#[derive(Debug, Clone)]
pub struct TimeWindow {
    horizon_ms: f64,
    stamps: VecDeque<f64>,
}

impl TimeWindow {
    pub fn new(horizon_ms: f64) -> Self {
        Self {
            horizon_ms,
            stamps: VecDeque::new(),
        }
    }

    /// Append `now_ms`, evict stale entries and return the resulting count.
    pub fn record(&mut self, now_ms: f64) -> usize {
        self.stamps.push_back(now_ms);
        self.evict(now_ms);
        self.stamps.len()
    }

    /// Drop every entry with `now - t >= horizon`.
    pub fn evict(&mut self, now_ms: f64) {
        while let Some(&oldest) = self.stamps.front() {
            if now_ms - oldest < self.horizon_ms {
                break;
            }
            self.stamps.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.stamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stamps.is_empty()
    }

    pub fn clear(&mut self) {
        self.stamps.clear();
    }

    pub fn horizon_ms(&self) -> f64 {
        self.horizon_ms
    }
}
