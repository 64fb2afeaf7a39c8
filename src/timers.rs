//! Delayed-task arena
//!
//! Pending decays and warning dismissals live here keyed by a monotonic
//! id, so they can be cancelled individually or all at once on teardown.
//! The arena never fires anything itself; a [`TimerHost`] wakes the guard
//! and the guard drains whatever is due.

use std::collections::BTreeMap;

/// Wakes the guard so it can drain due tasks.
pub trait TimerHost {
    /// Called whenever a task is scheduled for monotonic time `due_ms`,
    /// `delay_ms` from now.
    fn wake_at(&self, due_ms: f64, delay_ms: f64);
}

/// The host polls `next_due()` itself; nothing is armed.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostPolled;

impl TimerHost for HostPolled {
    fn wake_at(&self, _due_ms: f64, _delay_ms: f64) {}
}

/// Handle to a scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(u64);

#[derive(Debug)]
struct Pending<T> {
    due_ms: f64,
    task: T,
}

/// Arena of tasks waiting for a deadline.
#[derive(Debug)]
pub struct DelayedTasks<T> {
    next_id: u64,
    pending: BTreeMap<TaskId, Pending<T>>,
}

impl<T> Default for DelayedTasks<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> DelayedTasks<T> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            pending: BTreeMap::new(),
        }
    }

    /// Schedule `task` to become due at `due_ms`.
    pub fn schedule(&mut self, due_ms: f64, task: T) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.pending.insert(id, Pending { due_ms, task });
        id
    }

    /// Cancel a task. Returns the task if it was still pending.
    pub fn cancel(&mut self, id: TaskId) -> Option<T> {
        self.pending.remove(&id).map(|p| p.task)
    }

    /// Remove and return every task due at or before `now_ms`, earliest
    /// deadline first, ties broken by scheduling order.
    pub fn take_due(&mut self, now_ms: f64) -> Vec<(TaskId, T)> {
        let mut due_ids: Vec<(f64, TaskId)> = self
            .pending
            .iter()
            .filter(|(_, p)| p.due_ms <= now_ms)
            .map(|(id, p)| (p.due_ms, *id))
            .collect();
        due_ids.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        due_ids
            .into_iter()
            .filter_map(|(_, id)| self.pending.remove(&id).map(|p| (id, p.task)))
            .collect()
    }

    /// Earliest pending deadline.
    pub fn next_due(&self) -> Option<f64> {
        self.pending
            .values()
            .map(|p| p.due_ms)
            .min_by(|a, b| a.total_cmp(b))
    }

    /// Number of pending tasks matching a predicate.
    pub fn count_where(&self, mut pred: impl FnMut(&T) -> bool) -> usize {
        self.pending.values().filter(|p| pred(&p.task)).count()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drop every pending task.
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
