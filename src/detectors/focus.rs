//! Tab-visibility and window-focus burst detection.

use crate::config::{FOCUS_LOSS_BURST, FOCUS_LOSS_WINDOW_MS, VISIBILITY_BURST, VISIBILITY_WINDOW_MS};
use crate::event::EventKind;
use crate::window::TimeWindow;

/// Two independent sliding windows; each clears when its burst fires.
#[derive(Debug, Clone)]
pub struct FocusDetector {
    visibility: TimeWindow,
    focus_loss: TimeWindow,
}

impl Default for FocusDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl FocusDetector {
    pub fn new() -> Self {
        Self {
            visibility: TimeWindow::new(VISIBILITY_WINDOW_MS),
            focus_loss: TimeWindow::new(FOCUS_LOSS_WINDOW_MS),
        }
    }

    pub fn on_visibility_change(&mut self, now_ms: f64) -> Option<EventKind> {
        let count = self.visibility.record(now_ms);
        if count > VISIBILITY_BURST {
            log::debug!("Visibility burst: {} changes", count);
            self.visibility.clear();
            return Some(EventKind::VisibilitySpam);
        }
        None
    }

    pub fn on_focus_lost(&mut self, now_ms: f64) -> Option<EventKind> {
        let count = self.focus_loss.record(now_ms);
        if count > FOCUS_LOSS_BURST {
            log::debug!("Focus-loss burst: {} blurs", count);
            self.focus_loss.clear();
            return Some(EventKind::FocusLossSpam);
        }
        None
    }

    /// Regaining focus is normal and must not count toward the next burst.
    pub fn on_focus_gained(&mut self) {
        self.focus_loss.clear();
    }

    pub fn visibility_pending(&self) -> usize {
        self.visibility.len()
    }

    pub fn focus_loss_pending(&self) -> usize {
        self.focus_loss.len()
    }
}
