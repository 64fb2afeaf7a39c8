//! Response surface: where blur and warnings become visible.

use std::cell::RefCell;
use std::rc::Rc;

/// Default warning text.
pub const WARNING_MESSAGE: &str =
    "Screen capture of this content is not permitted. This attempt has been logged.";

/// Visual side effects driven by the guard.
pub trait ResponseSurface {
    fn apply_blur(&self);
    fn remove_blur(&self);
    fn show_warning(&self, message: &str);
    fn hide_warning(&self);
}

/// Surface that does nothing, for headless use.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSurface;

impl ResponseSurface for NullSurface {
    fn apply_blur(&self) {}
    fn remove_blur(&self) {}
    fn show_warning(&self, _message: &str) {}
    fn hide_warning(&self) {}
}

/// One observed surface call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceCall {
    Blur,
    Unblur,
    ShowWarning(String),
    HideWarning,
}

/// Records calls. Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    calls: Rc<RefCell<Vec<SurfaceCall>>>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<SurfaceCall> {
        self.calls.borrow().clone()
    }

    pub fn count(&self, call: &SurfaceCall) -> usize {
        self.calls.borrow().iter().filter(|c| *c == call).count()
    }
}

impl ResponseSurface for RecordingSurface {
    fn apply_blur(&self) {
        self.calls.borrow_mut().push(SurfaceCall::Blur);
    }

    fn remove_blur(&self) {
        self.calls.borrow_mut().push(SurfaceCall::Unblur);
    }

    fn show_warning(&self, message: &str) {
        self.calls
            .borrow_mut()
            .push(SurfaceCall::ShowWarning(message.to_string()));
    }

    fn hide_warning(&self) {
        self.calls.borrow_mut().push(SurfaceCall::HideWarning);
    }
}
