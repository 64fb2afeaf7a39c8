//! Capture shortcut matching.
//!
//! The browser never sees keys the OS swallows, so this only catches
//! shortcuts that reach the page.

use crate::event::EventKind;
use serde::{Deserialize, Serialize};

/// The parts of a `keydown`/`keyup` event the matcher looks at.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPress {
    /// `KeyboardEvent.key`
    pub key: String,
    /// `KeyboardEvent.code`
    pub code: String,
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub meta: bool,
}

impl KeyPress {
    pub fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
            ..Default::default()
        }
    }

    pub fn ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn shift(mut self) -> Self {
        self.shift = true;
        self
    }

    pub fn alt(mut self) -> Self {
        self.alt = true;
        self
    }

    pub fn meta(mut self) -> Self {
        self.meta = true;
        self
    }

    pub fn with_code(mut self, code: &str) -> Self {
        self.code = code.to_string();
        self
    }

    fn is(&self, key: &str, code: &str) -> bool {
        self.key.eq_ignore_ascii_case(key) || self.code == code
    }
}

/// Classify a key press against the known capture shortcuts.
pub fn classify(press: &KeyPress) -> Option<EventKind> {
    if press.is("PrintScreen", "PrintScreen") {
        // Win+PrtSc and Alt+PrtSc save or grab the window directly
        return Some(if press.meta || press.alt {
            EventKind::WindowsPrintscreen
        } else {
            EventKind::PrintscreenKey
        });
    }

    if press.shift && (press.ctrl || press.meta) && press.is("s", "KeyS") {
        return Some(EventKind::CtrlShiftS);
    }

    if press.meta && press.shift {
        // Shift turns digits into symbols on most layouts; `code` keeps the digit
        if press.is("3", "Digit3") {
            return Some(EventKind::MacCmdShift3);
        }
        if press.is("4", "Digit4") {
            return Some(EventKind::MacCmdShift4);
        }
        if press.is("5", "Digit5") {
            return Some(EventKind::MacCmdShift5);
        }
    }

    None
}

/// Classify a key release. Only PrintScreen counts: Windows hands the
/// page its `keyup` but swallows the `keydown`.
pub fn classify_release(press: &KeyPress) -> Option<EventKind> {
    classify(press).filter(|kind| {
        matches!(
            kind,
            EventKind::PrintscreenKey | EventKind::WindowsPrintscreen
        )
    })
}
