//! Detection kinds and the audit record shipped to the logging endpoint.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Every event tag the guard can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    PrintscreenKey,
    CtrlShiftS,
    #[serde(rename = "mac_cmd_shift_3")]
    MacCmdShift3,
    #[serde(rename = "mac_cmd_shift_4")]
    MacCmdShift4,
    #[serde(rename = "mac_cmd_shift_5")]
    MacCmdShift5,
    WindowsPrintscreen,
    VisibilitySpam,
    FocusLossSpam,
    LowFrameRate,
    CopyAttempted,
    PasteAttempted,
    SelectAttempted,
    DragAttempted,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::PrintscreenKey => "printscreen_key",
            EventKind::CtrlShiftS => "ctrl_shift_s",
            EventKind::MacCmdShift3 => "mac_cmd_shift_3",
            EventKind::MacCmdShift4 => "mac_cmd_shift_4",
            EventKind::MacCmdShift5 => "mac_cmd_shift_5",
            EventKind::WindowsPrintscreen => "windows_printscreen",
            EventKind::VisibilitySpam => "visibility_spam",
            EventKind::FocusLossSpam => "focus_loss_spam",
            EventKind::LowFrameRate => "low_frame_rate",
            EventKind::CopyAttempted => "copy_attempted",
            EventKind::PasteAttempted => "paste_attempted",
            EventKind::SelectAttempted => "select_attempted",
            EventKind::DragAttempted => "drag_attempted",
        }
    }

    /// Kinds that go through the debounce gate and can degrade content.
    pub fn escalates(&self) -> bool {
        matches!(
            self,
            EventKind::PrintscreenKey
                | EventKind::CtrlShiftS
                | EventKind::MacCmdShift3
                | EventKind::MacCmdShift4
                | EventKind::MacCmdShift5
                | EventKind::WindowsPrintscreen
                | EventKind::VisibilitySpam
                | EventKind::FocusLossSpam
        )
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified capture signal from one of the detectors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    pub kind: EventKind,
    /// Which detector produced it, e.g. "keyboard"
    pub source: &'static str,
}

impl Detection {
    pub fn new(kind: EventKind, source: &'static str) -> Self {
        Self { kind, source }
    }
}

/// Static facts about the page, sampled once at startup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageContext {
    pub url: String,
    pub user_agent: String,
    pub screen_width: u32,
    pub screen_height: u32,
}

impl PageContext {
    /// `WIDTHxHEIGHT`
    pub fn screen_resolution(&self) -> String {
        format!("{}x{}", self.screen_width, self.screen_height)
    }
}

/// The JSON record delivered to the logging endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEvent {
    pub event_type: String,
    pub details: String,
    pub timestamp: String,
    pub url: String,
    pub user_agent: String,
    pub screen_resolution: String,
}

impl LogEvent {
    pub fn new(event_type: &str, details: &str, now_ms: f64, page: &PageContext) -> Self {
        Self {
            event_type: event_type.to_string(),
            details: details.to_string(),
            timestamp: iso_timestamp(now_ms),
            url: page.url.clone(),
            user_agent: page.user_agent.clone(),
            screen_resolution: page.screen_resolution(),
        }
    }

    pub fn to_json(&self) -> String {
        // Only plain strings inside, serialization cannot fail
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// ISO-8601 with millisecond precision, matching `Date.prototype.toISOString`.
pub fn iso_timestamp(ms: f64) -> String {
    DateTime::<Utc>::from_timestamp_millis(ms as i64)
        .unwrap_or_default()
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}
