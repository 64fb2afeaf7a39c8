//! Copy, paste, select and drag filters for marked elements.

use crate::event::EventKind;
use serde::{Deserialize, Serialize};

/// Clipboard payload written in place of blocked content.
pub const REDACTION_PLACEHOLDER: &str = "[Content protected]";

/// The four protection kinds, each with its own opt-in marker attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtectionKind {
    Copy,
    Paste,
    Select,
    Drag,
}

impl ProtectionKind {
    pub const ALL: [ProtectionKind; 4] = [
        ProtectionKind::Copy,
        ProtectionKind::Paste,
        ProtectionKind::Select,
        ProtectionKind::Drag,
    ];

    /// Marker attribute that opts an element into this protection.
    pub fn marker(&self) -> &'static str {
        match self {
            ProtectionKind::Copy => "data-no-copy",
            ProtectionKind::Paste => "data-no-paste",
            ProtectionKind::Select => "data-no-select",
            ProtectionKind::Drag => "data-no-drag",
        }
    }

    /// DOM event name the filter listens to.
    pub fn dom_event(&self) -> &'static str {
        match self {
            ProtectionKind::Copy => "copy",
            ProtectionKind::Paste => "paste",
            ProtectionKind::Select => "selectstart",
            ProtectionKind::Drag => "dragstart",
        }
    }

    pub fn event_kind(&self) -> EventKind {
        match self {
            ProtectionKind::Copy => EventKind::CopyAttempted,
            ProtectionKind::Paste => EventKind::PasteAttempted,
            ProtectionKind::Select => EventKind::SelectAttempted,
            ProtectionKind::Drag => EventKind::DragAttempted,
        }
    }
}

/// What the filter needs to know about the event target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementInfo {
    pub id: String,
    pub tag: String,
    /// Marker attributes present on the closest marked ancestor
    pub markers: Vec<String>,
}

impl ElementInfo {
    pub fn new(id: &str, tag: &str) -> Self {
        Self {
            id: id.to_string(),
            tag: tag.to_lowercase(),
            markers: Vec::new(),
        }
    }

    pub fn with_marker(mut self, kind: ProtectionKind) -> Self {
        self.markers.push(kind.marker().to_string());
        self
    }

    pub fn is_marked(&self, kind: ProtectionKind) -> bool {
        self.markers.iter().any(|m| m == kind.marker())
    }

    /// Identifier used in log details: the id, else the tag name.
    pub fn label(&self) -> &str {
        if self.id.is_empty() {
            &self.tag
        } else {
            &self.id
        }
    }
}

/// Outcome of a blocked action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardBlock {
    pub event: EventKind,
    pub details: String,
    /// Payload to put on the clipboard instead of the selection
    pub clipboard: Option<&'static str>,
}

/// Decide whether an action on `element` is blocked.
pub fn evaluate(kind: ProtectionKind, element: &ElementInfo) -> Option<GuardBlock> {
    if !element.is_marked(kind) {
        return None;
    }
    Some(GuardBlock {
        event: kind.event_kind(),
        details: element.label().to_string(),
        clipboard: matches!(kind, ProtectionKind::Copy).then_some(REDACTION_PLACEHOLDER),
    })
}
