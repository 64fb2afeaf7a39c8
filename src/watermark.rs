//! Session watermark tagging.
//!
//! The watermark is inert metadata stored in an attribute; rendering it is
//! left to the page's stylesheet. Tagging is idempotent: an element that
//! already carries a watermark is never touched again.

use chrono::{DateTime, Utc};

/// Attribute holding the watermark text.
pub const WATERMARK_ATTR: &str = "data-watermark";
/// Class marking protected content.
pub const PROTECTED_CLASS: &str = "protected-content";
/// Attribute marking protected content.
pub const PROTECTED_ATTR: &str = "data-protected";
/// CSS selector for protected content.
pub const PROTECTED_SELECTOR: &str = ".protected-content, [data-protected]";

/// Something that can carry a watermark.
pub trait WatermarkTarget {
    fn is_protected(&self) -> bool;
    fn watermark(&self) -> Option<String>;
    fn set_watermark(&self, text: &str);
}

/// Composite watermark text: configured label, session id, UTC minute.
pub fn compose(label: &str, session_id: &str, now_ms: f64) -> String {
    let stamp = DateTime::<Utc>::from_timestamp_millis(now_ms as i64)
        .unwrap_or_default()
        .format("%Y-%m-%d %H:%M");
    format!("{} • {} • {}", label, session_id, stamp)
}

/// Applies one fixed watermark text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Watermarker {
    text: String,
}

impl Watermarker {
    pub fn new(text: String) -> Self {
        Self { text }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Tag one element. Returns whether it was newly tagged.
    pub fn tag<T: WatermarkTarget + ?Sized>(&self, target: &T) -> bool {
        if !target.is_protected() || target.watermark().is_some() {
            return false;
        }
        target.set_watermark(&self.text);
        true
    }

    /// Tag every untagged protected element. Returns how many were tagged.
    pub fn tag_all<'a, T, I>(&self, targets: I) -> usize
    where
        T: WatermarkTarget + ?Sized + 'a,
        I: IntoIterator<Item = &'a T>,
    {
        targets.into_iter().filter(|t| self.tag(*t)).count()
    }
}
