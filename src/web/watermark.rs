//! Watermark coverage via MutationObserver
//!
//! Tags protected elements already in the document, then watches for
//! inserted subtrees and tags protected elements inside them as well.

use wasm_bindgen::JsCast;
use web_sys::{Document, Element};

use super::observer::InsertionObserver;
use crate::error::{GuardError, Result};
use crate::watermark::{
    WatermarkTarget, Watermarker, PROTECTED_ATTR, PROTECTED_CLASS, PROTECTED_SELECTOR,
    WATERMARK_ATTR,
};

impl WatermarkTarget for Element {
    fn is_protected(&self) -> bool {
        self.class_list().contains(PROTECTED_CLASS) || self.has_attribute(PROTECTED_ATTR)
    }

    fn watermark(&self) -> Option<String> {
        self.get_attribute(WATERMARK_ATTR)
    }

    fn set_watermark(&self, text: &str) {
        if let Err(e) = self.set_attribute(WATERMARK_ATTR, text) {
            log::debug!("Failed to set watermark: {:?}", e);
        }
    }
}

/// Tag `root` itself and every protected descendant.
pub fn tag_subtree(marker: &Watermarker, root: &Element) -> usize {
    let mut tagged = usize::from(marker.tag(root));
    if let Ok(nodes) = root.query_selector_all(PROTECTED_SELECTOR) {
        for i in 0..nodes.length() {
            if let Some(el) = nodes.get(i).and_then(|n| n.dyn_into::<Element>().ok()) {
                tagged += usize::from(marker.tag(&el));
            }
        }
    }
    tagged
}

/// Live watermark observer. Disconnects on drop.
#[derive(Debug)]
pub struct WatermarkObserver {
    inner: InsertionObserver,
}

impl WatermarkObserver {
    /// Tag the current document and start observing it.
    pub fn start(document: &Document, marker: Watermarker) -> Result<Self> {
        let root = document
            .document_element()
            .ok_or_else(|| GuardError::MissingTarget("document.documentElement".into()))?;

        let tagged = tag_subtree(&marker, &root);
        log::info!("💧 Watermarked {} protected elements", tagged);

        let inner = InsertionObserver::start(&root, move |el| {
            let tagged = tag_subtree(&marker, el);
            if tagged > 0 {
                log::debug!("Watermarked {} inserted elements", tagged);
            }
        })?;
        Ok(Self { inner })
    }

    pub fn disconnect(&self) {
        self.inner.disconnect();
    }
}
