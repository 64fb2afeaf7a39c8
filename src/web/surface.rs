//! DOM response surface: blur protected content and show the warning banner.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, HtmlElement, NodeList};

use super::observer::InsertionObserver;
use crate::error::{GuardError, Result};
use crate::surface::ResponseSurface;
use crate::watermark::PROTECTED_SELECTOR;

/// Class added to degraded elements.
pub const BLUR_CLASS: &str = "capture-guard-blurred";
/// Id of the warning banner element.
pub const WARNING_ID: &str = "capture-guard-warning";

const BLUR_FILTER: &str = "blur(12px)";
const WARNING_STYLE: &str = "position:fixed;top:16px;left:50%;transform:translateX(-50%);\
    z-index:2147483647;padding:12px 20px;border-radius:6px;background:#b00020;color:#fff;\
    font:14px/1.4 sans-serif;box-shadow:0 2px 8px rgba(0,0,0,.3);";

/// Blurs protected content and keeps blurring protected elements inserted
/// while degraded. Clones share the same observer.
#[derive(Debug, Clone)]
pub struct DomSurface {
    document: Document,
    observer: Rc<RefCell<Option<InsertionObserver>>>,
}

impl DomSurface {
    pub fn new(document: Document) -> Self {
        Self {
            document,
            observer: Rc::new(RefCell::new(None)),
        }
    }

    /// Protected elements, or `<body>` when the page marks none.
    fn blur_targets(&self) -> Vec<HtmlElement> {
        let mut targets = html_elements(self.document.query_selector_all(PROTECTED_SELECTOR));
        if targets.is_empty() {
            if let Some(body) = self.document.body() {
                targets.push(body);
            }
        }
        targets
    }

    fn set_blur(&self) -> Result<()> {
        for el in self.blur_targets() {
            blur_element(&el)?;
        }
        if self.observer.borrow().is_none() {
            if let Some(root) = self.document.document_element() {
                let observer = InsertionObserver::start(&root, |el| {
                    if let Err(e) = blur_inserted(el) {
                        log::debug!("Failed to blur inserted element: {}", e);
                    }
                })?;
                *self.observer.borrow_mut() = Some(observer);
            }
        }
        Ok(())
    }

    /// Undo every blur applied, whatever the page looks like now.
    fn clear_blur(&self) -> Result<()> {
        if let Some(observer) = self.observer.borrow_mut().take() {
            observer.disconnect();
        }
        let blurred = html_elements(self.document.query_selector_all(&format!(".{}", BLUR_CLASS)));
        for el in blurred {
            el.class_list().remove_1(BLUR_CLASS)?;
            let style = el.style();
            style.remove_property("filter")?;
            style.remove_property("transition")?;
        }
        Ok(())
    }

    fn warning_element(&self) -> Result<Element> {
        if let Some(existing) = self.document.get_element_by_id(WARNING_ID) {
            return Ok(existing);
        }
        let body = self
            .document
            .body()
            .ok_or_else(|| GuardError::MissingTarget("document.body".into()))?;
        let el = self.document.create_element("div")?;
        el.set_id(WARNING_ID);
        el.set_attribute("role", "alert")?;
        el.set_attribute("style", WARNING_STYLE)?;
        body.append_child(&el)?;
        Ok(el)
    }
}

impl ResponseSurface for DomSurface {
    fn apply_blur(&self) {
        if let Err(e) = self.set_blur() {
            log::warn!("Failed to blur protected content: {}", e);
        }
    }

    fn remove_blur(&self) {
        if let Err(e) = self.clear_blur() {
            log::warn!("Failed to restore protected content: {}", e);
        }
    }

    fn show_warning(&self, message: &str) {
        match self.warning_element() {
            Ok(el) => el.set_text_content(Some(message)),
            Err(e) if e.is_notice() => log::debug!("No warning shown: {}", e),
            Err(e) => log::warn!("Failed to show warning: {}", e),
        }
    }

    fn hide_warning(&self) {
        if let Some(el) = self.document.get_element_by_id(WARNING_ID) {
            el.remove();
        }
    }
}

fn html_elements(nodes: std::result::Result<NodeList, JsValue>) -> Vec<HtmlElement> {
    let Ok(nodes) = nodes else {
        return Vec::new();
    };
    (0..nodes.length())
        .filter_map(|i| nodes.get(i))
        .filter_map(|n| n.dyn_into::<HtmlElement>().ok())
        .collect()
}

fn blur_element(el: &HtmlElement) -> Result<()> {
    el.class_list().add_1(BLUR_CLASS)?;
    let style = el.style();
    style.set_property("filter", BLUR_FILTER)?;
    style.set_property("transition", "filter 0.2s")?;
    Ok(())
}

/// Blur protected elements in an inserted subtree, unless they already sit
/// inside blurred content.
fn blur_inserted(root: &Element) -> Result<()> {
    let inside_blurred = root
        .parent_element()
        .and_then(|p| p.closest(&format!(".{}", BLUR_CLASS)).ok().flatten())
        .is_some();
    if inside_blurred {
        return Ok(());
    }
    let mut targets = html_elements(root.query_selector_all(PROTECTED_SELECTOR));
    if root.matches(PROTECTED_SELECTOR)? {
        if let Some(el) = root.dyn_ref::<HtmlElement>() {
            targets.push(el.clone());
        }
    }
    for el in targets {
        blur_element(&el)?;
    }
    Ok(())
}
