//! Page probing: context for log records, cookies, activation marker.

use wasm_bindgen::JsCast;
use web_sys::{Document, HtmlDocument, Window};

use crate::event::PageContext;

/// Attribute on `<html>` that activates the guard on load.
pub const ACTIVATION_ATTR: &str = "data-capture-guard";

/// Sample url, user agent and screen size once.
pub fn probe(window: &Window) -> PageContext {
    let url = window.location().href().unwrap_or_default();
    let user_agent = window.navigator().user_agent().unwrap_or_default();
    let (screen_width, screen_height) = window
        .screen()
        .map(|s| {
            (
                s.width().unwrap_or(0).max(0) as u32,
                s.height().unwrap_or(0).max(0) as u32,
            )
        })
        .unwrap_or((0, 0));

    PageContext {
        url,
        user_agent,
        screen_width,
        screen_height,
    }
}

/// `document.cookie`, or empty when unavailable.
pub fn cookies(document: &Document) -> String {
    document
        .dyn_ref::<HtmlDocument>()
        .and_then(|html| html.cookie().ok())
        .unwrap_or_default()
}

/// Whether the host page asked for activation.
pub fn activation_requested(document: &Document) -> bool {
    document
        .document_element()
        .and_then(|root| root.get_attribute(ACTIVATION_ATTR))
        .map(|value| value.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}
