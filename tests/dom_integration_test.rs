//! Capture guard browser integration tests
//!
//! Run with: wasm-pack test --headless --chrome
//! (or --firefox)

#![cfg(target_arch = "wasm32")]

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::{Promise, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use wasm_bindgen_test::*;
use web_sys::{Document, Element};

use capture_guard::web::{
    self, page, surface::BLUR_CLASS, watermark::tag_subtree, DomEventSource, DomSurface,
    WatermarkObserver,
};
use capture_guard::{
    attach, detach, CaptureGuard, EventSource, MemorySink, RecordingSurface, ResponseSurface,
    Signal, SignalKind, SignalOutcome, Watermarker,
};
use gloo_timers::future::TimeoutFuture;
use std::cell::Cell;

wasm_bindgen_test_configure!(run_in_browser);

fn document() -> Document {
    web_sys::window().unwrap().document().unwrap()
}

fn mount(html: &str) -> Element {
    let doc = document();
    let host = doc.create_element("div").unwrap();
    host.set_inner_html(html);
    doc.body().unwrap().append_child(&host).unwrap();
    host
}

async fn next_microtask() {
    JsFuture::from(Promise::resolve(&JsValue::NULL)).await.unwrap();
}

fn get(obj: &JsValue, key: &str) -> JsValue {
    Reflect::get(obj, &JsValue::from_str(key)).unwrap()
}

// ===== Watermark Tests =====

#[wasm_bindgen_test]
fn watermark_tags_protected_elements_once() {
    let host = mount(
        r#"<p id="wm-plain">plain</p>
           <section id="wm-class" class="protected-content">a</section>
           <div id="wm-attr" data-protected>b</div>"#,
    );
    let marker = Watermarker::new("CONFIDENTIAL • T3ST0001 • 2024-01-01 09:00".into());

    assert_eq!(tag_subtree(&marker, &host), 2);
    assert_eq!(tag_subtree(&marker, &host), 0, "second pass must be a no-op");

    let doc = document();
    let tagged = doc.get_element_by_id("wm-class").unwrap();
    assert_eq!(
        tagged.get_attribute("data-watermark").as_deref(),
        Some(marker.text())
    );
    assert!(doc
        .get_element_by_id("wm-plain")
        .unwrap()
        .get_attribute("data-watermark")
        .is_none());
    host.remove();
}

#[wasm_bindgen_test]
async fn observer_tags_inserted_elements() {
    let doc = document();
    let marker = Watermarker::new("INTERNAL • OBS00001 • 2024-01-01 09:00".into());
    let observer = WatermarkObserver::start(&doc, marker).unwrap();

    let host = mount(r#"<article id="obs-late" class="protected-content">late</article>"#);
    next_microtask().await;

    let late = doc.get_element_by_id("obs-late").unwrap();
    assert_eq!(
        late.get_attribute("data-watermark").as_deref(),
        Some("INTERNAL • OBS00001 • 2024-01-01 09:00")
    );

    observer.disconnect();
    let after = mount(r#"<div id="obs-after" data-protected>after</div>"#);
    next_microtask().await;
    assert!(doc
        .get_element_by_id("obs-after")
        .unwrap()
        .get_attribute("data-watermark")
        .is_none());

    host.remove();
    after.remove();
}

// ===== Event Source Tests =====

fn dom_guard() -> (Rc<RefCell<CaptureGuard>>, MemorySink, RecordingSurface) {
    let sink = MemorySink::new();
    let surface = RecordingSurface::new();
    let guard = CaptureGuard::new()
        .with_sink(sink.clone())
        .with_surface(surface.clone());
    (Rc::new(RefCell::new(guard)), sink, surface)
}

#[wasm_bindgen_test]
fn copy_on_marked_element_is_blocked() {
    let host = mount(r#"<table id="salaries" data-no-copy><tr><td id="cell">42</td></tr></table>"#);
    let (guard, sink, _) = dom_guard();
    let window = web_sys::window().unwrap();
    let mut source = DomEventSource::new(window, document());
    let ids = attach(&guard, &mut source);

    let allowed = js_sys::eval(
        "document.getElementById('cell').dispatchEvent(\
            new Event('copy', { bubbles: true, cancelable: true }))",
    )
    .unwrap();
    assert_eq!(allowed, JsValue::FALSE, "copy should be cancelled");

    let events = sink.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, "copy_attempted");
    assert_eq!(events[0].details, "salaries");

    detach(&mut source, &ids);
    let allowed = js_sys::eval(
        "document.getElementById('cell').dispatchEvent(\
            new Event('copy', { bubbles: true, cancelable: true }))",
    )
    .unwrap();
    assert_eq!(allowed, JsValue::TRUE, "detached source must not intervene");
    host.remove();
}

#[wasm_bindgen_test]
fn unmarked_copy_passes_through() {
    let host = mount(r#"<p id="free-text" data-no-paste>free</p>"#);
    let (guard, sink, _) = dom_guard();
    let mut source = DomEventSource::new(web_sys::window().unwrap(), document());
    attach(&guard, &mut source);

    let allowed = js_sys::eval(
        "document.getElementById('free-text').dispatchEvent(\
            new Event('copy', { bubbles: true, cancelable: true }))",
    )
    .unwrap();
    assert_eq!(allowed, JsValue::TRUE);
    assert!(sink.is_empty());
    host.remove();
}

#[wasm_bindgen_test]
fn capture_shortcut_is_suppressed_and_logged() {
    let (guard, sink, surface) = dom_guard();
    let mut source = DomEventSource::new(web_sys::window().unwrap(), document());
    attach(&guard, &mut source);

    let allowed = js_sys::eval(
        "document.dispatchEvent(\
            new KeyboardEvent('keydown', { key: 'PrintScreen', cancelable: true }))",
    )
    .unwrap();
    assert_eq!(allowed, JsValue::FALSE);
    assert!(sink.event_types().contains(&"printscreen_key".to_string()));
    assert_eq!(guard.borrow().state().recording_likelihood, 1);
    assert!(surface.count(&capture_guard::SurfaceCall::Blur) >= 1);

    let allowed = js_sys::eval(
        "document.dispatchEvent(\
            new KeyboardEvent('keydown', { key: 'p', ctrlKey: true, cancelable: true }))",
    )
    .unwrap();
    assert_eq!(allowed, JsValue::TRUE);
}

#[wasm_bindgen_test]
fn print_screen_keyup_is_detected() {
    let (guard, sink, _) = dom_guard();
    let mut source = DomEventSource::new(web_sys::window().unwrap(), document());
    attach(&guard, &mut source);

    let allowed = js_sys::eval(
        "document.dispatchEvent(\
            new KeyboardEvent('keyup', { key: 'PrintScreen', cancelable: true }))",
    )
    .unwrap();
    assert_eq!(allowed, JsValue::FALSE);
    assert_eq!(sink.event_types(), vec!["printscreen_key".to_string()]);

    let allowed = js_sys::eval(
        "document.dispatchEvent(\
            new KeyboardEvent('keyup', { key: 's', ctrlKey: true, shiftKey: true, cancelable: true }))",
    )
    .unwrap();
    assert_eq!(allowed, JsValue::TRUE);
    assert_eq!(sink.len(), 1);
}

#[wasm_bindgen_test]
fn visibility_burst_from_dom_events() {
    let (guard, sink, _) = dom_guard();
    let mut source = DomEventSource::new(web_sys::window().unwrap(), document());
    attach(&guard, &mut source);

    for _ in 0..6 {
        js_sys::eval("document.dispatchEvent(new Event('visibilitychange'))").unwrap();
    }
    assert_eq!(sink.event_types(), vec!["visibility_spam".to_string()]);
}

#[wasm_bindgen_test]
fn focus_loss_burst_from_window_events() {
    let (guard, sink, _) = dom_guard();
    let mut source = DomEventSource::new(web_sys::window().unwrap(), document());
    attach(&guard, &mut source);

    for _ in 0..3 {
        js_sys::eval("window.dispatchEvent(new Event('blur'))").unwrap();
    }
    js_sys::eval("window.dispatchEvent(new Event('focus'))").unwrap();
    js_sys::eval("window.dispatchEvent(new Event('blur'))").unwrap();
    assert!(sink.is_empty(), "focus must reset the burst");

    for _ in 0..3 {
        js_sys::eval("window.dispatchEvent(new Event('blur'))").unwrap();
    }
    assert_eq!(sink.event_types(), vec!["focus_loss_spam".to_string()]);
}

#[wasm_bindgen_test]
async fn animation_frames_flow_until_unsubscribed() {
    let mut source = DomEventSource::new(web_sys::window().unwrap(), document());
    let frames = Rc::new(Cell::new(0u32));
    let counter = Rc::clone(&frames);
    let id = source.subscribe(
        SignalKind::AnimationFrame,
        Box::new(move |signal| {
            if let Signal::AnimationFrame(_) = signal {
                counter.set(counter.get() + 1);
            }
            SignalOutcome::default()
        }),
    );

    TimeoutFuture::new(300).await;
    assert!(frames.get() > 0, "no animation frames delivered");

    assert!(source.unsubscribe(id));
    let seen = frames.get();
    TimeoutFuture::new(150).await;
    assert_eq!(frames.get(), seen);
}

#[wasm_bindgen_test]
fn activation_marker() {
    let doc = document();
    let root = doc.document_element().unwrap();
    assert!(!page::activation_requested(&doc));

    root.set_attribute("data-capture-guard", "TRUE").unwrap();
    assert!(page::activation_requested(&doc));
    root.set_attribute("data-capture-guard", "off").unwrap();
    assert!(!page::activation_requested(&doc));
    root.remove_attribute("data-capture-guard").unwrap();
}

// ===== Surface Tests =====

fn is_blurred(el: &Element) -> bool {
    el.class_list().contains(BLUR_CLASS)
}

#[wasm_bindgen_test]
async fn body_fallback_blur_is_fully_undone() {
    let doc = document();
    let body: Element = doc.body().unwrap().into();
    let surface = DomSurface::new(doc.clone());

    surface.apply_blur();
    assert!(is_blurred(&body));

    let host = mount(r#"<div id="late-protected" class="protected-content">late</div>"#);
    next_microtask().await;

    surface.remove_blur();
    assert!(!is_blurred(&body));
    let style = doc.body().unwrap().style();
    assert_eq!(style.get_property_value("filter").unwrap(), "");
    assert!(!is_blurred(&doc.get_element_by_id("late-protected").unwrap()));
    host.remove();
}

#[wasm_bindgen_test]
async fn protected_elements_inserted_while_degraded_are_blurred() {
    let doc = document();
    let host = mount(r#"<div id="early-protected" data-protected>early</div>"#);
    let surface = DomSurface::new(doc.clone());

    surface.apply_blur();
    assert!(is_blurred(&doc.get_element_by_id("early-protected").unwrap()));
    assert!(!is_blurred(&doc.body().unwrap()));

    let late = mount(r#"<section><p id="nested-protected" class="protected-content">x</p></section>"#);
    next_microtask().await;
    assert!(is_blurred(&doc.get_element_by_id("nested-protected").unwrap()));

    surface.remove_blur();
    assert!(!is_blurred(&doc.get_element_by_id("early-protected").unwrap()));
    assert!(!is_blurred(&doc.get_element_by_id("nested-protected").unwrap()));

    // No longer watching once content is restored
    let after = mount(r#"<div id="after-protected" data-protected>y</div>"#);
    next_microtask().await;
    assert!(!is_blurred(&doc.get_element_by_id("after-protected").unwrap()));

    host.remove();
    late.remove();
    after.remove();
}

// ===== JS API Tests =====

#[wasm_bindgen_test]
fn js_api_lifecycle() {
    assert_eq!(web::get_state(), JsValue::NULL);
    assert!(!web::destroy());

    let host = mount(r#"<div id="api-protected" class="protected-content">secret</div>"#);
    let overrides = js_sys::eval("({ watermarkText: 'INTERNAL', logToServer: false })").unwrap();
    assert!(web::init(overrides));
    assert!(!web::init(JsValue::UNDEFINED), "second init must be a no-op");

    let config = web::get_config();
    assert_eq!(get(&config, "watermarkText"), JsValue::from_str("INTERNAL"));
    assert_eq!(get(&config, "logToServer"), JsValue::FALSE);

    let state = web::get_state();
    assert_eq!(get(&state, "recordingLikelihood"), JsValue::from_f64(0.0));
    assert_eq!(get(&state, "blurActive"), JsValue::FALSE);

    let protected = document().get_element_by_id("api-protected").unwrap();
    let stamp = protected.get_attribute("data-watermark").unwrap();
    assert!(stamp.starts_with("INTERNAL • "));

    web::blur();
    assert_eq!(get(&web::get_state(), "blurActive"), JsValue::TRUE);
    assert!(protected.class_list().contains("capture-guard-blurred"));
    web::unblur();
    assert!(!protected.class_list().contains("capture-guard-blurred"));

    web::log_event("report_exported".into(), Some("report-7".into()));
    let logged = get(&get(&web::get_state(), "stats"), "eventsLogged");
    assert_eq!(logged, JsValue::from_f64(1.0));

    assert!(web::destroy());
    assert_eq!(web::get_state(), JsValue::NULL);
    assert!(!web::destroy());
    host.remove();
}
