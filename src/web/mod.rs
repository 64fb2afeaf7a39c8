//! Browser bindings
//!
//! ## Usage
//!
//! ```javascript
//! import init, * as guard from './pkg/capture_guard.js';
//! await init();                       // auto-activates if <html data-capture-guard="true">
//! guard.init({ detectionDebounceMs: 500, watermarkText: 'INTERNAL' });
//! guard.logEvent('export_clicked', 'report-42');
//! console.log(guard.getState());
//! ```
//!
//! One guard is active per page. Every export swallows its own failures:
//! the host page never sees an exception from here.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;

use crate::config::GuardConfig;
use crate::engine::CaptureGuard;
use crate::error::{GuardError, Result};
use crate::session;
use crate::source::{self, SubscriptionId};

pub mod events;
pub mod observer;
pub mod page;
pub mod surface;
pub mod timers;
pub mod transport;
pub mod watermark;

pub use events::DomEventSource;
pub use surface::DomSurface;
pub use timers::BrowserTimers;
pub use transport::BeaconSink;
pub use watermark::WatermarkObserver;

struct ActiveGuard {
    guard: Rc<RefCell<CaptureGuard>>,
    source: DomEventSource,
    subscriptions: Vec<SubscriptionId>,
    observer: Option<WatermarkObserver>,
}

thread_local! {
    static ACTIVE: RefCell<Option<ActiveGuard>> = const { RefCell::new(None) };
}

/// Install console logging. Safe to call repeatedly.
fn install_logging() {
    let _ = console_log::init_with_level(log::Level::Info);
}

/// Module start hook: activate when the page carries the marker attribute.
#[wasm_bindgen(start)]
pub fn start() {
    install_logging();
    let requested = web_sys::window()
        .and_then(|w| w.document())
        .map(|d| page::activation_requested(&d))
        .unwrap_or(false);
    if requested {
        init(JsValue::UNDEFINED);
    }
}

/// Start the guard with partial configuration overrides.
///
/// Returns `true` when a guard was started, `false` when one was already
/// running or the page has no document.
#[wasm_bindgen]
pub fn init(overrides: JsValue) -> bool {
    install_logging();
    match try_init(overrides) {
        Ok(()) => true,
        Err(e) if e.is_notice() => {
            log::info!("{}", e);
            false
        }
        Err(e) => {
            log::warn!("Capture guard failed to start: {}", e);
            false
        }
    }
}

fn try_init(overrides: JsValue) -> Result<()> {
    if ACTIVE.with(|a| a.borrow().is_some()) {
        return Err(GuardError::AlreadyInitialized);
    }

    let overrides: serde_json::Value = if overrides.is_undefined() || overrides.is_null() {
        serde_json::Value::Null
    } else {
        serde_wasm_bindgen::from_value(overrides)
            .map_err(|e| GuardError::Config(e.to_string()))
            .unwrap_or_else(|e| {
                log::debug!("{}", e);
                serde_json::Value::Null
            })
    };
    let config = GuardConfig::with_overrides(&overrides);

    let window = web_sys::window().ok_or_else(|| GuardError::MissingTarget("window".into()))?;
    let document = window
        .document()
        .ok_or_else(|| GuardError::MissingTarget("document".into()))?;

    let guard = CaptureGuard::with_config(config)
        .with_page(page::probe(&window))
        .with_session_id(session::session_id_from_cookies(&page::cookies(&document)))
        .with_sink(BeaconSink::new())
        .with_surface(DomSurface::new(document.clone()));
    let guard = Rc::new(RefCell::new(guard));
    guard
        .borrow_mut()
        .set_timer_host(BrowserTimers::new(Rc::downgrade(&guard)));

    let mut dom_source = DomEventSource::new(window, document.clone());
    let subscriptions = source::attach(&guard, &mut dom_source);

    let marker = guard.borrow().watermarker().cloned();
    let observer = match marker {
        Some(marker) => match WatermarkObserver::start(&document, marker) {
            Ok(observer) => Some(observer),
            Err(e) => {
                log::warn!("Watermarking unavailable: {}", e);
                None
            }
        },
        None => None,
    };

    log::info!(
        "🛡️ Capture guard active (session {}, {} listeners)",
        guard.borrow().session_id(),
        dom_source.listener_count()
    );

    ACTIVE.with(|a| {
        *a.borrow_mut() = Some(ActiveGuard {
            guard,
            source: dom_source,
            subscriptions,
            observer,
        });
    });
    Ok(())
}

fn with_guard<R>(f: impl FnOnce(&mut CaptureGuard) -> R) -> Option<R> {
    ACTIVE.with(|a| {
        let active = a.borrow();
        let Some(active) = active.as_ref() else {
            log::debug!("{}", GuardError::NotInitialized);
            return None;
        };
        let result = match active.guard.try_borrow_mut() {
            Ok(mut guard) => Some(f(&mut guard)),
            Err(_) => {
                log::warn!("Capture guard busy");
                None
            }
        };
        result
    })
}

/// Record an event through the logging pipeline. Bypasses the debounce
/// gate and does not affect the recording likelihood.
#[wasm_bindgen(js_name = logEvent)]
pub fn log_event(event_type: String, details: Option<String>) {
    with_guard(|g| g.log_event(&event_type, details.as_deref().unwrap_or("")));
}

/// Degrade protected content regardless of detection state.
#[wasm_bindgen]
pub fn blur() {
    with_guard(|g| g.blur());
}

/// Restore protected content regardless of detection state.
#[wasm_bindgen]
pub fn unblur() {
    with_guard(|g| g.unblur());
}

/// Snapshot of the protection state, or `null` before `init`.
#[wasm_bindgen(js_name = getState)]
pub fn get_state() -> JsValue {
    with_guard(|g| g.state())
        .and_then(|state| serde_wasm_bindgen::to_value(&state).ok())
        .unwrap_or(JsValue::NULL)
}

/// Snapshot of the active configuration, or `null` before `init`.
#[wasm_bindgen(js_name = getConfig)]
pub fn get_config() -> JsValue {
    with_guard(|g| g.config().clone())
        .and_then(|config| serde_wasm_bindgen::to_value(&config).ok())
        .unwrap_or(JsValue::NULL)
}

/// Tear down the active guard: listeners, observer, pending timers and
/// visible effects. A later `init` starts a fresh guard.
#[wasm_bindgen]
pub fn destroy() -> bool {
    let Some(mut active) = ACTIVE.with(|a| a.borrow_mut().take()) else {
        return false;
    };
    let removed = source::detach(&mut active.source, &active.subscriptions);
    log::debug!("Removed {} listeners", removed);
    if let Some(observer) = active.observer.take() {
        observer.disconnect();
    }
    if let Ok(mut guard) = active.guard.try_borrow_mut() {
        guard.shutdown();
    }
    true
}
