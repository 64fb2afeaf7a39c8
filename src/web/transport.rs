//! Beacon delivery of audit events
//!
//! `navigator.sendBeacon` survives page unload, so it is tried first. When
//! the browser refuses the beacon, a `keepalive` fetch is fired instead.
//! Nothing is retried and nothing is awaited by the caller.

use js_sys::Array;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{Blob, BlobPropertyBag, Request, RequestInit, RequestMode, Response};

use crate::error::{GuardError, Result};
use crate::event::LogEvent;
use crate::sink::EventSink;

#[derive(Debug, Clone, Copy, Default)]
pub struct BeaconSink;

impl BeaconSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for BeaconSink {
    fn deliver(&self, endpoint: &str, event: &LogEvent) {
        let body = event.to_json();
        log::info!("📤 {} → {}", event.event_type, endpoint);

        match send_beacon(endpoint, &body) {
            Ok(true) => {}
            Ok(false) => {
                log::debug!("Beacon refused, falling back to fetch");
                let endpoint = endpoint.to_string();
                spawn_local(async move {
                    if let Err(e) = post_keepalive(&endpoint, &body).await {
                        log::warn!("⚠️ Capture event delivery failed: {}", e);
                    }
                });
            }
            Err(e) => log::warn!("⚠️ Capture event delivery failed: {}", e),
        }
    }
}

fn send_beacon(endpoint: &str, body: &str) -> Result<bool> {
    let window = web_sys::window().ok_or_else(|| GuardError::Delivery("No window object".into()))?;

    let parts = Array::of1(&JsValue::from_str(body));
    let opts = BlobPropertyBag::new();
    opts.set_type("application/json");
    let blob = Blob::new_with_str_sequence_and_options(&parts, &opts)?;

    Ok(window.navigator().send_beacon_with_opt_blob(endpoint, Some(&blob))?)
}

async fn post_keepalive(endpoint: &str, body: &str) -> Result<()> {
    let opts = RequestInit::new();
    opts.set_method("POST");
    opts.set_mode(RequestMode::SameOrigin);
    // web-sys exposes no keepalive setter; set the dictionary member directly
    let _ = js_sys::Reflect::set(&opts, &JsValue::from_str("keepalive"), &JsValue::TRUE);
    opts.set_body(&JsValue::from_str(body));

    let request = Request::new_with_str_and_init(endpoint, &opts)
        .map_err(|e| GuardError::Delivery(format!("Failed to create request: {:?}", e)))?;
    request
        .headers()
        .set("Content-Type", "application/json")
        .map_err(|e| GuardError::Delivery(format!("Failed to set header: {:?}", e)))?;

    let window = web_sys::window().ok_or_else(|| GuardError::Delivery("No window object".into()))?;
    let resp_value = JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(|e| GuardError::Delivery(format!("Fetch failed: {:?}", e)))?;

    let resp: Response = resp_value
        .dyn_into()
        .map_err(|_| GuardError::Delivery("Failed to cast to Response".into()))?;

    if !resp.ok() {
        return Err(GuardError::Delivery(format!(
            "HTTP {}: {}",
            resp.status(),
            resp.status_text()
        )));
    }
    Ok(())
}
