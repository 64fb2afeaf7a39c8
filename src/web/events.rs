//! Browser event source
//!
//! Adapts `document`/`window` listeners and the animation-frame loop to the
//! [`EventSource`] interface. Listeners are removed on `unsubscribe` and
//! when the source is dropped.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{ClipboardEvent, Document, Element, Event, EventTarget, KeyboardEvent, Node, Window};

use crate::data_guard::{ElementInfo, ProtectionKind};
use crate::detectors::KeyPress;
use crate::source::{EventSource, Signal, SignalHandler, SignalKind, SignalOutcome, SubscriptionId};

enum Listener {
    Dom {
        target: EventTarget,
        event: &'static str,
        capture: bool,
        callback: Closure<dyn FnMut(Event)>,
    },
    Frame {
        running: Rc<Cell<bool>>,
        request_id: Rc<Cell<i32>>,
        callback: Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>,
    },
}

pub struct DomEventSource {
    window: Window,
    document: Document,
    next_id: u64,
    listeners: HashMap<SubscriptionId, Listener>,
}

impl std::fmt::Debug for DomEventSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DomEventSource")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl DomEventSource {
    pub fn new(window: Window, document: Document) -> Self {
        Self {
            window,
            document,
            next_id: 0,
            listeners: HashMap::new(),
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn listen(
        &self,
        target: EventTarget,
        event: &'static str,
        capture: bool,
        mut on_event: impl FnMut(Event) + 'static,
    ) -> Option<Listener> {
        let callback = Closure::wrap(Box::new(move |e: Event| on_event(e)) as Box<dyn FnMut(Event)>);
        match target.add_event_listener_with_callback_and_bool(
            event,
            callback.as_ref().unchecked_ref(),
            capture,
        ) {
            Ok(()) => Some(Listener::Dom {
                target,
                event,
                capture,
                callback,
            }),
            Err(e) => {
                log::warn!("Failed to listen for '{}': {:?}", event, e);
                None
            }
        }
    }

    fn frame_loop(&self, mut handler: SignalHandler) -> Listener {
        let running = Rc::new(Cell::new(true));
        let request_id = Rc::new(Cell::new(0));
        let callback: Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>> = Rc::new(RefCell::new(None));

        let window = self.window.clone();
        let loop_running = Rc::clone(&running);
        let loop_request = Rc::clone(&request_id);
        let loop_callback = Rc::clone(&callback);
        *callback.borrow_mut() = Some(Closure::wrap(Box::new(move |ts: f64| {
            if !loop_running.get() {
                return;
            }
            handler(&Signal::AnimationFrame(ts));
            if let Some(cb) = loop_callback.borrow().as_ref() {
                if let Ok(id) = window.request_animation_frame(cb.as_ref().unchecked_ref()) {
                    loop_request.set(id);
                }
            }
        }) as Box<dyn FnMut(f64)>));

        if let Some(cb) = callback.borrow().as_ref() {
            match self.window.request_animation_frame(cb.as_ref().unchecked_ref()) {
                Ok(id) => request_id.set(id),
                Err(e) => log::warn!("requestAnimationFrame unavailable: {:?}", e),
            }
        }

        Listener::Frame {
            running,
            request_id,
            callback,
        }
    }

    fn remove(&self, listener: Listener) {
        match listener {
            Listener::Dom {
                target,
                event,
                capture,
                callback,
            } => {
                let _ = target.remove_event_listener_with_callback_and_bool(
                    event,
                    callback.as_ref().unchecked_ref(),
                    capture,
                );
            }
            Listener::Frame {
                running,
                request_id,
                callback,
            } => {
                running.set(false);
                let _ = self.window.cancel_animation_frame(request_id.get());
                // Break the closure's self-reference
                callback.borrow_mut().take();
            }
        }
    }
}

impl EventSource for DomEventSource {
    fn subscribe(&mut self, kind: SignalKind, mut handler: SignalHandler) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;

        let document: EventTarget = self.document.clone().into();
        let window: EventTarget = self.window.clone().into();
        let listener = match kind {
            SignalKind::KeyDown => self.listen(document, "keydown", true, move |e| {
                if let Some(ke) = e.dyn_ref::<KeyboardEvent>() {
                    suppress(&e, handler(&Signal::KeyDown(key_press(ke))));
                }
            }),
            SignalKind::KeyUp => self.listen(document, "keyup", true, move |e| {
                if let Some(ke) = e.dyn_ref::<KeyboardEvent>() {
                    suppress(&e, handler(&Signal::KeyUp(key_press(ke))));
                }
            }),
            SignalKind::VisibilityChange => self.listen(document, "visibilitychange", false, move |_| {
                handler(&Signal::VisibilityChange);
            }),
            SignalKind::FocusLost => self.listen(window, "blur", false, move |_| {
                handler(&Signal::FocusLost);
            }),
            SignalKind::FocusGained => self.listen(window, "focus", false, move |_| {
                handler(&Signal::FocusGained);
            }),
            SignalKind::AnimationFrame => Some(self.frame_loop(handler)),
            SignalKind::ProtectedAction(protection) => {
                self.listen(document, protection.dom_event(), true, move |e| {
                    let Some(info) = marked_target(&e, protection) else {
                        return;
                    };
                    let outcome = handler(&Signal::ProtectedAction(protection, info));
                    apply_outcome(&e, outcome);
                })
            }
        };

        if let Some(listener) = listener {
            self.listeners.insert(id, listener);
        }
        id
    }

    fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        match self.listeners.remove(&id) {
            Some(listener) => {
                self.remove(listener);
                true
            }
            None => false,
        }
    }
}

impl Drop for DomEventSource {
    fn drop(&mut self) {
        let listeners: Vec<Listener> = self.listeners.drain().map(|(_, l)| l).collect();
        for listener in listeners {
            self.remove(listener);
        }
    }
}

fn key_press(e: &KeyboardEvent) -> KeyPress {
    KeyPress {
        key: e.key(),
        code: e.code(),
        ctrl: e.ctrl_key(),
        shift: e.shift_key(),
        alt: e.alt_key(),
        meta: e.meta_key(),
    }
}

fn suppress(e: &Event, outcome: SignalOutcome) {
    if outcome.prevent_default {
        e.prevent_default();
        e.stop_propagation();
    }
}

/// Closest ancestor of the event target carrying the protection marker.
fn marked_target(e: &Event, protection: ProtectionKind) -> Option<ElementInfo> {
    let node: Node = e.target()?.dyn_into().ok()?;
    // selectstart targets text nodes
    let start = match node.dyn_ref::<Element>() {
        Some(el) => el.clone(),
        None => node.parent_element()?,
    };
    let marked = start
        .closest(&format!("[{}]", protection.marker()))
        .ok()
        .flatten()?;

    let mut info = ElementInfo::new(&marked.id(), &marked.tag_name());
    for kind in ProtectionKind::ALL {
        if marked.has_attribute(kind.marker()) {
            info = info.with_marker(kind);
        }
    }
    Some(info)
}

fn apply_outcome(e: &Event, outcome: SignalOutcome) {
    if !outcome.prevent_default {
        return;
    }
    e.prevent_default();
    if let (Some(payload), Some(ce)) = (outcome.clipboard, e.dyn_ref::<ClipboardEvent>()) {
        if let Some(data) = ce.clipboard_data() {
            if let Err(e) = data.set_data("text/plain", payload) {
                log::debug!("Failed to write redaction to clipboard: {:?}", e);
            }
        }
    }
}
