//! Event logger boundary.
//!
//! Delivery is fire-and-forget: a sink never reports back and never
//! blocks the protection response.

use crate::event::LogEvent;
use std::cell::RefCell;
use std::rc::Rc;

/// Destination for audit events.
pub trait EventSink {
    /// Attempt delivery at most once. Failures stay inside the sink.
    fn deliver(&self, endpoint: &str, event: &LogEvent);
}

/// Console-only sink.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleSink;

impl EventSink for ConsoleSink {
    fn deliver(&self, _endpoint: &str, event: &LogEvent) {
        log::warn!("🛡️ capture event: {}", event.to_json());
    }
}

/// Records every delivery. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    events: Rc<RefCell<Vec<(String, LogEvent)>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<LogEvent> {
        self.events.borrow().iter().map(|(_, e)| e.clone()).collect()
    }

    pub fn endpoints(&self) -> Vec<String> {
        self.events.borrow().iter().map(|(ep, _)| ep.clone()).collect()
    }

    pub fn event_types(&self) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .map(|(_, e)| e.event_type.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }
}

impl EventSink for MemorySink {
    fn deliver(&self, endpoint: &str, event: &LogEvent) {
        self.events
            .borrow_mut()
            .push((endpoint.to_string(), event.clone()));
    }
}
