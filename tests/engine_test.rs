//! Capture guard behaviour driven through the event source interface
//!
//! Run with: cargo test

use std::cell::RefCell;
use std::rc::Rc;

use capture_guard::{
    attach, detach, CaptureGuard, ElementInfo, EventSource, FakeEventSource, GuardConfig,
    KeyPress, ManualClock, MemorySink, PageContext, ProtectionKind, RecordingSurface, Signal,
    SurfaceCall, REDACTION_PLACEHOLDER,
};
use serde_json::json;

struct Harness {
    guard: Rc<RefCell<CaptureGuard>>,
    source: FakeEventSource,
    clock: ManualClock,
    sink: MemorySink,
    surface: RecordingSurface,
}

impl Harness {
    fn new(overrides: serde_json::Value) -> Self {
        let clock = ManualClock::new(1_700_000_000_000.0);
        let sink = MemorySink::new();
        let surface = RecordingSurface::new();
        let guard = CaptureGuard::with_config(GuardConfig::with_overrides(&overrides))
            .with_clock(clock.clone())
            .with_sink(sink.clone())
            .with_surface(surface.clone())
            .with_page(PageContext {
                url: "https://payroll.example/reports/7".into(),
                user_agent: "Mozilla/5.0 (Test)".into(),
                screen_width: 2560,
                screen_height: 1440,
            })
            .with_session_id("AB12CD34".into());
        let guard = Rc::new(RefCell::new(guard));
        let mut source = FakeEventSource::new();
        attach(&guard, &mut source);
        Self {
            guard,
            source,
            clock,
            sink,
            surface,
        }
    }

    fn emit_spaced(&mut self, signal: Signal, count: usize, gap_ms: f64) {
        for _ in 0..count {
            self.source.emit(signal.clone());
            self.clock.advance(gap_ms);
        }
    }

    fn advance(&self, ms: f64) {
        self.clock.advance(ms);
        self.guard.borrow_mut().run_due();
    }

    fn likelihood(&self) -> u32 {
        self.guard.borrow().state().recording_likelihood
    }

    fn blurred(&self) -> bool {
        self.guard.borrow().state().blur_active
    }
}

#[test]
fn visibility_burst_emits_exactly_once() {
    let mut h = Harness::new(json!({ "detectionDebounceMs": 0 }));
    h.emit_spaced(Signal::VisibilityChange, 7, 200.0);

    assert_eq!(h.sink.event_types(), vec!["visibility_spam"]);
    assert_eq!(h.likelihood(), 1);

    // The 7th event plus five more make a fresh burst of six
    h.emit_spaced(Signal::VisibilityChange, 4, 200.0);
    assert_eq!(h.sink.len(), 1);
    h.emit_spaced(Signal::VisibilityChange, 1, 200.0);
    assert_eq!(h.sink.event_types(), vec!["visibility_spam", "visibility_spam"]);
}

#[test]
fn focus_loss_burst_and_recovery() {
    let mut h = Harness::new(json!({ "detectionDebounceMs": 0 }));
    h.emit_spaced(Signal::FocusLost, 4, 500.0);
    assert_eq!(h.sink.event_types(), vec!["focus_loss_spam"]);

    h.emit_spaced(Signal::FocusLost, 3, 100.0);
    h.source.emit(Signal::FocusGained);
    h.source.emit(Signal::FocusLost);
    assert_eq!(h.sink.len(), 1, "regained focus must reset the burst");
}

#[test]
fn debounce_merges_near_simultaneous_detections() {
    let mut h = Harness::new(json!({ "detectionDebounceMs": 100 }));
    let outcome = h.source.emit(Signal::KeyDown(KeyPress::new("PrintScreen")));
    assert!(outcome.prevent_default);
    h.clock.advance(50.0);
    let outcome = h.source.emit(Signal::KeyDown(KeyPress::new("s").ctrl().shift()));
    // Still suppressed even though the detection was dropped
    assert!(outcome.prevent_default);

    assert_eq!(h.sink.event_types(), vec!["printscreen_key"]);
    assert_eq!(h.likelihood(), 1);
    assert_eq!(h.surface.count(&SurfaceCall::Blur), 1);
    assert_eq!(h.guard.borrow().state().stats.detections_debounced, 1);
}

#[test]
fn likelihood_returns_to_zero_only_after_all_decays() {
    let mut h = Harness::new(json!({ "detectionDebounceMs": 100 }));
    for _ in 0..3 {
        h.source.emit(Signal::KeyDown(KeyPress::new("4").meta().shift()));
        h.clock.advance(1_000.0);
    }
    assert_eq!(h.likelihood(), 3);
    assert_eq!(h.guard.borrow().state().pending_decays, 3);

    // First decay due 5s after the first detection (2s from now)
    h.advance(2_000.0);
    assert_eq!(h.likelihood(), 2);
    assert!(h.blurred());
    h.advance(1_000.0);
    assert_eq!(h.likelihood(), 1);
    assert!(h.blurred());
    h.advance(1_000.0);
    assert_eq!(h.likelihood(), 0);
    assert!(!h.blurred());
    assert_eq!(h.surface.count(&SurfaceCall::Unblur), 1);

    h.advance(60_000.0);
    assert_eq!(h.likelihood(), 0);
}

#[test]
fn keyboard_classification_through_source() {
    let mut h = Harness::new(json!({ "detectionDebounceMs": 0 }));
    let outcome = h.source.emit(Signal::KeyDown(KeyPress::new("4").meta().shift()));
    assert!(outcome.prevent_default);
    h.clock.advance(10.0);
    h.source.emit(Signal::KeyDown(KeyPress::new("s").ctrl().shift()));
    h.clock.advance(10.0);
    let outcome = h.source.emit(Signal::KeyDown(KeyPress::new("p").ctrl()));
    assert!(!outcome.prevent_default);

    assert_eq!(h.sink.event_types(), vec!["mac_cmd_shift_4", "ctrl_shift_s"]);
}

#[test]
fn print_screen_release_is_detected_once() {
    let mut h = Harness::new(json!({}));
    // Windows: only the release reaches the page
    let outcome = h.source.emit(Signal::KeyUp(KeyPress::new("PrintScreen")));
    assert!(outcome.prevent_default);
    assert_eq!(h.sink.event_types(), vec!["printscreen_key"]);

    // Elsewhere both arrive; the debounce gate merges them
    h.clock.advance(5_000.0);
    h.source.emit(Signal::KeyDown(KeyPress::new("PrintScreen")));
    h.clock.advance(80.0);
    h.source.emit(Signal::KeyUp(KeyPress::new("PrintScreen")));
    assert_eq!(h.sink.len(), 2);

    let outcome = h.source.emit(Signal::KeyUp(KeyPress::new("s").ctrl().shift()));
    assert!(!outcome.prevent_default);
}

#[test]
fn wall_clock_step_back_keeps_self_heal() {
    let mut h = Harness::new(json!({}));
    h.source.emit(Signal::KeyDown(KeyPress::new("PrintScreen")));
    assert!(h.blurred());

    h.clock.set(1_700_000_000_000.0 - 3_600_000.0);
    h.advance(10_000.0);
    assert_eq!(h.likelihood(), 0);
    assert!(!h.blurred());

    h.source.emit(Signal::KeyDown(KeyPress::new("PrintScreen").alt()));
    assert_eq!(h.likelihood(), 1);
    assert_eq!(h.sink.event_types(), vec!["printscreen_key", "windows_printscreen"]);
}

#[test]
fn low_frame_rate_is_logged_not_escalated() {
    let mut h = Harness::new(json!({}));
    let mut ts = 0.0;
    h.source.emit(Signal::AnimationFrame(ts));
    for _ in 0..100 {
        ts += 1_000.0 / 15.0;
        h.source.emit(Signal::AnimationFrame(ts));
    }
    assert_eq!(h.sink.event_types(), vec!["low_frame_rate"]);
    assert!(!h.blurred());
    assert_eq!(h.likelihood(), 0);
}

#[test]
fn brief_frame_dip_is_ignored() {
    let mut h = Harness::new(json!({}));
    let mut ts = 0.0;
    h.source.emit(Signal::AnimationFrame(ts));
    // One slow second, then smooth for a while
    for _ in 0..16 {
        ts += 1_000.0 / 15.0;
        h.source.emit(Signal::AnimationFrame(ts));
    }
    for _ in 0..600 {
        ts += 1_000.0 / 60.0;
        h.source.emit(Signal::AnimationFrame(ts));
    }
    assert!(h.sink.is_empty());
}

#[test]
fn copy_on_protected_element_is_redacted_and_logged() {
    let mut h = Harness::new(json!({}));
    let element = ElementInfo::new("salary-table", "TABLE").with_marker(ProtectionKind::Copy);
    let outcome = h
        .source
        .emit(Signal::ProtectedAction(ProtectionKind::Copy, element));

    assert!(outcome.prevent_default);
    assert_eq!(outcome.clipboard, Some(REDACTION_PLACEHOLDER));

    let events = h.sink.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, "copy_attempted");
    assert_eq!(events[0].details, "salary-table");
    assert_eq!(events[0].screen_resolution, "2560x1440");
    assert_eq!(events[0].url, "https://payroll.example/reports/7");
    // Data-protection blocks never degrade content
    assert!(!h.blurred());
}

#[test]
fn unmarked_action_passes_through() {
    let mut h = Harness::new(json!({}));
    let element = ElementInfo::new("notes", "div").with_marker(ProtectionKind::Paste);
    let outcome = h
        .source
        .emit(Signal::ProtectedAction(ProtectionKind::Drag, element));
    assert!(!outcome.prevent_default);
    assert!(h.sink.is_empty());
}

#[test]
fn log_record_shape() {
    let h = Harness::new(json!({ "serverEndpoint": "/audit/capture" }));
    h.guard.borrow_mut().log_event("report_exported", "report-7");

    assert_eq!(h.sink.endpoints(), vec!["/audit/capture"]);
    let value = serde_json::to_value(&h.sink.events()[0]).unwrap();
    for field in [
        "event_type",
        "details",
        "timestamp",
        "url",
        "user_agent",
        "screen_resolution",
    ] {
        assert!(value.get(field).is_some(), "missing {}", field);
    }
    assert_eq!(value["timestamp"], "2023-11-14T22:13:20.000Z");
}

#[test]
fn detach_stops_delivery() {
    let guard = Rc::new(RefCell::new(
        CaptureGuard::new()
            .with_clock(ManualClock::new(0.0))
            .with_sink(MemorySink::new()),
    ));
    let mut source = FakeEventSource::new();
    let ids = attach(&guard, &mut source);
    assert_eq!(source.subscriber_count(), 10);

    assert_eq!(detach(&mut source, &ids), 10);
    let outcome = source.emit(Signal::KeyDown(KeyPress::new("PrintScreen")));
    assert!(!outcome.prevent_default);
    assert_eq!(guard.borrow().state().recording_likelihood, 0);
    assert!(!source.unsubscribe(ids[0]));
}

#[test]
fn independent_instances() {
    let mut a = Harness::new(json!({ "detectionDebounceMs": 0 }));
    let b = Harness::new(json!({ "detectionDebounceMs": 0 }));
    a.source.emit(Signal::KeyDown(KeyPress::new("PrintScreen")));
    assert_eq!(a.likelihood(), 1);
    assert_eq!(b.likelihood(), 0);
    assert!(b.sink.is_empty());
}
