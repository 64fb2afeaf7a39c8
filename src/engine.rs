//! Detection aggregator and response controller
//!
//! ## States
//!
//! ```text
//!            accepted detection
//!   Clear ───────────────────────▶ Degraded
//!     ▲                               │
//!     └─────── last decay fires ──────┘
//! ```
//!
//! Every detection passes a debounce gate. An accepted detection logs,
//! warns, degrades and bumps `recording_likelihood`, then schedules its own
//! decay. Decays are independent and commutative (decrement, floor at 0),
//! so content returns to Clear only once every outstanding decay has run.

use serde::{Deserialize, Serialize};

use crate::clock::{Clock, SystemClock};
use crate::config::{GuardConfig, DECAY_DELAY_MS, WARNING_DISMISS_MS};
use crate::data_guard::{self, ElementInfo, GuardBlock, ProtectionKind};
use crate::detectors::{classify, classify_release, FocusDetector, FrameRateMonitor, KeyPress};
use crate::event::{Detection, EventKind, LogEvent, PageContext};
use crate::session;
use crate::sink::{ConsoleSink, EventSink};
use crate::source::{Signal, SignalOutcome};
use crate::surface::{NullSurface, ResponseSurface, WARNING_MESSAGE};
use crate::timers::{DelayedTasks, HostPolled, TaskId, TimerHost};
use crate::watermark::{self, Watermarker};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Task {
    Decay,
    DismissWarning,
}

/// Cumulative counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuardStats {
    pub detections_accepted: u64,
    pub detections_debounced: u64,
    pub events_logged: u64,
    pub guard_blocks: u64,
    pub low_frame_rate_episodes: u64,
}

/// Read-only snapshot of the protection state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuardState {
    pub initialized: bool,
    pub recording_likelihood: u32,
    pub blur_active: bool,
    pub last_detection_timestamp: Option<f64>,
    pub last_detection_type: Option<String>,
    pub pending_decays: usize,
    pub warning_visible: bool,
    pub session_id: String,
    pub stats: GuardStats,
}

/// One capture guard instance: configuration, state and detector buffers.
pub struct CaptureGuard {
    config: GuardConfig,
    clock: Box<dyn Clock>,
    sink: Box<dyn EventSink>,
    surface: Box<dyn ResponseSurface>,
    timer_host: Box<dyn TimerHost>,
    page: PageContext,
    session_id: String,
    watermarker: Option<Watermarker>,

    focus: FocusDetector,
    frames: FrameRateMonitor,
    tasks: DelayedTasks<Task>,

    initialized: bool,
    recording_likelihood: u32,
    blur_active: bool,
    /// Monotonic time of the last accepted detection, for the debounce gate
    last_detection_ms: Option<f64>,
    /// Wall-clock time of the same detection, for reporting
    last_detection_at: Option<f64>,
    last_detection_kind: Option<EventKind>,
    warning_task: Option<TaskId>,
    stats: GuardStats,
}

impl std::fmt::Debug for CaptureGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureGuard")
            .field("config", &self.config)
            .field("session_id", &self.session_id)
            .field("initialized", &self.initialized)
            .field("recording_likelihood", &self.recording_likelihood)
            .field("blur_active", &self.blur_active)
            .finish()
    }
}

impl CaptureGuard {
    /// Create a guard with default configuration
    pub fn new() -> Self {
        Self::with_config(GuardConfig::default())
    }

    /// Create a guard with the system clock, console logging and no
    /// visible surface. Swap collaborators with the `with_*` methods.
    pub fn with_config(config: GuardConfig) -> Self {
        let mut guard = Self {
            config,
            clock: Box::new(SystemClock::new()),
            sink: Box::new(ConsoleSink),
            surface: Box::new(NullSurface),
            timer_host: Box::new(HostPolled),
            page: PageContext::default(),
            session_id: session::random_token(),
            watermarker: None,
            focus: FocusDetector::new(),
            frames: FrameRateMonitor::new(),
            tasks: DelayedTasks::new(),
            initialized: true,
            recording_likelihood: 0,
            blur_active: false,
            last_detection_ms: None,
            last_detection_at: None,
            last_detection_kind: None,
            warning_task: None,
            stats: GuardStats::default(),
        };
        guard.refresh_watermark();
        guard
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self.refresh_watermark();
        self
    }

    pub fn with_sink(mut self, sink: impl EventSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    pub fn with_surface(mut self, surface: impl ResponseSurface + 'static) -> Self {
        self.surface = Box::new(surface);
        self
    }

    pub fn with_timer_host(mut self, host: impl TimerHost + 'static) -> Self {
        self.timer_host = Box::new(host);
        self
    }

    /// Replace the timer host on a guard that is already shared.
    pub fn set_timer_host(&mut self, host: impl TimerHost + 'static) {
        self.timer_host = Box::new(host);
    }

    pub fn with_page(mut self, page: PageContext) -> Self {
        self.page = page;
        self
    }

    pub fn with_session_id(mut self, session_id: String) -> Self {
        self.session_id = session_id;
        self.refresh_watermark();
        self
    }

    fn refresh_watermark(&mut self) {
        self.watermarker = self.config.watermark_enabled.then(|| {
            Watermarker::new(watermark::compose(
                &self.config.watermark_text,
                &self.session_id,
                self.clock.now_ms(),
            ))
        });
    }

    // ===== Accessors =====

    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn watermarker(&self) -> Option<&Watermarker> {
        self.watermarker.as_ref()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn state(&self) -> GuardState {
        GuardState {
            initialized: self.initialized,
            recording_likelihood: self.recording_likelihood,
            blur_active: self.blur_active,
            last_detection_timestamp: self.last_detection_at,
            last_detection_type: self.last_detection_kind.map(|k| k.as_str().to_string()),
            pending_decays: self.tasks.count_where(|t| *t == Task::Decay),
            warning_visible: self.warning_task.is_some(),
            session_id: self.session_id.clone(),
            stats: self.stats.clone(),
        }
    }

    /// Earliest pending task deadline, in monotonic milliseconds.
    pub fn next_due(&self) -> Option<f64> {
        self.tasks.next_due()
    }

    // ===== Signal dispatch =====

    pub fn handle_signal(&mut self, signal: &Signal) -> SignalOutcome {
        if !self.initialized {
            return SignalOutcome::default();
        }
        match signal {
            Signal::KeyDown(press) => SignalOutcome {
                prevent_default: self.on_key(press),
                clipboard: None,
            },
            Signal::KeyUp(press) => SignalOutcome {
                prevent_default: self.on_key_release(press),
                clipboard: None,
            },
            Signal::VisibilityChange => {
                self.on_visibility_change();
                SignalOutcome::default()
            }
            Signal::FocusLost => {
                self.on_focus_lost();
                SignalOutcome::default()
            }
            Signal::FocusGained => {
                self.on_focus_gained();
                SignalOutcome::default()
            }
            Signal::AnimationFrame(ts) => {
                self.on_frame(*ts);
                SignalOutcome::default()
            }
            Signal::ProtectedAction(kind, element) => {
                match self.on_protected_action(*kind, element) {
                    Some(block) => SignalOutcome {
                        prevent_default: true,
                        clipboard: block.clipboard,
                    },
                    None => SignalOutcome::default(),
                }
            }
        }
    }

    /// Returns whether the key event must be suppressed.
    pub fn on_key(&mut self, press: &KeyPress) -> bool {
        match classify(press) {
            Some(kind) => {
                self.report(Detection::new(kind, "keyboard"));
                true
            }
            None => false,
        }
    }

    /// Key releases only matter for PrintScreen, which some platforms
    /// deliver without a matching `keydown`.
    pub fn on_key_release(&mut self, press: &KeyPress) -> bool {
        match classify_release(press) {
            Some(kind) => {
                self.report(Detection::new(kind, "keyboard"));
                true
            }
            None => false,
        }
    }

    pub fn on_visibility_change(&mut self) {
        let now = self.clock.monotonic_ms();
        if let Some(kind) = self.focus.on_visibility_change(now) {
            self.report(Detection::new(kind, "visibility"));
        }
    }

    pub fn on_focus_lost(&mut self) {
        let now = self.clock.monotonic_ms();
        if let Some(kind) = self.focus.on_focus_lost(now) {
            self.report(Detection::new(kind, "focus"));
        }
    }

    pub fn on_focus_gained(&mut self) {
        self.focus.on_focus_gained();
    }

    /// Frame-rate drops are logged only; they never degrade content.
    pub fn on_frame(&mut self, frame_ms: f64) {
        if let Some(fps) = self.frames.on_frame(frame_ms) {
            self.stats.low_frame_rate_episodes += 1;
            log::info!("📉 Sustained low frame rate: {} fps", fps);
            self.log_event(EventKind::LowFrameRate.as_str(), &format!("fps={}", fps));
        }
    }

    pub fn on_protected_action(
        &mut self,
        kind: ProtectionKind,
        element: &ElementInfo,
    ) -> Option<GuardBlock> {
        let block = data_guard::evaluate(kind, element)?;
        self.stats.guard_blocks += 1;
        log::warn!("🚫 Blocked {} on {}", kind.dom_event(), block.details);
        self.log_event(block.event.as_str(), &block.details);
        Some(block)
    }

    // ===== Aggregation =====

    /// Feed a detection through the debounce gate. Returns whether it was
    /// accepted.
    pub fn report(&mut self, detection: Detection) -> bool {
        if !self.initialized {
            return false;
        }
        let now = self.clock.monotonic_ms();
        if let Some(last) = self.last_detection_ms {
            if now - last < self.config.detection_debounce_ms {
                self.stats.detections_debounced += 1;
                log::debug!("Debounced {} from {}", detection.kind, detection.source);
                return false;
            }
        }

        self.last_detection_ms = Some(now);
        self.last_detection_at = Some(self.clock.now_ms());
        self.last_detection_kind = Some(detection.kind);
        self.stats.detections_accepted += 1;
        log::warn!(
            "⚠️ Capture attempt detected: {} (source: {})",
            detection.kind,
            detection.source
        );

        self.log_event(detection.kind.as_str(), detection.source);

        if self.config.show_warning_modal {
            self.show_warning(now);
        }

        if detection.kind.escalates() && self.config.blur_on_detection && !self.blur_active {
            self.blur();
        }

        self.recording_likelihood += 1;
        self.schedule(now + DECAY_DELAY_MS, Task::Decay);
        true
    }

    fn show_warning(&mut self, now: f64) {
        if let Some(previous) = self.warning_task.take() {
            self.tasks.cancel(previous);
        }
        self.surface.show_warning(WARNING_MESSAGE);
        self.warning_task = Some(self.schedule(now + WARNING_DISMISS_MS, Task::DismissWarning));
    }

    fn schedule(&mut self, due_ms: f64, task: Task) -> TaskId {
        let id = self.tasks.schedule(due_ms, task);
        let delay_ms = (due_ms - self.clock.monotonic_ms()).max(0.0);
        self.timer_host.wake_at(due_ms, delay_ms);
        id
    }

    /// Run every task whose deadline has passed. Returns how many ran.
    pub fn run_due(&mut self) -> usize {
        let due = self.tasks.take_due(self.clock.monotonic_ms());
        let count = due.len();
        for (id, task) in due {
            match task {
                Task::Decay => self.decay(),
                Task::DismissWarning => {
                    if self.warning_task == Some(id) {
                        self.warning_task = None;
                        self.surface.hide_warning();
                    }
                }
            }
        }
        count
    }

    /// Timer callback for a wake-up armed for `due_ms`. Runs whatever is
    /// due, then returns how long to wait before trying again if a task
    /// this wake-up was meant for is still pending. Timers may fire a
    /// little early, and nothing else would re-arm them.
    pub fn on_wake(&mut self, due_ms: f64) -> Option<f64> {
        let ran = self.run_due();
        if ran > 0 {
            log::debug!("⏰ Ran {} due guard tasks", ran);
        }
        let now = self.clock.monotonic_ms();
        self.tasks
            .next_due()
            .filter(|next| *next <= due_ms)
            .map(|next| (next - now).max(1.0))
    }

    fn decay(&mut self) {
        self.recording_likelihood = self.recording_likelihood.saturating_sub(1);
        log::debug!("Likelihood decayed to {}", self.recording_likelihood);
        if self.recording_likelihood == 0 && self.blur_active {
            log::info!("✅ No recent capture signals, restoring content");
            self.unblur();
        }
    }

    // ===== Public operations =====

    /// Record an event through the logging boundary without touching the
    /// debounce gate or the likelihood.
    pub fn log_event(&mut self, event_type: &str, details: &str) {
        let event = LogEvent::new(event_type, details, self.clock.now_ms(), &self.page);
        self.stats.events_logged += 1;
        if self.config.log_to_server {
            self.sink.deliver(&self.config.server_endpoint, &event);
        } else {
            ConsoleSink.deliver(&self.config.server_endpoint, &event);
        }
    }

    pub fn blur(&mut self) {
        self.blur_active = true;
        self.surface.apply_blur();
    }

    pub fn unblur(&mut self) {
        self.blur_active = false;
        self.surface.remove_blur();
    }

    /// Cancel pending tasks and clear every visible effect. Later signals
    /// are ignored.
    pub fn shutdown(&mut self) {
        if !self.initialized {
            return;
        }
        self.tasks.clear();
        if self.warning_task.take().is_some() {
            self.surface.hide_warning();
        }
        if self.blur_active {
            self.unblur();
        }
        self.recording_likelihood = 0;
        self.initialized = false;
        log::info!("Capture guard shut down");
    }
}

impl Default for CaptureGuard {
    fn default() -> Self {
        Self::new()
    }
}
