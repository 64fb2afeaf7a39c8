//! # Capture Guard
//!
//! Client-side screenshot and screen-recording attempt detection,
//! compiled to WebAssembly.
//!
//! No browser can stop an OS-level screenshot. This crate infers likely
//! capture attempts from indirect signals and responds: it logs the
//! attempt, warns the user and temporarily degrades protected content.
//!
//! ## Architecture
//!
//! ```text
//! EventSource (DOM listeners / rAF)
//!   ↓  Signal
//! Detectors: keyboard · focus/visibility · frame rate
//!   ↓  Detection
//! CaptureGuard: debounce → log → warn → blur → likelihood++ → decay
//!   ↓                         ↓
//! EventSink (beacon)     ResponseSurface (blur, banner)
//! ```
//!
//! Everything above the `web` module is platform-agnostic and tested
//! natively with a fake event source, a manual clock and in-memory
//! collaborators.

pub mod clock;
pub mod config;
pub mod data_guard;
pub mod detectors;
pub mod engine;
mod error;
pub mod event;
pub mod session;
pub mod sink;
pub mod source;
pub mod surface;
pub mod timers;
pub mod watermark;
pub mod web;
pub mod window;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::GuardConfig;
pub use data_guard::{ElementInfo, GuardBlock, ProtectionKind, REDACTION_PLACEHOLDER};
pub use detectors::{FocusDetector, FrameRateMonitor, KeyPress};
pub use engine::{CaptureGuard, GuardState, GuardStats};
pub use error::{ErrorCode, ErrorInfo, GuardError, Result};
pub use event::{Detection, EventKind, LogEvent, PageContext};
pub use sink::{ConsoleSink, EventSink, MemorySink};
pub use source::{
    attach, detach, EventSource, FakeEventSource, Signal, SignalKind, SignalOutcome,
    SubscriptionId,
};
pub use surface::{NullSurface, RecordingSurface, ResponseSurface, SurfaceCall};
pub use timers::{DelayedTasks, HostPolled, TaskId, TimerHost};
pub use watermark::{WatermarkTarget, Watermarker};
pub use window::TimeWindow;
