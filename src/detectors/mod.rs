//! Signal detectors
//!
//! Each detector is independent and only owns its own rolling state:
//!
//! - [`keyboard`]: stateless capture-shortcut matching
//! - [`focus`]: visibility and focus-loss bursts over sliding windows
//! - [`frame_rate`]: sustained low frame rate, log-only

pub mod focus;
pub mod frame_rate;
pub mod keyboard;

pub use focus::FocusDetector;
pub use frame_rate::FrameRateMonitor;
pub use keyboard::{classify, classify_release, KeyPress};
