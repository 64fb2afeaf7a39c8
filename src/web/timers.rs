//! Browser timer host: one `gloo_timers` timeout per scheduled task.

use std::cell::RefCell;
use std::rc::Weak;

use gloo_timers::future::TimeoutFuture;
use wasm_bindgen_futures::spawn_local;

use crate::engine::CaptureGuard;
use crate::timers::TimerHost;

/// Wakes a shared guard when its tasks fall due. Holds only a weak
/// reference, so a destroyed guard lets pending wake-ups lapse.
#[derive(Debug, Clone)]
pub struct BrowserTimers {
    guard: Weak<RefCell<CaptureGuard>>,
}

impl BrowserTimers {
    pub fn new(guard: Weak<RefCell<CaptureGuard>>) -> Self {
        Self { guard }
    }
}

impl TimerHost for BrowserTimers {
    fn wake_at(&self, due_ms: f64, delay_ms: f64) {
        let guard = self.guard.clone();
        spawn_local(async move {
            let mut delay = delay_ms;
            loop {
                TimeoutFuture::new(delay.max(0.0).ceil() as u32).await;
                let Some(strong) = guard.upgrade() else {
                    return;
                };
                let retry = match strong.try_borrow_mut() {
                    Ok(mut guard) => guard.on_wake(due_ms),
                    // Busy dispatching a DOM event; try again next tick
                    Err(_) => Some(0.0),
                };
                match retry {
                    Some(ms) => {
                        log::debug!("Timer fired early, re-arming in {} ms", ms);
                        delay = ms;
                    }
                    None => return,
                }
            }
        });
    }
}
