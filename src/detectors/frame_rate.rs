//! Sustained frame-rate drop detection.
//!
//! Recording overhead tends to pin the page well below 20 fps. A leaky
//! counter keeps single dips from counting; a sustained run logs once per
//! episode and never escalates to a blur.

use crate::config::{FPS_SAMPLE_MS, LOW_FPS, LOW_FPS_EPISODE};

#[derive(Debug, Clone, Default)]
pub struct FrameRateMonitor {
    frames: u32,
    window_start_ms: Option<f64>,
    low_windows: u32,
    episode_logged: bool,
}

impl FrameRateMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one animation frame. Returns the sampled fps when this frame
    /// closed a window that completed a sustained low-fps episode.
    pub fn on_frame(&mut self, now_ms: f64) -> Option<u32> {
        let start = match self.window_start_ms {
            Some(start) => start,
            None => {
                self.window_start_ms = Some(now_ms);
                return None;
            }
        };

        self.frames += 1;
        let elapsed = now_ms - start;
        if elapsed < FPS_SAMPLE_MS {
            return None;
        }

        let fps = (f64::from(self.frames) * 1_000.0 / elapsed).round() as u32;
        self.frames = 0;
        self.window_start_ms = Some(now_ms);
        self.sample(fps)
    }

    /// Feed one window's sampled fps.
    pub fn sample(&mut self, fps: u32) -> Option<u32> {
        if fps > 0 && fps < LOW_FPS {
            self.low_windows += 1;
        } else {
            self.low_windows = self.low_windows.saturating_sub(1);
            if self.low_windows == 0 {
                self.episode_logged = false;
            }
        }

        if self.low_windows >= LOW_FPS_EPISODE && !self.episode_logged {
            self.episode_logged = true;
            return Some(fps);
        }
        None
    }

    pub fn low_windows(&self) -> u32 {
        self.low_windows
    }
}
