//! Guard configuration and engine tuning constants.
//!
//! Configuration is fixed once a guard is constructed. Callers supply a
//! partial override object which is merged key by key over the defaults.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Visibility-change burst horizon.
pub const VISIBILITY_WINDOW_MS: f64 = 5_000.0;
/// A burst fires once the visibility window holds more than this many events.
pub const VISIBILITY_BURST: usize = 5;
/// Focus-loss burst horizon.
pub const FOCUS_LOSS_WINDOW_MS: f64 = 3_000.0;
/// A burst fires once the focus-loss window holds more than this many events.
pub const FOCUS_LOSS_BURST: usize = 3;
/// Frame-rate sampling window.
pub const FPS_SAMPLE_MS: f64 = 1_000.0;
/// Sampled frame rates strictly between zero and this are "low".
pub const LOW_FPS: u32 = 20;
/// Consecutive low windows that make a sustained episode.
pub const LOW_FPS_EPISODE: u32 = 5;
/// Delay before a detection's contribution to the likelihood decays.
pub const DECAY_DELAY_MS: f64 = 5_000.0;
/// Warning auto-dismiss delay.
pub const WARNING_DISMISS_MS: f64 = 10_000.0;

/// Configuration for a capture guard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GuardConfig {
    /// Send events to the server endpoint, otherwise console only
    pub log_to_server: bool,
    pub server_endpoint: String,
    pub blur_on_detection: bool,
    pub show_warning_modal: bool,
    pub watermark_enabled: bool,
    pub watermark_text: String,
    /// Minimum gap between processed detections
    pub detection_debounce_ms: f64,
    /// Reserved burst-sizing tunable; carried but not consulted
    pub recording_threshold: u32,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            log_to_server: true,
            server_endpoint: "/api/security/capture-events".into(),
            blur_on_detection: true,
            show_warning_modal: true,
            watermark_enabled: true,
            watermark_text: "CONFIDENTIAL".into(),
            detection_debounce_ms: 1_000.0,
            recording_threshold: 3,
        }
    }
}

impl GuardConfig {
    /// Merge a partial override object over the defaults.
    ///
    /// Unknown keys are ignored. A recognized key whose value has the wrong
    /// type is skipped on its own and the default kept. Anything that is not
    /// a JSON object yields the defaults.
    pub fn with_overrides(overrides: &Value) -> Self {
        let defaults = Self::default();
        let obj = match overrides {
            Value::Object(obj) => obj,
            Value::Null => return defaults,
            other => {
                log::debug!("Ignoring non-object config overrides: {}", other);
                return defaults;
            }
        };

        let mut merged: Map<String, Value> = match serde_json::to_value(&defaults) {
            Ok(Value::Object(map)) => map,
            _ => return defaults,
        };
        let mut config = defaults;

        for (key, value) in obj {
            if !merged.contains_key(key) {
                log::debug!("Ignoring unknown config key '{}'", key);
                continue;
            }
            let previous = merged.insert(key.clone(), value.clone());
            match serde_json::from_value::<GuardConfig>(Value::Object(merged.clone())) {
                Ok(candidate) => config = candidate,
                Err(e) => {
                    log::debug!("Ignoring config key '{}': {}", key, e);
                    if let Some(previous) = previous {
                        merged.insert(key.clone(), previous);
                    }
                }
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let config = GuardConfig::default();
        assert!(config.log_to_server);
        assert!(config.blur_on_detection);
        assert_eq!(config.watermark_text, "CONFIDENTIAL");
        assert_eq!(config.detection_debounce_ms, 1_000.0);
    }

    #[test]
    fn test_partial_override() {
        let config = GuardConfig::with_overrides(&json!({
            "detectionDebounceMs": 100,
            "watermarkText": "INTERNAL"
        }));
        assert_eq!(config.detection_debounce_ms, 100.0);
        assert_eq!(config.watermark_text, "INTERNAL");
        assert!(config.show_warning_modal);
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let config = GuardConfig::with_overrides(&json!({
            "blurOnDetection": false,
            "somethingElse": 42
        }));
        assert!(!config.blur_on_detection);
        assert_eq!(config.server_endpoint, GuardConfig::default().server_endpoint);
    }

    #[test]
    fn test_wrong_type_keeps_default() {
        let config = GuardConfig::with_overrides(&json!({
            "logToServer": "yes please",
            "serverEndpoint": "/audit"
        }));
        assert!(config.log_to_server);
        assert_eq!(config.server_endpoint, "/audit");
    }

    #[test]
    fn test_non_object_yields_defaults() {
        assert_eq!(GuardConfig::with_overrides(&json!(7)), GuardConfig::default());
        assert_eq!(GuardConfig::with_overrides(&Value::Null), GuardConfig::default());
    }
}
