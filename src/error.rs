//! Error types for the capture guard
//!
//! Nothing in this crate is allowed to surface an error to the host page.
//! Errors exist so internal plumbing can use `?`; every exported entry
//! point turns them into a console report and a neutral return value.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use wasm_bindgen::JsValue;

pub type Result<T> = std::result::Result<T, GuardError>;

/// Error codes for programmatic handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Configuration errors (1xx)
    ConfigError = 100,

    // DOM errors (2xx)
    MissingTarget = 200,
    JsInterop = 201,

    // Delivery errors (3xx)
    DeliveryFailed = 300,

    // Lifecycle errors (4xx)
    AlreadyInitialized = 400,
    NotInitialized = 401,

    // Internal errors (9xx)
    InternalError = 900,
}

/// Main error type for the capture guard
#[derive(Error, Debug, Clone)]
pub enum GuardError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("DOM target not found: {0}")]
    MissingTarget(String),

    #[error("JS interop failed: {0}")]
    JsInterop(String),

    #[error("Event delivery failed: {0}")]
    Delivery(String),

    #[error("Capture guard already initialized")]
    AlreadyInitialized,

    #[error("Capture guard not initialized")]
    NotInitialized,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl GuardError {
    /// Get the error code for programmatic handling
    pub fn code(&self) -> ErrorCode {
        match self {
            GuardError::Config(_) => ErrorCode::ConfigError,
            GuardError::MissingTarget(_) => ErrorCode::MissingTarget,
            GuardError::JsInterop(_) => ErrorCode::JsInterop,
            GuardError::Delivery(_) => ErrorCode::DeliveryFailed,
            GuardError::AlreadyInitialized => ErrorCode::AlreadyInitialized,
            GuardError::NotInitialized => ErrorCode::NotInitialized,
            GuardError::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// Whether the error should stop the guard. Always false: protection
    /// degrades instead of failing.
    pub fn is_fatal(&self) -> bool {
        false
    }

    /// Whether the error is just a console notice rather than a fault
    pub fn is_notice(&self) -> bool {
        matches!(
            self,
            GuardError::AlreadyInitialized | GuardError::MissingTarget(_)
        )
    }

    /// Get a user-friendly message for display
    pub fn user_message(&self) -> String {
        match self {
            GuardError::Config(_) => {
                "Capture guard configuration was invalid; defaults are in use.".into()
            }
            GuardError::MissingTarget(_) => {
                "A protected element was not found on the page.".into()
            }
            GuardError::JsInterop(_) => "A browser API call failed.".into(),
            GuardError::Delivery(_) => {
                "A security event could not be delivered to the server.".into()
            }
            GuardError::AlreadyInitialized => "Capture guard is already running.".into(),
            GuardError::NotInitialized => {
                "Capture guard has not been initialized. Call init() first.".into()
            }
            GuardError::Internal(_) => {
                "An internal error occurred. Please report this bug.".into()
            }
        }
    }
}

impl From<JsValue> for GuardError {
    fn from(value: JsValue) -> Self {
        GuardError::JsInterop(format!("{:?}", value))
    }
}

impl From<serde_json::Error> for GuardError {
    fn from(err: serde_json::Error) -> Self {
        GuardError::Config(err.to_string())
    }
}

impl From<GuardError> for JsValue {
    fn from(err: GuardError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

/// Error information for JavaScript consumption
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorInfo {
    pub code: u32,
    pub message: String,
    pub user_message: String,
    pub is_fatal: bool,
}

impl From<&GuardError> for ErrorInfo {
    fn from(err: &GuardError) -> Self {
        ErrorInfo {
            code: err.code() as u32,
            message: err.to_string(),
            user_message: err.user_message(),
            is_fatal: err.is_fatal(),
        }
    }
}
