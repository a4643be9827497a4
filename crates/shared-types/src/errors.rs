//! # Error Channel
//!
//! Every remote response carries a [`WireError`]. Code `0` means success; any
//! other code is a failure whose message travels alongside it. Internally a
//! failure is a [`ServiceError`]; success is the absence of one.
//!
//! Callers test the code, never the presence of an error object.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Numeric error codes shared by every service adapter.
///
/// Transport faults are negative, storage domain errors sit in the 2000 range.
/// Codes reported by consensus engines are passed through unchanged.
pub mod error_codes {
    pub const SUCCESS: i32 = 0;

    // Transport faults
    pub const REMOTE_EXCEPTION: i32 = -1;
    pub const REMOTE_UNKNOWN_METHOD: i32 = -3;
    pub const REMOTE_CANCELLED: i32 = -4;
    pub const REMOTE_CODEC: i32 = -5;
    pub const REMOTE_UNREACHABLE: i32 = -6;
    pub const REMOTE_CALL_TIMEOUT: i32 = -7;

    // Storage
    pub const STAGING_ERROR: i32 = 2001;
    pub const NOT_FOUND: i32 = 2002;
    pub const STALE_COMMIT: i32 = 2003;
    pub const STORAGE_FAULT: i32 = 2004;

    /// Whether `code` denotes a transport-level fault rather than a
    /// remote-reported failure.
    pub fn is_transport_fault(code: i32) -> bool {
        code < 0
    }
}

/// An internal failure: a non-zero code plus a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("error {code}: {message}")]
pub struct ServiceError {
    pub code: i32,
    pub message: String,
}

impl ServiceError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn is_transport_fault(&self) -> bool {
        error_codes::is_transport_fault(self.code)
    }
}

/// The error value carried in every remote response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct WireError {
    pub error_code: i32,
    pub error_message: String,
}

impl WireError {
    /// The success value: code 0, empty message.
    pub fn success() -> Self {
        Self::default()
    }

    /// Encode an optional internal failure. `None` becomes code 0.
    pub fn from_result(error: Option<&ServiceError>) -> Self {
        match error {
            Some(e) => Self {
                error_code: e.code,
                error_message: e.message.clone(),
            },
            None => Self::success(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error_code == error_codes::SUCCESS
    }

    /// Decode back into the internal representation. Code 0 yields `None`.
    pub fn to_service_error(&self) -> Option<ServiceError> {
        if self.is_success() {
            None
        } else {
            Some(ServiceError::new(self.error_code, self.error_message.clone()))
        }
    }

    pub fn into_service_error(self) -> Option<ServiceError> {
        if self.is_success() {
            None
        } else {
            Some(ServiceError {
                code: self.error_code,
                message: self.error_message,
            })
        }
    }
}

impl From<ServiceError> for WireError {
    fn from(e: ServiceError) -> Self {
        Self {
            error_code: e.code,
            error_message: e.message,
        }
    }
}

impl<T> From<&Result<T, ServiceError>> for WireError {
    fn from(result: &Result<T, ServiceError>) -> Self {
        Self::from_result(result.as_ref().err())
    }
}

/// Payload encoding failure.
#[derive(Debug, Error)]
#[error("codec error: {0}")]
pub struct CodecError(pub String);

impl From<bincode::Error> for CodecError {
    fn from(e: bincode::Error) -> Self {
        Self(e.to_string())
    }
}
