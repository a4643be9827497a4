//! # Transport Ports
//!
//! [`RemoteTransport`] carries an encoded request to a remote service and
//! brings back its encoded response. [`ServiceEndpoint`] is the receiving end:
//! a server adapter that decodes the request and answers it.
//!
//! Any failure to obtain a response is a [`TransportFault`]. Remote-reported
//! failures are not faults: they arrive inside a successfully delivered
//! response body.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use shared_types::envelope::{decode_payload, encode_payload};
use shared_types::error_codes;
use shared_types::{RemoteRequest, RemoteResponse, ServiceError};
use std::time::Duration;
use thiserror::Error;

/// The call did not produce a usable response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportFault {
    #[error("remote call timed out after {0:?}")]
    Timeout(Duration),

    #[error("service unreachable: {0}")]
    Unreachable(String),

    #[error("codec failure: {0}")]
    Codec(String),

    #[error("call cancelled before completion")]
    Cancelled,

    #[error("remote exception: {0}")]
    Exception(String),

    #[error("unknown method {service}.{method}")]
    UnknownMethod { service: String, method: String },
}

impl TransportFault {
    /// Negative error code reported to the completion handler.
    pub fn code(&self) -> i32 {
        match self {
            TransportFault::Timeout(_) => error_codes::REMOTE_CALL_TIMEOUT,
            TransportFault::Unreachable(_) => error_codes::REMOTE_UNREACHABLE,
            TransportFault::Codec(_) => error_codes::REMOTE_CODEC,
            TransportFault::Cancelled => error_codes::REMOTE_CANCELLED,
            TransportFault::Exception(_) => error_codes::REMOTE_EXCEPTION,
            TransportFault::UnknownMethod { .. } => error_codes::REMOTE_UNKNOWN_METHOD,
        }
    }

    pub fn into_service_error(self) -> ServiceError {
        ServiceError::new(self.code(), self.to_string())
    }
}

impl From<TransportFault> for ServiceError {
    fn from(fault: TransportFault) -> Self {
        fault.into_service_error()
    }
}

/// Delivers requests to remote services.
#[async_trait]
pub trait RemoteTransport: Send + Sync {
    /// Deliver `request` and wait for its response.
    ///
    /// Implementations enforce their own per-call timeout and report it as
    /// [`TransportFault::Timeout`].
    async fn invoke(&self, request: RemoteRequest) -> Result<RemoteResponse, TransportFault>;
}

/// A server adapter reachable through a transport.
#[async_trait]
pub trait ServiceEndpoint: Send + Sync {
    /// Name the endpoint is registered under.
    fn service_name(&self) -> &'static str;

    /// Answer one encoded request for `method`.
    async fn dispatch(&self, method: &str, payload: &[u8]) -> Result<Vec<u8>, TransportFault>;
}

/// Decode a request body, mapping failure to a codec fault.
pub fn decode_request<T: DeserializeOwned>(payload: &[u8]) -> Result<T, TransportFault> {
    decode_payload(payload).map_err(|e| TransportFault::Codec(e.to_string()))
}

/// Encode a response body, mapping failure to a codec fault.
pub fn encode_response<T: Serialize>(response: &T) -> Result<Vec<u8>, TransportFault> {
    encode_payload(response).map_err(|e| TransportFault::Codec(e.to_string()))
}
