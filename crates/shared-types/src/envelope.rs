//! # Remote Call Envelope
//!
//! The wrapper every remote invocation travels in. The payload is an opaque,
//! already-encoded request or response body; the envelope only adds routing
//! and correlation.
//!
//! The in-process transport encodes payloads with `bincode`. The real network
//! codec is owned by the RPC framework and is not modelled here.

use crate::errors::CodecError;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use uuid::Uuid;

/// A request headed for one method of one remote service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteRequest {
    // =========================================================================
    // HEADER SECTION
    // =========================================================================
    /// Protocol version for forward compatibility.
    pub version: u16,

    /// Correlates the response (and log lines) with this request.
    pub correlation_id: Uuid,

    /// Target service, one of [`crate::ipc::services`].
    pub service: String,

    /// Target method, one of [`crate::ipc::methods`].
    pub method: String,

    /// Unix timestamp (milliseconds) when the request was issued.
    pub timestamp_ms: u64,

    // =========================================================================
    // PAYLOAD SECTION
    // =========================================================================
    /// Encoded request body.
    pub payload: Vec<u8>,
}

impl RemoteRequest {
    /// Current protocol version.
    pub const CURRENT_VERSION: u16 = 1;

    pub fn new(
        correlation_id: Uuid,
        service: impl Into<String>,
        method: impl Into<String>,
        payload: Vec<u8>,
    ) -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            correlation_id,
            service: service.into(),
            method: method.into(),
            timestamp_ms: now_millis(),
            payload,
        }
    }
}

/// The answer to a [`RemoteRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteResponse {
    /// Copied from the request.
    pub correlation_id: Uuid,
    /// Encoded response body. Its first field is always a `WireError`.
    pub payload: Vec<u8>,
}

impl RemoteResponse {
    pub fn new(correlation_id: Uuid, payload: Vec<u8>) -> Self {
        Self {
            correlation_id,
            payload,
        }
    }
}

/// Encode a request or response body.
pub fn encode_payload<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
    bincode::serialize(value).map_err(CodecError::from)
}

/// Decode a request or response body.
pub fn decode_payload<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    bincode::deserialize(bytes).map_err(CodecError::from)
}

fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::WireError;
    use crate::ipc::GetPbftViewResponse;

    #[test]
    fn test_request_carries_routing() {
        let id = Uuid::new_v4();
        let req = RemoteRequest::new(id, "PBFTService", "getPBFTView", vec![]);
        assert_eq!(req.version, RemoteRequest::CURRENT_VERSION);
        assert_eq!(req.correlation_id, id);
        assert_eq!(req.service, "PBFTService");
        assert!(req.timestamp_ms > 0);
    }

    #[test]
    fn test_truncated_payload_is_codec_error() {
        let resp = GetPbftViewResponse {
            error: WireError::success(),
            view: 42,
        };
        let bytes = encode_payload(&resp).unwrap();
        let truncated = &bytes[..bytes.len() - 1];
        assert!(decode_payload::<GetPbftViewResponse>(truncated).is_err());
    }
}
