//! # Completion Bridge
//!
//! Turns a remote call into exactly one invocation of a typed completion
//! handler `(Option<ServiceError>, T)`.
//!
//! ## Resolution Paths
//!
//! | Path | Handler receives |
//! |------|------------------|
//! | Response with code 0 | `None`, decoded value |
//! | Response with non-zero code | that error, sentinel |
//! | Transport fault | fault mapped to a negative code, sentinel |
//! | Task dropped before resolution | `REMOTE_CANCELLED`, sentinel |
//!
//! `call` never blocks and never returns a result: the handler is the only
//! result channel. It runs on a worker of the runtime the bridge was built
//! with.

use crate::correlation::CorrelationId;
use crate::pending::PendingCallRegistry;
use crate::transport::{RemoteTransport, TransportFault};
use serde::{de::DeserializeOwned, Serialize};
use shared_types::envelope::{decode_payload, encode_payload};
use shared_types::{RemoteRequest, RemoteResponsePayload, ServiceError};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tracing::debug;

/// Routes outbound calls through a transport and resolves their handlers.
#[derive(Clone)]
pub struct CompletionBridge {
    transport: Arc<dyn RemoteTransport>,
    registry: Arc<PendingCallRegistry>,
    runtime: Handle,
}

impl CompletionBridge {
    pub fn new(transport: Arc<dyn RemoteTransport>, runtime: Handle) -> Self {
        Self {
            transport,
            registry: PendingCallRegistry::new(),
            runtime,
        }
    }

    pub fn registry(&self) -> &Arc<PendingCallRegistry> {
        &self.registry
    }

    /// Issue `method` on `service` and resolve `handler` exactly once.
    ///
    /// `extract` pulls the result slot out of a successful response body;
    /// `sentinel` stands in for it on every failure path.
    pub fn call<Req, Resp, T, F, H>(
        &self,
        service: &'static str,
        method: &'static str,
        request: &Req,
        sentinel: T,
        extract: F,
        handler: H,
    ) -> CorrelationId
    where
        Req: Serialize,
        Resp: DeserializeOwned + RemoteResponsePayload + Send + 'static,
        T: Send + 'static,
        F: FnOnce(Resp) -> T + Send + 'static,
        H: FnOnce(Option<ServiceError>, T) + Send + 'static,
    {
        let pending = self.registry.register(method, sentinel, handler);
        let correlation_id = pending.correlation_id();
        let encoded = encode_payload(request);
        let transport = Arc::clone(&self.transport);

        debug!(
            correlation_id = %correlation_id,
            service = service,
            method = method,
            "Issuing remote call"
        );

        self.runtime.spawn(async move {
            let payload = match encoded {
                Ok(payload) => payload,
                Err(e) => {
                    pending.fault(TransportFault::Codec(e.to_string()));
                    return;
                }
            };

            let request = RemoteRequest::new(correlation_id.into(), service, method, payload);
            let response = match transport.invoke(request).await {
                Ok(response) => response,
                Err(fault) => {
                    pending.fault(fault);
                    return;
                }
            };

            match decode_payload::<Resp>(&response.payload) {
                Ok(body) => match body.wire_error().to_service_error() {
                    None => pending.complete(extract(body)),
                    Some(error) => pending.remote_error(error),
                },
                Err(e) => pending.fault(TransportFault::Codec(e.to_string())),
            }
        });

        correlation_id
    }

    /// Awaitable form of [`CompletionBridge::call`].
    pub async fn call_and_wait<Req, Resp, T, F>(
        &self,
        service: &'static str,
        method: &'static str,
        request: &Req,
        sentinel: T,
        extract: F,
    ) -> (Option<ServiceError>, T)
    where
        Req: Serialize,
        Resp: DeserializeOwned + RemoteResponsePayload + Send + 'static,
        T: Clone + Send + 'static,
        F: FnOnce(Resp) -> T + Send + 'static,
    {
        let fallback = sentinel.clone();
        let (tx, rx) = oneshot::channel();
        self.call(service, method, request, sentinel, extract, move |error, value| {
            let _ = tx.send((error, value));
        });

        match rx.await {
            Ok(result) => result,
            Err(_) => (Some(TransportFault::Cancelled.into_service_error()), fallback),
        }
    }
}
