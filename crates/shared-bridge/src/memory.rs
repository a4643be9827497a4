//! # In-Memory Transport
//!
//! Routes requests to [`ServiceEndpoint`]s registered in the same process.
//! Used by the node runtime for co-located services and by tests.
//!
//! Each dispatch runs in its own task: a panicking endpoint surfaces as
//! [`TransportFault::Exception`] instead of taking the caller down, and the
//! optional per-call timeout aborts the dispatch and reports
//! [`TransportFault::Timeout`].

use crate::transport::{RemoteTransport, ServiceEndpoint, TransportFault};
use async_trait::async_trait;
use dashmap::DashMap;
use shared_types::{RemoteRequest, RemoteResponse};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Process-local transport.
#[derive(Default)]
pub struct InMemoryTransport {
    endpoints: DashMap<String, Arc<dyn ServiceEndpoint>>,
    call_timeout: Option<Duration>,
    calls_dispatched: AtomicU64,
}

impl InMemoryTransport {
    /// Transport without a per-call timeout.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_call_timeout(call_timeout: Duration) -> Self {
        Self {
            call_timeout: Some(call_timeout),
            ..Self::default()
        }
    }

    /// Make `endpoint` reachable under its service name, replacing any
    /// previous registration.
    pub fn register(&self, endpoint: Arc<dyn ServiceEndpoint>) {
        let name = endpoint.service_name();
        debug!(service = name, "Registered service endpoint");
        self.endpoints.insert(name.to_string(), endpoint);
    }

    /// Make a service unreachable.
    pub fn deregister(&self, service: &str) -> bool {
        self.endpoints.remove(service).is_some()
    }

    pub fn is_registered(&self, service: &str) -> bool {
        self.endpoints.contains_key(service)
    }

    pub fn calls_dispatched(&self) -> u64 {
        self.calls_dispatched.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl RemoteTransport for InMemoryTransport {
    async fn invoke(&self, request: RemoteRequest) -> Result<RemoteResponse, TransportFault> {
        let RemoteRequest {
            correlation_id,
            service,
            method,
            payload,
            ..
        } = request;

        // Clone out of the map so no shard lock is held across the await.
        let endpoint = self
            .endpoints
            .get(&service)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| TransportFault::Unreachable(service.clone()))?;

        self.calls_dispatched.fetch_add(1, Ordering::Relaxed);

        let mut task = tokio::spawn(async move { endpoint.dispatch(&method, &payload).await });

        let joined = match self.call_timeout {
            Some(limit) => match tokio::time::timeout(limit, &mut task).await {
                Ok(joined) => joined,
                Err(_) => {
                    task.abort();
                    warn!(
                        correlation_id = %correlation_id,
                        service = %service,
                        timeout_ms = limit.as_millis() as u64,
                        "Remote call timed out"
                    );
                    return Err(TransportFault::Timeout(limit));
                }
            },
            None => task.await,
        };

        let body = match joined {
            Ok(result) => result?,
            Err(e) if e.is_panic() => {
                warn!(correlation_id = %correlation_id, service = %service, "Endpoint panicked");
                return Err(TransportFault::Exception(format!("{service} endpoint panicked")));
            }
            Err(_) => return Err(TransportFault::Cancelled),
        };

        Ok(RemoteResponse::new(correlation_id, body))
    }
}
