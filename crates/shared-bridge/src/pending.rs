//! # Pending Calls
//!
//! A [`PendingCall`] owns the caller's completion handler and the failure
//! sentinel for one outbound call. Resolving it consumes it, so the handler
//! runs at most once; dropping it unresolved runs the handler with
//! `REMOTE_CANCELLED`, so the handler runs at least once.
//!
//! The [`PendingCallRegistry`] tracks what is in flight for diagnostics. Each
//! pending call points back at it through a `Weak`, so an abandoned adapter
//! is never kept alive by its own outstanding calls.

use crate::correlation::CorrelationId;
use crate::transport::TransportFault;
use dashmap::DashMap;
use shared_types::ServiceError;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Completion handler supplied by the caller of an outbound call.
pub type CompletionHandler<T> = Box<dyn FnOnce(Option<ServiceError>, T) + Send + 'static>;

/// How a pending call was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallOutcome {
    /// Remote answered with code 0.
    Completed,
    /// Remote answered with a non-zero code.
    RemoteError,
    /// No usable response.
    Fault,
    /// Dropped before any response arrived.
    Cancelled,
}

/// One outstanding remote invocation.
pub struct PendingCall<T: Send + 'static> {
    correlation_id: CorrelationId,
    method: &'static str,
    started_at: Instant,
    handler: Option<CompletionHandler<T>>,
    sentinel: Option<T>,
    registry: Weak<PendingCallRegistry>,
}

impl<T: Send + 'static> PendingCall<T> {
    pub fn correlation_id(&self) -> CorrelationId {
        self.correlation_id
    }

    pub fn method(&self) -> &'static str {
        self.method
    }

    /// Remote succeeded: hand over the decoded value.
    pub fn complete(mut self, value: T) {
        self.resolve(CallOutcome::Completed, None, Some(value));
    }

    /// Remote reported a failure: hand over the error and the sentinel.
    pub fn remote_error(mut self, error: ServiceError) {
        self.resolve(CallOutcome::RemoteError, Some(error), None);
    }

    /// Transport failed: hand over the fault's error and the sentinel.
    pub fn fault(mut self, fault: TransportFault) {
        self.resolve(CallOutcome::Fault, Some(fault.into_service_error()), None);
    }

    fn resolve(&mut self, outcome: CallOutcome, error: Option<ServiceError>, value: Option<T>) {
        let Some(handler) = self.handler.take() else {
            return;
        };
        let elapsed = self.started_at.elapsed();

        if let Some(registry) = self.registry.upgrade() {
            registry.finish(&self.correlation_id, outcome);
        }

        match outcome {
            CallOutcome::Completed => debug!(
                correlation_id = %self.correlation_id,
                method = self.method,
                elapsed_ms = elapsed.as_millis() as u64,
                "Remote call completed"
            ),
            _ => warn!(
                correlation_id = %self.correlation_id,
                method = self.method,
                outcome = ?outcome,
                error = ?error,
                elapsed_ms = elapsed.as_millis() as u64,
                "Remote call failed, delivering sentinel"
            ),
        }

        // The sentinel is only ever taken here, and the handler only once.
        if let Some(value) = value.or_else(|| self.sentinel.take()) {
            handler(error, value);
        }
        self.sentinel = None;
    }
}

impl<T: Send + 'static> Drop for PendingCall<T> {
    fn drop(&mut self) {
        if self.handler.is_some() {
            let error = TransportFault::Cancelled.into_service_error();
            self.resolve(CallOutcome::Cancelled, Some(error), None);
        }
    }
}

/// Statistics for the pending call registry
#[derive(Debug, Default)]
pub struct BridgeStats {
    pub total_registered: AtomicU64,
    pub total_completed: AtomicU64,
    pub total_remote_errors: AtomicU64,
    pub total_faults: AtomicU64,
    pub total_cancelled: AtomicU64,
}

/// Point-in-time copy of [`BridgeStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BridgeStatsSnapshot {
    pub registered: u64,
    pub completed: u64,
    pub remote_errors: u64,
    pub faults: u64,
    pub cancelled: u64,
}

impl BridgeStatsSnapshot {
    /// Calls resolved by any path.
    pub fn resolved(&self) -> u64 {
        self.completed + self.remote_errors + self.faults + self.cancelled
    }
}

struct InFlight {
    method: &'static str,
    started_at: Instant,
}

/// Tracks every in-flight call issued through one bridge.
#[derive(Default)]
pub struct PendingCallRegistry {
    pending: DashMap<CorrelationId, InFlight>,
    stats: BridgeStats,
}

impl PendingCallRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register a call and return the pending handle that resolves it.
    pub fn register<T, H>(self: &Arc<Self>, method: &'static str, sentinel: T, handler: H) -> PendingCall<T>
    where
        T: Send + 'static,
        H: FnOnce(Option<ServiceError>, T) + Send + 'static,
    {
        let correlation_id = CorrelationId::new();
        let started_at = Instant::now();

        self.pending.insert(correlation_id, InFlight { method, started_at });
        self.stats.total_registered.fetch_add(1, Ordering::Relaxed);

        debug!(
            correlation_id = %correlation_id,
            method = method,
            "Registered pending call"
        );

        PendingCall {
            correlation_id,
            method,
            started_at,
            handler: Some(Box::new(handler)),
            sentinel: Some(sentinel),
            registry: Arc::downgrade(self),
        }
    }

    fn finish(&self, correlation_id: &CorrelationId, outcome: CallOutcome) {
        self.pending.remove(correlation_id);
        let counter = match outcome {
            CallOutcome::Completed => &self.stats.total_completed,
            CallOutcome::RemoteError => &self.stats.total_remote_errors,
            CallOutcome::Fault => &self.stats.total_faults,
            CallOutcome::Cancelled => &self.stats.total_cancelled,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Get number of currently pending calls
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_pending(&self, correlation_id: &CorrelationId) -> bool {
        self.pending.contains_key(correlation_id)
    }

    /// Method names and ages of calls in flight for at least `threshold`.
    pub fn overdue(&self, threshold: Duration) -> Vec<(CorrelationId, &'static str, Duration)> {
        let now = Instant::now();
        self.pending
            .iter()
            .filter_map(|entry| {
                let age = now.duration_since(entry.started_at);
                (age >= threshold).then(|| (*entry.key(), entry.method, age))
            })
            .collect()
    }

    pub fn stats(&self) -> BridgeStatsSnapshot {
        BridgeStatsSnapshot {
            registered: self.stats.total_registered.load(Ordering::Relaxed),
            completed: self.stats.total_completed.load(Ordering::Relaxed),
            remote_errors: self.stats.total_remote_errors.load(Ordering::Relaxed),
            faults: self.stats.total_faults.load(Ordering::Relaxed),
            cancelled: self.stats.total_cancelled.load(Ordering::Relaxed),
        }
    }
}
