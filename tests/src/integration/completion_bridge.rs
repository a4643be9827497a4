//! # Completion Bridge Resolution
//!
//! Every outbound call resolves its handler exactly once, whichever way it
//! ends:
//!
//! | Ending | Error code | Value |
//! |--------|-----------|-------|
//! | Remote success | none | decoded |
//! | Remote error | remote code | sentinel |
//! | Service unreachable | `REMOTE_UNREACHABLE` | sentinel |
//! | Call timeout | `REMOTE_CALL_TIMEOUT` | sentinel |
//! | Runtime gone before a response | `REMOTE_CANCELLED` | sentinel |

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use qc_08_consensus_service::adapters::STALE_PROPOSAL;
    use qc_08_consensus_service::{
        BlockSyncServiceClient, BlockSyncServiceServer, PbftServiceClient, PbftServiceServer,
        StandaloneConsensusEngine, StandaloneSyncEngine,
    };
    use shared_bridge::{CompletionBridge, InMemoryTransport, ServiceEndpoint, TransportFault};
    use shared_types::{error_codes, services, LedgerConfig, ServiceError, ViewNumber};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::runtime::Handle;
    use tokio::sync::oneshot;

    type Seen<T> = Arc<Mutex<Vec<(Option<i32>, T)>>>;

    fn recorder<T: Send + 'static>(seen: &Seen<T>) -> impl FnOnce(Option<ServiceError>, T) + Send + 'static {
        let seen = Arc::clone(seen);
        move |error, value| seen.lock().push((error.map(|e| e.code), value))
    }

    /// PBFT endpoint that never answers.
    struct StalledPbft;

    #[async_trait]
    impl ServiceEndpoint for StalledPbft {
        fn service_name(&self) -> &'static str {
            services::PBFT
        }

        async fn dispatch(&self, _method: &str, _payload: &[u8]) -> Result<Vec<u8>, TransportFault> {
            std::future::pending().await
        }
    }

    fn consensus_transport() -> Arc<InMemoryTransport> {
        let transport = Arc::new(InMemoryTransport::new());
        let engine = Arc::new(StandaloneConsensusEngine::new());
        transport.register(Arc::new(PbftServiceServer::new(Arc::clone(&engine))));
        transport.register(Arc::new(BlockSyncServiceServer::new(Arc::new(StandaloneSyncEngine::new(engine)))));
        transport
    }

    async fn view(client: &PbftServiceClient) -> (Option<ServiceError>, ViewNumber) {
        let (tx, rx) = oneshot::channel();
        client.get_pbft_view(move |e, v| {
            let _ = tx.send((e, v));
        });
        rx.await.unwrap()
    }

    #[tokio::test]
    async fn test_success_and_remote_error_each_resolve_once() {
        let transport = consensus_transport();
        let client = PbftServiceClient::new(CompletionBridge::new(transport, Handle::current()));

        assert_eq!(view(&client).await, (None, 0));

        let ledger = LedgerConfig {
            block_number: 5,
            block_hash: vec![0xAA; 32],
            ..LedgerConfig::default()
        };
        let (tx, rx) = oneshot::channel();
        client.notify_new_block(ledger, move |e| {
            let _ = tx.send(e);
        });
        assert!(rx.await.unwrap().is_none());

        // At or below the head is stale.
        let (tx, rx) = oneshot::channel();
        client.submit_proposal(b"p5".to_vec(), 5, vec![0xBB; 32], move |e| {
            let _ = tx.send(e.map(|e| e.code));
        });
        assert_eq!(rx.await.unwrap(), Some(STALE_PROPOSAL));

        let stats = client.bridge().registry().stats();
        assert_eq!(stats.registered, 3);
        assert_eq!(stats.completed, 2);
        assert_eq!(stats.remote_errors, 1);
        assert_eq!(client.bridge().registry().pending_count(), 0);
    }

    #[tokio::test]
    async fn test_unreachable_service_delivers_sentinel() {
        let transport = consensus_transport();
        transport.deregister(services::BLOCK_SYNC);
        let client = BlockSyncServiceClient::new(CompletionBridge::new(transport, Handle::current()));

        let seen: Seen<String> = Arc::default();
        let (tx, rx) = oneshot::channel();
        let sink = recorder(&seen);
        client.get_sync_info(move |e, info| {
            sink(e, info);
            let _ = tx.send(());
        });
        rx.await.unwrap();

        assert_eq!(*seen.lock(), vec![(Some(error_codes::REMOTE_UNREACHABLE), String::new())]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_delivers_sentinel_once() {
        let transport = Arc::new(InMemoryTransport::with_call_timeout(Duration::from_millis(100)));
        transport.register(Arc::new(StalledPbft));
        let client = PbftServiceClient::new(CompletionBridge::new(transport, Handle::current()));

        let (tx, rx) = oneshot::channel();
        client.check_block(Default::default(), move |e, valid| {
            let _ = tx.send((e.map(|e| e.code), valid));
        });
        assert_eq!(rx.await.unwrap(), (Some(error_codes::REMOTE_CALL_TIMEOUT), false));

        let stats = client.bridge().registry().stats();
        assert_eq!(stats.faults, 1);
        assert_eq!(stats.resolved(), 1);
    }

    #[test]
    fn test_runtime_teardown_cancels_pending_calls() {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .unwrap();
        let transport = Arc::new(InMemoryTransport::new());
        transport.register(Arc::new(StalledPbft));
        let client = PbftServiceClient::new(CompletionBridge::new(transport, runtime.handle().clone()));

        let (tx, rx) = std::sync::mpsc::channel();
        for _ in 0..8 {
            let tx = tx.clone();
            client.get_pbft_view(move |e, v| {
                let _ = tx.send((e.map(|e| e.code), v));
            });
        }
        drop(tx);

        runtime.shutdown_timeout(Duration::from_secs(1));

        let mut outcomes = Vec::new();
        while let Ok(outcome) = rx.recv_timeout(Duration::from_secs(5)) {
            outcomes.push(outcome);
        }
        assert_eq!(outcomes, vec![(Some(error_codes::REMOTE_CANCELLED), 0); 8]);
        assert_eq!(client.bridge().registry().stats().cancelled, 8);
        assert_eq!(client.bridge().registry().pending_count(), 0);
    }

    #[tokio::test]
    async fn test_dropped_client_still_resolves_handler() {
        let transport = consensus_transport();
        let client = PbftServiceClient::new(CompletionBridge::new(transport, Handle::current()));

        let (tx, rx) = oneshot::channel();
        client.get_pbft_view(move |e, v| {
            let _ = tx.send((e, v));
        });
        drop(client);

        assert_eq!(rx.await.unwrap(), (None, 0));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_mixed_outcomes_resolve_exactly_once() {
        let transport = consensus_transport();
        let bridge = CompletionBridge::new(transport.clone(), Handle::current());
        let pbft = PbftServiceClient::new(bridge.clone());
        let sync = BlockSyncServiceClient::new(bridge.clone());

        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        for i in 0..50 {
            let tx = tx.clone();
            if i % 2 == 0 {
                pbft.get_pbft_view(move |e, _| {
                    let _ = tx.send(e.map(|e| e.code));
                });
            } else {
                sync.get_sync_info(move |e, _| {
                    let _ = tx.send(e.map(|e| e.code));
                });
            }
            if i == 25 {
                transport.deregister(services::BLOCK_SYNC);
            }
        }
        drop(tx);

        let mut resolved = 0;
        while let Some(code) = rx.recv().await {
            assert!(code.is_none() || code == Some(error_codes::REMOTE_UNREACHABLE));
            resolved += 1;
        }
        assert_eq!(resolved, 50);

        let stats = bridge.registry().stats();
        assert_eq!(stats.registered, 50);
        assert_eq!(stats.resolved(), 50);
        assert_eq!(bridge.registry().pending_count(), 0);
    }
}
