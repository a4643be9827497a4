//! # Staged Commit Flow
//!
//! The storage service driven entirely through `StorageServiceClient`:
//!
//! ```text
//! client ──addStateCache(N)──→ transport ──→ StorageServiceServer ──→ StateCacheStore
//! client ──commitBlock(N)────→ transport ──→ StorageServiceServer ──→ one atomic batch
//! client ──getBatch──────────→ transport ──→ StorageServiceServer ──→ committed rows
//! ```

#[cfg(test)]
mod tests {
    use qc_02_storage_service::{
        InMemoryKVStore, StorageConfig, StorageService, StorageServiceApi, StorageServiceClient,
        StorageServiceServer,
    };
    use shared_bridge::{CompletionBridge, InMemoryTransport};
    use shared_types::{error_codes, Entry, ServiceError, TableInfo, TableMutationSet};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use tokio::runtime::Handle;
    use tokio::sync::oneshot;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn t_test() -> TableInfo {
        TableInfo::new("t_test", "id", vec!["value".into()])
    }

    fn mutations(rows: &[(&str, &str)]) -> Vec<TableMutationSet> {
        let set = rows.iter().fold(TableMutationSet::new(t_test()), |set, (key, value)| {
            set.with_row(*key, Entry::new(0).with_field("value", value.as_bytes().to_vec()))
        });
        vec![set]
    }

    /// Storage service served over the in-process transport.
    fn connect<KV>(service: Arc<StorageService<KV>>) -> StorageServiceClient
    where
        KV: qc_02_storage_service::KeyValueStore + 'static,
    {
        service.create_table(t_test()).unwrap();
        let transport = Arc::new(InMemoryTransport::new());
        transport.register(Arc::new(StorageServiceServer::new(service)));
        StorageServiceClient::new(CompletionBridge::new(transport, Handle::current()))
    }

    fn in_memory() -> (Arc<StorageService<InMemoryKVStore>>, StorageServiceClient) {
        let service = Arc::new(StorageService::new_in_memory(StorageConfig::default()));
        let client = connect(Arc::clone(&service));
        (service, client)
    }

    async fn stage(client: &StorageServiceClient, n: i64, rows: &[(&str, &str)]) -> Option<ServiceError> {
        let (tx, rx) = oneshot::channel();
        client.add_state_cache(n, mutations(rows), move |e| {
            let _ = tx.send(e);
        });
        rx.await.unwrap()
    }

    async fn commit(client: &StorageServiceClient, n: i64) -> (Option<ServiceError>, u64) {
        let (tx, rx) = oneshot::channel();
        client.commit_block(n, vec![], vec![], move |e, count| {
            let _ = tx.send((e, count));
        });
        rx.await.unwrap()
    }

    async fn get_batch(client: &StorageServiceClient, keys: &[&str]) -> (Option<ServiceError>, Vec<Vec<u8>>) {
        let (tx, rx) = oneshot::channel();
        let keys = keys.iter().map(|k| k.to_string()).collect();
        client.get_batch("t_test", keys, move |e, values| {
            let _ = tx.send((e, values));
        });
        rx.await.unwrap()
    }

    // =============================================================================
    // FLOWS
    // =============================================================================

    #[tokio::test]
    async fn test_stage_commit_batch_read() {
        let (_, client) = in_memory();

        assert!(stage(&client, 10, &[("k1", "1")]).await.is_none());

        // Not visible until committed.
        let (error, values) = get_batch(&client, &["k1"]).await;
        assert!(error.is_none());
        assert_eq!(values, vec![Vec::<u8>::new()]);

        assert_eq!(commit(&client, 10).await, (None, 1));

        let (error, values) = get_batch(&client, &["k1", "missing"]).await;
        assert!(error.is_none());
        assert_eq!(values, vec![b"1".to_vec(), Vec::new()]);

        let (tx, rx) = oneshot::channel();
        client.get_state_cache(10, move |e, sets| {
            let _ = tx.send((e, sets));
        });
        let (error, sets) = rx.await.unwrap();
        assert_eq!(error.unwrap().code, error_codes::NOT_FOUND);
        assert!(sets.is_empty());
    }

    #[tokio::test]
    async fn test_stale_commit_over_the_wire() {
        let (service, client) = in_memory();

        stage(&client, 5, &[("a", "5")]).await;
        assert_eq!(commit(&client, 5).await, (None, 1));

        stage(&client, 3, &[("a", "3")]).await;
        let (error, count) = commit(&client, 3).await;
        assert_eq!(error.unwrap().code, error_codes::STALE_COMMIT);
        assert_eq!(count, 0);

        assert_eq!(service.last_committed(), Some(5));
        assert_eq!(get_batch(&client, &["a"]).await.1, vec![b"5".to_vec()]);
    }

    #[tokio::test]
    async fn test_schema_violation_rejected_at_stage() {
        let (service, client) = in_memory();

        let (tx, rx) = oneshot::channel();
        let bad = vec![TableMutationSet::new(t_test()).with_row("a", Entry::new(0).with_field("nope", b"x".to_vec()))];
        client.add_state_cache(1, bad, move |e| {
            let _ = tx.send(e);
        });
        assert_eq!(rx.await.unwrap().unwrap().code, error_codes::STAGING_ERROR);
        assert!(service.state_cache().is_empty());
    }

    #[tokio::test]
    async fn test_storage_fault_leaves_state_unchanged() {
        let store = Arc::new(InMemoryKVStore::new());
        let service = Arc::new(StorageService::open(Arc::clone(&store), StorageConfig::default()).unwrap());
        let client = connect(Arc::clone(&service));

        stage(&client, 1, &[("a", "1")]).await;
        commit(&client, 1).await;

        stage(&client, 2, &[("a", "2"), ("b", "2")]).await;
        store.fail_next_batch_after(1);
        let (error, count) = commit(&client, 2).await;
        assert_eq!(error.unwrap().code, error_codes::STORAGE_FAULT);
        assert_eq!(count, 0);

        assert_eq!(service.last_committed(), Some(1));
        assert_eq!(
            get_batch(&client, &["a", "b"]).await.1,
            vec![b"1".to_vec(), Vec::new()]
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_distinct_blocks_stage_concurrently() {
        let (service, client) = in_memory();

        let handles: Vec<_> = (1..=32)
            .map(|n: i64| {
                let client = client.clone();
                tokio::spawn(async move {
                    let key = format!("k{n:02}");
                    stage(&client, n, &[(key.as_str(), "v")]).await
                })
            })
            .collect();
        for handle in handles {
            assert!(handle.await.unwrap().is_none());
        }
        assert_eq!(service.state_cache().len(), 32);

        for n in 1..=32 {
            assert_eq!(commit(&client, n).await, (None, 1));
        }
        assert!(service.state_cache().is_empty());
        assert_eq!(service.last_committed(), Some(32));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_restage_and_commit_of_same_block_are_ordered() {
        for _ in 0..20 {
            let (_, client) = in_memory();
            stage(&client, 1, &[("a", "old")]).await;

            let restager = {
                let client = client.clone();
                tokio::spawn(async move { stage(&client, 1, &[("a", "new"), ("b", "new")]).await })
            };
            let (error, count) = commit(&client, 1).await;
            assert!(error.is_none());
            assert!(restager.await.unwrap().is_none());

            // Either the whole old entry or the whole new one was committed.
            let values = get_batch(&client, &["a", "b"]).await.1;
            match count {
                1 => assert_eq!(values, vec![b"old".to_vec(), Vec::new()]),
                2 => assert_eq!(values, vec![b"new".to_vec(), b"new".to_vec()]),
                other => panic!("unexpected applied count {other}"),
            }
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_two_table_commits_never_read_torn() {
        let (service, client) = in_memory();
        let t_pair = TableInfo::new("t_pair", "id", vec!["value".into()]);
        service.create_table(t_pair.clone()).unwrap();

        let done = Arc::new(AtomicBool::new(false));
        let reader = {
            let (client, done) = (client.clone(), Arc::clone(&done));
            tokio::spawn(async move {
                let read = |table: &'static str| {
                    let client = client.clone();
                    async move {
                        let (tx, rx) = oneshot::channel();
                        client.get_batch(table, vec!["k".to_string()], move |e, values| {
                            let _ = tx.send((e, values));
                        });
                        let (error, values) = rx.await.unwrap();
                        assert!(error.is_none());
                        String::from_utf8(values[0].clone()).unwrap().parse::<u64>().unwrap_or(0)
                    }
                };
                let mut rounds = 0u32;
                loop {
                    let finished = done.load(Ordering::Acquire);
                    // Versions only grow; a torn commit puts b outside [a1, a2].
                    let a1 = read("t_test").await;
                    let b = read("t_pair").await;
                    let a2 = read("t_test").await;
                    assert!(a1 <= b && b <= a2, "torn read: a1={a1} b={b} a2={a2}");
                    rounds += 1;
                    if finished {
                        break;
                    }
                }
                rounds
            })
        };

        for n in 1..=100i64 {
            let value = n.to_string();
            let mut sets = mutations(&[("k", value.as_str())]);
            sets.push(
                TableMutationSet::new(t_pair.clone())
                    .with_row("k", Entry::new(0).with_field("value", value.clone().into_bytes())),
            );
            let (tx, rx) = oneshot::channel();
            client.add_state_cache(n, sets, move |e| {
                let _ = tx.send(e);
            });
            assert!(rx.await.unwrap().is_none());
            assert_eq!(commit(&client, n).await, (None, 2));
        }
        done.store(true, Ordering::Release);

        assert!(reader.await.unwrap() > 0);
        assert_eq!(get_batch(&client, &["k"]).await.1, vec![b"100".to_vec()]);
    }
}
