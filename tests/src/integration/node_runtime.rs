//! # Node Runtime Wiring
//!
//! A node built from configuration, driven only through the clients its
//! container hands out: a block is staged and committed through storage,
//! announced to consensus, and reflected in the sync status. Transactions
//! submitted to the pool show up as unsealed in the same status.

#[cfg(test)]
mod tests {
    use node_runtime::container::StorageBackend;
    use node_runtime::{NodeConfig, NodeRuntime, NodeStatus};
    use qc_02_storage_service::StorageServiceApi;
    use qc_06_txpool_service::adapters::DUPLICATE_TRANSACTION;
    use shared_types::{error_codes, Entry, LedgerConfig, TableInfo, TableMutationSet};
    use std::collections::HashMap;
    use tokio::runtime::Handle;
    use std::time::Duration;
    use tokio::sync::oneshot;

    fn config(vars: &[(&str, &str)]) -> NodeConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        NodeConfig::from_lookup(|name| vars.get(name).cloned()).unwrap()
    }

    fn block_rows(table: &TableInfo, value: &str) -> Vec<TableMutationSet> {
        vec![TableMutationSet::new(table.clone())
            .with_row("alice", Entry::new(0).with_field("balance", value.as_bytes().to_vec()))]
    }

    #[tokio::test]
    async fn test_block_lifecycle_through_node_clients() {
        let node = NodeRuntime::new(
            config(&[("QC_TABLES", "t_balance:account:balance")]),
            Handle::current(),
        )
        .unwrap();
        let task = node.start();
        let container = node.container();
        let table = container.storage.table_info("t_balance").unwrap();

        let (tx, rx) = oneshot::channel();
        container.storage_client.add_state_cache(1, block_rows(&table, "100"), move |e| {
            let _ = tx.send(e);
        });
        assert!(rx.await.unwrap().is_none());
        assert_eq!(node.status().staged_blocks, 1);

        let (tx, rx) = oneshot::channel();
        container.storage_client.commit_block(1, vec![], vec![], move |e, count| {
            let _ = tx.send((e, count));
        });
        assert_eq!(rx.await.unwrap(), (None, 1));

        let (tx, rx) = oneshot::channel();
        container.storage_client.get("t_balance", "alice", move |e, value| {
            let _ = tx.send((e, value));
        });
        assert_eq!(rx.await.unwrap(), (None, b"100".to_vec()));

        let ledger = LedgerConfig {
            block_number: 1,
            block_hash: vec![0x01, 0x02],
            ..LedgerConfig::default()
        };
        let (tx, rx) = oneshot::channel();
        container.pbft_client.notify_new_block(ledger, move |e| {
            let _ = tx.send(e);
        });
        assert!(rx.await.unwrap().is_none());

        let (tx, rx) = oneshot::channel();
        container.sync_client.get_sync_info(move |e, info| {
            let _ = tx.send((e, info));
        });
        let (error, info) = rx.await.unwrap();
        assert!(error.is_none());
        let info: serde_json::Value = serde_json::from_str(&info).unwrap();
        assert_eq!(info["blockNumber"], 1);
        assert_eq!(info["blockHash"], "0102");

        assert_eq!(
            node.status(),
            NodeStatus {
                last_committed: Some(1),
                staged_blocks: 0,
                pending_calls: 0,
                calls_resolved: 5,
            }
        );

        node.shutdown();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_file_backed_node_recovers_after_restart() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().to_string_lossy().into_owned();
        let vars = [
            ("QC_STORAGE_BACKEND", "file"),
            ("QC_DATA_DIR", data_dir.as_str()),
            ("QC_TABLES", "t_balance:account:balance"),
        ];

        {
            let node = NodeRuntime::new(config(&vars), Handle::current()).unwrap();
            let container = node.container();
            assert_eq!(container.config.storage.backend, StorageBackend::File);
            let table = container.storage.table_info("t_balance").unwrap();

            for (n, value) in [(1, "10"), (2, "20")] {
                container.storage.add_state_cache(n, block_rows(&table, value)).unwrap();
                container.storage.commit_block(n, vec![], vec![]).unwrap();
            }
            // Staged but never committed.
            container.storage.add_state_cache(3, block_rows(&table, "30")).unwrap();
        }

        let node = NodeRuntime::new(config(&vars), Handle::current()).unwrap();
        let status = node.status();
        assert_eq!(status.last_committed, Some(2));
        assert_eq!(status.staged_blocks, 0);

        let container = node.container();
        assert_eq!(container.storage.get("t_balance", "alice").unwrap(), b"20".to_vec());

        // Stale after recovery.
        let (tx, rx) = oneshot::channel();
        container.storage_client.commit_block(2, vec![], vec![], move |e, count| {
            let _ = tx.send((e.map(|e| e.code), count));
        });
        assert_eq!(rx.await.unwrap(), (Some(error_codes::STALE_COMMIT), 0));
    }

    #[tokio::test]
    async fn test_submitted_transactions_reach_sync_status() {
        let node = NodeRuntime::new(config(&[("QC_TX_POOL_CAPACITY", "4")]), Handle::current()).unwrap();
        let container = node.container();

        for tx in [b"tx-a".to_vec(), b"tx-b".to_vec(), b"tx-a".to_vec()] {
            let (sender, receiver) = oneshot::channel();
            container.txpool_client.submit(tx, move |e, result| {
                let _ = sender.send((e.map(|e| e.code), result.is_some()));
            });
            let outcome = receiver.await.unwrap();
            assert!(outcome == (None, true) || outcome == (Some(DUPLICATE_TRANSACTION), false));
        }
        assert_eq!(container.txpool.pending_count(), 2);

        // Unsealed-size reports are fire-and-forget.
        for _ in 0..100 {
            if node.status().pending_calls == 0 && container.consensus.unsealed_txs_size() == 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        let (sender, receiver) = oneshot::channel();
        container.sync_client.get_sync_info(move |e, info| {
            let _ = sender.send((e, info));
        });
        let (error, info) = receiver.await.unwrap();
        assert!(error.is_none());
        let info: serde_json::Value = serde_json::from_str(&info).unwrap();
        assert_eq!(info["unsealedTxs"], 2);
    }
}
