//! Shared helpers for the daemon integration tests
//!
//! Each test gets its own socket under a fresh temp dir and its own
//! `MemoryStore`, served by the same listener code the binary uses.

#![allow(dead_code)]

use std::sync::Arc;

use kvproxy::driver::DriverListener;
use kvproxy::store::{MemoryStore, StoreClient};
use kvproxy_client::KvClient;
use tempfile::TempDir;

pub struct TestDaemon {
    pub socket: String,
    _dir: TempDir,
    _server: tokio::task::JoinHandle<()>,
}

impl TestDaemon {
    pub async fn start() -> Self {
        Self::with_store(Arc::new(MemoryStore::new())).await
    }

    pub async fn with_store(store: Arc<dyn StoreClient>) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().join("kvproxy.sock");
        let listener = DriverListener::bind(&path, "test").expect("Failed to bind socket");
        let server = tokio::spawn(async move {
            let _ = listener.serve(store, 8).await;
        });

        Self {
            socket: path.to_string_lossy().into_owned(),
            _dir: dir,
            _server: server,
        }
    }

    pub async fn client(&self) -> KvClient {
        KvClient::connect_with_pool(&self.socket, 1)
            .await
            .expect("Failed to connect to daemon")
    }
}
