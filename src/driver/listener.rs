//! Unix socket listener for one cluster.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::net::UnixListener;

use super::spawn_driver_handler;
use crate::error::ProxyResult;
use crate::store::StoreClient;

/// Socket bound for one cluster. The socket file is removed on drop.
pub struct DriverListener {
    listener: UnixListener,
    path: PathBuf,
    cluster: String,
}

impl DriverListener {
    /// Bind `path`, replacing a stale socket file left by a previous run.
    pub fn bind(path: &Path, cluster: impl Into<String>) -> ProxyResult<Self> {
        match std::fs::remove_file(path) {
            Ok(()) => tracing::debug!("Removed stale socket {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        let listener = UnixListener::bind(path)?;
        Ok(Self {
            listener,
            path: path.to_path_buf(),
            cluster: cluster.into(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Accept connections forever, handing each to its own task.
    ///
    /// Returns only if the accept loop fails.
    pub async fn serve(&self, store: Arc<dyn StoreClient>, queue_size: usize) -> ProxyResult<()> {
        tracing::info!(
            "Cluster {} listening on unix socket {}",
            self.cluster,
            self.path.display()
        );

        let sender = spawn_driver_handler(store, self.cluster.clone(), queue_size);
        let mut accepted: u64 = 0;
        loop {
            let (stream, _) = match self.listener.accept().await {
                Ok(conn) => conn,
                Err(e) => {
                    tracing::error!("Accept failed on {}: {}", self.path.display(), e);
                    return Err(e.into());
                }
            };
            accepted += 1;
            let addr = format!("{}#{}", self.cluster, accepted);
            if sender.send((stream, addr)).await.is_err() {
                tracing::error!("Driver handler for {} stopped", self.cluster);
                return Ok(());
            }
        }
    }
}

impl Drop for DriverListener {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!("Failed to remove socket {}: {}", self.path.display(), e);
            }
        }
        tracing::info!("Cluster {} listener on {} closed", self.cluster, self.path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_bind_replaces_stale_file_and_cleans_up() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("kv.sock");
        std::fs::write(&path, b"stale").unwrap();

        let listener = DriverListener::bind(&path, "test").unwrap();
        assert_eq!(listener.path(), path.as_path());
        assert!(path.exists());

        drop(listener);
        assert!(!path.exists());
    }
}
