//! Shared harness for the service integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::PathBuf;

use depot_service::{ProxyRole, ServerRole};
use depot_store::StorageConfig;
use tempfile::TempDir;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Binds and starts a server role on a loopback port, storing under a fresh
/// temp directory.
pub async fn start_server() -> (ServerRole, TempDir) {
    depot_test_utils::logging::init();

    let base = TempDir::new().unwrap();
    let server = ServerRole::bind(loopback(), &StorageConfig::with_base_dir(base.path()))
        .await
        .unwrap();
    server.start();

    (server, base)
}

/// Creates a proxy role for `server_addr`, storing under a fresh temp
/// directory.
pub async fn new_proxy(server_addr: SocketAddr) -> (ProxyRole, TempDir) {
    depot_test_utils::logging::init();

    let base = TempDir::new().unwrap();
    let proxy = ProxyRole::new(server_addr, &StorageConfig::with_base_dir(base.path()))
        .await
        .unwrap();

    (proxy, base)
}

/// `127.0.0.1:0` — loopback with an ephemeral port.
pub fn loopback() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 0))
}

/// Drains a reader to the end.
pub async fn read_all<R: AsyncRead + Unpin>(mut reader: R) -> Vec<u8> {
    let mut data = Vec::new();
    reader.read_to_end(&mut data).await.unwrap();
    data
}

/// Lists the files under the per-process storage directory inside `base`
/// whose names start with `prefix`.
pub fn stored_files(base: &TempDir, prefix: &str) -> Vec<PathBuf> {
    let mut found = Vec::new();

    for entry in std::fs::read_dir(base.path()).into_iter().flatten().flatten() {
        if !entry.path().is_dir() {
            continue;
        }
        for file in std::fs::read_dir(entry.path()).into_iter().flatten().flatten() {
            if file.file_name().to_string_lossy().starts_with(prefix) {
                found.push(file.path());
            }
        }
    }

    found.sort();
    found
}
