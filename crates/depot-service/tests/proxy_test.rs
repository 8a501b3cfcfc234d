//! Integration tests for the proxy role: forwarding puts, read-through
//! caching, and fetch-time integrity verification.

mod common;

use common::*;
use depot_core::digest::key_of;
use depot_core::{BlobKey, JobId};
use depot_proto as proto;
use depot_service::Error;
use depot_test_utils::payload;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;

#[tokio::test]
async fn test_put_forwards_to_server_and_caches_nothing() {
    let (server, _server_base) = start_server().await;
    let (proxy, proxy_base) = new_proxy(server.local_addr()).await;

    let data = payload::patterned(4096);
    let key = proxy.put_bytes(Some(&JobId::random()), &data).await.unwrap();
    assert_eq!(key, key_of(&data));

    // The blob lands on the server; the proxy's own cache stays empty.
    let file = server.get(&key).await.unwrap();
    assert_eq!(read_all(file).await, data);
    assert!(stored_files(&proxy_base, "blob_").is_empty());

    proxy.shutdown().await;
    server.shutdown().await;
}

#[tokio::test]
async fn test_get_reads_through_and_then_serves_locally() {
    let (server, _server_base) = start_server().await;
    let (proxy, proxy_base) = new_proxy(server.local_addr()).await;

    let (data, key) = payload::patterned_with_key(16 * 1024);
    server.put_bytes(None, &data).await.unwrap();

    // First get misses locally, fetches, verifies and installs.
    let file = proxy.get(&key).await.unwrap();
    assert_eq!(read_all(file).await, data);

    let cached = stored_files(&proxy_base, "blob_");
    assert_eq!(cached.len(), 1);
    assert!(cached[0].ends_with(format!("blob_{}", key)));

    // With the server gone, a second get can only be served from the local
    // cache.
    server.shutdown().await;
    let file = proxy.get(&key).await.unwrap();
    assert_eq!(read_all(file).await, data);

    proxy.shutdown().await;
}

#[tokio::test]
async fn test_get_url_reads_through() {
    let (server, _server_base) = start_server().await;
    let (proxy, proxy_base) = new_proxy(server.local_addr()).await;

    let key = server.put_bytes(None, b"linked artifact").await.unwrap();

    let url = proxy.get_url(&key).await.unwrap();
    assert_eq!(url.scheme(), "file");
    assert!(url
        .path()
        .starts_with(proxy_base.path().canonicalize().unwrap().to_str().unwrap()));

    proxy.shutdown().await;
    server.shutdown().await;
}

#[tokio::test]
async fn test_miss_after_read_through_is_not_found() {
    let (server, _server_base) = start_server().await;
    let (proxy, _proxy_base) = new_proxy(server.local_addr()).await;

    assert!(matches!(
        proxy.get(&BlobKey::zero()).await,
        Err(Error::NotFound(_))
    ));

    proxy.shutdown().await;
    server.shutdown().await;
}

#[tokio::test]
async fn test_corrupted_fetch_is_rejected_and_not_cached() {
    depot_test_utils::logging::init();

    // A server that answers every get with a payload whose last byte is
    // flipped relative to what the key promises.
    let (data, key) = payload::patterned_with_key(4096);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let corrupted = {
        let mut corrupted = data.clone();
        *corrupted.last_mut().unwrap() ^= 0x01;
        corrupted
    };
    tokio::spawn(async move {
        loop {
            let (mut socket, _) = listener.accept().await.unwrap();
            proto::read_op(&mut socket).await.unwrap();
            depot_core::BlobKey::read_from(&mut socket).await.unwrap();
            proto::write_status(&mut socket, proto::Status::Hit).await.unwrap();
            socket.write_all(&corrupted).await.unwrap();
            socket.flush().await.unwrap();
        }
    });

    let (proxy, proxy_base) = new_proxy(addr).await;

    assert!(matches!(
        proxy.get(&key).await,
        Err(Error::CorruptTransfer { .. })
    ));

    // Nothing published, nothing left behind.
    assert!(stored_files(&proxy_base, "blob_").is_empty());
    assert!(stored_files(&proxy_base, "tmp-").is_empty());

    proxy.shutdown().await;
}

#[tokio::test]
async fn test_shutdown_wipes_local_cache() {
    let (server, _server_base) = start_server().await;
    let (proxy, proxy_base) = new_proxy(server.local_addr()).await;

    let key = server.put_bytes(None, b"cache me").await.unwrap();
    proxy.get(&key).await.unwrap();
    assert_eq!(stored_files(&proxy_base, "blob_").len(), 1);

    proxy.shutdown().await;
    assert!(stored_files(&proxy_base, "blob_").is_empty());

    server.shutdown().await;
}
