//! Tests for the process-wide facade. The facade holds one role per
//! process, so these tests run serially and reset the cell as they go.

mod common;

use common::*;
use depot_core::BlobKey;
use depot_service::{facade, Error};
use depot_store::StorageConfig;
use depot_test_utils::payload;
use serial_test::serial;
use tempfile::TempDir;

#[tokio::test]
#[serial]
async fn test_operations_require_initialization() {
    facade::shutdown().await;

    assert!(matches!(
        facade::put_bytes(None, b"data").await,
        Err(Error::NotInitialized)
    ));
    assert!(matches!(
        facade::get(&BlobKey::zero()).await,
        Err(Error::NotInitialized)
    ));
    assert!(matches!(
        facade::get_url(&BlobKey::zero()).await,
        Err(Error::NotInitialized)
    ));
}

#[tokio::test]
#[serial]
async fn test_server_lifecycle_through_facade() {
    facade::shutdown().await;

    let base = TempDir::new().unwrap();
    facade::init_server(loopback(), &StorageConfig::with_base_dir(base.path()))
        .await
        .unwrap();

    let (data, expected) = payload::patterned_with_key(16 * 1024);
    let key = facade::put_stream(None, data.as_slice()).await.unwrap();
    assert_eq!(key, expected);

    let file = facade::get(&key).await.unwrap();
    assert_eq!(read_all(file).await, data);

    let url = facade::get_url(&key).await.unwrap();
    assert_eq!(url.scheme(), "file");

    facade::shutdown().await;
    assert!(stored_files(&base, "blob_").is_empty());
    assert!(matches!(
        facade::get(&key).await,
        Err(Error::NotInitialized)
    ));
}

#[tokio::test]
#[serial]
async fn test_reinitialization_is_ignored() {
    facade::shutdown().await;

    let first = TempDir::new().unwrap();
    facade::init_server(loopback(), &StorageConfig::with_base_dir(first.path()))
        .await
        .unwrap();
    let key = facade::put_bytes(None, b"sticky role").await.unwrap();

    // Neither a second server nor a proxy may displace the active role.
    let second = TempDir::new().unwrap();
    facade::init_server(loopback(), &StorageConfig::with_base_dir(second.path()))
        .await
        .unwrap();
    facade::init_proxy(loopback(), &StorageConfig::with_base_dir(second.path()))
        .await
        .unwrap();

    let file = facade::get(&key).await.unwrap();
    assert_eq!(read_all(file).await, b"sticky role");
    assert!(stored_files(&second, "blob_").is_empty());

    facade::shutdown().await;
}

#[tokio::test]
#[serial]
async fn test_proxy_role_through_facade() {
    facade::shutdown().await;

    let (server, _server_base) = start_server().await;
    let proxy_base = TempDir::new().unwrap();
    facade::init_proxy(
        server.local_addr(),
        &StorageConfig::with_base_dir(proxy_base.path()),
    )
    .await
    .unwrap();

    // Puts forward to the server, gets read through into the local cache.
    let (data, key) = payload::patterned_with_key(2048);
    assert_eq!(facade::put_bytes(None, &data).await.unwrap(), key);

    let file = facade::get(&key).await.unwrap();
    assert_eq!(read_all(file).await, data);
    assert_eq!(stored_files(&proxy_base, "blob_").len(), 1);

    facade::shutdown().await;
    server.shutdown().await;
}
