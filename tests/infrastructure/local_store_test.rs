use std::io;
use std::time::Duration;

use bytes::Bytes;
use futures::stream;

use bomatic::application::ports::{StagingStore, StagingStoreError};
use bomatic::domain::{JobId, StoragePath};
use bomatic::infrastructure::storage::{LocalStagingStore, UPLOAD_ROUTE_PREFIX};

const BASE_URL: &str = "http://localhost:3000/";

fn create_test_store() -> (tempfile::TempDir, LocalStagingStore) {
    let dir = tempfile::TempDir::new().unwrap();
    let store = LocalStagingStore::new(dir.path().to_path_buf(), BASE_URL).unwrap();
    (dir, store)
}

fn upload_path(filename: &str) -> StoragePath {
    StoragePath::for_upload(&JobId::new(), filename)
}

#[tokio::test]
async fn given_valid_stream_when_storing_then_size_is_returned_and_bytes_match() {
    let (_dir, store) = create_test_store();
    let path = upload_path("a.wav");

    let chunks = vec![Ok(Bytes::from("RIFF ")), Ok(Bytes::from("audio"))];
    let size = store
        .store(&path, Box::pin(stream::iter(chunks)))
        .await
        .unwrap();

    assert_eq!(size, 10);
    assert_eq!(store.fetch(&path).await.unwrap(), Bytes::from("RIFF audio"));
    assert!(store.exists(&path).await.unwrap());
}

#[tokio::test]
async fn given_stream_error_when_storing_then_returns_io_error_and_nothing_exists() {
    let (_dir, store) = create_test_store();
    let path = upload_path("a.wav");

    let chunks: Vec<Result<Bytes, io::Error>> = vec![
        Ok(Bytes::from("partial")),
        Err(io::Error::new(io::ErrorKind::ConnectionReset, "network drop")),
    ];
    let result = store.store(&path, Box::pin(stream::iter(chunks))).await;

    assert!(matches!(result, Err(StagingStoreError::Io(_))));
    assert!(!store.exists(&path).await.unwrap());
}

#[tokio::test]
async fn given_missing_object_when_fetching_then_not_found() {
    let (_dir, store) = create_test_store();

    let result = store.fetch(&upload_path("missing.wav")).await;

    assert!(matches!(result, Err(StagingStoreError::NotFound(_))));
}

#[tokio::test]
async fn given_path_when_issuing_write_url_then_points_at_upload_route_with_expiry() {
    let (_dir, store) = create_test_store();
    let path = upload_path("a.wav");
    let before = chrono::Utc::now().timestamp();

    let url = store
        .issue_write_url(&path, Duration::from_secs(3600))
        .await
        .unwrap();

    let prefix = format!("http://localhost:3000{}/{}?expires=", UPLOAD_ROUTE_PREFIX, path);
    assert!(url.starts_with(&prefix), "{}", url);
    let expires: i64 = url[prefix.len()..].parse().unwrap();
    assert!(expires >= before + 3600);
    assert!(!LocalStagingStore::is_expired(expires));
}

#[tokio::test]
async fn given_missing_object_when_issuing_read_url_then_none() {
    let (_dir, store) = create_test_store();

    let url = store
        .issue_read_url(&upload_path("a.wav"), Duration::from_secs(60))
        .await
        .unwrap();

    assert!(url.is_none());
}

#[tokio::test]
async fn given_stored_object_when_issuing_read_url_then_some() {
    let (_dir, store) = create_test_store();
    let path = upload_path("a.wav");
    store
        .store(&path, Box::pin(stream::iter(vec![Ok(Bytes::from("x"))])))
        .await
        .unwrap();

    let url = store
        .issue_read_url(&path, Duration::from_secs(60))
        .await
        .unwrap();

    assert!(url.unwrap().contains(path.as_str()));
}

#[test]
fn given_past_timestamp_when_checking_expiry_then_expired() {
    assert!(LocalStagingStore::is_expired(chrono::Utc::now().timestamp() - 1));
}

#[tokio::test]
async fn given_filename_with_url_delimiters_when_issuing_write_url_then_segment_is_encoded() {
    let (_dir, store) = create_test_store();
    let path = upload_path("take#1 50%?.wav");

    let url = store
        .issue_write_url(&path, Duration::from_secs(60))
        .await
        .unwrap();

    let parsed = reqwest::Url::parse(&url).unwrap();
    assert!(parsed.fragment().is_none());
    assert_eq!(
        parsed.path_segments().unwrap().last(),
        Some("take%231%2050%25%3F.wav")
    );
    assert_eq!(
        parsed.query_pairs().map(|(k, _)| k.into_owned()).collect::<Vec<_>>(),
        vec!["expires".to_string()]
    );
}
