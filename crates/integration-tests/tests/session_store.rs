//! Integration tests for the file-backed session store.

use std::path::PathBuf;

use pocketshop_integration_tests::fixtures::user;
use pocketshop_storefront::{FileSessionStore, SessionStore};
use uuid::Uuid;

/// A session path under a fresh temporary directory.
fn temp_session_path() -> PathBuf {
    std::env::temp_dir()
        .join(format!("pocketshop-test-{}", Uuid::new_v4().simple()))
        .join("nested")
        .join("session.json")
}

fn cleanup(path: &std::path::Path) {
    if let Some(root) = path.parent().and_then(std::path::Path::parent) {
        let _ = std::fs::remove_dir_all(root);
    }
}

#[tokio::test]
async fn test_missing_file_is_logged_out() {
    let path = temp_session_path();

    let store = FileSessionStore::open(&path).await.expect("open");

    assert!(!store.current().is_active());
    assert!(!path.exists());
}

#[tokio::test]
async fn test_session_survives_reopen() {
    let path = temp_session_path();
    let amina = user("u1");

    let store = FileSessionStore::open(&path).await.expect("open");
    store.save(&amina).await.expect("save");
    drop(store);

    let reopened = FileSessionStore::open(&path).await.expect("reopen");
    assert_eq!(reopened.current().active_user(), Some(&amina));

    reopened.clear().await.expect("clear");
    let cleared = FileSessionStore::open(&path).await.expect("reopen");
    assert!(!cleared.current().is_active());

    cleanup(&path);
}

#[tokio::test]
async fn test_corrupt_file_reads_as_logged_out_and_is_replaced() {
    let path = temp_session_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("mkdir");
    }
    std::fs::write(&path, b"{ definitely not json").expect("write");

    let store = FileSessionStore::open(&path).await.expect("open");
    assert!(!store.current().is_active());

    store.save(&user("u1")).await.expect("save");
    let raw = std::fs::read_to_string(&path).expect("read");
    assert!(serde_json::from_str::<serde_json::Value>(&raw).is_ok());

    cleanup(&path);
}

#[tokio::test]
async fn test_undecodable_user_record_is_not_active() {
    let path = temp_session_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("mkdir");
    }
    std::fs::write(
        &path,
        br#"{"is_logged_in": true, "user_data": "{\"id\": 42}"}"#,
    )
    .expect("write");

    let store = FileSessionStore::open(&path).await.expect("open");

    let session = store.current();
    assert!(session.is_logged_in);
    assert!(session.user.is_none());
    assert!(!session.is_active());

    cleanup(&path);
}

#[tokio::test]
async fn test_subscribers_observe_login() {
    let path = temp_session_path();
    let store = FileSessionStore::open(&path).await.expect("open");
    let mut rx = store.subscribe();

    store.save(&user("u1")).await.expect("save");

    assert!(rx.has_changed().expect("store alive"));
    assert!(rx.borrow_and_update().is_active());

    cleanup(&path);
}
