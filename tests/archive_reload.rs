//! Archive loading and hot swapping while serving.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{client, entry, har, start_server, write_archive};
use har_replay::archive::{ArchiveStore, ArchiveWatcher};
use reqwest::StatusCode;

const MARKER_A: &str = "rewritten_from=https%3A%2F%2Fa.test";

fn site(body: &str) -> serde_json::Value {
    har(
        "https://a.test/",
        vec![entry("GET", "https://a.test/x").body(body).build()],
    )
}

#[tokio::test]
async fn test_second_load_replaces_archive() {
    let server = start_server().await;
    server.write_archive("one.har", &site("one"));
    server.write_archive("two.har", &site("two"));
    let url = server.url(&format!("/x?{MARKER_A}"));

    server.load("one.har").await;
    assert_eq!(client().get(&url).send().await.unwrap().text().await.unwrap(), "one");

    server.load("two.har").await;
    assert_eq!(client().get(&url).send().await.unwrap().text().await.unwrap(), "two");
}

#[tokio::test]
async fn test_failed_load_keeps_previous_archive() {
    let server = start_server().await;
    server.write_archive("good.har", &site("good"));
    std::fs::write(server.dir.path().join("bad.har"), "{ not json").unwrap();
    let url = server.url(&format!("/x?{MARKER_A}"));

    assert_eq!(server.load("good.har").await.status(), StatusCode::OK);

    let response = server.load("bad.har").await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = server.load("missing.har").await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    assert_eq!(client().get(&url).send().await.unwrap().text().await.unwrap(), "good");
}

#[tokio::test]
async fn test_load_rejects_bad_requests() {
    let server = start_server().await;

    let response = client()
        .post(server.url("/loadHAR"))
        .body("filename=site.har")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = server.load("../etc/passwd").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(!server.store.is_loaded());
}

#[tokio::test]
async fn test_archive_without_pages_is_rejected() {
    let server = start_server().await;
    server.write_archive("empty.har", &serde_json::json!({ "log": { "entries": [] } }));

    let response = server.load("empty.har").await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(!server.store.is_loaded());
}

#[tokio::test]
async fn test_requests_during_reload_see_whole_archives() {
    let server = start_server().await;
    server.write_archive("one.har", &site("one"));
    server.write_archive("two.har", &site("two"));
    server.load("one.har").await;
    let url = server.url(&format!("/x?{MARKER_A}"));

    let readers: Vec<_> = (0..8)
        .map(|_| {
            let url = url.clone();
            tokio::spawn(async move {
                let client = client();
                for _ in 0..20 {
                    let response = client.get(&url).send().await.unwrap();
                    assert_eq!(response.status(), StatusCode::OK);
                    let body = response.text().await.unwrap();
                    assert!(body == "one" || body == "two", "unexpected body {body}");
                }
            })
        })
        .collect();

    for name in ["two.har", "one.har", "two.har"] {
        assert_eq!(server.load(name).await.status(), StatusCode::OK);
    }

    for reader in readers {
        reader.await.unwrap();
    }
}

#[tokio::test]
async fn test_watcher_reloads_changed_archive() {
    let dir = tempfile::tempdir().unwrap();
    write_archive(dir.path(), "site.har", &site("before"));

    let store = Arc::new(ArchiveStore::new(dir.path()));
    let first = store.load_file("site.har").unwrap();
    let _watcher = ArchiveWatcher::new(store.clone()).run().unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;
    write_archive(dir.path(), "site.har", &site("after"));

    let mut reloaded = false;
    for _ in 0..50 {
        tokio::time::sleep(Duration::from_millis(100)).await;
        if store.current().is_some_and(|s| s.id != first.id) {
            reloaded = true;
            break;
        }
    }
    assert!(reloaded, "archive was not reloaded after the file changed");

    let snapshot = store.current().unwrap();
    let entries = snapshot.index.lookup("https://a.test/x", "GET").unwrap();
    assert_eq!(entries[0].response.content.text(), "after");
}
