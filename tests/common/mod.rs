//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use har_replay::archive::ArchiveStore;
use har_replay::config::ReplayConfig;
use har_replay::http::HttpServer;
use har_replay::lifecycle::Shutdown;
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::net::TcpListener;

/// A replay server on an ephemeral port with its own archive directory.
pub struct TestServer {
    pub addr: SocketAddr,
    pub dir: TempDir,
    pub store: Arc<ArchiveStore>,
    shutdown: Shutdown,
}

impl TestServer {
    pub fn url(&self, path_and_query: &str) -> String {
        format!("http://{}{}", self.addr, path_and_query)
    }

    pub fn write_archive(&self, name: &str, archive: &Value) {
        write_archive(self.dir.path(), name, archive);
    }

    /// Load an archive through the HTTP endpoint, like the browser panel does.
    pub async fn load(&self, name: &str) -> reqwest::Response {
        client()
            .post(self.url("/loadHAR"))
            .body(json!({ "filename": name }).to_string())
            .send()
            .await
            .expect("Server unreachable")
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

pub async fn start_server() -> TestServer {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(ArchiveStore::new(dir.path()));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let mut config = ReplayConfig::default();
    config.listener.bind_address = addr.to_string();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, store.clone());
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    tokio::time::sleep(Duration::from_millis(50)).await;

    TestServer {
        addr,
        dir,
        store,
        shutdown,
    }
}

/// Client that reports redirects instead of following them.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

pub fn write_archive(dir: &Path, name: &str, archive: &Value) {
    std::fs::write(dir.join(name), archive.to_string()).unwrap();
}

/// HAR document with one page and the given entries.
pub fn har(page_url: &str, entries: Vec<Value>) -> Value {
    json!({
        "log": {
            "version": "1.2",
            "creator": { "name": "test", "version": "0" },
            "pages": [{ "id": "page_1", "title": page_url, "startedDateTime": "2023-01-01T00:00:00Z" }],
            "entries": entries
        }
    })
}

/// Builder for a recorded entry.
pub struct EntryBuilder {
    value: Value,
}

pub fn entry(method: &str, url: &str) -> EntryBuilder {
    EntryBuilder {
        value: json!({
            "pageref": "page_1",
            "request": { "method": method, "url": url, "headers": [], "cookies": [], "queryString": [] },
            "response": {
                "status": 200,
                "statusText": "OK",
                "headers": [],
                "cookies": [],
                "content": { "size": 0, "mimeType": "text/plain" }
            }
        }),
    }
}

#[allow(dead_code)]
impl EntryBuilder {
    pub fn status(mut self, status: u16) -> Self {
        self.value["response"]["status"] = json!(status);
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.value["response"]["headers"]
            .as_array_mut()
            .unwrap()
            .push(json!({ "name": name, "value": value }));
        self
    }

    pub fn body(mut self, text: &str) -> Self {
        self.value["response"]["content"]["text"] = json!(text);
        self
    }

    pub fn base64_body(mut self, text: &str) -> Self {
        self.value["response"]["content"]["text"] = json!(text);
        self.value["response"]["content"]["encoding"] = json!("base64");
        self
    }

    pub fn cookie(mut self, name: &str, value: &str) -> Self {
        self.value["request"]["cookies"]
            .as_array_mut()
            .unwrap()
            .push(json!({ "name": name, "value": value, "path": "/", "httpOnly": false, "secure": true }));
        self
    }

    pub fn build(self) -> Value {
        self.value
    }
}
