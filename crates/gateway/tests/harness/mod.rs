//! Shared setup for gateway integration tests
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode};
use axum::Router;
use bytes::Bytes;
use object_store::ObjectStore;
use tower::ServiceExt;

use common::prelude::*;
use gateway::http_server::{self, parse_url_base};
use gateway::ServiceState;

pub const API_KEY: &str = "test-key";
pub const PROJECT: &str = "project";
pub const SITE_HOST: &str = "www.example.com";

pub struct TestGateway {
    pub router: Router,
    pub state: ServiceState,
    pub backend: ObjectStoreBackend,
    /// Serialized access grant for the test project
    pub cred: String,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Access grant records for a hosted site, split across two grant records
pub fn site_records(access: &Access, root: &str) -> Vec<String> {
    let serialized = access.serialize().unwrap();
    let (first, second) = serialized.split_at(serialized.len() / 2);
    vec![
        format!("storj_grant-2:{}", second),
        format!("storj_root:{}", root),
        format!("storj_grant-1:{}", first),
        "v=spf1 -all".to_string(),
    ]
}

async fn put(backend: &ObjectStoreBackend, bucket: &str, key: &str, data: &'static [u8]) {
    backend
        .store()
        .put(
            &ObjectStoreBackend::object_path(PROJECT, bucket, key),
            Bytes::from_static(data).into(),
        )
        .await
        .unwrap();
}

/// Gateway at `http://localhost` over an in-memory store holding
///
/// ```text
/// testbucket/test/foo                 "FOO"
/// testbucket/docs/readme.txt
/// testbucket/docs/guides/intro.txt
/// bucket1/folder1/index.html
/// bucket1/folder1/folder2/index.html
/// ```
///
/// with `www.example.com` hosting `bucket1/folder1`.
pub async fn setup() -> TestGateway {
    setup_with(default_lookup(), Duration::from_secs(60)).await
}

pub async fn setup_with(lookup: StaticTxtLookup, ttl: Duration) -> TestGateway {
    build(lookup, ttl, |backend| -> Arc<dyn StorageBackend> { Arc::new(backend) }).await
}

/// Same data, served through a backend built around the object store
pub async fn setup_with_backend<F>(wrap: F) -> TestGateway
where
    F: FnOnce(ObjectStoreBackend) -> Arc<dyn StorageBackend>,
{
    build(default_lookup(), Duration::from_secs(60), wrap).await
}

fn default_lookup() -> StaticTxtLookup {
    let access = Access::new("sat.example.com:7777", API_KEY);
    StaticTxtLookup::new()
        .with_records(SITE_HOST, site_records(&access, "bucket1/folder1"))
        .with_records("broken.example.com", ["storj_root:bucket1"])
}

async fn build<F>(lookup: StaticTxtLookup, ttl: Duration, wrap: F) -> TestGateway
where
    F: FnOnce(ObjectStoreBackend) -> Arc<dyn StorageBackend>,
{
    let backend = ObjectStoreBackend::new(&ObjectStoreConfig::Memory)
        .await
        .unwrap()
        .with_project(API_KEY, PROJECT)
        .with_nodes(vec![
            "10.0.0.1".parse().unwrap(),
            "10.0.0.2".parse().unwrap(),
        ]);

    put(&backend, "testbucket", "test/foo", b"FOO").await;
    put(&backend, "testbucket", "docs/readme.txt", b"read me").await;
    put(&backend, "testbucket", "docs/guides/intro.txt", b"intro").await;
    put(&backend, "bucket1", "folder1/index.html", b"<h1>home</h1>").await;
    put(&backend, "bucket1", "folder1/folder2/index.html", b"<h1>nested</h1>").await;

    let geo = IpTable::from_json(r#"{"10.0.0.1": {"latitude": 52.52, "longitude": 13.405}}"#)
        .unwrap();
    let resolver = HostResolver::new(Arc::new(CredentialCache::new(ttl)), Arc::new(lookup));
    let state = ServiceState::new(
        parse_url_base("http://localhost").unwrap(),
        wrap(backend.clone()),
        resolver,
        Arc::new(geo),
    );
    let router = http_server::router(state.clone(), Duration::from_secs(5));

    let cred = Access::new("sat.example.com:7777", API_KEY)
        .serialize()
        .unwrap();

    TestGateway {
        router,
        state,
        backend,
        cred,
    }
}

impl TestGateway {
    /// Send a request to `host` with optional extra headers
    pub async fn send_to(
        &self,
        host: &str,
        method: Method,
        path: &str,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let mut request = Request::builder()
            .method(method)
            .uri(path)
            .header("host", host);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        let request = request.body(Body::empty()).unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Send a request to the gateway's own host
    pub async fn send(&self, method: Method, path: &str) -> TestResponse {
        self.send_to("localhost", method, path, &[]).await
    }
}
