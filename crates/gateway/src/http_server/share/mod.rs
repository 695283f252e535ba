//! Sharing handler.
//!
//! Requests addressed to the gateway's own host are sharing links that
//! carry their access grant in the path. Requests for any other host are
//! sites hosted on a custom domain whose grant and root come from DNS.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::extract::State;
use axum::http::header::{HeaderMap, HOST};
use axum::http::uri::Authority;
use axum::http::{Method, Uri};
use axum::response::Response;
use futures::{Stream, StreamExt};
use tokio::runtime::Handle;

use common::prelude::Project;

use crate::ServiceState;

pub mod content;
mod hosting;
mod pages;
mod responses;
mod traditional;

/// Entry point for every request that is not a status endpoint
pub async fn handler(
    State(state): State<ServiceState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    match request_host(&headers, &uri) {
        Some(host) if host == state.base_host() => {
            traditional::handle(&state, &method, &uri, &headers).await
        }
        host => hosting::handle(&state, host, &method, &uri, &headers).await,
    }
}

/// Lowercased request host without its port, from the `Host` header or
/// the request target
fn request_host(headers: &HeaderMap, uri: &Uri) -> Option<String> {
    let authority = headers
        .get(HOST)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.parse::<Authority>().ok())
        .or_else(|| uri.authority().cloned())?;
    Some(authority.host().to_ascii_lowercase())
}

/// Whether a query flag is present, with or without a value
fn query_flag(uri: &Uri, flag: &str) -> bool {
    uri.query().is_some_and(|query| {
        query
            .split('&')
            .any(|pair| pair.split('=').next() == Some(flag))
    })
}

async fn close_project(project: Arc<dyn Project>) {
    if let Err(e) = project.close().await {
        tracing::warn!(error = %e, "unable to close project");
    }
}

/// Closes its project when dropped
struct ProjectGuard(Option<Arc<dyn Project>>);

impl Drop for ProjectGuard {
    fn drop(&mut self) {
        let Some(project) = self.0.take() else {
            return;
        };
        match Handle::try_current() {
            Ok(handle) => {
                handle.spawn(close_project(project));
            }
            Err(_) => tracing::warn!("no runtime to close project on"),
        }
    }
}

/// Response body that keeps its project open until the body is finished
struct ProjectBody<S> {
    inner: S,
    _guard: ProjectGuard,
}

impl<S: Stream + Unpin> Stream for ProjectBody<S> {
    type Item = S::Item;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.poll_next_unpin(cx)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// Hand the project over to the response body.
///
/// Object bodies stream from the project after the handler returned, so
/// the project is closed once the body is fully sent or dropped.
fn close_after_body(response: Response, project: Arc<dyn Project>) -> Response {
    response.map(|body| {
        Body::from_stream(ProjectBody {
            inner: body.into_data_stream(),
            _guard: ProjectGuard(Some(project)),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::net::IpAddr;
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use axum::http::HeaderValue;
    use common::prelude::{BackendError, ByteStream, ObjectInfo};
    use futures::stream::{self, BoxStream};

    /// Project that only counts as open until `close` is called
    #[derive(Default)]
    struct TrackedProject {
        closed: AtomicBool,
    }

    #[async_trait]
    impl Project for TrackedProject {
        async fn stat_object(&self, _: &str, key: &str) -> Result<ObjectInfo, BackendError> {
            Err(BackendError::ObjectNotFound(key.to_string()))
        }

        fn list_objects<'a>(
            &'a self,
            _: &'a str,
            _: &'a str,
        ) -> BoxStream<'a, Result<ObjectInfo, BackendError>> {
            stream::empty().boxed()
        }

        async fn download_object(
            &self,
            _: &str,
            _: &str,
            _: u64,
            _: u64,
        ) -> Result<ByteStream, BackendError> {
            Ok(stream::empty().boxed())
        }

        async fn object_node_ips(&self, _: &str, _: &str) -> Result<Vec<IpAddr>, BackendError> {
            Ok(Vec::new())
        }

        async fn close(&self) -> Result<(), BackendError> {
            self.closed.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_project_closed_after_body() {
        let project = Arc::new(TrackedProject::default());
        let response = close_after_body(Response::new(Body::from("FOO")), project.clone());

        settle().await;
        assert!(!project.closed.load(Ordering::SeqCst));

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"FOO");

        settle().await;
        assert!(project.closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_project_closed_when_body_dropped() {
        let project = Arc::new(TrackedProject::default());
        let response = close_after_body(Response::new(Body::from("FOO")), project.clone());

        drop(response);
        settle().await;
        assert!(project.closed.load(Ordering::SeqCst));
    }

    #[test]
    fn test_request_host() {
        let uri: Uri = "/cred/bucket/key".parse().unwrap();
        let mut headers = HeaderMap::new();
        assert_eq!(request_host(&headers, &uri), None);

        headers.insert(HOST, HeaderValue::from_static("Link.Example.com:8080"));
        assert_eq!(
            request_host(&headers, &uri).as_deref(),
            Some("link.example.com")
        );

        headers.insert(HOST, HeaderValue::from_static("[::1]:8080"));
        assert_eq!(request_host(&headers, &uri).as_deref(), Some("[::1]"));

        let uri: Uri = "http://localhost:3000/cred/bucket".parse().unwrap();
        assert_eq!(
            request_host(&HeaderMap::new(), &uri).as_deref(),
            Some("localhost")
        );
    }

    #[test]
    fn test_query_flag() {
        let uri: Uri = "/a/b/c?download".parse().unwrap();
        assert!(query_flag(&uri, "download"));
        assert!(!query_flag(&uri, "view"));

        let uri: Uri = "/a/b/c?x=1&view=true".parse().unwrap();
        assert!(query_flag(&uri, "view"));
        assert!(!query_flag(&uri, "download"));

        let uri: Uri = "/a/b/c".parse().unwrap();
        assert!(!query_flag(&uri, "download"));
    }
}
