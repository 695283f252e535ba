use std::sync::Arc;

use axum::http::header::HeaderMap;
use axum::http::{Method, Uri};
use axum::response::Response;
use percent_encoding::percent_decode_str;

use common::prelude::*;

use super::responses::{backend_failure, internal_error, NotFoundContext, UNABLE_TO_HANDLE};
use super::{close_after_body, content};
use crate::ServiceState;

/// Serve a site hosted on a custom domain.
///
/// The domain's TXT records name the access grant and the `bucket[/prefix]`
/// root; the request path is resolved under that root and always served
/// as raw content.
#[tracing::instrument(skip_all, fields(host = host.as_deref(), path = uri.path()))]
pub async fn handle(
    state: &ServiceState,
    host: Option<String>,
    method: &Method,
    uri: &Uri,
    headers: &HeaderMap,
) -> Response {
    let Some(hostname) = host else {
        tracing::error!("{}: request carries no host", UNABLE_TO_HANDLE);
        return internal_error();
    };

    let (access, root) = match state.resolver().resolve(&hostname).await {
        Ok(resolved) => resolved,
        Err(e) => {
            tracing::error!(hostname, error = %e, "{}", UNABLE_TO_HANDLE);
            return internal_error();
        }
    };

    let project = match state.backend().open_project(&access).await {
        Ok(project) => project,
        Err(e) => return backend_failure(NotFoundContext::Site, "open project", e),
    };

    let decoded = percent_decode_str(uri.path()).decode_utf8_lossy();
    let key = root.object_key(&decoded);
    let response = serve(&project, root.bucket(), &key, method, headers).await;
    close_after_body(response, project)
}

async fn serve(
    project: &Arc<dyn Project>,
    bucket: &str,
    key: &str,
    method: &Method,
    headers: &HeaderMap,
) -> Response {
    let object = match project.stat_object(bucket, key).await {
        Ok(object) => object,
        Err(e) => return backend_failure(NotFoundContext::Site, "stat object", e),
    };

    let ranger = ObjectRanger::new(project.clone(), object, bucket);
    match content::serve(method, headers, &ranger).await {
        Ok(response) => response,
        Err(e) => backend_failure(NotFoundContext::Site, "download object", e),
    }
}
