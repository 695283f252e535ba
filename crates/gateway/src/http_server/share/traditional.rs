use std::sync::Arc;

use axum::http::header::{self, HeaderMap, HeaderValue};
use axum::http::{Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use percent_encoding::{percent_decode_str, utf8_percent_encode, NON_ALPHANUMERIC};

use common::listing::build_listing;
use common::prelude::*;

use super::pages::{render, PrefixListingTemplate, SingleObjectTemplate};
use super::responses::{backend_failure, listing_failure, plain_text, NotFoundContext};
use super::{close_after_body, content, query_flag};
use crate::http_server::make_location;
use crate::ServiceState;

/// Serve a sharing link: `[raw/]<access>/<bucket>[/<key>]`
#[tracing::instrument(skip_all, fields(method = %method, path = uri.path()))]
pub async fn handle(
    state: &ServiceState,
    method: &Method,
    uri: &Uri,
    headers: &HeaderMap,
) -> Response {
    let location_only = match *method {
        Method::HEAD => true,
        Method::GET => false,
        _ => return plain_text(StatusCode::METHOD_NOT_ALLOWED, "method not allowed"),
    };

    let decoded = percent_decode_str(uri.path()).decode_utf8_lossy();
    let request = match RequestPath::parse(&decoded) {
        Ok(request) => request,
        Err(e) => {
            return plain_text(StatusCode::BAD_REQUEST, format!("invalid request: {}", e));
        }
    };

    let project = match state.backend().open_project(&request.access).await {
        Ok(project) => project,
        Err(e) => return backend_failure(NotFoundContext::Share, "open project", e),
    };

    let response = serve(state, &project, &request, location_only, method, uri, headers).await;
    close_after_body(response, project)
}

async fn serve(
    state: &ServiceState,
    project: &Arc<dyn Project>,
    request: &RequestPath,
    location_only: bool,
    method: &Method,
    uri: &Uri,
    headers: &HeaderMap,
) -> Response {
    if request.is_prefix() {
        // listing links are relative, so directories must end in a separator
        if !uri.path().ends_with('/') {
            return redirect(StatusCode::MOVED_PERMANENTLY, &format!("{}/", uri.path()));
        }
        return serve_prefix(state, project.as_ref(), request).await;
    }

    let object = match project.stat_object(&request.bucket, &request.key).await {
        Ok(object) => object,
        Err(e) => return backend_failure(NotFoundContext::Share, "stat object", e),
    };

    if location_only {
        return redirect(
            StatusCode::FOUND,
            &make_location(state.url_base(), uri.path()),
        );
    }

    let download = query_flag(uri, "download");
    let view = query_flag(uri, "view");
    if !download && !view && !request.raw {
        return serve_object_info(state, project.as_ref(), request, &object).await;
    }

    let ranger = ObjectRanger::new(project.clone(), object, request.bucket.clone());
    let mut response = match content::serve(method, headers, &ranger).await {
        Ok(response) => response,
        Err(e) => return backend_failure(NotFoundContext::Share, "download object", e),
    };

    if download && response.status().is_success() {
        response.headers_mut().insert(
            header::CONTENT_DISPOSITION,
            attachment(request.file_name()),
        );
    }
    response
}

async fn serve_prefix(state: &ServiceState, project: &dyn Project, request: &RequestPath) -> Response {
    let items = project.list_objects(&request.bucket, &request.key);
    match build_listing(&request.serialized_access, &request.bucket, &request.key, items).await {
        Ok(listing) => render(
            StatusCode::OK,
            PrefixListingTemplate::new(state.url_base().path(), listing),
        ),
        Err(e) => listing_failure(e),
    }
}

/// Object information page: name, size and where its pieces are stored
async fn serve_object_info(
    state: &ServiceState,
    project: &dyn Project,
    request: &RequestPath,
    object: &ObjectInfo,
) -> Response {
    let ips = match project.object_node_ips(&request.bucket, &request.key).await {
        Ok(ips) => ips,
        Err(e) => return backend_failure(NotFoundContext::Share, "get object IPs", e),
    };

    let locations: Vec<Location> = ips
        .iter()
        .filter_map(|ip| match state.geo().locate(*ip) {
            Ok(location) => location,
            Err(e) => {
                tracing::error!(%ip, error = %e, "failed to get IP info");
                None
            }
        })
        .collect();

    render(
        StatusCode::OK,
        SingleObjectTemplate {
            name: object.key.clone(),
            size: format_base10(object.size),
            pieces: ips.len(),
            locations,
        },
    )
}

fn redirect(status: StatusCode, location: &str) -> Response {
    match HeaderValue::from_str(location) {
        Ok(location) => (status, [(header::LOCATION, location)]).into_response(),
        Err(e) => {
            tracing::error!(location, error = %e, "invalid redirect location");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// `Content-Disposition` naming the downloaded file
fn attachment(file_name: &str) -> HeaderValue {
    if file_name.is_ascii() && !file_name.contains('"') {
        if let Ok(value) = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", file_name)) {
            return value;
        }
    }
    let encoded = utf8_percent_encode(file_name, NON_ALPHANUMERIC);
    HeaderValue::from_str(&format!("attachment; filename*=UTF-8''{}", encoded))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}
