use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use common::prelude::BackendError;

use super::pages::{render, NotFoundTemplate};

pub const UNABLE_TO_HANDLE: &str = "unable to handle request";

/// Which kind of request hit a missing bucket or object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFoundContext {
    /// An object behind a sharing link
    Share,
    /// A prefix listing behind a sharing link
    Listing,
    /// A page of a site hosted on a custom domain
    Site,
}

impl NotFoundContext {
    fn bucket_message(self) -> &'static str {
        match self {
            NotFoundContext::Share | NotFoundContext::Listing => "Oops! Bucket not found.",
            NotFoundContext::Site => "Oops! This site's bucket was not found.",
        }
    }

    fn object_message(self) -> &'static str {
        match self {
            NotFoundContext::Share => "Oops! Object not found.",
            NotFoundContext::Listing => "Oops! Folder not found.",
            NotFoundContext::Site => "Oops! Page not found.",
        }
    }
}

pub fn plain_text(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        message.into(),
    )
        .into_response()
}

pub fn not_found(message: &str) -> Response {
    render(StatusCode::NOT_FOUND, NotFoundTemplate { message })
}

pub fn internal_error() -> Response {
    plain_text(StatusCode::INTERNAL_SERVER_ERROR, UNABLE_TO_HANDLE)
}

/// Map a backend failure to a response: missing buckets and objects get a
/// rendered 404, anything else is logged with the failing action and
/// answered with a 500.
pub fn backend_failure(context: NotFoundContext, action: &str, err: BackendError) -> Response {
    match err {
        BackendError::BucketNotFound(_) => not_found(context.bucket_message()),
        BackendError::ObjectNotFound(_) => not_found(context.object_message()),
        err => {
            tracing::error!(action, error = %err, "{}", UNABLE_TO_HANDLE);
            internal_error()
        }
    }
}

/// Listing failures never surface as server errors
pub fn listing_failure(err: BackendError) -> Response {
    match err {
        err if err.is_not_found() => backend_failure(NotFoundContext::Listing, "list prefix", err),
        err => {
            tracing::error!(action = "list prefix", error = %err, "{}", UNABLE_TO_HANDLE);
            not_found("Oops! Unable to list this folder.")
        }
    }
}
