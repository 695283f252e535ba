use axum::body::Body;
use axum::http::header::{self, HeaderMap, HeaderValue};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};

use common::prelude::{BackendError, ObjectRanger};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RangeError {
    #[error("malformed range")]
    Malformed,
    #[error("range not satisfiable")]
    Unsatisfiable,
}

/// Parse a `Range` header against an object of `size` bytes.
///
/// Returns the inclusive `(start, end)` of a single byte range, or `None`
/// when the header asks for several ranges, which are answered with the
/// full content.
pub fn parse_range(range: &str, size: u64) -> Result<Option<(u64, u64)>, RangeError> {
    let range = range
        .trim()
        .strip_prefix("bytes=")
        .ok_or(RangeError::Malformed)?
        .trim();

    if range.contains(',') {
        return Ok(None);
    }

    if let Some(suffix) = range.strip_prefix('-') {
        // bytes=-N, the last N bytes
        let n: u64 = suffix.parse().map_err(|_| RangeError::Malformed)?;
        if n == 0 || size == 0 {
            return Err(RangeError::Unsatisfiable);
        }
        return Ok(Some((size.saturating_sub(n), size - 1)));
    }

    let (start, end) = range.split_once('-').ok_or(RangeError::Malformed)?;
    let start: u64 = start.parse().map_err(|_| RangeError::Malformed)?;
    if start >= size {
        return Err(RangeError::Unsatisfiable);
    }

    if end.is_empty() {
        // bytes=N-, from N to the end
        return Ok(Some((start, size - 1)));
    }

    let end: u64 = end.parse().map_err(|_| RangeError::Malformed)?;
    if start > end {
        return Err(RangeError::Malformed);
    }
    Ok(Some((start, end.min(size - 1))))
}

/// Serve an object, honoring a single `Range` request.
///
/// Backend failures are returned for the caller to map; everything about
/// the range itself is answered here.
pub async fn serve(
    method: &Method,
    headers: &HeaderMap,
    ranger: &ObjectRanger,
) -> Result<Response, BackendError> {
    let size = ranger.size();

    let range = match headers.get(header::RANGE) {
        None => None,
        Some(value) => {
            let parsed = value
                .to_str()
                .map_err(|_| RangeError::Malformed)
                .and_then(|value| parse_range(value, size));
            match parsed {
                Ok(range) => range,
                Err(e) => {
                    tracing::debug!(key = ranger.key(), size, "{}", e);
                    return Ok(unsatisfiable(size));
                }
            }
        }
    };

    let (status, offset, length) = match range {
        Some((start, end)) => (StatusCode::PARTIAL_CONTENT, start, end - start + 1),
        None => (StatusCode::OK, 0, size),
    };

    let mut response = if *method == Method::HEAD || length == 0 {
        Response::new(Body::empty())
    } else {
        let stream = ranger.range(offset, length).await?;
        Response::new(Body::from_stream(stream))
    };
    *response.status_mut() = status;

    let content_type = mime_guess::from_path(ranger.key()).first_or_octet_stream();
    let response_headers = response.headers_mut();
    response_headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));
    response_headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));
    if let Ok(value) = HeaderValue::from_str(content_type.as_ref()) {
        response_headers.insert(header::CONTENT_TYPE, value);
    }
    if let Some(created) = ranger.created() {
        let last_modified = created.format("%a, %d %b %Y %H:%M:%S GMT").to_string();
        if let Ok(value) = HeaderValue::from_str(&last_modified) {
            response_headers.insert(header::LAST_MODIFIED, value);
        }
    }
    if status == StatusCode::PARTIAL_CONTENT {
        let content_range = format!("bytes {}-{}/{}", offset, offset + length - 1, size);
        if let Ok(value) = HeaderValue::from_str(&content_range) {
            response_headers.insert(header::CONTENT_RANGE, value);
        }
    }

    Ok(response)
}

fn unsatisfiable(size: u64) -> Response {
    (
        StatusCode::RANGE_NOT_SATISFIABLE,
        [(header::CONTENT_RANGE, format!("bytes */{}", size))],
        "range not satisfiable",
    )
        .into_response()
}
