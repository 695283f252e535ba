use std::net::SocketAddr;
use std::time::Duration;

use url::Url;

#[derive(Debug, Clone)]
pub struct Config {
    // Listen address
    pub listen_addr: SocketAddr,
    // log level for http tracing
    pub log_level: tracing::Level,
    // Upper bound on handling a single request
    pub request_timeout: Duration,
}

impl Config {
    pub fn new(listen_addr: SocketAddr, request_timeout: Duration) -> Self {
        tracing::info!(
            "Creating HTTP server Config: listen_addr={}, request_timeout={:?}",
            listen_addr,
            request_timeout
        );
        Self {
            listen_addr,
            log_level: tracing::Level::INFO,
            request_timeout,
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum UrlBaseError {
    #[error("URL base must be http:// or https://")]
    Scheme,
    #[error("URL base must contain host")]
    MissingHost,
    #[error("URL base must not contain user info")]
    UserInfo,
    #[error("URL base must not contain query values")]
    Query,
    #[error("URL base must not contain a fragment")]
    Fragment,
    #[error("invalid URL base: {0}")]
    Url(#[from] url::ParseError),
}

/// Validate the public base URL of the gateway
pub fn parse_url_base(s: &str) -> Result<Url, UrlBaseError> {
    let url = match Url::parse(s) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => return Err(UrlBaseError::Scheme),
        Err(url::ParseError::EmptyHost) => return Err(UrlBaseError::MissingHost),
        Err(e) => return Err(e.into()),
    };

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlBaseError::Scheme);
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlBaseError::MissingHost);
    }
    if !url.username().is_empty() || url.password().is_some() {
        return Err(UrlBaseError::UserInfo);
    }
    if url.query().is_some_and(|q| !q.is_empty()) {
        return Err(UrlBaseError::Query);
    }
    if url.fragment().is_some_and(|f| !f.is_empty()) {
        return Err(UrlBaseError::Fragment);
    }
    Ok(url)
}

/// Absolute URL for `request_path` under the base URL.
///
/// The base path and the request path are joined and cleaned: empty and
/// `.` segments are dropped, `..` removes its parent, and no trailing
/// separator is kept.
pub fn make_location(base: &Url, request_path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in base.path().split('/').chain(request_path.split('/')) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            segment => segments.push(segment),
        }
    }

    let mut location = base.clone();
    location.set_path(&format!("/{}", segments.join("/")));
    location.to_string()
}
