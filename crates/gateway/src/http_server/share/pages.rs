use askama::Template;
use askama_axum::{IntoResponse, Response};
use axum::http::StatusCode;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

use common::prelude::{Listing, Location};

/// Characters escaped in generated links; `/` is kept as the separator
const LINK: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'&')
    .add(b'\'')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

fn encode_link(path: &str) -> String {
    utf8_percent_encode(path, LINK).to_string()
}

pub struct CrumbLink {
    pub label: String,
    pub href: String,
}

pub struct EntryRow {
    pub name: String,
    pub href: String,
    pub size: String,
    pub is_prefix: bool,
}

#[derive(Template)]
#[template(path = "404.html")]
pub struct NotFoundTemplate<'a> {
    pub message: &'a str,
}

/// Template for prefix listings
#[derive(Template)]
#[template(path = "prefix-listing.html")]
pub struct PrefixListingTemplate {
    pub bucket: String,
    pub breadcrumbs: Vec<CrumbLink>,
    pub entries: Vec<EntryRow>,
}

impl PrefixListingTemplate {
    /// Breadcrumbs link from `base_path`, the path of the base url; entries
    ///  link relative to the listed prefix
    pub fn new(base_path: &str, listing: Listing) -> Self {
        let base_path = base_path.trim_end_matches('/');
        Self {
            bucket: listing.bucket,
            breadcrumbs: listing
                .breadcrumbs
                .into_iter()
                .map(|crumb| CrumbLink {
                    href: format!("{}/{}", base_path, encode_link(&crumb.url)),
                    label: crumb.label,
                })
                .collect(),
            entries: listing
                .entries
                .into_iter()
                .map(|entry| EntryRow {
                    href: encode_link(&entry.name),
                    name: entry.name,
                    size: entry.size,
                    is_prefix: entry.is_prefix,
                })
                .collect(),
        }
    }
}

/// Template for the object information page
#[derive(Template)]
#[template(path = "single-object.html")]
pub struct SingleObjectTemplate {
    pub name: String,
    pub size: String,
    pub pieces: usize,
    pub locations: Vec<Location>,
}

/// Render a page with the given status.
///
/// A failed render is logged and answered with the same status and an
/// empty body.
pub fn render<T: Template + IntoResponse>(status: StatusCode, template: T) -> Response {
    let mut response = template.into_response();
    if response.status().is_server_error() {
        tracing::error!(mime = T::MIME_TYPE, "error while executing template");
        return status.into_response();
    }
    *response.status_mut() = status;
    response
}
