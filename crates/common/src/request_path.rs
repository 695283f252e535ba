use crate::access::{Access, AccessError};

const RAW_MARKER: &str = "raw";

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum RequestPathError {
    #[error("missing access")]
    MissingAccess,
    #[error("missing bucket")]
    MissingBucket,
    #[error(transparent)]
    Access(#[from] AccessError),
}

/// A traditional sharing link path, split into its parts
///
/// Grammar (percent-decoded, `/` separated):
///
/// ```text
/// [ "raw" / ] <serialized-access> / <bucket> [ / <key...> ]
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestPath {
    /// Bypass the object metadata page
    pub raw: bool,
    pub access: Access,
    /// Kept verbatim for building breadcrumb links
    pub serialized_access: String,
    pub bucket: String,
    /// Empty for bucket root requests
    pub key: String,
}

impl RequestPath {
    /// Parse a request path. Parsing is strictly positional.
    pub fn parse(path: &str) -> Result<Self, RequestPathError> {
        let path = path.strip_prefix('/').unwrap_or(path);

        let mut raw = false;
        let mut segments: Vec<String> = path.splitn(4, '/').map(str::to_string).collect();
        if segments.len() == 4 {
            if segments[0] == RAW_MARKER {
                raw = true;
                segments.remove(0);
            } else {
                // keys may contain separators themselves
                let tail = segments.pop().unwrap_or_default();
                segments[2] = format!("{}/{}", segments[2], tail);
            }
        }

        if segments.len() == 1 {
            if segments[0].is_empty() {
                return Err(RequestPathError::MissingAccess);
            }
            return Err(RequestPathError::MissingBucket);
        }

        let mut segments = segments.into_iter();
        let serialized_access = segments.next().unwrap_or_default();
        let bucket = segments.next().unwrap_or_default();
        let key = segments.next().unwrap_or_default();

        let access = Access::parse(&serialized_access)?;

        Ok(Self {
            raw,
            access,
            serialized_access,
            bucket,
            key,
        })
    }

    /// Whether the request addresses a prefix rather than a single object
    pub fn is_prefix(&self) -> bool {
        self.key.is_empty() || self.key.ends_with('/')
    }

    /// Final path segment of the key, used as a download filename
    pub fn file_name(&self) -> &str {
        self.key.rsplit('/').next().unwrap_or(&self.key)
    }
}
