//! TXT record protocol for hosting custom domains.
//!
//! A hostname advertises its storage location with records such as:
//!
//! ```text
//! storj_grant-1:<first part of the access grant>
//! storj_grant-2:<second part of the access grant>
//! storj_root:mybucket/folder
//! ```
//!
//! TXT values have a length ceiling, so the access grant is split across
//! several indexed records. DNS does not guarantee record order, the index
//! restores it.

use std::collections::BTreeMap;

use crate::access::{Access, AccessError};

pub const GRANT_KEY_PREFIX: &str = "storj_grant-";
pub const ROOT_KEY: &str = "storj_root";

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("missing root path in txt record")]
    MissingRootPath,
    #[error("missing grants")]
    MissingGrants,
    #[error("invalid grant index: {0}")]
    InvalidGrantIndex(String),
    #[error("invalid root path: {0}")]
    InvalidRootPath(String),
    #[error(transparent)]
    Access(#[from] AccessError),
}

/// Storage location a custom domain is served from: `bucket[/prefix]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootPath {
    bucket: String,
    prefix: Option<String>,
}

impl RootPath {
    pub fn parse(root: &str) -> Result<Self, RecordError> {
        let (bucket, prefix) = match root.split_once('/') {
            Some((bucket, prefix)) => (bucket, Some(prefix.to_string())),
            None => (root, None),
        };
        if bucket.is_empty() {
            return Err(RecordError::InvalidRootPath(root.to_string()));
        }
        Ok(Self {
            bucket: bucket.to_string(),
            prefix,
        })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Object key for a request path served under this root.
    ///
    /// An empty request path serves `index.html`. With root
    /// `bucket1/folder1`, `/folder2/index.html` maps to
    /// `folder1/folder2/index.html`.
    pub fn object_key(&self, request_path: &str) -> String {
        let path = request_path.trim_start_matches('/');
        let path = if path.is_empty() { "index.html" } else { path };
        match &self.prefix {
            Some(prefix) => format!("{}/{}", prefix, path),
            None => path.to_string(),
        }
    }
}

/// Reassemble the access grant and root path from a hostname's TXT records.
///
/// Records that are not `key:value` pairs or carry unrelated keys are
/// ignored. When several root records are present the last one seen is used.
pub fn parse_records<S: AsRef<str>>(records: &[S]) -> Result<(Access, RootPath), RecordError> {
    let mut grants: BTreeMap<u32, &str> = BTreeMap::new();
    let mut root: Option<&str> = None;

    for record in records {
        let Some((key, value)) = record.as_ref().split_once(':') else {
            continue;
        };
        if let Some(index) = key.strip_prefix(GRANT_KEY_PREFIX) {
            let index: u32 = index
                .parse()
                .map_err(|_| RecordError::InvalidGrantIndex(index.to_string()))?;
            if index == 0 {
                return Err(RecordError::InvalidGrantIndex(index.to_string()));
            }
            grants.insert(index, value);
        } else if key == ROOT_KEY {
            root = Some(value);
        }
    }

    let root = match root {
        Some(root) if !root.is_empty() => RootPath::parse(root)?,
        _ => return Err(RecordError::MissingRootPath),
    };

    let max = grants.keys().next_back().copied().unwrap_or(0);
    let mut serialized = String::new();
    for index in 1..=max {
        match grants.get(&index) {
            Some(fragment) if !fragment.is_empty() => serialized.push_str(fragment),
            _ => return Err(RecordError::MissingGrants),
        }
    }

    let access = Access::parse(&serialized)?;
    Ok((access, root))
}
