//! Storage backend capability.
//!
//! The gateway never talks to storage directly: it opens a [`Project`] with
//! an access grant and asks it for object metadata, prefix listings and
//! ranged downloads.

use std::net::IpAddr;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;

use crate::access::Access;

mod store;

pub use store::{ObjectStoreBackend, ObjectStoreConfig};

/// Byte stream returned by ranged downloads
pub type ByteStream = BoxStream<'static, Result<Bytes, BackendError>>;

/// Errors reported by a storage backend.
///
/// Not-found conditions are explicit variants so callers can pick a status
/// without inspecting messages.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("bucket not found: {0}")]
    BucketNotFound(String),
    #[error("object not found: {0}")]
    ObjectNotFound(String),
    #[error("permission denied")]
    PermissionDenied,
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("object storage error: {0}")]
    ObjectStore(#[from] object_store::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BackendError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            BackendError::BucketNotFound(_) | BackendError::ObjectNotFound(_)
        )
    }
}

/// Metadata of a stored object, or of a prefix in a listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
    /// Key relative to the bucket; prefixes end with `/`
    pub key: String,
    pub is_prefix: bool,
    pub size: u64,
    pub created: Option<DateTime<Utc>>,
}

impl ObjectInfo {
    pub fn prefix(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            is_prefix: true,
            size: 0,
            created: None,
        }
    }
}

/// Entry point into storage: turns an access grant into a project handle
#[async_trait]
pub trait StorageBackend: Send + Sync {
    async fn open_project(&self, access: &Access) -> Result<Arc<dyn Project>, BackendError>;
}

/// A storage project opened with an access grant.
///
/// Handles are owned by a single request and closed when it completes.
#[async_trait]
pub trait Project: Send + Sync {
    async fn stat_object(&self, bucket: &str, key: &str) -> Result<ObjectInfo, BackendError>;

    /// Lazily list the objects and sub-prefixes directly under `prefix`
    fn list_objects<'a>(
        &'a self,
        bucket: &'a str,
        prefix: &'a str,
    ) -> BoxStream<'a, Result<ObjectInfo, BackendError>>;

    /// Download `length` bytes of an object starting at `offset`
    async fn download_object(
        &self,
        bucket: &str,
        key: &str,
        offset: u64,
        length: u64,
    ) -> Result<ByteStream, BackendError>;

    /// Addresses of the storage nodes holding the object's pieces
    async fn object_node_ips(&self, bucket: &str, key: &str) -> Result<Vec<IpAddr>, BackendError>;

    async fn close(&self) -> Result<(), BackendError>;
}
