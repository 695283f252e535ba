//! Storage backend over `object_store` (S3/MinIO/local filesystem/memory).
//!
//! Objects are laid out as `<project>/<bucket>/<key>`. The project a grant
//! opens is looked up from the grant's API key. A bucket exists as long as
//! something is stored under it.

use std::collections::HashMap;
use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, BoxStream};
use futures::{StreamExt, TryStreamExt};
use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use object_store::{GetOptions, GetRange, ObjectMeta, ObjectStore};
use serde::{Deserialize, Serialize};

use super::{BackendError, ByteStream, ObjectInfo, Project, StorageBackend};
use crate::access::Access;

/// Configuration for the object storage backend.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ObjectStoreConfig {
    /// In-memory storage (for testing)
    #[default]
    Memory,

    /// Local filesystem storage
    Local {
        /// Path to the storage directory
        path: PathBuf,
    },

    /// S3-compatible storage (AWS S3, MinIO, etc.)
    S3 {
        /// S3 endpoint URL (e.g., "http://localhost:9000" for MinIO)
        endpoint: String,
        /// Access key ID
        access_key: String,
        /// Secret access key
        secret_key: String,
        /// Bucket name
        bucket: String,
        /// Optional region (defaults to "us-east-1")
        region: Option<String>,
    },
}

#[derive(Debug, Clone)]
pub struct ObjectStoreBackend {
    store: Arc<dyn ObjectStore>,
    /// api key -> project
    projects: Arc<HashMap<String, String>>,
    nodes: Arc<Vec<IpAddr>>,
}

impl ObjectStoreBackend {
    /// Create a new storage backend from configuration.
    pub async fn new(config: &ObjectStoreConfig) -> Result<Self, BackendError> {
        let store: Arc<dyn ObjectStore> = match config {
            ObjectStoreConfig::Memory => Arc::new(InMemory::new()),

            ObjectStoreConfig::Local { path } => {
                // Ensure directory exists
                tokio::fs::create_dir_all(path).await?;
                Arc::new(
                    LocalFileSystem::new_with_prefix(path)
                        .map_err(|e| BackendError::InvalidConfig(e.to_string()))?,
                )
            }

            ObjectStoreConfig::S3 {
                endpoint,
                access_key,
                secret_key,
                bucket,
                region,
            } => {
                let builder = AmazonS3Builder::new()
                    .with_endpoint(endpoint)
                    .with_access_key_id(access_key)
                    .with_secret_access_key(secret_key)
                    .with_bucket_name(bucket)
                    .with_region(region.as_deref().unwrap_or("us-east-1"))
                    .with_allow_http(endpoint.starts_with("http://"));

                Arc::new(
                    builder
                        .build()
                        .map_err(|e| BackendError::InvalidConfig(e.to_string()))?,
                )
            }
        };

        Ok(Self::from_store(store))
    }

    pub fn from_store(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            projects: Arc::new(HashMap::new()),
            nodes: Arc::new(Vec::new()),
        }
    }

    /// Register the project an API key opens
    pub fn with_project(mut self, api_key: impl Into<String>, project: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.projects).insert(api_key.into(), project.into());
        self
    }

    /// Storage node addresses reported for every object
    pub fn with_nodes(mut self, nodes: Vec<IpAddr>) -> Self {
        self.nodes = Arc::new(nodes);
        self
    }

    /// The underlying store
    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    /// Location of an object for a project
    pub fn object_path(project: &str, bucket: &str, key: &str) -> ObjectPath {
        ObjectPath::from(format!("{}/{}/{}", project, bucket, key))
    }
}

#[async_trait]
impl StorageBackend for ObjectStoreBackend {
    async fn open_project(&self, access: &Access) -> Result<Arc<dyn Project>, BackendError> {
        let project = self
            .projects
            .get(access.api_key())
            .ok_or(BackendError::PermissionDenied)?;

        tracing::debug!(%access, project, "opened project");
        Ok(Arc::new(StoreProject {
            store: self.store.clone(),
            project: project.clone(),
            nodes: self.nodes.clone(),
        }))
    }
}

struct StoreProject {
    store: Arc<dyn ObjectStore>,
    project: String,
    nodes: Arc<Vec<IpAddr>>,
}

impl StoreProject {
    fn bucket_path(&self, bucket: &str) -> ObjectPath {
        ObjectPath::from(format!("{}/{}", self.project, bucket))
    }

    fn object_path(&self, bucket: &str, key: &str) -> ObjectPath {
        ObjectStoreBackend::object_path(&self.project, bucket, key)
    }

    /// Key of a stored location relative to its bucket
    fn relative_key(&self, bucket: &str, location: &ObjectPath) -> String {
        let bucket_prefix = format!("{}/{}/", self.project, bucket);
        let location = location.as_ref();
        location
            .strip_prefix(&bucket_prefix)
            .unwrap_or(location)
            .to_string()
    }

    fn object_info(&self, bucket: &str, meta: &ObjectMeta) -> ObjectInfo {
        ObjectInfo {
            key: self.relative_key(bucket, &meta.location),
            is_prefix: false,
            size: meta.size as u64,
            created: Some(meta.last_modified),
        }
    }

    async fn bucket_exists(&self, bucket: &str) -> Result<bool, BackendError> {
        if bucket.is_empty() {
            return Ok(false);
        }
        let path = self.bucket_path(bucket);
        let mut objects = self.store.list(Some(&path));
        match objects.next().await {
            Some(Ok(_)) => Ok(true),
            None | Some(Err(object_store::Error::NotFound { .. })) => Ok(false),
            Some(Err(e)) => Err(e.into()),
        }
    }

    /// Distinguish a missing bucket from a missing object
    async fn not_found(&self, bucket: &str, key: &str) -> BackendError {
        match self.bucket_exists(bucket).await {
            Ok(true) => BackendError::ObjectNotFound(key.to_string()),
            Ok(false) => BackendError::BucketNotFound(bucket.to_string()),
            Err(e) => e,
        }
    }

    async fn list_page(&self, bucket: &str, prefix: &str) -> Result<Vec<ObjectInfo>, BackendError> {
        if !self.bucket_exists(bucket).await? {
            return Err(BackendError::BucketNotFound(bucket.to_string()));
        }

        let path = ObjectPath::from(format!("{}/{}/{}", self.project, bucket, prefix));
        let listing = self.store.list_with_delimiter(Some(&path)).await?;

        let mut entries: Vec<ObjectInfo> = listing
            .common_prefixes
            .iter()
            .map(|p| ObjectInfo::prefix(format!("{}/", self.relative_key(bucket, p))))
            .chain(
                listing
                    .objects
                    .iter()
                    .map(|meta| self.object_info(bucket, meta)),
            )
            .collect();
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(entries)
    }
}

#[async_trait]
impl Project for StoreProject {
    async fn stat_object(&self, bucket: &str, key: &str) -> Result<ObjectInfo, BackendError> {
        match self.store.head(&self.object_path(bucket, key)).await {
            Ok(meta) => Ok(self.object_info(bucket, &meta)),
            Err(object_store::Error::NotFound { .. }) => Err(self.not_found(bucket, key).await),
            Err(e) => Err(e.into()),
        }
    }

    fn list_objects<'a>(
        &'a self,
        bucket: &'a str,
        prefix: &'a str,
    ) -> BoxStream<'a, Result<ObjectInfo, BackendError>> {
        stream::once(self.list_page(bucket, prefix))
            .map_ok(|entries| stream::iter(entries.into_iter().map(Ok::<_, BackendError>)))
            .try_flatten()
            .boxed()
    }

    async fn download_object(
        &self,
        bucket: &str,
        key: &str,
        offset: u64,
        length: u64,
    ) -> Result<ByteStream, BackendError> {
        if length == 0 {
            return Ok(stream::empty().boxed());
        }

        let start = usize::try_from(offset)
            .map_err(|_| BackendError::InvalidConfig(format!("offset out of range: {offset}")))?;
        let end = offset
            .checked_add(length)
            .and_then(|end| usize::try_from(end).ok())
            .ok_or_else(|| BackendError::InvalidConfig(format!("length out of range: {length}")))?;

        let options = GetOptions {
            range: Some(GetRange::Bounded(start..end)),
            ..Default::default()
        };

        match self.store.get_opts(&self.object_path(bucket, key), options).await {
            Ok(result) => Ok(result.into_stream().map_err(BackendError::from).boxed()),
            Err(object_store::Error::NotFound { .. }) => Err(self.not_found(bucket, key).await),
            Err(e) => Err(e.into()),
        }
    }

    async fn object_node_ips(&self, bucket: &str, key: &str) -> Result<Vec<IpAddr>, BackendError> {
        // every configured node holds the whole store
        self.stat_object(bucket, key).await?;
        Ok(self.nodes.as_ref().clone())
    }

    async fn close(&self) -> Result<(), BackendError> {
        tracing::trace!(project = %self.project, "closing project");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use bytes::Bytes;

    const API_KEY: &str = "test-key";

    async fn setup() -> (ObjectStoreBackend, Arc<dyn Project>) {
        let backend = ObjectStoreBackend::new(&ObjectStoreConfig::Memory)
            .await
            .unwrap()
            .with_project(API_KEY, "project")
            .with_nodes(vec!["10.0.0.1".parse().unwrap()]);

        for (key, data) in [
            ("test/foo", "FOO"),
            ("test/sub/bar", "BAR"),
            ("top.txt", "hello world"),
        ] {
            backend
                .store()
                .put(
                    &ObjectStoreBackend::object_path("project", "testbucket", key),
                    Bytes::from_static(data.as_bytes()).into(),
                )
                .await
                .unwrap();
        }

        let project = backend
            .open_project(&Access::new("sat", API_KEY))
            .await
            .unwrap();
        (backend, project)
    }

    async fn collect(stream: ByteStream) -> Vec<u8> {
        stream
            .try_fold(Vec::new(), |mut acc, chunk| async move {
                acc.extend_from_slice(&chunk);
                Ok(acc)
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_open_project_unknown_key() {
        let (backend, _) = setup().await;
        let result = backend.open_project(&Access::new("sat", "other")).await;
        assert!(matches!(result, Err(BackendError::PermissionDenied)));
    }

    #[tokio::test]
    async fn test_stat_object() {
        let (_, project) = setup().await;

        let info = project.stat_object("testbucket", "test/foo").await.unwrap();
        assert_eq!(info.key, "test/foo");
        assert_eq!(info.size, 3);
        assert!(!info.is_prefix);
        assert!(info.created.is_some());

        let err = project
            .stat_object("testbucket", "test/missing")
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::ObjectNotFound(_)));

        let err = project
            .stat_object("someotherbucket", "test/foo")
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::BucketNotFound(_)));
    }

    #[tokio::test]
    async fn test_list_objects() {
        let (_, project) = setup().await;

        let root: Vec<ObjectInfo> = project
            .list_objects("testbucket", "")
            .try_collect()
            .await
            .unwrap();
        let keys: Vec<&str> = root.iter().map(|i| i.key.as_str()).collect();
        assert_eq!(keys, vec!["test/", "top.txt"]);
        assert!(root[0].is_prefix);
        assert_eq!(root[1].size, 11);

        let nested: Vec<ObjectInfo> = project
            .list_objects("testbucket", "test/")
            .try_collect()
            .await
            .unwrap();
        let keys: Vec<&str> = nested.iter().map(|i| i.key.as_str()).collect();
        assert_eq!(keys, vec!["test/foo", "test/sub/"]);

        let missing: Result<Vec<ObjectInfo>, _> =
            project.list_objects("nobucket", "").try_collect().await;
        assert!(matches!(missing, Err(BackendError::BucketNotFound(_))));
    }

    #[tokio::test]
    async fn test_download_ranges() {
        let (_, project) = setup().await;

        let full = project
            .download_object("testbucket", "top.txt", 0, 11)
            .await
            .unwrap();
        assert_eq!(collect(full).await, b"hello world");

        let part = project
            .download_object("testbucket", "top.txt", 6, 5)
            .await
            .unwrap();
        assert_eq!(collect(part).await, b"world");

        let empty = project
            .download_object("testbucket", "top.txt", 0, 0)
            .await
            .unwrap();
        assert!(collect(empty).await.is_empty());

        let missing = project.download_object("testbucket", "gone", 0, 1).await;
        assert!(matches!(missing, Err(BackendError::ObjectNotFound(_))));
    }

    #[tokio::test]
    async fn test_object_node_ips() {
        let (_, project) = setup().await;
        let ips = project
            .object_node_ips("testbucket", "test/foo")
            .await
            .unwrap();
        assert_eq!(ips, vec!["10.0.0.1".parse::<IpAddr>().unwrap()]);

        let missing = project.object_node_ips("testbucket", "nope").await;
        assert!(matches!(missing, Err(BackendError::ObjectNotFound(_))));
    }
}
