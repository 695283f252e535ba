use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::backend::{BackendError, ByteStream, ObjectInfo, Project};

/// A stored object exposed as a sized, randomly addressable byte source.
///
/// Every read goes back to the backend; nothing is buffered here.
#[derive(Clone)]
pub struct ObjectRanger {
    project: Arc<dyn Project>,
    object: ObjectInfo,
    bucket: String,
}

impl ObjectRanger {
    pub fn new(project: Arc<dyn Project>, object: ObjectInfo, bucket: impl Into<String>) -> Self {
        Self {
            project,
            object,
            bucket: bucket.into(),
        }
    }

    /// Total length of the object, fixed when the ranger was built
    pub fn size(&self) -> u64 {
        self.object.size
    }

    pub fn key(&self) -> &str {
        &self.object.key
    }

    pub fn created(&self) -> Option<DateTime<Utc>> {
        self.object.created
    }

    /// Read `length` bytes starting at `offset`
    pub async fn range(&self, offset: u64, length: u64) -> Result<ByteStream, BackendError> {
        self.project
            .download_object(&self.bucket, &self.object.key, offset, length)
            .await
    }
}

impl std::fmt::Debug for ObjectRanger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectRanger")
            .field("bucket", &self.bucket)
            .field("object", &self.object)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::net::IpAddr;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use bytes::Bytes;
    use futures::stream::{self, BoxStream};
    use futures::{StreamExt, TryStreamExt};

    /// Serves a fixed buffer and counts downloads
    struct FixedProject {
        data: &'static [u8],
        downloads: AtomicUsize,
    }

    #[async_trait]
    impl Project for FixedProject {
        async fn stat_object(&self, _bucket: &str, key: &str) -> Result<ObjectInfo, BackendError> {
            Err(BackendError::ObjectNotFound(key.to_string()))
        }

        fn list_objects<'a>(
            &'a self,
            _bucket: &'a str,
            _prefix: &'a str,
        ) -> BoxStream<'a, Result<ObjectInfo, BackendError>> {
            stream::empty().boxed()
        }

        async fn download_object(
            &self,
            _bucket: &str,
            key: &str,
            offset: u64,
            length: u64,
        ) -> Result<ByteStream, BackendError> {
            self.downloads.fetch_add(1, Ordering::SeqCst);
            let start = offset as usize;
            let end = start + length as usize;
            if end > self.data.len() {
                return Err(BackendError::ObjectNotFound(key.to_string()));
            }
            let chunk = Bytes::from_static(&self.data[start..end]);
            Ok(stream::once(async move { Ok(chunk) }).boxed())
        }

        async fn object_node_ips(&self, _: &str, _: &str) -> Result<Vec<IpAddr>, BackendError> {
            Ok(Vec::new())
        }

        async fn close(&self) -> Result<(), BackendError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_ranger_reads_through() {
        let project = Arc::new(FixedProject {
            data: b"hello world",
            downloads: AtomicUsize::new(0),
        });
        let object = ObjectInfo {
            key: "greeting.txt".to_string(),
            is_prefix: false,
            size: 11,
            created: None,
        };
        let ranger = ObjectRanger::new(project.clone(), object, "bucket");
        assert_eq!(ranger.size(), 11);
        assert_eq!(ranger.key(), "greeting.txt");

        for _ in 0..2 {
            let chunks: Vec<Bytes> = ranger.range(6, 5).await.unwrap().try_collect().await.unwrap();
            assert_eq!(chunks.concat(), b"world");
        }
        assert_eq!(project.downloads.load(Ordering::SeqCst), 2);

        let err = match ranger.range(6, 50).await {
            Err(e) => e,
            Ok(_) => panic!("reading past the end should fail"),
        };
        assert!(err.is_not_found());
    }
}
