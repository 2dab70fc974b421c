//! Storage bridge between HTTP payloads and the object-storage backend
//!
//! Turns an uploaded byte payload into a uniquely named object and reads a
//! named object back. Each operation is exactly one backend call with no
//! retry, chunking or checksum verification.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, info};
use uuid::Uuid;

use super::backend::STORAGE_CLASS_STANDARD;
use super::error::StorageResult;
use super::sniff::detect_content_type;
use super::{ObjectBackend, PutObjectRequest, StorageError};

/// Largest object `get` will return: 50 MiB
pub const MAX_DOWNLOAD_BYTES: u64 = 50 * 1024 * 1024;

const CONTENT_DISPOSITION: &str = "attachment";

pub struct StorageBridge {
    backend: Arc<dyn ObjectBackend>,
    bucket: String,
    key_prefix: String,
}

impl StorageBridge {
    pub fn new(
        backend: Arc<dyn ObjectBackend>,
        bucket: impl Into<String>,
        key_prefix: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            bucket: bucket.into(),
            key_prefix: key_prefix.into(),
        }
    }

    /// Store `payload` under a freshly generated key and return that key.
    ///
    /// Only the first `size_hint` bytes are stored; a hint larger than the
    /// payload fails before the backend is called.
    pub async fn put(
        &self,
        payload: Bytes,
        declared_name: &str,
        size_hint: u64,
    ) -> StorageResult<String> {
        let body = match usize::try_from(size_hint) {
            Ok(size) if size <= payload.len() => payload.slice(..size),
            _ => {
                return Err(StorageError::PayloadRead {
                    declared: size_hint,
                    actual: payload.len(),
                })
            }
        };

        let key = object_key(&self.key_prefix, declared_name);
        let content_type = detect_content_type(&body).to_string();

        debug!(
            bucket = %self.bucket,
            key = %key,
            content_type = %content_type,
            size = body.len(),
            "Putting object"
        );

        self.backend
            .put_object(PutObjectRequest {
                bucket: self.bucket.clone(),
                key: key.clone(),
                body,
                content_type,
                content_disposition: CONTENT_DISPOSITION.to_string(),
                public_read: true,
                server_side_encryption: true,
                storage_class: STORAGE_CLASS_STANDARD.to_string(),
            })
            .await?;

        info!(bucket = %self.bucket, key = %key, "Object stored");
        Ok(key)
    }

    /// Fetch the object stored under `key`.
    pub async fn get(&self, key: &str) -> StorageResult<Bytes> {
        let data = self
            .backend
            .get_object(&self.bucket, key, MAX_DOWNLOAD_BYTES)
            .await?;

        debug!(bucket = %self.bucket, key = %key, size = data.len(), "Object fetched");
        Ok(data)
    }
}

/// `prefix` + 32 hex chars of a v4 UUID + the declared file extension.
pub fn object_key(prefix: &str, declared_name: &str) -> String {
    format!(
        "{}{}{}",
        prefix,
        Uuid::new_v4().simple(),
        extension_of(declared_name)
    )
}

/// Extension of the last path component, dot included, or "" if none.
fn extension_of(name: &str) -> &str {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    match base.rfind('.') {
        Some(idx) => &base[idx..],
        None => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::backend::MockObjectBackend;
    use crate::test_utils::MemoryBackend;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;

    const PNG: &[u8] = b"\x89PNG\x0D\x0A\x1A\x0A\x00\x00\x00\x0DIHDR";

    fn bridge_with(backend: impl ObjectBackend + 'static) -> StorageBridge {
        StorageBridge::new(Arc::new(backend), "pictures-bucket", "pictures/")
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("photo.png"), ".png");
        assert_eq!(extension_of("archive.tar.gz"), ".gz");
        assert_eq!(extension_of("README"), "");
        assert_eq!(extension_of("dir.d/README"), "");
        assert_eq!(extension_of("C:\\Users\\me\\cat.JPG"), ".JPG");
        assert_eq!(extension_of(""), "");
    }

    #[test]
    fn test_object_key_shape() {
        let key = object_key("pictures/", "cat.jpeg");
        let suffix = key
            .strip_prefix("pictures/")
            .and_then(|rest| rest.strip_suffix(".jpeg"))
            .unwrap();
        assert_eq!(suffix.len(), 32);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[tokio::test]
    async fn test_put_sets_fixed_object_attributes() {
        let mut backend = MockObjectBackend::new();
        backend
            .expect_put_object()
            .withf(|req| {
                req.bucket == "pictures-bucket"
                    && req.key.starts_with("pictures/")
                    && req.key.ends_with(".txt")
                    && req.content_type == "image/png"
                    && req.content_disposition == "attachment"
                    && req.public_read
                    && req.server_side_encryption
                    && req.storage_class == "STANDARD"
                    && req.body.as_ref() == PNG
            })
            .times(1)
            .returning(|_| Ok(()));

        // The extension says text, the bytes say PNG
        let key = bridge_with(backend)
            .put(Bytes::from_static(PNG), "file.txt", PNG.len() as u64)
            .await
            .unwrap();
        assert!(key.ends_with(".txt"));
    }

    #[tokio::test]
    async fn test_put_size_hint_longer_than_payload_fails_without_backend_call() {
        let mut backend = MockObjectBackend::new();
        backend.expect_put_object().times(0);

        let err = bridge_with(backend)
            .put(Bytes::from_static(b"short"), "a.txt", 10)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::PayloadRead { declared: 10, actual: 5 }));
    }

    #[tokio::test]
    async fn test_put_truncates_to_size_hint() {
        let backend = MemoryBackend::default();
        let bridge = bridge_with(backend.clone());

        let key = bridge
            .put(Bytes::from_static(b"hello world"), "a.txt", 5)
            .await
            .unwrap();
        assert_eq!(backend.object(&key).unwrap().body, Bytes::from_static(b"hello"));
    }

    #[tokio::test]
    async fn test_put_surfaces_backend_error_unmodified() {
        let mut backend = MockObjectBackend::new();
        backend.expect_put_object().times(1).returning(|req| {
            Err(StorageError::Backend {
                operation: "PutObject",
                key: req.key,
                message: "AccessDenied".to_string(),
            })
        });

        let err = bridge_with(backend)
            .put(Bytes::from_static(PNG), "a.png", PNG.len() as u64)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Backend { operation: "PutObject", .. }));
    }

    #[tokio::test]
    async fn test_get_passes_download_limit() {
        let mut backend = MockObjectBackend::new();
        backend
            .expect_get_object()
            .withf(|bucket, key, max| {
                bucket == "pictures-bucket"
                    && key == "pictures/abc.png"
                    && *max == MAX_DOWNLOAD_BYTES
            })
            .times(1)
            .returning(|_, _, _| Ok(Bytes::from_static(b"data")));

        let data = bridge_with(backend).get("pictures/abc.png").await.unwrap();
        assert_eq!(data, Bytes::from_static(b"data"));
    }

    #[tokio::test]
    async fn test_identical_concurrent_puts_get_distinct_keys() {
        let backend = MemoryBackend::default();
        let bridge = Arc::new(bridge_with(backend.clone()));

        let uploads = (0..32).map(|_| {
            let bridge = Arc::clone(&bridge);
            tokio::spawn(async move {
                bridge
                    .put(Bytes::from_static(PNG), "same.png", PNG.len() as u64)
                    .await
                    .unwrap()
            })
        });
        let keys: HashSet<String> = futures::future::join_all(uploads)
            .await
            .into_iter()
            .map(|res| res.unwrap())
            .collect();

        assert_eq!(keys.len(), 32);
        assert_eq!(backend.len(), 32);
    }

    #[tokio::test]
    async fn test_round_trip_through_memory_backend() {
        let bridge = bridge_with(MemoryBackend::default());
        let payload: Vec<u8> = (0..=255u8).cycle().take(4096).collect();

        let key = bridge
            .put(Bytes::from(payload.clone()), "blob.bin", payload.len() as u64)
            .await
            .unwrap();
        let fetched = bridge.get(&key).await.unwrap();
        assert_eq!(fetched.as_ref(), payload.as_slice());
    }

    #[tokio::test]
    async fn test_get_missing_key_is_an_error() {
        let bridge = bridge_with(MemoryBackend::default());
        assert!(bridge.get("pictures/nope.png").await.is_err());
    }
}
