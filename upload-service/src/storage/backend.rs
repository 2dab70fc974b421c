//! The object-storage seam the storage bridge talks to.

use async_trait::async_trait;
use bytes::Bytes;

use super::error::StorageResult;

/// Storage class every object is written with.
pub const STORAGE_CLASS_STANDARD: &str = "STANDARD";

/// A single PutObject call, with the object attributes spelled out.
#[derive(Debug, Clone, PartialEq)]
pub struct PutObjectRequest {
    pub bucket: String,
    pub key: String,
    pub body: Bytes,
    pub content_type: String,
    pub content_disposition: String,
    pub public_read: bool,
    pub server_side_encryption: bool,
    pub storage_class: String,
}

/// Key-addressed byte store. Implementations must be safe to share across
/// concurrent requests without extra locking.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectBackend: Send + Sync {
    /// Write one object. Either the whole object is stored or nothing is.
    async fn put_object(&self, request: PutObjectRequest) -> StorageResult<()>;

    /// Read one object in full, failing if it is larger than `max_bytes`.
    async fn get_object(&self, bucket: &str, key: &str, max_bytes: u64) -> StorageResult<Bytes>;
}
