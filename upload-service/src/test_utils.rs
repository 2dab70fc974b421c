//! Test helpers shared across modules.

use std::collections::HashMap;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use async_trait::async_trait;
use bytes::Bytes;

use crate::storage::{ObjectBackend, PutObjectRequest, StorageBridge, StorageError};
use crate::AppState;

/// In-memory object store that records every write.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    objects: Arc<Mutex<HashMap<String, PutObjectRequest>>>,
    put_calls: Arc<AtomicUsize>,
}

impl MemoryBackend {
    pub fn object(&self, key: &str) -> Option<PutObjectRequest> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn put_calls(&self) -> usize {
        self.put_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectBackend for MemoryBackend {
    async fn put_object(&self, request: PutObjectRequest) -> Result<(), StorageError> {
        self.put_calls.fetch_add(1, Ordering::SeqCst);
        let mut objects = self.objects.lock().unwrap();
        assert!(
            !objects.contains_key(&request.key),
            "object {} written twice",
            request.key
        );
        objects.insert(request.key.clone(), request);
        Ok(())
    }

    async fn get_object(
        &self,
        bucket: &str,
        key: &str,
        max_bytes: u64,
    ) -> Result<Bytes, StorageError> {
        let objects = self.objects.lock().unwrap();
        let object = objects
            .get(key)
            .filter(|object| object.bucket == bucket)
            .ok_or_else(|| StorageError::Backend {
                operation: "GetObject",
                key: key.to_string(),
                message: "NoSuchKey: The specified key does not exist.".to_string(),
            })?;

        if object.body.len() as u64 > max_bytes {
            return Err(StorageError::TooLarge {
                key: key.to_string(),
                size: object.body.len() as u64,
                limit: max_bytes,
            });
        }
        Ok(object.body.clone())
    }
}

/// App state backed by `backend`, writing to `pictures-bucket` under `pictures/`.
pub fn test_state(backend: MemoryBackend, legacy_status_codes: bool) -> AppState {
    AppState {
        bridge: Arc::new(StorageBridge::new(Arc::new(backend), "pictures-bucket", "pictures/")),
        legacy_status_codes,
    }
}
