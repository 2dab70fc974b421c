// Storage module for S3/MinIO integration

pub mod backend;
pub mod bridge;
pub mod error;
pub mod s3_client;
pub mod sniff;

pub use backend::{ObjectBackend, PutObjectRequest};
pub use bridge::StorageBridge;
pub use error::StorageError;
