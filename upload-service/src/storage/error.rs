use thiserror::Error;

/// Storage error types
///
/// Callers treat every variant as the same opaque failure; the variants only
/// exist so the log line says what went wrong.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Payload read error: declared {declared} bytes but only {actual} were received")]
    PayloadRead { declared: u64, actual: usize },

    #[error("Object {key} is {size} bytes, above the {limit} byte download limit")]
    TooLarge { key: String, size: u64, limit: u64 },

    #[error("S3 {operation} failed for {key}: {message}")]
    Backend {
        operation: &'static str,
        key: String,
        message: String,
    },
}

pub type StorageResult<T> = Result<T, StorageError>;
