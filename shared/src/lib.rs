//! Shared utilities for the upload service workspace

// Re-export common dependencies
pub use tracing;

pub mod observability;
