//! Object Storage Error Types

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Invalid storage configuration: {message}")]
    Configuration { message: String },

    #[error("Bucket '{bucket}' {operation} failed: {message}")]
    Bucket {
        bucket: String,
        operation: &'static str,
        message: String,
    },

    #[error("Object '{path}' {operation} failed: {message}")]
    Object {
        path: String,
        operation: &'static str,
        message: String,
    },

    #[error("Listing objects under '{prefix}' failed: {message}")]
    Listing { prefix: String, message: String },

    #[error("Upload of '{path}' expected {expected} bytes but the reader produced {actual}")]
    ShortRead {
        path: String,
        expected: u64,
        actual: u64,
    },

    #[error("Failed to read upload body for '{path}'")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Result type for object storage operations
pub type StorageResult<T> = Result<T, StorageError>;
