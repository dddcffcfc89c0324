//! Storage error types.

use thiserror::Error;

use teamweaver_core::error::MatchError;

/// Errors raised by the RocksDB repository.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database failed to open at the specified path.
    #[error("Failed to open database at '{path}': {message}")]
    OpenFailed {
        /// The path where the open was attempted.
        path: String,
        /// The underlying RocksDB message.
        message: String,
    },

    /// Column family missing from the opened database.
    #[error("Column family '{name}' not found")]
    ColumnFamilyNotFound {
        /// Name of the missing column family.
        name: String,
    },

    /// Read operation failed.
    #[error("Read failed: {0}")]
    ReadFailed(String),

    /// Write operation failed.
    #[error("Write failed: {0}")]
    WriteFailed(String),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<StorageError> for MatchError {
    /// The core treats every repository failure as transient storage
    /// unavailability; the orchestrator retries with bounded backoff and
    /// surfaces the final error otherwise.
    fn from(err: StorageError) -> Self {
        MatchError::StorageUnavailable(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_maps_to_storage_unavailable() {
        let err: MatchError = StorageError::ReadFailed("io".into()).into();
        assert!(matches!(err, MatchError::StorageUnavailable(_)));
        assert!(err.is_transient());
    }
}
