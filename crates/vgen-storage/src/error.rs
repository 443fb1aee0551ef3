//! Storage error types.

use std::fmt;

use thiserror::Error;

pub type StorageResult<T> = Result<T, StorageError>;

/// Which object operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transfer {
    Upload,
    Download,
    Delete,
}

impl fmt::Display for Transfer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Transfer::Upload => "upload",
            Transfer::Download => "download",
            Transfer::Delete => "delete",
        })
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("R2 is not configured: {0}")]
    Config(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    /// `key` is the object key, or a key count for batch deletes
    #[error("Failed to {op} {key}: {message}")]
    Transfer {
        op: Transfer,
        key: String,
        message: String,
    },

    #[error("Failed to sign a URL for {key}: {message}")]
    Presign { key: String, message: String },

    #[error("Bucket {bucket} is unreachable: {message}")]
    Unreachable { bucket: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn transfer(op: Transfer, key: impl Into<String>, err: impl fmt::Display) -> Self {
        Self::Transfer {
            op,
            key: key.into(),
            message: err.to_string(),
        }
    }

    pub fn presign(key: impl Into<String>, err: impl fmt::Display) -> Self {
        Self::Presign {
            key: key.into(),
            message: err.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_message_names_operation_and_key() {
        let err = StorageError::transfer(Transfer::Upload, "users/u/videos/v/clip.mp4", "timed out");
        assert_eq!(
            err.to_string(),
            "Failed to upload users/u/videos/v/clip.mp4: timed out"
        );
        assert!(!err.is_not_found());
        assert!(StorageError::NotFound("k".into()).is_not_found());
    }
}
