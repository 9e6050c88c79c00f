//! Upload errors

use crate::policy::FileCategory;

/// Upload failures. Validation errors are meant to be mapped to a
/// user-facing rejection by the caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadError {
    #[error("invalid data URL: {0}")]
    InvalidDataUrl(String),

    #[error("file type {mime} is not allowed for {category}")]
    UnsupportedFileType { mime: String, category: FileCategory },

    #[error("file is {size} bytes, {category} uploads are limited to {limit} bytes")]
    FileTooLarge {
        size: u64,
        limit: u64,
        category: FileCategory,
    },

    #[error("object not found: {0}")]
    NotFound(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("invalid upload policy: {0}")]
    Policy(String),
}

/// Result type for upload operations
pub type UploadResult<T> = std::result::Result<T, UploadError>;
