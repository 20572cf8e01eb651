//! Error types for the ContextKit domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant. Retrieval never surfaces
//! these to its callers: indexing and cache failures are logged and absorbed
//! where they occur, so the enums mostly travel as far as a `warn!` line.

use std::path::PathBuf;
use thiserror::Error;

/// The top-level error type for ContextKit operations that do propagate,
/// such as loading a capability registry file.
#[derive(Debug, Error)]
pub enum Error {
    // --- Indexing errors ---
    #[error("Index error: {0}")]
    Index(#[from] IndexError),

    // --- Cache errors ---
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    // --- Input files ---
    #[error("Failed to read {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum IndexError {
    #[error("Root {root} is unreadable: {reason}")]
    RootUnreadable { root: PathBuf, reason: String },

    #[error("Failed to read {path}: {reason}")]
    FileUnreadable { path: PathBuf, reason: String },

    #[error("Skipping {path}: {size} bytes exceeds the {limit} byte limit")]
    FileTooLarge { path: PathBuf, size: u64, limit: u64 },

    #[error("Path not found or not a regular file: {0}")]
    PathNotFound(PathBuf),

    #[error("Invalid capability descriptor: {0}")]
    InvalidCapability(String),
}

#[derive(Debug, Clone, Error)]
pub enum CacheError {
    #[error("Cache I/O failed at {path}: {reason}")]
    Io { path: PathBuf, reason: String },

    #[error("Cache file {path} is corrupt: {reason}")]
    Decode { path: PathBuf, reason: String },

    #[error("Cache version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },

    #[error("Cache root mismatch: expected {expected}, found {found}")]
    RootMismatch { expected: String, found: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_error_displays_correctly() {
        let err = Error::Index(IndexError::FileTooLarge {
            path: PathBuf::from("src/huge.rs"),
            size: 2048,
            limit: 1024,
        });
        assert!(err.to_string().contains("src/huge.rs"));
        assert!(err.to_string().contains("1024"));
    }

    #[test]
    fn cache_error_displays_correctly() {
        let err = Error::Cache(CacheError::VersionMismatch {
            expected: 2,
            found: 1,
        });
        assert!(err.to_string().contains("expected 2"));
        assert!(err.to_string().contains("found 1"));
    }
}
