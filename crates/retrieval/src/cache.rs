//! On-disk index cache.
//!
//! One JSON file per (corpus kind, indexed root):
//!
//! ```json
//! { "version": 1, "root": "/work/project", "chunks": [ ... ] }
//! ```
//!
//! A file whose version or root does not match is treated as absent. The
//! cache is not invalidated by file changes under the root; callers that need
//! fresh results remove the file (see [`CacheStore::remove`]).

use contextkit_core::chunk::{Chunk, CorpusKind};
use contextkit_core::error::CacheError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// Bumped whenever chunking or the file layout changes.
pub const CACHE_VERSION: u32 = 1;

#[derive(Serialize)]
struct CacheFileRef<'a> {
    version: u32,
    root: &'a str,
    chunks: &'a [Chunk],
}

#[derive(Deserialize)]
struct CacheHeader {
    version: u32,
    root: String,
}

#[derive(Deserialize)]
struct CacheFile {
    chunks: Vec<Chunk>,
}

/// Reads and writes cache files in one directory.
#[derive(Debug, Clone)]
pub struct CacheStore {
    dir: PathBuf,
}

impl CacheStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `<dir>/<kind>-<root hash>.json`
    pub fn path_for(&self, kind: CorpusKind, root: &str) -> PathBuf {
        self.dir.join(format!("{kind}-{}.json", root_hash(root)))
    }

    /// Load the chunks cached for `(kind, root)`.
    ///
    /// `Ok(None)` when no cache file exists; an error when it exists but is
    /// unreadable, corrupt, from another version, or for another root.
    pub fn load(&self, kind: CorpusKind, root: &str) -> Result<Option<Vec<Chunk>>, CacheError> {
        let path = self.path_for(kind, root);
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(CacheError::Io {
                    path,
                    reason: e.to_string(),
                });
            }
        };

        let header: CacheHeader =
            serde_json::from_slice(&bytes).map_err(|e| CacheError::Decode {
                path: path.clone(),
                reason: e.to_string(),
            })?;
        if header.version != CACHE_VERSION {
            return Err(CacheError::VersionMismatch {
                expected: CACHE_VERSION,
                found: header.version,
            });
        }
        if header.root != root {
            return Err(CacheError::RootMismatch {
                expected: root.to_string(),
                found: header.root,
            });
        }

        let file: CacheFile = serde_json::from_slice(&bytes).map_err(|e| CacheError::Decode {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        debug!(path = %path.display(), chunks = file.chunks.len(), "Loaded index cache");
        Ok(Some(file.chunks))
    }

    /// Write the chunks for `(kind, root)`, replacing any existing file.
    ///
    /// Each write goes to its own temp file in the cache directory and is
    /// renamed into place, so readers see either the old file or the new one.
    pub fn store(
        &self,
        kind: CorpusKind,
        root: &str,
        chunks: &[Chunk],
    ) -> Result<PathBuf, CacheError> {
        let path = self.path_for(kind, root);
        let io_error = |e: std::io::Error| CacheError::Io {
            path: path.clone(),
            reason: e.to_string(),
        };

        std::fs::create_dir_all(&self.dir).map_err(io_error)?;

        let body = serde_json::to_vec(&CacheFileRef {
            version: CACHE_VERSION,
            root,
            chunks,
        })
        .map_err(|e| CacheError::Io {
            path: path.clone(),
            reason: format!("Failed to serialize cache: {e}"),
        })?;

        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(io_error)?;
        tmp.write_all(&body).map_err(io_error)?;
        tmp.persist(&path).map_err(|e| io_error(e.error))?;

        debug!(path = %path.display(), chunks = chunks.len(), "Wrote index cache");
        Ok(path)
    }

    /// Delete the cache file for `(kind, root)`. Returns whether one existed.
    pub fn remove(&self, kind: CorpusKind, root: &str) -> Result<bool, CacheError> {
        let path = self.path_for(kind, root);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(CacheError::Io {
                path,
                reason: e.to_string(),
            }),
        }
    }
}

/// First 16 hex characters of the SHA-256 of `root`.
pub fn root_hash(root: &str) -> String {
    let digest = Sha256::digest(root.as_bytes());
    hex::encode(&digest[..8])
}
