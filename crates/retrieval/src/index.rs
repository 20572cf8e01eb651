//! The build-once corpus index and the shared first-stage ranking.
//!
//! An [`IndexCell`] is `unbuilt` until its first read, then `built` for the
//! rest of the process. Concurrent first readers block on a single build;
//! everyone after that reads the finished chunk list without locking.

use crate::cache::CacheStore;
use contextkit_core::chunk::{Chunk, CorpusKind, sort_by_score_desc};
use contextkit_core::error::CacheError;
use contextkit_core::terms::overlap_score;
use std::sync::OnceLock;
use tracing::{debug, info, warn};

/// What one scan produced, and whether it may be written to the cache.
pub(crate) struct Scanned {
    chunks: Vec<Chunk>,
    persist: bool,
}

impl Scanned {
    /// An index of what is on disk. Cached.
    pub(crate) fn complete(chunks: Vec<Chunk>) -> Self {
        Self {
            chunks,
            persist: true,
        }
    }

    /// An index of input that is missing or unreadable right now. Served for
    /// this process but never cached, so the next process scans again.
    pub(crate) fn transient(chunks: Vec<Chunk>) -> Self {
        Self {
            chunks,
            persist: false,
        }
    }
}

impl From<Vec<Chunk>> for Scanned {
    fn from(chunks: Vec<Chunk>) -> Self {
        Self::complete(chunks)
    }
}

/// Lazily built, immutable chunk list for one corpus over one root.
pub(crate) struct IndexCell {
    kind: CorpusKind,
    /// Identity of what is indexed (root directory or document path).
    root_key: String,
    cache: Option<CacheStore>,
    chunks: OnceLock<Vec<Chunk>>,
}

impl IndexCell {
    pub(crate) fn new(
        kind: CorpusKind,
        root_key: impl Into<String>,
        cache: Option<CacheStore>,
    ) -> Self {
        Self {
            kind,
            root_key: root_key.into(),
            cache,
            chunks: OnceLock::new(),
        }
    }

    pub(crate) fn is_built(&self) -> bool {
        self.chunks.get().is_some()
    }

    /// The chunk list, building it on first use: a valid cache file wins,
    /// otherwise `scan` runs and a complete result is written back to the
    /// cache.
    pub(crate) fn get_or_build<S>(&self, scan: impl FnOnce() -> S) -> &[Chunk]
    where
        S: Into<Scanned>,
    {
        self.chunks.get_or_init(|| {
            if let Some(chunks) = self.load_cached() {
                info!(
                    corpus = %self.kind,
                    root = %self.root_key,
                    chunks = chunks.len(),
                    "Index loaded from cache"
                );
                return chunks;
            }

            let Scanned { chunks, persist } = scan().into();
            info!(
                corpus = %self.kind,
                root = %self.root_key,
                chunks = chunks.len(),
                cached = persist && self.cache.is_some(),
                "Index built from scan"
            );
            if persist
                && let Some(cache) = &self.cache
                && let Err(e) = cache.store(self.kind, &self.root_key, &chunks)
            {
                warn!(corpus = %self.kind, error = %e, "Failed to write index cache");
            }
            chunks
        })
    }

    fn load_cached(&self) -> Option<Vec<Chunk>> {
        let cache = self.cache.as_ref()?;
        match cache.load(self.kind, &self.root_key) {
            Ok(found) => found,
            Err(e @ (CacheError::VersionMismatch { .. } | CacheError::RootMismatch { .. })) => {
                debug!(corpus = %self.kind, reason = %e, "Ignoring stale index cache");
                None
            }
            Err(e) => {
                warn!(corpus = %self.kind, error = %e, "Ignoring unreadable index cache");
                None
            }
        }
    }

    /// Remove this index's cache file so the next process rebuilds it.
    pub(crate) fn remove_cache(&self) -> Result<bool, CacheError> {
        match &self.cache {
            Some(cache) => cache.remove(self.kind, &self.root_key),
            None => Ok(false),
        }
    }
}

/// Score every chunk with the overlap of `query_terms` against `text_of`,
/// drop zero scores, sort descending and keep the best `k`.
pub(crate) fn top_k<S, F>(chunks: &[Chunk], query_terms: &[S], k: usize, text_of: F) -> Vec<Chunk>
where
    S: AsRef<str>,
    F: Fn(&Chunk) -> String,
{
    if k == 0 || query_terms.is_empty() {
        return Vec::new();
    }
    let mut scored: Vec<Chunk> = chunks
        .iter()
        .filter_map(|chunk| {
            let score = overlap_score(query_terms, &text_of(chunk));
            (score > 0.0).then(|| chunk.clone().with_score(score))
        })
        .collect();
    sort_by_score_desc(&mut scored);
    scored.truncate(k);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    fn chunk(location: &str, content: &str) -> Chunk {
        Chunk::new(CorpusKind::Docs, "guide.md", location, content)
    }

    #[test]
    fn builds_exactly_once() {
        let cell = IndexCell::new(CorpusKind::Docs, "/root", None);
        let scans = AtomicUsize::new(0);
        assert!(!cell.is_built());
        for _ in 0..3 {
            cell.get_or_build(|| {
                scans.fetch_add(1, Ordering::SeqCst);
                vec![chunk("guide.md#A", "alpha")]
            });
        }
        assert!(cell.is_built());
        assert_eq!(scans.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn concurrent_first_readers_share_one_build() {
        let cell = IndexCell::new(CorpusKind::Docs, "/root", None);
        let scans = AtomicUsize::new(0);
        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    let chunks = cell.get_or_build(|| {
                        scans.fetch_add(1, Ordering::SeqCst);
                        std::thread::sleep(std::time::Duration::from_millis(20));
                        vec![chunk("guide.md#A", "alpha"), chunk("guide.md#B", "beta")]
                    });
                    assert_eq!(chunks.len(), 2);
                });
            }
        });
        assert_eq!(scans.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn warm_cache_short_circuits_scan() {
        let tmp = TempDir::new().unwrap();
        let store = CacheStore::new(tmp.path());
        let cold = IndexCell::new(CorpusKind::Docs, "/root", Some(store.clone()));
        let built = cold.get_or_build(|| vec![chunk("guide.md#A", "alpha")]).to_vec();

        let warm = IndexCell::new(CorpusKind::Docs, "/root", Some(store));
        let loaded =
            warm.get_or_build(|| -> Vec<Chunk> { panic!("scan must not run with a warm cache") });
        assert_eq!(loaded, built.as_slice());
        assert!(warm.remove_cache().unwrap());
    }

    #[test]
    fn transient_scan_is_served_but_not_cached() {
        let tmp = TempDir::new().unwrap();
        let store = CacheStore::new(tmp.path());
        let first = IndexCell::new(CorpusKind::Memory, "/notes.md", Some(store.clone()));
        assert!(first.get_or_build(|| Scanned::transient(Vec::new())).is_empty());
        assert!(first.is_built());
        assert!(store.load(CorpusKind::Memory, "/notes.md").unwrap().is_none());

        let second = IndexCell::new(CorpusKind::Memory, "/notes.md", Some(store.clone()));
        let chunks = second.get_or_build(|| vec![chunk("notes.md#Deploy", "deploy friday")]);
        assert_eq!(chunks.len(), 1);
        assert!(store.load(CorpusKind::Memory, "/notes.md").unwrap().is_some());
    }

    #[test]
    fn top_k_filters_sorts_and_truncates() {
        let chunks = vec![
            chunk("guide.md#Intro", "welcome to the project"),
            chunk("guide.md#Setup", "install and configure the project"),
            chunk("guide.md#Usage", "configure flags"),
        ];
        let terms = vec!["configure".to_string(), "project".to_string()];
        let top = top_k(&chunks, &terms, 2, |c| c.content().to_string());
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].location(), "guide.md#Setup");
        assert_eq!(top[0].score(), 1.0);
        assert!(top[0].score() >= top[1].score());
    }

    #[test]
    fn top_k_with_no_terms_or_zero_k_is_empty() {
        let chunks = vec![chunk("guide.md#A", "alpha")];
        let none: Vec<String> = Vec::new();
        assert!(top_k(&chunks, &none, 5, |c| c.content().to_string()).is_empty());
        assert!(top_k(&chunks, &["alpha"], 0, |c| c.content().to_string()).is_empty());
    }
}
