//! Memory corpora.
//!
//! Two sources of remembered facts feed the memory selection:
//! - [`SessionMemory`] scores notes the caller passes in with each request.
//!   Nothing is stored.
//! - [`DurableMemory`] indexes the long-lived project-notes document. Another
//!   component appends to that file; it is read-only here and chunked like
//!   any other document.

use crate::cache::CacheStore;
use crate::docs::chunk_document;
use crate::index::{IndexCell, Scanned, top_k};
use crate::scan;
use contextkit_core::chunk::{Chunk, CorpusKind, sort_by_score_desc};
use contextkit_core::memory::SessionNote;
use contextkit_core::terms::{overlap_score, tokenize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Scores caller-supplied session notes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionMemory;

impl SessionMemory {
    /// The `k` notes that best match `query`, scored over key and text.
    pub fn query(&self, query: &str, notes: &[SessionNote], k: usize) -> Vec<Chunk> {
        let terms = tokenize(query);
        if terms.is_empty() || k == 0 {
            return Vec::new();
        }
        let mut scored: Vec<Chunk> = notes
            .iter()
            .filter_map(|note| {
                let score = overlap_score(&terms, &format!("{} {}", note.key, note.text));
                (score > 0.0).then(|| {
                    Chunk::new(CorpusKind::Memory, &note.key, &note.key, &note.text)
                        .with_metadata("origin", "session")
                        .with_score(score)
                })
            })
            .collect();
        sort_by_score_desc(&mut scored);
        scored.truncate(k);
        scored
    }
}

/// The project-notes document, chunked at headings.
pub struct DurableMemory {
    path: PathBuf,
    source_id: String,
    max_chunk_lines: usize,
    max_file_bytes: u64,
    index: IndexCell,
}

impl DurableMemory {
    /// `root` is only used to give the document a short, root-relative id.
    pub fn new(
        path: impl Into<PathBuf>,
        root: &Path,
        max_chunk_lines: usize,
        max_file_bytes: u64,
        cache: Option<CacheStore>,
    ) -> Self {
        let path = path.into();
        let source_id = scan::relative_id(root, &path);
        let index = IndexCell::new(CorpusKind::Memory, path.display().to_string(), cache);
        Self {
            path,
            source_id,
            max_chunk_lines,
            max_file_bytes,
            index,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Build (or load) the index if it is not built yet.
    pub fn build(&self) -> &[Chunk] {
        self.index.get_or_build(|| self.scan())
    }

    pub fn is_built(&self) -> bool {
        self.index.is_built()
    }

    /// The `k` best sections for `query`, scored like documentation.
    pub fn query(&self, query: &str, k: usize) -> Vec<Chunk> {
        let terms = tokenize(query);
        if terms.is_empty() || k == 0 {
            return Vec::new();
        }
        top_k(self.build(), &terms, k, |chunk| {
            format!("{} {}", chunk.content(), chunk.location())
        })
    }

    pub(crate) fn remove_cache(&self) -> bool {
        match self.index.remove_cache() {
            Ok(removed) => removed,
            Err(e) => {
                warn!(error = %e, "Failed to remove memory cache");
                false
            }
        }
    }

    /// A missing or unreadable document yields a transient empty index, so
    /// a document created later is picked up by the next build instead of
    /// being masked by a cached empty list.
    fn scan(&self) -> Scanned {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "No durable memory document");
            return Scanned::transient(Vec::new());
        }
        match scan::read_text(&self.path, self.max_file_bytes) {
            Ok(text) => {
                let chunks =
                    chunk_document(CorpusKind::Memory, &self.source_id, &text, self.max_chunk_lines)
                        .into_iter()
                        .map(|chunk| chunk.with_metadata("origin", "durable"))
                        .collect();
                Scanned::complete(chunks)
            }
            Err(e) => {
                warn!(error = %e, "Durable memory unavailable");
                Scanned::transient(Vec::new())
            }
        }
    }
}

/// Collapse chunks that share a location, keeping the first occurrence.
pub fn dedup_by_location(chunks: Vec<Chunk>) -> Vec<Chunk> {
    let mut seen = HashSet::new();
    chunks
        .into_iter()
        .filter(|chunk| seen.insert(chunk.location().to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn notes() -> Vec<SessionNote> {
        vec![
            SessionNote::new("failing_test", "The parser test fails on empty input"),
            SessionNote::new("preference", "User wants terse commit messages"),
            SessionNote::new("plan", "Fix the parser, then rerun the test suite"),
        ]
    }

    #[test]
    fn session_query_scores_key_and_text() {
        let results = SessionMemory.query("parser test", &notes(), 5);
        let keys: Vec<&str> = results.iter().map(|c| c.location()).collect();
        assert_eq!(keys, vec!["failing_test", "plan"]);
        assert!(results.iter().all(|c| c.kind() == CorpusKind::Memory));
        assert_eq!(results[0].meta("origin"), Some("session"));
    }

    #[test]
    fn session_query_limits_and_handles_empty() {
        assert_eq!(SessionMemory.query("parser test", &notes(), 1).len(), 1);
        assert!(SessionMemory.query("", &notes(), 5).is_empty());
        assert!(SessionMemory.query("parser", &[], 5).is_empty());
    }

    #[test]
    fn durable_memory_chunks_by_heading() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(".contextkit/MEMORY.md");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(
            &path,
            "# Decisions\nUse sqlite for storage.\n\n# Conventions\nSnake case everywhere.\n",
        )
        .unwrap();

        let memory = DurableMemory::new(&path, tmp.path(), 80, 1024 * 1024, None);
        let results = memory.query("storage decisions", 3);
        assert_eq!(results[0].location(), ".contextkit/MEMORY.md#Decisions");
        assert_eq!(results[0].meta("origin"), Some("durable"));
        assert_eq!(results[0].kind(), CorpusKind::Memory);
    }

    #[test]
    fn missing_document_is_empty_but_built() {
        let tmp = TempDir::new().unwrap();
        let memory = DurableMemory::new(tmp.path().join("none.md"), tmp.path(), 80, 1024, None);
        assert!(memory.build().is_empty());
        assert!(memory.is_built());
    }

    #[test]
    fn document_created_after_empty_build_is_found() {
        let tmp = TempDir::new().unwrap();
        let cache = CacheStore::new(tmp.path().join("cache"));
        let path = tmp.path().join("MEMORY.md");

        let before = DurableMemory::new(&path, tmp.path(), 80, 1024, Some(cache.clone()));
        assert!(before.build().is_empty());
        let key = path.display().to_string();
        assert!(cache.load(CorpusKind::Memory, &key).unwrap().is_none());

        std::fs::write(&path, "# Deploy\nDeploy on friday.\n").unwrap();
        let after = DurableMemory::new(&path, tmp.path(), 80, 1024, Some(cache));
        let results = after.query("deploy friday", 3);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].location(), "MEMORY.md#Deploy");
    }

    #[test]
    fn dedup_keeps_first_occurrence() {
        let first = Chunk::new(CorpusKind::Memory, "a", "notes#Plan", "durable").with_score(0.2);
        let second = Chunk::new(CorpusKind::Memory, "b", "notes#Plan", "session").with_score(0.9);
        let other = Chunk::new(CorpusKind::Memory, "c", "notes#Other", "x");
        let merged = dedup_by_location(vec![first.clone(), second, other]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0], first);
    }
}
