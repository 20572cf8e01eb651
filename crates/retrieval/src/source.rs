//! Source corpus: definition-bounded chunks of code files.

use crate::boundary::{BoundaryDetector, DetectorRegistry};
use crate::cache::CacheStore;
use crate::index::{IndexCell, Scanned, top_k};
use crate::scan;
use contextkit_config::IndexConfig;
use contextkit_core::chunk::{Chunk, CorpusKind};
use contextkit_core::terms::tokenize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Code files under one root, chunked at definition starts.
pub struct SourceCorpus {
    root: PathBuf,
    settings: IndexConfig,
    detectors: Arc<DetectorRegistry>,
    index: IndexCell,
}

impl SourceCorpus {
    pub fn new(
        root: impl Into<PathBuf>,
        settings: IndexConfig,
        detectors: Arc<DetectorRegistry>,
        cache: Option<CacheStore>,
    ) -> Self {
        let root = root.into();
        let index = IndexCell::new(CorpusKind::Source, root.display().to_string(), cache);
        Self {
            root,
            settings,
            detectors,
            index,
        }
    }

    /// Build (or load) the index if it is not built yet.
    pub fn build(&self) -> &[Chunk] {
        self.index.get_or_build(|| self.scan())
    }

    pub fn is_built(&self) -> bool {
        self.index.is_built()
    }

    /// The `k` best chunks for `query`, scored over content and file path.
    pub fn query(&self, query: &str, k: usize) -> Vec<Chunk> {
        let terms = tokenize(query);
        if terms.is_empty() || k == 0 {
            return Vec::new();
        }
        top_k(self.build(), &terms, k, |chunk| {
            format!("{} {}", chunk.content(), chunk.source())
        })
    }

    /// Chunk one file the same way the scan does.
    pub fn chunk_file(&self, path: &Path) -> Option<Vec<Chunk>> {
        let text = match scan::read_text(path, self.settings.max_file_bytes) {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "Skipping source file");
                return None;
            }
        };
        let source_id = scan::relative_id(&self.root, path);
        let detector = self.detectors.for_path(path);
        Some(chunk_source(
            &source_id,
            &text,
            detector,
            self.settings.max_chunk_lines,
        ))
    }

    pub(crate) fn remove_cache(&self) -> bool {
        match self.index.remove_cache() {
            Ok(removed) => removed,
            Err(e) => {
                warn!(error = %e, "Failed to remove source cache");
                false
            }
        }
    }

    fn scan(&self) -> Scanned {
        let files = match scan::collect_files(
            &self.root,
            &self.settings.source_extensions,
            &self.settings.exclude_dirs,
        ) {
            Ok(files) => files,
            Err(e) => {
                warn!(error = %e, "Source corpus is empty");
                return Scanned::transient(Vec::new());
            }
        };
        debug!(root = %self.root.display(), files = files.len(), "Scanning source files");

        let chunks = files
            .iter()
            .filter_map(|path| self.chunk_file(path))
            .flatten()
            .collect();
        Scanned::complete(chunks)
    }
}

/// Split one source file into chunks at the detector's definition lines.
///
/// A file without definitions is a single chunk; any chunk longer than
/// `max_lines` is split at the cap.
pub fn chunk_source(
    source_id: &str,
    text: &str,
    detector: &dyn BoundaryDetector,
    max_lines: usize,
) -> Vec<Chunk> {
    let lines: Vec<&str> = text.lines().collect();
    let boundaries = detector.boundaries(&lines);
    scan::chunk_lines(CorpusKind::Source, source_id, text, &boundaries, max_lines)
        .into_iter()
        .map(|chunk| chunk.with_metadata("detector", detector.name()))
        .collect()
}
