//! Documentation corpus: heading-bounded chunks of prose documents.
//!
//! Locations name the section: `README.md#Setup`. Text before the first
//! heading (or a document with no headings) is located at the bare path.
//! Sections longer than the line cap are split, and every piece after the
//! first gets an `@L<line>` suffix so locations stay unique. A repeated
//! heading gets the same suffix on its first piece.

use crate::boundary::{BoundaryDetector, MarkdownHeadings};
use crate::cache::CacheStore;
use crate::index::{IndexCell, Scanned, top_k};
use crate::scan;
use contextkit_config::IndexConfig;
use contextkit_core::chunk::{Chunk, CorpusKind};
use contextkit_core::terms::tokenize;
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Prose documents under one root, chunked at headings.
pub struct DocsCorpus {
    root: PathBuf,
    settings: IndexConfig,
    index: IndexCell,
}

impl DocsCorpus {
    pub fn new(root: impl Into<PathBuf>, settings: IndexConfig, cache: Option<CacheStore>) -> Self {
        let root = root.into();
        let index = IndexCell::new(CorpusKind::Docs, root.display().to_string(), cache);
        Self {
            root,
            settings,
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

    /// The `k` best chunks for `query`, scored over content and location so
    /// that a matching heading outranks an incidental body match.
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
                warn!(error = %e, "Failed to remove docs cache");
                false
            }
        }
    }

    fn scan(&self) -> Scanned {
        let mut seen = HashSet::new();
        let mut chunks = Vec::new();

        // Preferred documents come first and bypass the extension and
        // directory filters.
        for preferred in &self.settings.preferred_docs {
            let path = self.root.join(preferred);
            if path.is_file() {
                seen.insert(path.clone());
                chunks.extend(self.chunk_file(&path));
            }
        }

        match scan::collect_files(
            &self.root,
            &self.settings.doc_extensions,
            &self.settings.exclude_dirs,
        ) {
            Ok(files) => {
                debug!(root = %self.root.display(), files = files.len(), "Scanning documents");
                for path in files.iter().filter(|path| !seen.contains(*path)) {
                    chunks.extend(self.chunk_file(path));
                }
            }
            Err(e) => {
                warn!(error = %e, "Documentation scan skipped");
                return Scanned::transient(chunks);
            }
        }
        Scanned::complete(chunks)
    }

    fn chunk_file(&self, path: &std::path::Path) -> Vec<Chunk> {
        match scan::read_text(path, self.settings.max_file_bytes) {
            Ok(text) => chunk_document(
                CorpusKind::Docs,
                &scan::relative_id(&self.root, path),
                &text,
                self.settings.max_chunk_lines,
            ),
            Err(e) => {
                warn!(error = %e, "Skipping document");
                Vec::new()
            }
        }
    }
}

/// Split a document into heading-bounded sections.
///
/// A heading that repeats an earlier one in the same document is located
/// with the `@L<line>` suffix of its first line, so no two sections share a
/// location.
pub fn chunk_document(
    kind: CorpusKind,
    source_id: &str,
    text: &str,
    max_lines: usize,
) -> Vec<Chunk> {
    let detector = MarkdownHeadings;
    let lines: Vec<&str> = text.lines().collect();
    let mut starts = detector.boundaries(&lines);
    if starts.first() != Some(&0) {
        starts.insert(0, 0);
    }

    let mut anchors = HashSet::new();
    let mut chunks = Vec::new();
    for (i, &start) in starts.iter().enumerate() {
        let end = starts.get(i + 1).copied().unwrap_or(lines.len());
        let heading = lines.get(start).and_then(|line| detector.label(line));
        let anchor = match &heading {
            Some(title) => format!("{source_id}#{title}"),
            None => source_id.to_string(),
        };
        let repeated = !anchors.insert(anchor.clone());

        for (a, b) in scan::split_range(start, end, max_lines) {
            let piece = &lines[a..b];
            if piece.iter().all(|line| line.trim().is_empty()) {
                continue;
            }
            let location = if a == start && !repeated {
                anchor.clone()
            } else {
                format!("{anchor}@L{}", a + 1)
            };
            let mut chunk = Chunk::new(kind, source_id, location, piece.join("\n").trim_end())
                .with_metadata("lines", format!("{}-{}", a + 1, b));
            if let Some(title) = &heading {
                chunk = chunk.with_metadata("heading", title.as_str());
            }
            chunks.push(chunk);
        }
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;

    #[test]
    fn sections_are_located_by_heading() {
        let text = "Intro text\n\n# Setup\nRun the installer.\n\n## Usage\nCall it.\n";
        let chunks = chunk_document(CorpusKind::Docs, "docs/guide.md", text, 80);
        let locations: Vec<&str> = chunks.iter().map(|c| c.location()).collect();
        assert_eq!(
            locations,
            vec!["docs/guide.md", "docs/guide.md#Setup", "docs/guide.md#Usage"]
        );
        assert_eq!(chunks[1].meta("heading"), Some("Setup"));
        assert!(chunks[1].content().contains("installer"));
    }

    #[test]
    fn document_without_headings_is_one_chunk() {
        let chunks = chunk_document(CorpusKind::Docs, "notes.txt", "just\nsome\nlines", 80);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].location(), "notes.txt");
    }

    #[test]
    fn long_sections_get_unique_continuations() {
        let body = (0..5).map(|n| format!("line {n}")).collect::<Vec<_>>().join("\n");
        let text = format!("# Big\n{body}");
        let chunks = chunk_document(CorpusKind::Docs, "big.md", &text, 3);
        let locations: Vec<&str> = chunks.iter().map(|c| c.location()).collect();
        assert_eq!(locations, vec!["big.md#Big", "big.md#Big@L4"]);
    }

    #[test]
    fn repeated_headings_get_distinct_locations() {
        let text = "## Decision\nUse sqlite.\n\n## Other\nNote.\n\n## Decision\nUse tokio.\n";
        let chunks = chunk_document(CorpusKind::Memory, "MEMORY.md", text, 80);
        let locations: Vec<&str> = chunks.iter().map(|c| c.location()).collect();
        assert_eq!(
            locations,
            vec!["MEMORY.md#Decision", "MEMORY.md#Other", "MEMORY.md#Decision@L7"]
        );
        assert_eq!(chunks[2].meta("heading"), Some("Decision"));
        assert!(chunks[2].content().contains("tokio"));
    }

    #[test]
    fn preferred_doc_is_indexed_even_when_excluded() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        std::fs::create_dir_all(root.join("docs")).unwrap();
        std::fs::write(root.join("OVERVIEW.rst"), "# Overview\nArchitecture summary.").unwrap();
        std::fs::write(root.join("docs/guide.md"), "# Setup\nInstall steps.").unwrap();

        let settings = IndexConfig {
            preferred_docs: vec!["OVERVIEW.rst".into(), "MISSING.md".into()],
            ..IndexConfig::default()
        };
        let corpus = DocsCorpus::new(root, settings, None);
        let chunks = corpus.build();
        let locations: Vec<&str> = chunks.iter().map(|c| c.location()).collect();
        assert_eq!(locations, vec!["OVERVIEW.rst#Overview", "docs/guide.md#Setup"]);
    }

    #[test]
    fn heading_match_outranks_body_match() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        std::fs::write(
            root.join("README.md"),
            "# Deployment\nShip the binary.\n\n# Testing\nRun tests before deployment.\n",
        )
        .unwrap();
        let corpus = DocsCorpus::new(root, IndexConfig::default(), None);
        let results = corpus.query("deployment binary", 2);
        assert_eq!(results[0].location(), "README.md#Deployment");
        assert!(results[0].score() > results[1].score());
    }

    #[test]
    fn query_with_no_terms_is_empty() {
        let corpus = DocsCorpus::new(Path::new("/nonexistent"), IndexConfig::default(), None);
        assert!(corpus.query("the and of", 3).is_empty());
    }
}
