//! The retrieval orchestrator.
//!
//! [`RetrievalService`] owns every corpus for one workspace root and turns a
//! query into a [`ResultBundle`]:
//!
//! 1. First-stage query per corpus, over-fetching so the reranker has room.
//! 2. Rerank with the fixed-rule bonuses.
//! 3. Truncate to the per-corpus budget.
//! 4. Merge durable and session memory, collapsing repeated locations.
//!
//! Corpora are built lazily on first use and never rebuilt in-process.

use crate::boundary::DetectorRegistry;
use crate::cache::CacheStore;
use crate::capability::CapabilityCorpus;
use crate::docs::DocsCorpus;
use crate::memory::{DurableMemory, SessionMemory, dedup_by_location};
use crate::render;
use crate::rerank::Reranker;
use crate::scan;
use crate::source::SourceCorpus;
use contextkit_config::{BudgetConfig, RetrievalConfig};
use contextkit_core::bundle::ResultBundle;
use contextkit_core::capability::{CapabilityDescriptor, CapabilityEntry};
use contextkit_core::chunk::{Chunk, CorpusKind};
use contextkit_core::error::IndexError;
use contextkit_core::memory::SessionNote;
use contextkit_core::terms::{overlap_score, tokenize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info, warn};

/// Smallest first-stage fetch for capabilities, so an allow-list still has
/// candidates to keep when the budget is small.
const CAPABILITY_MIN_FETCH: usize = 12;

/// Everything one retrieval call needs besides the workspace.
#[derive(Debug, Clone, Copy)]
pub struct RetrievalInput<'a> {
    pub query: &'a str,
    /// The capability universe for this call. Empty means no capabilities.
    pub capabilities: &'a [CapabilityDescriptor],
    /// When set, only these capability names may be selected.
    pub allowed_capabilities: Option<&'a [String]>,
    /// Per-corpus result counts; the configured budget when `None`.
    pub budget: Option<BudgetConfig>,
    pub session_notes: &'a [SessionNote],
}

impl<'a> RetrievalInput<'a> {
    pub fn new(query: &'a str) -> Self {
        Self {
            query,
            capabilities: &[],
            allowed_capabilities: None,
            budget: None,
            session_notes: &[],
        }
    }

    pub fn with_capabilities(mut self, capabilities: &'a [CapabilityDescriptor]) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn with_allowed_capabilities(mut self, allowed: &'a [String]) -> Self {
        self.allowed_capabilities = Some(allowed);
        self
    }

    pub fn with_budget(mut self, budget: BudgetConfig) -> Self {
        self.budget = Some(budget);
        self
    }

    pub fn with_session_notes(mut self, notes: &'a [SessionNote]) -> Self {
        self.session_notes = notes;
        self
    }
}

/// Retrieval over one workspace root.
///
/// Construct one per root and share it by reference or `Arc`; all methods
/// take `&self`.
pub struct RetrievalService {
    root: PathBuf,
    config: RetrievalConfig,
    reranker: Reranker,
    source: SourceCorpus,
    docs: DocsCorpus,
    durable: DurableMemory,
    session: SessionMemory,
    capabilities: Mutex<Option<Arc<CapabilityCorpus>>>,
}

impl RetrievalService {
    /// Create a service for `root`. Nothing is read from disk until the
    /// first query.
    pub fn new(root: impl Into<PathBuf>, config: RetrievalConfig) -> Self {
        let given = root.into();
        let root = match given.canonicalize() {
            Ok(root) => root,
            Err(e) => {
                warn!(root = %given.display(), error = %e, "Could not canonicalize root, using it as given");
                given
            }
        };

        let cache = if config.cache.enabled {
            Some(CacheStore::new(config.cache.resolved_dir()))
        } else {
            None
        };
        let detectors = Arc::new(DetectorRegistry::with_defaults());
        let durable_path = config.memory.resolve(&root);

        info!(
            root = %root.display(),
            cache = cache.is_some(),
            memory = %durable_path.display(),
            "Retrieval service ready"
        );

        Self {
            source: SourceCorpus::new(&root, config.index.clone(), detectors, cache.clone()),
            docs: DocsCorpus::new(&root, config.index.clone(), cache.clone()),
            durable: DurableMemory::new(
                durable_path,
                &root,
                config.index.max_chunk_lines,
                config.index.max_file_bytes,
                cache,
            ),
            session: SessionMemory,
            reranker: Reranker::from_config(&config.ranking),
            capabilities: Mutex::new(None),
            root,
            config,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Select source, docs, capabilities and memory for `input`.
    pub fn build(&self, input: &RetrievalInput<'_>) -> ResultBundle {
        let budget = input.budget.unwrap_or(self.config.budget);
        let query = input.query;

        let source = self.select(query, budget.code, |n| self.source.query(query, n));
        let docs = self.select(query, budget.docs, |n| self.docs.query(query, n));
        let capabilities = self.select_capabilities(input, budget.capabilities);
        let memory = self.select_memory(input, budget.memory);

        debug!(
            source = source.len(),
            docs = docs.len(),
            capabilities = capabilities.len(),
            memory = memory.len(),
            "Bundle assembled"
        );
        ResultBundle::new(source, docs, capabilities, memory)
    }

    /// Like [`build`](Self::build), but code and docs come only from the
    /// given files instead of the corpora.
    ///
    /// Each existing file contributes its best chunk for the query (its first
    /// chunk when nothing matches). Paths are relative to the root or
    /// absolute; missing paths and non-files are skipped.
    pub fn build_minimal(
        &self,
        input: &RetrievalInput<'_>,
        target_paths: &[PathBuf],
        config_paths: &[PathBuf],
    ) -> ResultBundle {
        let budget = input.budget.unwrap_or(self.config.budget);
        let terms = tokenize(input.query);

        let source: Vec<Chunk> = self
            .resolve_paths(target_paths)
            .iter()
            .filter_map(|path| self.source.chunk_file(path))
            .filter_map(|chunks| best_chunk(chunks, &terms))
            .collect();

        let docs: Vec<Chunk> = self
            .resolve_paths(config_paths)
            .iter()
            .filter_map(|path| self.chunk_config_file(path))
            .filter_map(|chunks| best_chunk(chunks, &terms))
            .collect();

        let source = self.reranker.rerank(input.query, source);
        let docs = self.reranker.rerank(input.query, docs);
        let capabilities = self.select_capabilities(input, budget.capabilities);
        let memory = self.select_memory(input, budget.memory);

        ResultBundle::new(source, docs, capabilities, memory)
    }

    /// Render `bundle` with the configured per-item character budget.
    pub fn render(&self, bundle: &ResultBundle) -> String {
        render::render(bundle, self.config.render.max_chars_per_item)
    }

    /// Build (or load) every file-backed corpus now instead of on first query.
    pub fn warm(&self) {
        self.source.build();
        self.docs.build();
        self.durable.build();
    }

    /// Whether the index for `kind` has been built in this process.
    pub fn is_built(&self, kind: CorpusKind) -> bool {
        match kind {
            CorpusKind::Source => self.source.is_built(),
            CorpusKind::Docs => self.docs.is_built(),
            CorpusKind::Memory => self.durable.is_built(),
        }
    }

    /// Delete this root's cache files. In-memory indexes are unaffected; the
    /// next process rebuilds from a fresh scan. Returns how many were removed.
    pub fn invalidate_cache(&self) -> usize {
        let removed = [
            self.source.remove_cache(),
            self.docs.remove_cache(),
            self.durable.remove_cache(),
        ]
        .into_iter()
        .filter(|removed| *removed)
        .count();
        info!(root = %self.root.display(), removed, "Index cache invalidated");
        removed
    }

    /// First-stage fetch at 3k, rerank, keep k.
    fn select(&self, query: &str, k: usize, fetch: impl FnOnce(usize) -> Vec<Chunk>) -> Vec<Chunk> {
        if k == 0 {
            return Vec::new();
        }
        let mut chunks = self.reranker.rerank(query, fetch(over_fetch(k)));
        chunks.truncate(k);
        chunks
    }

    fn select_capabilities(&self, input: &RetrievalInput<'_>, k: usize) -> Vec<CapabilityEntry> {
        if k == 0 || input.capabilities.is_empty() {
            return Vec::new();
        }
        let corpus = self.capability_corpus(input.capabilities);
        let mut entries = corpus.query(input.query, k.max(CAPABILITY_MIN_FETCH));
        if let Some(allowed) = input.allowed_capabilities {
            entries.retain(|entry| allowed.iter().any(|name| name == entry.name()));
        }
        entries.truncate(k);
        entries
    }

    fn select_memory(&self, input: &RetrievalInput<'_>, k: usize) -> Vec<Chunk> {
        if k == 0 {
            return Vec::new();
        }
        let mut merged = self.durable.query(input.query, over_fetch(k));
        if !input.session_notes.is_empty() {
            merged.extend(
                self.session
                    .query(input.query, input.session_notes, k.saturating_mul(2)),
            );
        }
        let mut memory = self.reranker.rerank(input.query, dedup_by_location(merged));
        memory.truncate(k);
        memory
    }

    /// The corpus for `universe`, rebuilt only when its content changed.
    fn capability_corpus(&self, universe: &[CapabilityDescriptor]) -> Arc<CapabilityCorpus> {
        let fingerprint = CapabilityCorpus::fingerprint(universe);
        {
            let slot = self.capabilities.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(corpus) = slot.as_ref()
                && corpus.matches(&fingerprint)
            {
                return Arc::clone(corpus);
            }
        }

        let corpus = Arc::new(CapabilityCorpus::build(universe, &self.config.ranking));
        let mut slot = self.capabilities.lock().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(Arc::clone(&corpus));
        corpus
    }

    /// Existing regular files among `paths`, canonicalized, in order, without
    /// duplicates.
    fn resolve_paths(&self, paths: &[PathBuf]) -> Vec<PathBuf> {
        let mut seen = HashSet::new();
        let mut resolved = Vec::new();
        for path in paths {
            let candidate = if path.is_absolute() {
                path.clone()
            } else {
                self.root.join(path)
            };
            if !candidate.is_file() {
                warn!(error = %IndexError::PathNotFound(candidate), "Skipping explicit path");
                continue;
            }
            let canonical = candidate.canonicalize().unwrap_or(candidate);
            if seen.insert(canonical.clone()) {
                resolved.push(canonical);
            }
        }
        resolved
    }

    /// Configuration files have no definitions to split at; they are chunked
    /// at the line cap only and tagged as config.
    fn chunk_config_file(&self, path: &Path) -> Option<Vec<Chunk>> {
        let text = match scan::read_text(path, self.config.index.max_file_bytes) {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "Skipping config file");
                return None;
            }
        };
        let source_id = scan::relative_id(&self.root, path);
        Some(
            scan::chunk_lines(
                CorpusKind::Docs,
                &source_id,
                &text,
                &[],
                self.config.index.max_chunk_lines,
            )
            .into_iter()
            .map(|chunk| chunk.with_metadata("role", "config"))
            .collect(),
        )
    }
}

fn over_fetch(k: usize) -> usize {
    k.saturating_mul(3).max(k)
}

/// The highest-overlap chunk of one file, or its first chunk when none
/// overlaps. Ties go to the earlier chunk.
fn best_chunk(chunks: Vec<Chunk>, terms: &[String]) -> Option<Chunk> {
    let mut best: Option<Chunk> = None;
    for chunk in chunks {
        let score = overlap_score(terms, &format!("{} {}", chunk.content(), chunk.source()));
        if best.as_ref().is_none_or(|current| score > current.score()) {
            best = Some(chunk.with_score(score));
        }
    }
    best
}
