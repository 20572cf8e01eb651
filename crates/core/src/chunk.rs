//! Chunks: the unit of retrievable content.
//!
//! Every corpus except the capability corpus produces chunks. A chunk is
//! immutable once built: re-scoring consumes the old value and returns a new
//! one, so a score can never change behind a reader's back.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Small key/value annotations attached to a chunk.
///
/// Ordered so that serialized chunks (and therefore cache files) are
/// byte-identical for identical inputs.
pub type Metadata = BTreeMap<String, String>;

/// Which corpus produced a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorpusKind {
    /// Definition-bounded source code.
    Source,
    /// Heading-bounded prose documentation.
    Docs,
    /// Session notes and the durable project-notes document.
    Memory,
}

impl CorpusKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Docs => "docs",
            Self::Memory => "memory",
        }
    }
}

impl fmt::Display for CorpusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scored unit of content with a human-readable location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    corpus: CorpusKind,
    /// File or document identifier (root-relative path, session key, ...).
    source: String,
    /// Locator such as `src/app.rs:42` or `README.md#Setup`.
    location: String,
    #[serde(default)]
    score: f32,
    content: String,
    #[serde(default)]
    metadata: Metadata,
}

impl Chunk {
    /// Create an unscored chunk.
    pub fn new(
        corpus: CorpusKind,
        source: impl Into<String>,
        location: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            corpus,
            source: source.into(),
            location: location.into(),
            score: 0.0,
            content: content.into(),
            metadata: Metadata::new(),
        }
    }

    /// Attach one metadata annotation.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Return a copy of this chunk carrying `score`; nothing else changes.
    pub fn with_score(self, score: f32) -> Self {
        Self { score, ..self }
    }

    pub fn kind(&self) -> CorpusKind {
        self.corpus
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn score(&self) -> f32 {
        self.score
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Look up a single metadata value.
    pub fn meta(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }

    /// Whether two chunks describe the same content at the same place,
    /// ignoring score.
    pub fn same_identity(&self, other: &Chunk) -> bool {
        self.corpus == other.corpus
            && self.source == other.source
            && self.location == other.location
            && self.content == other.content
    }
}

/// Sort chunks by descending score. The sort is stable, so equal scores keep
/// their input order.
pub fn sort_by_score_desc(chunks: &mut [Chunk]) {
    chunks.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_score_keeps_identity() {
        let chunk = Chunk::new(CorpusKind::Source, "src/app.rs", "src/app.rs:1", "fn main() {}")
            .with_metadata("lang", "rs");
        let rescored = chunk.clone().with_score(0.75);
        assert_eq!(rescored.score(), 0.75);
        assert!(rescored.same_identity(&chunk));
        assert_eq!(rescored.meta("lang"), Some("rs"));
    }

    #[test]
    fn corpus_kind_serializes_lowercase() {
        let json = serde_json::to_string(&CorpusKind::Docs).unwrap();
        assert_eq!(json, "\"docs\"");
        assert_eq!(CorpusKind::Memory.to_string(), "memory");
    }

    #[test]
    fn chunk_serializes_all_cache_fields() {
        let chunk = Chunk::new(CorpusKind::Memory, "notes.md", "notes.md#Plan", "ship it");
        let value = serde_json::to_value(&chunk).unwrap();
        for field in ["corpus", "source", "location", "score", "content", "metadata"] {
            assert!(value.get(field).is_some(), "missing field {field}");
        }
    }

    #[test]
    fn sort_is_descending_and_stable() {
        let mut chunks = vec![
            Chunk::new(CorpusKind::Docs, "a", "a", "").with_score(0.5),
            Chunk::new(CorpusKind::Docs, "b", "b", "").with_score(1.0),
            Chunk::new(CorpusKind::Docs, "c", "c", "").with_score(0.5),
        ];
        sort_by_score_desc(&mut chunks);
        let order: Vec<&str> = chunks.iter().map(|c| c.location()).collect();
        assert_eq!(order, vec!["b", "a", "c"]);
    }
}
