//! # ContextKit Retrieval
//!
//! Indexes a workspace and selects the context an assistant needs for one
//! request: relevant code, documentation sections, invocable capabilities
//! and remembered notes.
//!
//! ```no_run
//! use contextkit_config::RetrievalConfig;
//! use contextkit_retrieval::{RetrievalInput, RetrievalService};
//!
//! let service = RetrievalService::new(".", RetrievalConfig::default());
//! let bundle = service.build(&RetrievalInput::new("where is the config parsed"));
//! println!("{}", service.render(&bundle));
//! ```
//!
//! All corpora rank with the same term-overlap score from `contextkit-core`,
//! followed by a small fixed-rule reranker. File-backed corpora are built once
//! per process and cached on disk between processes.

pub mod boundary;
pub mod cache;
pub mod capability;
pub mod docs;
mod index;
pub mod memory;
pub mod render;
pub mod rerank;
mod scan;
pub mod service;
pub mod source;

pub use boundary::{BoundaryDetector, DetectorRegistry, MarkdownHeadings, PatternDetector, PlainText};
pub use cache::{CACHE_VERSION, CacheStore};
pub use capability::{CapabilityCorpus, load_universe, synthesize_example};
pub use docs::{DocsCorpus, chunk_document};
pub use memory::{DurableMemory, SessionMemory};
pub use rerank::Reranker;
pub use service::{RetrievalInput, RetrievalService};
pub use source::{SourceCorpus, chunk_source};
