//! # ContextKit Core
//!
//! Domain types and the term-extraction primitive for the ContextKit
//! retrieval engine. This crate has no filesystem or framework logic; it
//! defines the records every corpus produces and the single relevance
//! function they all share.
//!
//! ## Data model
//!
//! - [`Chunk`]: one retrievable unit of source, documentation or memory text,
//!   tagged with its [`CorpusKind`].
//! - [`CapabilityDescriptor`] / [`CapabilityEntry`]: an invocable capability as
//!   supplied by the registry, and as selected for a request.
//! - [`SessionNote`]: a caller-owned `(key, text)` note.
//! - [`ResultBundle`]: the immutable output of one retrieval call.

pub mod bundle;
pub mod capability;
pub mod chunk;
pub mod error;
pub mod memory;
pub mod terms;

// Re-export key types at crate root for ergonomics
pub use bundle::ResultBundle;
pub use capability::{CapabilityDescriptor, CapabilityEntry};
pub use chunk::{Chunk, CorpusKind, Metadata};
pub use error::{CacheError, Error, IndexError, Result};
pub use memory::SessionNote;
pub use terms::{overlap_score, term_set, tokenize};
