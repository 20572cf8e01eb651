//! The result bundle returned by one retrieval call.

use crate::capability::{CapabilityDescriptor, CapabilityEntry};
use crate::chunk::Chunk;
use serde::Serialize;

/// An immutable snapshot of everything selected for one request.
///
/// Built once by the retrieval service and handed to the caller, which
/// renders it into a prompt and drops it.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResultBundle {
    source: Vec<Chunk>,
    docs: Vec<Chunk>,
    capabilities: Vec<CapabilityEntry>,
    memory: Vec<Chunk>,
}

impl ResultBundle {
    pub fn new(
        source: Vec<Chunk>,
        docs: Vec<Chunk>,
        capabilities: Vec<CapabilityEntry>,
        memory: Vec<Chunk>,
    ) -> Self {
        Self {
            source,
            docs,
            capabilities,
            memory,
        }
    }

    /// Selected source-code chunks.
    pub fn source(&self) -> &[Chunk] {
        &self.source
    }

    /// Selected documentation chunks.
    pub fn docs(&self) -> &[Chunk] {
        &self.docs
    }

    /// Selected capabilities.
    pub fn capabilities(&self) -> &[CapabilityEntry] {
        &self.capabilities
    }

    /// Selected memory chunks (durable and session, merged).
    pub fn memory(&self) -> &[Chunk] {
        &self.memory
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
            && self.docs.is_empty()
            && self.capabilities.is_empty()
            && self.memory.is_empty()
    }

    /// The selected capability schemas, in rank order, for the model's
    /// function-calling interface.
    pub fn capability_schemas(&self) -> Vec<CapabilityDescriptor> {
        self.capabilities
            .iter()
            .map(|entry| entry.schema().clone())
            .collect()
    }

    /// Consume the bundle into `(source, docs, capabilities, memory)`.
    pub fn into_parts(self) -> (Vec<Chunk>, Vec<Chunk>, Vec<CapabilityEntry>, Vec<Chunk>) {
        (self.source, self.docs, self.capabilities, self.memory)
    }
}
