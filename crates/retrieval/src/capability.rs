//! Capability corpus.
//!
//! Built from whatever capability universe the caller supplies. Each valid
//! descriptor becomes an entry with a synthesized example invocation; queries
//! score entries by term overlap and then add fixed-rule bonuses for literal
//! name mentions and intent words.

use contextkit_config::RankingConfig;
use contextkit_core::capability::{CapabilityDescriptor, CapabilityEntry};
use contextkit_core::error::{Error, IndexError};
use contextkit_core::terms::{overlap_score, tokenize};
use serde_json::{Map, Value, json};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, warn};

/// Intent words and the capability names that usually satisfy them.
const INTENT_RULES: &[(&[&str], &[&str])] = &[
    (
        &["read", "inspect", "view", "show", "open", "look"],
        &["read_file", "view_file", "open_file", "cat", "read"],
    ),
    (
        &["search", "find", "grep", "locate", "where"],
        &["search", "grep", "find_files", "search_files", "glob", "file_search"],
    ),
    (
        &["edit", "replace", "modify", "change", "update", "fix"],
        &["edit_file", "replace", "str_replace", "apply_patch", "write_file"],
    ),
    (
        &["create", "make", "mkdir", "directory", "new"],
        &["create_file", "write_file", "make_directory", "mkdir", "create_directory"],
    ),
    (
        &["test", "tests", "run", "execute", "build"],
        &["run_tests", "run_command", "shell", "bash", "execute"],
    ),
];

/// The capability universe of one request, ready to be queried.
#[derive(Debug, Clone)]
pub struct CapabilityCorpus {
    entries: Vec<CapabilityEntry>,
    fingerprint: String,
    name_bonus: f32,
    intent_bonus: f32,
}

impl CapabilityCorpus {
    /// Build entries for every valid descriptor. Invalid names and
    /// duplicates are skipped with a warning.
    pub fn build(universe: &[CapabilityDescriptor], ranking: &RankingConfig) -> Self {
        let mut seen = HashSet::new();
        let mut entries = Vec::with_capacity(universe.len());

        for descriptor in universe {
            if let Err(e) = validate_name(&descriptor.name) {
                warn!(error = %e, "Skipping capability");
                continue;
            }
            if !seen.insert(descriptor.name.clone()) {
                warn!(name = %descriptor.name, "Skipping duplicate capability");
                continue;
            }
            let example = synthesize_example(descriptor);
            entries.push(CapabilityEntry::new(descriptor.clone(), example));
        }

        debug!(capabilities = entries.len(), "Capability corpus built");
        Self {
            entries,
            fingerprint: Self::fingerprint(universe),
            name_bonus: ranking.capability_name_bonus,
            intent_bonus: ranking.capability_intent_bonus,
        }
    }

    /// Content hash of a universe, used to decide whether a rebuild is due.
    pub fn fingerprint(universe: &[CapabilityDescriptor]) -> String {
        let bytes = serde_json::to_vec(universe).unwrap_or_default();
        hex::encode(Sha256::digest(&bytes))
    }

    pub fn matches(&self, fingerprint: &str) -> bool {
        self.fingerprint == fingerprint
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[CapabilityEntry] {
        &self.entries
    }

    /// The `k` entries that best match `query`.
    ///
    /// Only entries with some term overlap are candidates; the bonuses
    /// reorder candidates but never admit an entry on their own.
    pub fn query(&self, query: &str, k: usize) -> Vec<CapabilityEntry> {
        let terms = tokenize(query);
        if terms.is_empty() || k == 0 {
            return Vec::new();
        }
        let lowered = query.to_lowercase();
        let intents = intended_capabilities(&terms);

        let mut scored: Vec<CapabilityEntry> = self
            .entries
            .iter()
            .filter_map(|entry| {
                let base = overlap_score(&terms, &searchable_text(entry));
                if base <= 0.0 {
                    return None;
                }
                let mut score = base;
                if contains_word(&lowered, &entry.name().to_lowercase()) {
                    score += self.name_bonus;
                }
                if intents.contains(entry.name()) {
                    score += self.intent_bonus;
                }
                Some(entry.clone().with_score(score))
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score()
                .partial_cmp(&a.score())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(k);
        scored
    }
}

/// Sample arguments for a capability: every required parameter mapped to a
/// placeholder of its declared type.
pub fn synthesize_example(descriptor: &CapabilityDescriptor) -> Value {
    let mut args = Map::new();
    for name in descriptor.required_parameters() {
        let placeholder = match descriptor.parameter_type(name) {
            Some("integer") => json!(1),
            Some("number") => json!(1.0),
            Some("boolean") => json!(false),
            Some("array") => json!([]),
            Some("object") => json!({}),
            _ => Value::String(format!("<{name}>")),
        };
        args.insert(name.to_string(), placeholder);
    }
    Value::Object(args)
}

/// Read a JSON array of capability descriptors.
pub fn load_universe(path: &Path) -> contextkit_core::Result<Vec<CapabilityDescriptor>> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::Read {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    Ok(serde_json::from_str(&content)?)
}

fn validate_name(name: &str) -> Result<(), IndexError> {
    if name.trim().is_empty() {
        return Err(IndexError::InvalidCapability("empty name".into()));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
    {
        return Err(IndexError::InvalidCapability(format!(
            "'{name}' contains characters outside [A-Za-z0-9_.-]"
        )));
    }
    Ok(())
}

fn searchable_text(entry: &CapabilityEntry) -> String {
    format!(
        "{} {} {}",
        entry.name(),
        entry.description(),
        entry.schema().parameters
    )
}

/// Capability names implied by the intent words among `terms`.
fn intended_capabilities(terms: &[String]) -> HashSet<&'static str> {
    INTENT_RULES
        .iter()
        .filter(|(words, _)| terms.iter().any(|term| words.contains(&term.as_str())))
        .flat_map(|(_, names)| names.iter().copied())
        .collect()
}

/// Whether `needle` occurs in `haystack` delimited by non-word characters.
fn contains_word(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    haystack.match_indices(needle).any(|(at, _)| {
        let before = haystack[..at].chars().next_back();
        let after = haystack[at + needle.len()..].chars().next();
        !before.is_some_and(is_word) && !after.is_some_and(is_word)
    })
}
