//! Plain-text rendering of a result bundle for prompt assembly.

use contextkit_core::bundle::ResultBundle;
use contextkit_core::capability::CapabilityEntry;
use contextkit_core::chunk::Chunk;
use std::fmt::Write;

/// Render `bundle` as a text block, grouped memory, docs, code, then
/// capabilities. Empty groups are left out; an empty bundle renders as "".
///
/// Each item's content is cut to `max_chars` characters.
pub fn render(bundle: &ResultBundle, max_chars: usize) -> String {
    let mut sections = Vec::new();

    if !bundle.memory().is_empty() {
        sections.push(chunk_section("Memory", bundle.memory(), max_chars));
    }
    if !bundle.docs().is_empty() {
        sections.push(chunk_section("Documentation", bundle.docs(), max_chars));
    }
    if !bundle.source().is_empty() {
        sections.push(chunk_section("Code", bundle.source(), max_chars));
    }
    if !bundle.capabilities().is_empty() {
        sections.push(capability_section(bundle.capabilities(), max_chars));
    }

    sections.join("\n")
}

fn chunk_section(title: &str, chunks: &[Chunk], max_chars: usize) -> String {
    let mut out = format!("## {title}\n\n");
    for chunk in chunks {
        let _ = writeln!(out, "### {} (score {:.3})", chunk.location(), chunk.score());
        let _ = writeln!(out, "{}\n", truncate(chunk.content(), max_chars));
    }
    out
}

fn capability_section(entries: &[CapabilityEntry], max_chars: usize) -> String {
    let mut out = String::from("## Capabilities\n\n");
    for entry in entries {
        let _ = writeln!(out, "### {} (score {:.3})", entry.name(), entry.score());
        if !entry.description().is_empty() {
            let _ = writeln!(out, "{}", truncate(entry.description(), max_chars));
        }
        let _ = writeln!(out, "example: {}({})\n", entry.name(), entry.example());
    }
    out
}

/// At most `max_chars` characters of `text`, with `…` appended when cut.
fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}…", &text[..cut]),
        None => text.to_string(),
    }
}
