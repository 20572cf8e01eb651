//! Filesystem helpers shared by the file-backed corpora.

use contextkit_core::chunk::{Chunk, CorpusKind};
use contextkit_core::error::IndexError;
use std::path::{Component, Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

/// Every regular file under `root` whose extension is in `extensions`,
/// skipping directories named in `exclude_dirs`. Sorted by path.
///
/// Fails only when the root itself cannot be listed; unreadable entries
/// below it are logged and skipped.
pub(crate) fn collect_files(
    root: &Path,
    extensions: &[String],
    exclude_dirs: &[String],
) -> Result<Vec<PathBuf>, IndexError> {
    std::fs::read_dir(root).map_err(|e| IndexError::RootUnreadable {
        root: root.to_path_buf(),
        reason: e.to_string(),
    })?;

    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            !(entry.depth() > 0
                && entry.file_type().is_dir()
                && exclude_dirs
                    .iter()
                    .any(|dir| entry.file_name().to_str() == Some(dir.as_str())))
        });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "Skipping unreadable directory entry");
                continue;
            }
        };
        if entry.file_type().is_file() && has_extension(entry.path(), extensions) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Case-insensitive extension check.
pub(crate) fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| extensions.iter().any(|want| want.eq_ignore_ascii_case(ext)))
}

/// Read a UTF-8 text file no larger than `max_bytes`.
pub(crate) fn read_text(path: &Path, max_bytes: u64) -> Result<String, IndexError> {
    let size = std::fs::metadata(path)
        .map_err(|e| IndexError::FileUnreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?
        .len();
    if size > max_bytes {
        return Err(IndexError::FileTooLarge {
            path: path.to_path_buf(),
            size,
            limit: max_bytes,
        });
    }
    std::fs::read_to_string(path).map_err(|e| IndexError::FileUnreadable {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// A stable identifier for `path`: root-relative with `/` separators, or the
/// full path when it lies outside `root`.
pub(crate) fn relative_id(root: &Path, path: &Path) -> String {
    match path.strip_prefix(root) {
        Ok(relative) => relative
            .components()
            .filter_map(|component| match component {
                Component::Normal(part) => Some(part.to_string_lossy()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("/"),
        Err(_) => path.display().to_string(),
    }
}

/// Split the line range `[start, end)` into pieces of at most `max_lines`.
pub(crate) fn split_range(start: usize, end: usize, max_lines: usize) -> Vec<(usize, usize)> {
    let step = max_lines.max(1);
    (start..end)
        .step_by(step)
        .map(|piece_start| (piece_start, (piece_start + step).min(end)))
        .collect()
}

/// Chunk `text` at the given boundary lines, capping each chunk at
/// `max_lines`. Text before the first boundary becomes its own chunk.
/// Whitespace-only pieces are dropped. Locations are `source:line`.
pub(crate) fn chunk_lines(
    kind: CorpusKind,
    source_id: &str,
    text: &str,
    boundaries: &[usize],
    max_lines: usize,
) -> Vec<Chunk> {
    let lines: Vec<&str> = text.lines().collect();
    let mut starts: Vec<usize> = boundaries
        .iter()
        .copied()
        .filter(|&b| b < lines.len())
        .collect();
    if starts.first() != Some(&0) {
        starts.insert(0, 0);
    }

    let mut chunks = Vec::new();
    for (i, &start) in starts.iter().enumerate() {
        let end = starts.get(i + 1).copied().unwrap_or(lines.len());
        for (a, b) in split_range(start, end, max_lines) {
            let piece = &lines[a..b];
            if piece.iter().all(|line| line.trim().is_empty()) {
                continue;
            }
            chunks.push(
                Chunk::new(
                    kind,
                    source_id,
                    format!("{source_id}:{}", a + 1),
                    piece.join("\n").trim_end(),
                )
                .with_metadata("lines", format!("{}-{}", a + 1, b)),
            );
        }
    }
    chunks
}
