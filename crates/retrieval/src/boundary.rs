//! Chunk-boundary detection.
//!
//! A [`BoundaryDetector`] decides which lines start a new chunk. Source files
//! use one pattern detector per language family; documents use
//! [`MarkdownHeadings`]. Adding a language means registering another detector
//! in the [`DetectorRegistry`]; the corpus code never changes.

use regex_lite::Regex;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

/// Finds the lines where a new chunk begins.
pub trait BoundaryDetector: Send + Sync {
    /// Short identifier, recorded in chunk metadata.
    fn name(&self) -> &str;

    /// Whether `line` starts a new chunk.
    fn is_boundary(&self, line: &str) -> bool;

    /// A title for the chunk that starts at `line`, if the format has one.
    fn label(&self, _line: &str) -> Option<String> {
        None
    }

    /// Zero-based indices of every boundary line, ascending.
    fn boundaries(&self, lines: &[&str]) -> Vec<usize> {
        lines
            .iter()
            .enumerate()
            .filter(|(_, line)| self.is_boundary(line))
            .map(|(index, _)| index)
            .collect()
    }
}

/// A detector driven by a single line pattern.
pub struct PatternDetector {
    name: String,
    pattern: Regex,
}

impl PatternDetector {
    pub fn new(name: impl Into<String>, pattern: &str) -> Result<Self, regex_lite::Error> {
        Ok(Self {
            name: name.into(),
            pattern: Regex::new(pattern)?,
        })
    }
}

impl BoundaryDetector for PatternDetector {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_boundary(&self, line: &str) -> bool {
        self.pattern.is_match(line)
    }
}

/// Never reports a boundary: the whole text is one chunk before the line cap.
pub struct PlainText;

impl BoundaryDetector for PlainText {
    fn name(&self) -> &str {
        "plain"
    }

    fn is_boundary(&self, _line: &str) -> bool {
        false
    }
}

/// ATX headings (`#` through `######`), ignoring lines inside fenced code.
pub struct MarkdownHeadings;

impl MarkdownHeadings {
    fn heading_text(line: &str) -> Option<&str> {
        let hashes = line.chars().take_while(|c| *c == '#').count();
        if hashes == 0 || hashes > 6 {
            return None;
        }
        let rest = &line[hashes..];
        if !rest.starts_with(char::is_whitespace) {
            return None;
        }
        let text = rest.trim();
        // A closing run of `#` only counts when separated by whitespace.
        let stripped = text.trim_end_matches('#');
        let text = if stripped.is_empty() || stripped.ends_with(char::is_whitespace) {
            stripped.trim_end()
        } else {
            text
        };
        (!text.is_empty()).then_some(text)
    }

    fn is_fence(line: &str) -> bool {
        let trimmed = line.trim_start();
        trimmed.starts_with("```") || trimmed.starts_with("~~~")
    }
}

impl BoundaryDetector for MarkdownHeadings {
    fn name(&self) -> &str {
        "markdown"
    }

    fn is_boundary(&self, line: &str) -> bool {
        Self::heading_text(line).is_some()
    }

    fn label(&self, line: &str) -> Option<String> {
        Self::heading_text(line).map(str::to_string)
    }

    fn boundaries(&self, lines: &[&str]) -> Vec<usize> {
        let mut in_fence = false;
        let mut found = Vec::new();
        for (index, line) in lines.iter().enumerate() {
            if Self::is_fence(line) {
                in_fence = !in_fence;
                continue;
            }
            if !in_fence && self.is_boundary(line) {
                found.push(index);
            }
        }
        found
    }
}

/// Built-in definition patterns: (name, extensions, pattern).
const BUILTIN_PATTERNS: &[(&str, &[&str], &str)] = &[
    (
        "rust",
        &["rs"],
        r#"^\s*(pub(\([^)]*\))?\s+)?((const|async|unsafe|extern\s+"[^"]*")\s+)*(fn|struct|enum|trait|impl|mod|union)\b|^\s*macro_rules!"#,
    ),
    ("python", &["py"], r"^\s*(async\s+)?(def|class)\s+\w"),
    (
        "javascript",
        &["js", "jsx", "mjs", "ts", "tsx"],
        r"^\s*(export\s+)?(default\s+)?(declare\s+)?(abstract\s+)?(async\s+)?(function\*?|class|interface|enum|type)\s+\w|^\s*(export\s+)?(const|let)\s+\w+\s*=\s*(async\s+)?(\([^)]*\)|\w+)\s*=>",
    ),
    ("go", &["go"], r"^(func|type)\s"),
    (
        "jvm",
        &["java", "kt", "scala", "cs"],
        r"^\s*((public|private|protected|internal|static|final|abstract|sealed|open|data|override|suspend|async|partial|virtual|case)\s+)*(class|interface|enum|record|struct|object|trait|fun|def)\s+\w",
    ),
    ("ruby", &["rb"], r"^\s*(def|class|module)\s+\w"),
    (
        "php",
        &["php"],
        r"^\s*((public|private|protected|static|abstract|final)\s+)*(function|class|interface|trait)\s+\w",
    ),
    (
        "swift",
        &["swift"],
        r"^\s*((public|private|internal|open|fileprivate|static|final)\s+)*(func|class|struct|enum|protocol|extension)\s+\w",
    ),
    (
        "c",
        &["c", "h", "cc", "cpp", "hpp"],
        r"^(class|struct|namespace|enum|union)\s+\w|^[A-Za-z_][\w\*&:<>, ]*[\s\*&]\**[A-Za-z_][\w:]*\s*\([^;]*$",
    ),
];

/// Used for source extensions with no registered detector.
const FALLBACK_PATTERN: &str =
    r"^\s*(pub\s+)?(export\s+)?(async\s+)?(def|fn|func|function|class|struct|interface|trait|impl|module)\s+\w";

/// Maps file extensions to boundary detectors.
pub struct DetectorRegistry {
    by_extension: HashMap<String, Arc<dyn BoundaryDetector>>,
    fallback: Arc<dyn BoundaryDetector>,
}

impl DetectorRegistry {
    /// An empty registry whose fallback treats each file as plain text.
    pub fn new() -> Self {
        Self {
            by_extension: HashMap::new(),
            fallback: Arc::new(PlainText),
        }
    }

    /// A registry with the built-in language detectors.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for (name, extensions, pattern) in BUILTIN_PATTERNS {
            match PatternDetector::new(*name, pattern) {
                Ok(detector) => registry.register(extensions, Arc::new(detector)),
                Err(e) => warn!(detector = *name, error = %e, "Skipping invalid boundary pattern"),
            }
        }
        match PatternDetector::new("generic", FALLBACK_PATTERN) {
            Ok(detector) => registry.fallback = Arc::new(detector),
            Err(e) => warn!(error = %e, "Generic boundary pattern invalid, using plain text"),
        }
        registry
    }

    /// Register a detector for extensions (without the dot, any case).
    /// Replaces any detector already registered for them.
    pub fn register(&mut self, extensions: &[&str], detector: Arc<dyn BoundaryDetector>) {
        for extension in extensions {
            self.by_extension
                .insert(extension.to_ascii_lowercase(), Arc::clone(&detector));
        }
    }

    /// The detector for a path, by extension.
    pub fn for_path(&self, path: &Path) -> &dyn BoundaryDetector {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(|e| self.by_extension.get(&e.to_ascii_lowercase()))
            .unwrap_or(&self.fallback)
            .as_ref()
    }
}

impl Default for DetectorRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
