//! Configuration loading, validation, and management for ContextKit.
//!
//! Loads configuration from `~/.contextkit/config.toml` with environment
//! variable overrides. Validates all settings before a retrieval service is
//! constructed from them.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.contextkit/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// What to index and how to chunk it
    #[serde(default)]
    pub index: IndexConfig,

    /// On-disk index cache
    #[serde(default)]
    pub cache: CacheConfig,

    /// Fixed-rule score bonuses
    #[serde(default)]
    pub ranking: RankingConfig,

    /// Default per-corpus result counts
    #[serde(default)]
    pub budget: BudgetConfig,

    /// Durable project memory
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Text rendering of result bundles
    #[serde(default)]
    pub render: RenderConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Directory names never descended into.
    #[serde(default = "default_exclude_dirs")]
    pub exclude_dirs: Vec<String>,

    /// File extensions (without the dot) indexed by the source corpus.
    #[serde(default = "default_source_extensions")]
    pub source_extensions: Vec<String>,

    /// File extensions (without the dot) indexed by the documentation corpus.
    #[serde(default = "default_doc_extensions")]
    pub doc_extensions: Vec<String>,

    /// Root-relative documents always indexed first by the documentation corpus.
    #[serde(default = "default_preferred_docs")]
    pub preferred_docs: Vec<String>,

    /// Longest chunk, in lines, before it is split.
    #[serde(default = "default_max_chunk_lines")]
    pub max_chunk_lines: usize,

    /// Files larger than this are skipped.
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,
}

fn default_exclude_dirs() -> Vec<String> {
    [
        ".git",
        ".hg",
        ".svn",
        ".contextkit",
        ".idea",
        ".vscode",
        ".venv",
        "venv",
        "__pycache__",
        "node_modules",
        "target",
        "dist",
        "build",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_source_extensions() -> Vec<String> {
    [
        "rs", "py", "js", "jsx", "mjs", "ts", "tsx", "go", "java", "kt", "scala", "c", "h", "cc",
        "cpp", "hpp", "cs", "rb", "php", "swift",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_doc_extensions() -> Vec<String> {
    ["md", "markdown", "txt"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_preferred_docs() -> Vec<String> {
    vec!["README.md".into()]
}

fn default_max_chunk_lines() -> usize {
    80
}

fn default_max_file_bytes() -> u64 {
    512 * 1024
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            exclude_dirs: default_exclude_dirs(),
            source_extensions: default_source_extensions(),
            doc_extensions: default_doc_extensions(),
            preferred_docs: default_preferred_docs(),
            max_chunk_lines: default_max_chunk_lines(),
            max_file_bytes: default_max_file_bytes(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Cache directory. Defaults to `~/.contextkit/cache`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
}

fn default_true() -> bool {
    true
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: None,
        }
    }
}

impl CacheConfig {
    /// The directory cache files are written to.
    pub fn resolved_dir(&self) -> PathBuf {
        match &self.dir {
            Some(dir) => expand_tilde(dir),
            None => RetrievalConfig::config_dir().join("cache"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingConfig {
    /// Added when a chunk's source (or its file name) is named in the query.
    #[serde(default = "default_rerank_source_bonus")]
    pub rerank_source_bonus: f32,

    /// Added when a chunk's exact location is named in the query.
    #[serde(default = "default_rerank_location_bonus")]
    pub rerank_location_bonus: f32,

    /// Added when a capability name appears literally in the query.
    #[serde(default = "default_capability_name_bonus")]
    pub capability_name_bonus: f32,

    /// Added when a query intent word maps to the capability.
    #[serde(default = "default_capability_intent_bonus")]
    pub capability_intent_bonus: f32,
}

fn default_rerank_source_bonus() -> f32 {
    0.5
}
fn default_rerank_location_bonus() -> f32 {
    0.25
}
fn default_capability_name_bonus() -> f32 {
    0.5
}
fn default_capability_intent_bonus() -> f32 {
    0.2
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            rerank_source_bonus: default_rerank_source_bonus(),
            rerank_location_bonus: default_rerank_location_bonus(),
            capability_name_bonus: default_capability_name_bonus(),
            capability_intent_bonus: default_capability_intent_bonus(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BudgetConfig {
    #[serde(default = "default_code_k")]
    pub code: usize,

    #[serde(default = "default_docs_k")]
    pub docs: usize,

    #[serde(default = "default_capabilities_k")]
    pub capabilities: usize,

    #[serde(default = "default_memory_k")]
    pub memory: usize,
}

fn default_code_k() -> usize {
    4
}
fn default_docs_k() -> usize {
    3
}
fn default_capabilities_k() -> usize {
    6
}
fn default_memory_k() -> usize {
    4
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            code: default_code_k(),
            docs: default_docs_k(),
            capabilities: default_capabilities_k(),
            memory: default_memory_k(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Project-notes document, relative to the indexed root unless absolute.
    #[serde(default = "default_durable_path")]
    pub durable_path: String,
}

fn default_durable_path() -> String {
    ".contextkit/MEMORY.md".into()
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            durable_path: default_durable_path(),
        }
    }
}

impl MemoryConfig {
    /// Resolve the durable memory document against `root`.
    pub fn resolve(&self, root: &Path) -> PathBuf {
        let path = expand_tilde(&self.durable_path);
        if path.is_absolute() {
            path
        } else {
            root.join(path)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Content characters shown per rendered item.
    #[serde(default = "default_max_chars_per_item")]
    pub max_chars_per_item: usize,
}

fn default_max_chars_per_item() -> usize {
    1200
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            max_chars_per_item: default_max_chars_per_item(),
        }
    }
}

impl RetrievalConfig {
    /// Load configuration from the default path (~/.contextkit/config.toml).
    ///
    /// Environment variables override the file:
    /// - `CONTEXTKIT_CACHE_DIR` sets the cache directory
    /// - `CONTEXTKIT_MEMORY_PATH` sets the durable memory document
    /// - `CONTEXTKIT_NO_CACHE` (any value) disables the cache
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".contextkit")
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(dir) = std::env::var("CONTEXTKIT_CACHE_DIR") {
            self.cache.dir = Some(dir);
        }
        if let Ok(path) = std::env::var("CONTEXTKIT_MEMORY_PATH") {
            self.memory.durable_path = path;
        }
        if std::env::var_os("CONTEXTKIT_NO_CACHE").is_some() {
            self.cache.enabled = false;
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.index.max_chunk_lines == 0 {
            return Err(ConfigError::ValidationError(
                "index.max_chunk_lines must be > 0".into(),
            ));
        }

        if self.index.source_extensions.is_empty() || self.index.doc_extensions.is_empty() {
            return Err(ConfigError::ValidationError(
                "index.source_extensions and index.doc_extensions must not be empty".into(),
            ));
        }

        if self.render.max_chars_per_item == 0 {
            return Err(ConfigError::ValidationError(
                "render.max_chars_per_item must be > 0".into(),
            ));
        }

        let bonuses = [
            ("rerank_source_bonus", self.ranking.rerank_source_bonus),
            ("rerank_location_bonus", self.ranking.rerank_location_bonus),
            ("capability_name_bonus", self.ranking.capability_name_bonus),
            ("capability_intent_bonus", self.ranking.capability_intent_bonus),
        ];
        for (name, value) in bonuses {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::ValidationError(format!(
                    "ranking.{name} must be a finite value >= 0"
                )));
            }
        }

        Ok(())
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs_home().join(rest),
        None if path == "~" => dirs_home(),
        None => PathBuf::from(path),
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = RetrievalConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.index.max_chunk_lines, 80);
        assert_eq!(config.budget.capabilities, 6);
        assert!(config.cache.enabled);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = RetrievalConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: RetrievalConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.index.source_extensions, config.index.source_extensions);
        assert_eq!(parsed.memory.durable_path, config.memory.durable_path);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let toml_str = r#"
[index]
max_chunk_lines = 40

[ranking]
capability_name_bonus = 1.0
"#;
        let config: RetrievalConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.index.max_chunk_lines, 40);
        assert_eq!(config.index.preferred_docs, vec!["README.md"]);
        assert_eq!(config.ranking.capability_name_bonus, 1.0);
        assert_eq!(config.ranking.rerank_source_bonus, 0.5);
    }

    #[test]
    fn zero_chunk_lines_rejected() {
        let mut config = RetrievalConfig::default();
        config.index.max_chunk_lines = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn negative_bonus_rejected() {
        let mut config = RetrievalConfig::default();
        config.ranking.rerank_location_bonus = -0.1;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("rerank_location_bonus"));
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = RetrievalConfig::load_from(Path::new("/nonexistent/config.toml"));
        assert!(result.is_ok());
        assert_eq!(result.unwrap().budget.code, 4);
    }

    #[test]
    fn invalid_file_reports_parse_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[index\nmax_chunk_lines = ").unwrap();
        let err = RetrievalConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn durable_path_resolves_against_root() {
        let config = MemoryConfig::default();
        let resolved = config.resolve(Path::new("/work/project"));
        assert_eq!(resolved, PathBuf::from("/work/project/.contextkit/MEMORY.md"));

        let absolute = MemoryConfig {
            durable_path: "/srv/notes.md".into(),
        };
        assert_eq!(absolute.resolve(Path::new("/work")), PathBuf::from("/srv/notes.md"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = RetrievalConfig::default_toml();
        assert!(toml_str.contains("max_chunk_lines"));
        assert!(toml_str.contains("README.md"));
    }
}
