//! `contextkit cache`: Index cache management.

use contextkit_config::RetrievalConfig;
use contextkit_retrieval::RetrievalService;
use std::path::Path;

pub fn clear(root: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = RetrievalConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let cache_dir = config.cache.resolved_dir();

    let service = RetrievalService::new(root, config);
    let removed = service.invalidate_cache();

    println!("🗑️  Cache for {}", service.root().display());
    println!("   Directory: {}", cache_dir.display());
    println!("   Removed:   {removed} file(s)");
    Ok(())
}
