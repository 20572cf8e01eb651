//! `contextkit tools`: Rank a capability registry for a query.

use contextkit_config::{BudgetConfig, RetrievalConfig};
use contextkit_retrieval::{RetrievalInput, RetrievalService, load_universe};
use std::path::Path;

pub fn run(
    query: &str,
    tools: &Path,
    allow: &[String],
    limit: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = RetrievalConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let universe = load_universe(tools)?;

    // Only the capability corpus is consulted; file corpora stay unbuilt.
    let budget = BudgetConfig {
        code: 0,
        docs: 0,
        capabilities: limit,
        memory: 0,
    };
    let service = RetrievalService::new(".", config);
    let mut input = RetrievalInput::new(query)
        .with_capabilities(&universe)
        .with_budget(budget);
    if !allow.is_empty() {
        input = input.with_allowed_capabilities(allow);
    }

    let bundle = service.build(&input);
    for entry in bundle.capabilities() {
        eprintln!("  [score: {:.3}] {}", entry.score(), entry.name());
    }
    println!("{}", serde_json::to_string_pretty(&bundle.capability_schemas())?);
    Ok(())
}
