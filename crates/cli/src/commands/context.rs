//! `contextkit context`: Assemble and print the context block for a query.

use contextkit_config::{BudgetConfig, RetrievalConfig};
use contextkit_core::{CapabilityDescriptor, SessionNote};
use contextkit_retrieval::{RetrievalInput, RetrievalService, load_universe};
use std::path::PathBuf;

/// Per-corpus overrides of the configured budget.
#[derive(Debug, Default, clap::Args)]
pub struct BudgetArgs {
    /// Code chunks to select
    #[arg(long)]
    pub code_k: Option<usize>,

    /// Documentation chunks to select
    #[arg(long)]
    pub docs_k: Option<usize>,

    /// Capabilities to select
    #[arg(long)]
    pub tools_k: Option<usize>,

    /// Memory chunks to select
    #[arg(long)]
    pub memory_k: Option<usize>,
}

impl BudgetArgs {
    fn apply(&self, base: BudgetConfig) -> BudgetConfig {
        BudgetConfig {
            code: self.code_k.unwrap_or(base.code),
            docs: self.docs_k.unwrap_or(base.docs),
            capabilities: self.tools_k.unwrap_or(base.capabilities),
            memory: self.memory_k.unwrap_or(base.memory),
        }
    }
}

pub struct ContextArgs {
    pub query: String,
    pub root: PathBuf,
    pub tools: Option<PathBuf>,
    pub allow: Vec<String>,
    pub notes: Vec<String>,
    pub targets: Vec<PathBuf>,
    pub config_paths: Vec<PathBuf>,
    pub budget: BudgetArgs,
}

pub fn run(args: ContextArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = RetrievalConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let budget = args.budget.apply(config.budget);

    let universe: Vec<CapabilityDescriptor> = match &args.tools {
        Some(path) => load_universe(path)?,
        None => Vec::new(),
    };
    let notes = args
        .notes
        .iter()
        .map(|raw| parse_note(raw))
        .collect::<Result<Vec<_>, _>>()?;

    let service = RetrievalService::new(&args.root, config);
    let mut input = RetrievalInput::new(&args.query)
        .with_capabilities(&universe)
        .with_session_notes(&notes)
        .with_budget(budget);
    if !args.allow.is_empty() {
        input = input.with_allowed_capabilities(&args.allow);
    }

    let minimal = !(args.targets.is_empty() && args.config_paths.is_empty());
    tracing::debug!(root = %service.root().display(), minimal, "Assembling context");
    let bundle = if !minimal {
        service.build(&input)
    } else {
        service.build_minimal(&input, &args.targets, &args.config_paths)
    };

    let rendered = service.render(&bundle);
    if rendered.is_empty() {
        println!("No context matched \"{}\" under {}", args.query, service.root().display());
    } else {
        print!("{rendered}");
    }
    Ok(())
}

/// Parse a `KEY=TEXT` session note.
fn parse_note(raw: &str) -> Result<SessionNote, String> {
    match raw.split_once('=') {
        Some((key, text)) if !key.trim().is_empty() => Ok(SessionNote::new(key.trim(), text)),
        _ => Err(format!("Invalid note '{raw}': expected KEY=TEXT")),
    }
}
