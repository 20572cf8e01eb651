//! ContextKit CLI: inspect retrieval against a directory.
//!
//! Commands:
//! - `context`: assemble and print the context block for a query
//! - `tools`: rank a capability registry for a query
//! - `config`: show the effective configuration
//! - `cache`: manage on-disk index caches

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "contextkit",
    about = "ContextKit: retrieval and context assembly for coding assistants",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble the context block for a query
    Context {
        /// The query to retrieve context for
        query: String,

        /// Workspace root to index
        #[arg(long, default_value = ".")]
        root: PathBuf,

        /// JSON file holding an array of capability descriptors
        #[arg(long)]
        tools: Option<PathBuf>,

        /// Only allow these capabilities (repeatable)
        #[arg(long = "allow")]
        allow: Vec<String>,

        /// Session note as KEY=TEXT (repeatable)
        #[arg(long = "note")]
        notes: Vec<String>,

        /// Explicit code file; switches to minimal assembly (repeatable)
        #[arg(long = "target")]
        targets: Vec<PathBuf>,

        /// Explicit config file; switches to minimal assembly (repeatable)
        #[arg(long = "config-path")]
        config_paths: Vec<PathBuf>,

        #[command(flatten)]
        budget: commands::context::BudgetArgs,
    },

    /// Rank capabilities for a query and print the selected schemas
    Tools {
        /// The query to rank capabilities against
        query: String,

        /// JSON file holding an array of capability descriptors
        #[arg(long)]
        tools: PathBuf,

        /// Only allow these capabilities (repeatable)
        #[arg(long = "allow")]
        allow: Vec<String>,

        /// Maximum capabilities to print
        #[arg(short, long, default_value_t = 6)]
        limit: usize,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Index cache management
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Print the config file path
    Path,
}

#[derive(Subcommand)]
enum CacheAction {
    /// Delete the cache files for a workspace root
    Clear {
        #[arg(long, default_value = ".")]
        root: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Context {
            query,
            root,
            tools,
            allow,
            notes,
            targets,
            config_paths,
            budget,
        } => commands::context::run(commands::context::ContextArgs {
            query,
            root,
            tools,
            allow,
            notes,
            targets,
            config_paths,
            budget,
        })?,
        Commands::Tools {
            query,
            tools,
            allow,
            limit,
        } => commands::tools::run(&query, &tools, &allow, limit)?,
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_cmd::show()?,
            ConfigAction::Path => commands::config_cmd::path()?,
        },
        Commands::Cache { action } => match action {
            CacheAction::Clear { root } => commands::cache::clear(&root)?,
        },
    }

    Ok(())
}
