//! CocoSearch CLI.
//!
//! Command-line interface for indexing, searching, and managing CocoSearch
//! indexes. Every subcommand resolves a project (defaulting to the current
//! directory) and drives it through [`cocosearch_core::Engine`].

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use cocosearch_core::types::{BlockType, Filters, SearchOptions};
use cocosearch_core::Engine;
use cocosearch_core::pipeline::IndexOptions;

#[derive(Parser, Debug)]
#[command(name = "cocosearch", version, about = "Hybrid (vector + keyword) code search engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level filter (`error`, `warn`, `info`, `debug`, `trace`).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Index a repository.
    Index {
        /// Path to the repository root.
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Override the derived index name.
        #[arg(long)]
        name: Option<String>,

        /// Glob pattern to include (repeatable). Defaults to everything not excluded.
        #[arg(long = "include")]
        include: Vec<String>,

        /// Extra glob pattern to exclude (repeatable), on top of the configured defaults.
        #[arg(long = "exclude")]
        exclude: Vec<String>,

        /// Don't honor `.gitignore` while walking the tree.
        #[arg(long)]
        no_gitignore: bool,
    },

    /// Search an indexed codebase.
    Search {
        /// Search query (natural language or an identifier).
        query: String,

        /// Path to the repository root.
        #[arg(long, default_value = ".")]
        path: PathBuf,

        /// Index name to search, if different from the path's resolved project.
        #[arg(long)]
        index: Option<String>,

        /// Maximum number of results.
        #[arg(short, long, default_value_t = 10)]
        limit: usize,

        /// Minimum score a result must clear to be returned.
        #[arg(long, default_value_t = 0.0)]
        min_score: f32,

        /// Restrict to one language (by id, e.g. `python`, `rust`).
        #[arg(long)]
        language: Option<String>,

        /// Restrict to one symbol kind (`function`, `method`, `class`, `interface`, `struct`, `trait`, `enum`, `module`).
        #[arg(long = "kind")]
        symbol_type: Option<String>,

        /// Restrict to results whose symbol name matches exactly.
        #[arg(long)]
        symbol_name: Option<String>,

        /// Skip the vector leg and run keyword-only search.
        #[arg(long)]
        keyword_only: bool,

        /// Expand each result to its smallest enclosing definition.
        #[arg(long)]
        smart_context: bool,

        /// Extra lines of context before a result (ignored if `--smart-context` is set).
        #[arg(long, default_value_t = 0)]
        context_before: usize,

        /// Extra lines of context after a result (ignored if `--smart-context` is set).
        #[arg(long, default_value_t = 0)]
        context_after: usize,

        /// Skip both cache tiers for this call.
        #[arg(long)]
        no_cache: bool,
    },

    /// Show index statistics.
    Stats {
        /// Path to the repository root.
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Index name, if different from the path's resolved project.
        #[arg(long)]
        index: Option<String>,

        /// Also list per-file parse failures.
        #[arg(long)]
        failed: bool,
    },

    /// List every registered index.
    List {
        /// Path to the repository root (used only to load config/connect storage).
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Drop an index's tables and registry entry.
    Clear {
        /// Path to the repository root.
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Index name, if different from the path's resolved project.
        #[arg(long)]
        index: Option<String>,
    },

    /// Inspect how a query would be analyzed, retrieved, and fused.
    Analyze {
        /// Query to analyze.
        query: String,

        /// Path to the repository root.
        #[arg(long, default_value = ".")]
        path: PathBuf,

        /// Index name, if different from the path's resolved project.
        #[arg(long)]
        index: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt().with_env_filter(&cli.log_level).init();

    match cli.command {
        Commands::Index { path, name, include, exclude, no_gitignore } => {
            let engine = Engine::new(&path).await?;
            let options = IndexOptions {
                index_name: name,
                include_patterns: include,
                exclude_patterns: exclude,
                respect_gitignore: !no_gitignore,
            };
            tracing::info!(path = %path.display(), "indexing repository");
            let report = engine.run_index(&options).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }

        Commands::Search {
            query,
            path,
            index,
            limit,
            min_score,
            language,
            symbol_type,
            symbol_name,
            keyword_only,
            smart_context,
            context_before,
            context_after,
            no_cache,
        } => {
            let engine = Engine::new(&path).await?;
            let options = SearchOptions {
                limit,
                min_score,
                filters: Filters { language, block_type: symbol_type.as_deref().and_then(parse_block_type), symbol_name, path_glob: None },
                use_hybrid: if keyword_only { Some(false) } else { None },
                smart_context,
                context_before,
                context_after,
                no_cache,
            };
            tracing::info!(query = %query, "searching");
            let results = engine.search(&query, index.as_deref(), &options).await?;
            println!("{}", serde_json::to_string_pretty(&results)?);
        }

        Commands::Stats { path, index, failed } => {
            let engine = Engine::new(&path).await?;
            let report = engine.index_stats(index.as_deref(), failed).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }

        Commands::List { path } => {
            let engine = Engine::new(&path).await?;
            let indexes = engine.list_indexes().await?;
            println!("{}", serde_json::to_string_pretty(&indexes)?);
        }

        Commands::Clear { path, index } => {
            let engine = Engine::new(&path).await?;
            engine.clear_index(index.as_deref()).await?;
            println!("cleared index {}", index.as_deref().unwrap_or_else(|| engine.project().index_name.as_str()));
        }

        Commands::Analyze { query, path, index } => {
            let engine = Engine::new(&path).await?;
            let diagnostics = engine.analyze_query(&query, index.as_deref()).await?;
            println!("{}", serde_json::to_string_pretty(&diagnostics)?);
        }
    }

    Ok(())
}

fn parse_block_type(s: &str) -> Option<BlockType> {
    match s.to_lowercase().as_str() {
        "function" => Some(BlockType::Function),
        "method" => Some(BlockType::Method),
        "class" => Some(BlockType::Class),
        "interface" => Some(BlockType::Interface),
        "struct" => Some(BlockType::Struct),
        "trait" => Some(BlockType::Trait),
        "enum" => Some(BlockType::Enum),
        "module" => Some(BlockType::Module),
        "fragment" => Some(BlockType::Fragment),
        _ => {
            tracing::warn!(kind = %s, "unrecognized symbol kind filter, ignoring");
            None
        }
    }
}

