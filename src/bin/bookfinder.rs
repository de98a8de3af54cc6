//! # bookfinder CLI
//!
//! Find where a book is available across every configured source.
//!
//! ```bash
//! # Step 1: list catalog candidates for a title
//! bookfinder candidates "클린코드"
//!
//! # Step 2: search every source for the chosen ISBN
//! bookfinder search "클린코드" --isbn 9788966261161 --title "클린 코드"
//!
//! # An ISBN needs no selection step
//! bookfinder search 9788966261161
//!
//! # Ask one source only, even a disabled one
//! bookfinder lookup ssafy "파이썬" --max-results 3
//!
//! # Show configured sources
//! bookfinder sources
//! ```
//!
//! Responses are printed to stdout as JSON. All tracing output goes to
//! stderr so that stdout stays machine-readable.

use std::path::PathBuf;

use anyhow::Context;
use bookfinder::{build_coordinator, AppConfig, SearchQuery, SearchRequest};
use clap::{Parser, Subcommand};
use serde::Serialize;

/// Search local holdings, libraries, bookstores and e-book services for a book.
#[derive(Parser)]
#[command(name = "bookfinder", version, about)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `~/.config/bookfinder/config.toml` when it exists.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List catalog candidates for a free-text query.
    Candidates {
        /// Title or keyword.
        query: String,
    },

    /// Search every enabled source.
    ///
    /// An ambiguous title prints candidates instead; pick one and pass its
    /// `--isbn` and `--title`.
    Search {
        /// ISBN, title or keyword.
        query: String,

        /// Identifier of the selected candidate.
        #[arg(long)]
        isbn: Option<String>,

        /// Canonical title of the selected candidate.
        #[arg(long, requires = "isbn")]
        title: Option<String>,

        /// Title sent to title-only sources. Defaults to `--title` up to " - ".
        #[arg(long, requires = "isbn")]
        main_title: Option<String>,

        /// Maximum number of results per source.
        #[arg(long)]
        max_results: Option<usize>,
    },

    /// Search one source by name, bypassing the cache.
    Lookup {
        /// Source name from the configuration.
        source: String,

        /// ISBN, title or keyword.
        query: String,

        /// Maximum number of results.
        #[arg(long)]
        max_results: Option<usize>,
    },

    /// List configured sources and their status.
    Sources,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("bookfinder=info,bookfinder_search=info")
            }),
        )
        .init();

    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref()).context("failed to load config")?;
    let config_max = config.search.max_results_per_source;
    let coordinator = build_coordinator(config).context("invalid configuration")?;

    match cli.command {
        Commands::Candidates { query } => {
            let list = coordinator.candidates(&query).await?;
            print_json(&list)
        }
        Commands::Search {
            query,
            isbn,
            title,
            main_title,
            max_results,
        } => {
            let mut request = SearchRequest::new(query);
            if let Some(isbn) = isbn {
                request = request.with_selection(isbn, title.unwrap_or_default());
            }
            if let Some(main) = main_title {
                request = request.with_main_title(main);
            }
            if let Some(max) = max_results {
                request = request.with_max_results(max);
            }
            let response = coordinator.handle(request).await.map_err(|e| {
                tracing::error!(error = %e, "search failed");
                anyhow::anyhow!("search failed: {e}")
            })?;
            print_json(&response)
        }
        Commands::Lookup {
            source,
            query,
            max_results,
        } => {
            let query = SearchQuery::parse(&query);
            let max = max_results.unwrap_or(config_max);
            let outcome = coordinator.search_source(&source, &query, max).await?;
            print_json(&outcome)
        }
        Commands::Sources => print_json(&coordinator.sources()),
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}
