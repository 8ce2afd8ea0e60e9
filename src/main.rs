//! rustscopus - Scopus search-to-CSV microservice
//!
//! ## Usage
//!
//! ### CLI Mode
//! ```bash
//! rustscopus search "TITLE-ABS-KEY(mouse OR rat)" --date 2018-2022
//! rustscopus citations 85012345678 --years 2019-2022
//! rustscopus serial 08966273
//! ```
//!
//! ### HTTP Server Mode
//! ```bash
//! SCOPUS_API_KEY=... rustscopus serve --port 5000
//! ```

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use rustscopus::config::{ServerConfig, DEFAULT_DATE, DEFAULT_FIELDS, DEFAULT_OUTPUT_PATH, DEFAULT_QUERY};
use rustscopus::export;
use rustscopus::extract::RecordKind;
use rustscopus::normalize::{normalize_with, total_results, OnEntryError, Rows, SearchResultTable};
use rustscopus::retrieval::year_span;
use rustscopus::scopus::{ScopusClient, SearchQuery, DEFAULT_BASE_URL};
use rustscopus::server::{self, AppState};
use rustscopus::truncate::truncate_default;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

// ============================================================================
// CLI Definition
// ============================================================================

/// Scopus search-to-CSV microservice
#[derive(Parser)]
#[command(name = "rustscopus")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Output logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    /// Elsevier API key
    #[arg(long, env = "SCOPUS_API_KEY", global = true, hide_env_values = true)]
    api_key: Option<String>,

    /// Elsevier API host
    #[arg(long, env = "SCOPUS_BASE_URL", global = true, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one search page and save it as CSV (or print JSON)
    Search {
        /// Scopus query, e.g. "TITLE-ABS-KEY(mouse OR rat)"
        query: String,

        /// Record kind: article or author
        #[arg(long, default_value = "article", value_parser = ["article", "author", "1", "2"])]
        kind: String,

        /// Comma-separated field list
        #[arg(long)]
        fields: Option<String>,

        /// Publication year range (e.g., "2018-2022")
        #[arg(long)]
        date: Option<String>,

        /// Index of the first result
        #[arg(long, default_value = "0")]
        start: u32,

        /// Page size
        #[arg(long)]
        count: Option<u32>,

        /// Skip author entries missing mandatory fields instead of failing
        #[arg(long)]
        skip_invalid: bool,

        /// Print the table as JSON instead of writing CSV
        #[arg(long)]
        json: bool,

        /// Output directory
        #[arg(short, long, default_value = "./output")]
        output: PathBuf,
    },

    /// Retrieve an author profile (JSON)
    Author {
        /// Scopus author id
        id: String,
    },

    /// Retrieve the abstract record of a document (JSON)
    Abstract {
        /// Scopus document id
        id: String,
    },

    /// Retrieve an affiliation profile (JSON)
    Affiliation {
        /// Scopus affiliation id
        id: String,
    },

    /// Retrieve serial title metadata and CiteScores by ISSN (JSON)
    Serial {
        /// Serial ISSN
        issn: String,
    },

    /// Yearly citation counts for documents (CSV to stdout)
    Citations {
        /// Scopus document ids
        #[arg(required = true)]
        ids: Vec<String>,

        /// Inclusive year range (e.g., "2019-2022")
        #[arg(long)]
        years: String,
    },

    /// Run as HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "5000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Query used when no keywords are given
        #[arg(long, default_value = DEFAULT_QUERY)]
        query: String,

        /// Comma-separated field list
        #[arg(long, default_value = DEFAULT_FIELDS)]
        fields: String,

        /// Publication year range
        #[arg(long, default_value = DEFAULT_DATE)]
        date: String,

        /// Where each served CSV is also written
        #[arg(long, default_value = DEFAULT_OUTPUT_PATH)]
        output_path: PathBuf,
    },
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    let subscriber = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false);
    if cli.json_logs {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    let api_key = cli
        .api_key
        .context("Missing API key (use --api-key or SCOPUS_API_KEY)")?;

    match cli.command {
        Commands::Search {
            query,
            kind,
            fields,
            date,
            start,
            count,
            skip_invalid,
            json,
            output,
        } => {
            let kind: RecordKind = kind.parse()?;
            let mut search = SearchQuery::new(query, kind);
            search.fields = fields;
            search.date = date;
            search.start = start;
            search.count = count;
            let policy = if skip_invalid { OnEntryError::Skip } else { OnEntryError::Abort };
            run_search(&api_key, &cli.base_url, &search, policy, json, output).await
        }
        Commands::Author { id } => {
            let client = ScopusClient::new(api_key, &cli.base_url)?;
            let profile = client.author(&id).await?;
            println!("{}", serde_json::to_string_pretty(&profile)?);
            Ok(())
        }
        Commands::Abstract { id } => {
            let client = ScopusClient::new(api_key, &cli.base_url)?;
            let record = client.abstract_record(&id).await?;
            println!("{}", serde_json::to_string_pretty(&record)?);
            Ok(())
        }
        Commands::Affiliation { id } => {
            let client = ScopusClient::new(api_key, &cli.base_url)?;
            let profile = client.affiliation(&id).await?;
            println!("{}", serde_json::to_string_pretty(&profile)?);
            Ok(())
        }
        Commands::Serial { issn } => {
            let client = ScopusClient::new(api_key, &cli.base_url)?;
            let tables = client.serial(&issn).await?;
            println!("{}", serde_json::to_string_pretty(&tables)?);
            Ok(())
        }
        Commands::Citations { ids, years } => {
            let year_range = parse_years(&years).context("Invalid --years format")?;
            let client = ScopusClient::new(api_key, &cli.base_url)?;
            let rows = client.citation_overview(&ids, year_range).await?;
            export::write_citations(std::io::stdout().lock(), &rows, year_range)?;
            Ok(())
        }
        Commands::Serve {
            port,
            host,
            query,
            fields,
            date,
            output_path,
        } => {
            let config = ServerConfig {
                api_key,
                base_url: cli.base_url,
                default_query: query,
                fields: Some(fields).filter(|f| !f.is_empty()),
                date: Some(date).filter(|d| !d.is_empty()),
                output_path,
            };
            run_server(host, port, config).await
        }
    }
}

// ============================================================================
// Search
// ============================================================================

async fn run_search(
    api_key: &str,
    base_url: &str,
    query: &SearchQuery,
    policy: OnEntryError,
    json: bool,
    output_dir: PathBuf,
) -> Result<()> {
    let client = ScopusClient::new(api_key, base_url)?;
    let response = client.search(query).await?;

    // An empty result set carries a placeholder entry instead of hits.
    if total_results(&response)? == 0 {
        println!("No results found.");
        return Ok(());
    }

    let (table, total) = normalize_with(&response, query.kind, policy)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&table)?);
        return Ok(());
    }

    println!("Found {} results ({} on this page).", total, table.len());
    print_preview(&table);

    std::fs::create_dir_all(&output_dir).context("Failed to create output directory")?;
    let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let path = output_dir.join(format!("{}_{}.csv", timestamp, query.kind));
    export::save_csv(&path, &table).context("Failed to write CSV")?;

    println!("Saved: {:?}", path);
    Ok(())
}

/// One shortened line per row
fn print_preview(table: &SearchResultTable) {
    match &table.rows {
        Rows::Articles(rows) => {
            for (i, row) in rows.iter().enumerate() {
                let title = row.title.as_deref().unwrap_or("(untitled)");
                println!("{:>3}. {}", i + 1, truncate_default(title));
            }
        }
        Rows::Authors(rows) => {
            for (i, row) in rows.iter().enumerate() {
                let line = format!(
                    "{} ({} documents){}",
                    row.name,
                    row.document_count,
                    row.affiliation
                        .as_deref()
                        .map(|a| format!(", {}", a))
                        .unwrap_or_default()
                );
                println!("{:>3}. {}", i + 1, truncate_default(&line));
            }
        }
    }
}

/// Parse an inclusive year range (e.g., "2019-2022" or "2020")
fn parse_years(years: &str) -> Result<(i32, i32)> {
    let range = match years.split_once('-') {
        Some((start, end)) => {
            let start: i32 = start.trim().parse().context("Invalid start year")?;
            let end: i32 = end.trim().parse().context("Invalid end year")?;
            if end < start {
                anyhow::bail!("End year {} is before start year {}", end, start);
            }
            (start, end)
        }
        None => {
            let year: i32 = years.trim().parse().context("Invalid year")?;
            (year, year)
        }
    };
    year_span(range)?;
    Ok(range)
}

// ============================================================================
// HTTP Server
// ============================================================================

async fn run_server(host: String, port: u16, config: ServerConfig) -> Result<()> {
    info!(host = %host, port = port, "Starting HTTP server");

    let app_state = Arc::new(AppState::new(config).context("Invalid server configuration")?);
    let app = server::router(app_state);

    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .context("Invalid host:port")?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    println!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .await
        .context("Server error")?;

    Ok(())
}
