use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use moonwatch::analyze::cluster::{cluster_authors, ClusterOptions};
use moonwatch::analyze::report::generate_report;
use moonwatch::config::{Config, DEFAULT_QUERY};
use moonwatch::fetch::client::HttpSearchClient;
use moonwatch::fetch::collector::{collect, FetchOptions};
use moonwatch::fetch::session;
use moonwatch::output::terminal;
use moonwatch::store::{read_records, RecordWriter};

/// Moonwatch: memecoin trend detection for celebrity social feeds.
///
/// Scrapes recent posts, scores tokens for memecoin potential, and serves
/// the resulting trend report over HTTP.
#[derive(Parser)]
#[command(name = "moonwatch", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch posts into a CSV record store
    Fetch {
        /// Search query (defaults to the crypto-slang sweep)
        query: Option<String>,

        /// Scope the fetch to a single handle (searches from:<handle>)
        #[arg(long)]
        user: Option<String>,

        /// Minimum number of records to collect before stopping
        #[arg(long)]
        min_records: Option<u64>,

        /// Output CSV path (defaults to the per-handle store in the data dir)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Analyze a record store and print the trend report
    Analyze {
        /// Path to a CSV record store produced by `fetch`
        file: PathBuf,

        /// Scope part of the report to one author
        #[arg(long)]
        user: Option<String>,

        /// Also cluster authors into this many groups
        #[arg(long)]
        clusters: Option<usize>,

        /// Print JSON instead of the table view
        #[arg(long)]
        json: bool,
    },

    /// Run the HTTP trend report API
    Serve {
        /// Port to listen on
        #[arg(long, default_value = "8080")]
        port: u16,

        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        bind: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("moonwatch=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Fetch {
            query,
            user,
            min_records,
            out,
        } => {
            let config = Config::load()?;

            let session = session::load_or_login(&config).await?;
            let client = HttpSearchClient::new(&config.api_base_url, &session)?;

            let query = match (&query, &user) {
                (Some(q), _) => q.clone(),
                (None, Some(u)) => format!("from:{}", u.trim_start_matches('@')),
                (None, None) => DEFAULT_QUERY.to_string(),
            };
            let store_path = match (&out, &user) {
                (Some(p), _) => p.clone(),
                (None, Some(u)) => config.store_path(u.trim_start_matches('@')),
                (None, None) => config.data_dir.join("tweets.csv"),
            };

            println!("Fetching into {}...", store_path.display());

            let mut writer = RecordWriter::create(&store_path)?;
            let opts = FetchOptions::with_target(min_records.unwrap_or(config.min_records));
            let outcome = collect(&client, &mut writer, &query, &opts).await?;

            println!("\n{}", "Fetch complete.".bold());
            println!("  Records collected: {}", outcome.collected);
            if !outcome.reached_target {
                println!(
                    "  {}",
                    format!("Stopped short of the {} record target.", opts.min_records).yellow()
                );
            }
            println!("\nNext: moonwatch analyze {}", store_path.display());
        }

        Commands::Analyze {
            file,
            user,
            clusters,
            json,
        } => {
            let records = read_records(&file)?;
            info!(records = records.len(), "loaded record store");

            let scoped = user.map(|u| u.trim_start_matches('@').to_string());
            let report = generate_report(&records, scoped.as_deref());

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                terminal::display_report(&report);
            }

            if let Some(n) = clusters {
                let opts = ClusterOptions {
                    n_clusters: n,
                    ..Default::default()
                };
                match cluster_authors(&records, &opts) {
                    Ok(found) => {
                        if json {
                            println!("{}", serde_json::to_string_pretty(&found)?);
                        } else {
                            terminal::display_clusters(&found);
                        }
                    }
                    Err(e) => {
                        println!("{}", format!("Clustering skipped: {e}").yellow());
                    }
                }
            }
        }

        Commands::Serve { port, bind } => {
            let config = Config::load()?;
            moonwatch::web::run_server(config, port, &bind).await?;
        }
    }

    Ok(())
}
