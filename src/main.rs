use std::fs::File;
use std::io::BufReader;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use rusqlite::Connection;
use tracing::info;

use scholarprint::config::Config;
use scholarprint::db::models::CorpusFile;
use scholarprint::db::{queries, schema};
use scholarprint::matcher::CandidateMatcher;
use scholarprint::output::terminal;
use scholarprint::pipeline::{author, publication, ranking, PipelineParams};
use scholarprint::reference::ReferenceData;

/// Scholarprint: assign topical keywords to publications and authors,
/// then rank authors against keyword queries.
#[derive(Parser)]
#[command(name = "scholarprint", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema
    Init,

    /// Import a corpus JSON file (publications, authors, authorship, NPMI pairs)
    Import {
        /// Path to the corpus file
        file: String,
    },

    /// Assign keyword fingerprints to every publication with an abstract
    AssignPublications {
        /// Number of publications to process in parallel (default: 8)
        #[arg(long, default_value = "8")]
        concurrency: usize,

        /// Per-publication processing deadline in seconds (default: 30)
        #[arg(long, default_value = "30")]
        timeout_secs: u64,
    },

    /// Aggregate publication fingerprints into per-author fingerprints
    AssignAuthors {
        /// Number of authors to process in parallel (default: 8)
        #[arg(long, default_value = "8")]
        concurrency: usize,

        /// Per-author processing deadline in seconds (default: 30)
        #[arg(long, default_value = "30")]
        timeout_secs: u64,
    },

    /// Rank authors against a set of query keyword ids
    Rank {
        /// Keyword ids to query with
        #[arg(required = true)]
        keyword_ids: Vec<i64>,
    },

    /// Show store statistics (row counts and fingerprint coverage)
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("scholarprint=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => {
            let config = Config::load()?;
            info!("Initializing scholarprint database...");
            let conn = open_database(&config)?;
            let table_count = schema::table_count(&conn)?;
            println!("Database initialized at: {}", config.db_path);
            println!("Tables created: {table_count}");
            println!("\nNext step: run `scholarprint import <corpus.json>`");
        }

        Commands::Import { file } => {
            let config = Config::load()?;
            let mut conn = open_database(&config)?;

            println!("Importing corpus from {file}...");
            let reader = BufReader::new(
                File::open(&file).with_context(|| format!("opening {file}"))?,
            );
            let corpus: CorpusFile =
                serde_json::from_reader(reader).with_context(|| format!("parsing {file}"))?;

            queries::import_corpus(&mut conn, &corpus)?;
            println!(
                "Imported {} publications, {} authors, {} authorship links, {} NPMI pairs.",
                corpus.publications.len(),
                corpus.authors.len(),
                corpus.authorship.len(),
                corpus.npmi_pairs.len(),
            );
        }

        Commands::AssignPublications {
            concurrency,
            timeout_secs,
        } => {
            let config = Config::load()?;
            config.require_data_dir()?;
            let mut conn = open_database(&config)?;

            println!("Loading reference data...");
            let reference = Arc::new(ReferenceData::load(&config.data_dir)?);
            let matcher = Arc::new(CandidateMatcher::new(reference.keywords.vocabulary())?);
            let params = Arc::new(PipelineParams {
                unit_timeout_secs: timeout_secs,
                ..PipelineParams::default()
            });

            println!("Assigning publication fingerprints ({concurrency} concurrent)...");
            let summary =
                publication::run(&mut conn, reference, matcher, params, concurrency).await?;
            terminal::display_pass_summary("Publication fingerprinting", &summary);
        }

        Commands::AssignAuthors {
            concurrency,
            timeout_secs,
        } => {
            let config = Config::load()?;
            config.require_data_dir()?;
            let mut conn = open_database(&config)?;

            println!("Loading reference data...");
            let reference = ReferenceData::load(&config.data_dir)?;
            let keywords = Arc::new(reference.keywords);
            let params = Arc::new(PipelineParams {
                unit_timeout_secs: timeout_secs,
                ..PipelineParams::default()
            });

            println!("Aggregating author fingerprints ({concurrency} concurrent)...");
            let summary = author::run(&mut conn, keywords, params, concurrency).await?;
            terminal::display_pass_summary("Author aggregation", &summary);
        }

        Commands::Rank { keyword_ids } => {
            let config = Config::load()?;
            let mut conn = open_database(&config)?;

            println!(
                "Ranking authors for keyword ids {:?}...",
                keyword_ids
            );
            let ranked = ranking::rank_authors(&mut conn, &keyword_ids)?;
            terminal::display_ranked_authors(&ranked);
        }

        Commands::Status => {
            let config = Config::load()?;
            let conn = open_database(&config)?;
            let stats = queries::get_store_stats(&conn)?;

            println!("\n{}", "=== Scholarprint Status ===".bold());
            println!("  Database: {}", config.db_path);
            println!("  Publications: {}", stats.publications);
            println!(
                "    with abstract: {}  fingerprinted: {}",
                stats.publications_with_abstract, stats.fingerprinted_publications
            );
            println!("  Authors: {}", stats.authors);
            println!("    fingerprinted: {}", stats.fingerprinted_authors);
            println!("  NPMI pairs: {}", stats.npmi_pairs);
        }
    }

    Ok(())
}

/// Open the SQLite database and make sure the schema exists.
fn open_database(config: &Config) -> Result<Connection> {
    let conn = Connection::open(&config.db_path)
        .with_context(|| format!("opening database at {}", config.db_path))?;
    schema::create_tables(&conn)?;
    Ok(conn)
}
