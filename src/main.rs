//! # docrag CLI Application
//!
//! Command-line entry point for docrag.
//!
//! ## Subcommands
//!
//! - `serve`: run the HTTP service (`/scrape`, `/query`, `/collections`)
//! - `crawl`: crawl a documentation site once, optionally indexing it
//! - `query`: answer a question from an indexed collection
//! - `list`: list indexed collections
//!
//! Settings can come from flags, `DOCRAG_*` environment variables or a `.env`
//! file. Model-backed operations need `GEMINI_API_KEY`.

mod telemetry;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use chrono::Utc;
use clap::{Args, CommandFactory, Parser, Subcommand};
use docrag::crawler::{CrawlerConfig, HttpFetcher, crawl_website};
use docrag::index::Database;
use docrag::model::{GEMINI_API_KEY_ENV, GeminiClient};
use docrag::rag::{RagOptions, RagSystem, collection_name_for};
use docrag::server::{self, AppState};
use tracing::{info, instrument};
use url::Url;

#[derive(Parser)]
#[command(author, version, about = "Crawl documentation sites and answer questions about them", long_about = None)]
struct Cli {
    /// Path of the libsql index file
    #[arg(long, global = true, env = "DOCRAG_DATABASE", default_value = ".docrag/index.db")]
    database: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP service
    Serve(ServeArgs),

    /// Crawl a documentation site
    Crawl(CrawlArgs),

    /// Answer a question from an indexed collection
    Query(QueryArgs),

    /// List indexed collections
    List(ListArgs),
}

#[derive(Args, Debug, Clone)]
struct CrawlOptions {
    /// Maximum number of pages to visit
    #[arg(long, default_value = "100")]
    max_pages: usize,

    /// Delay between requests in milliseconds
    #[arg(long, default_value = "1000")]
    delay_ms: u64,

    /// Per-request timeout in seconds
    #[arg(long, default_value = "10")]
    timeout_secs: u64,
}

impl CrawlOptions {
    fn to_config(&self) -> CrawlerConfig {
        CrawlerConfig::builder()
            .max_pages(self.max_pages)
            .rate_limit_ms(self.delay_ms)
            .timeout_secs(self.timeout_secs)
            .build()
    }
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Address to bind
    #[arg(long, env = "DOCRAG_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on
    #[arg(short, long, env = "DOCRAG_PORT", default_value = "5000")]
    port: u16,

    #[command(flatten)]
    crawl: CrawlOptions,

    /// Maximum chunk size in characters
    #[arg(long, default_value = "1000")]
    chunk_size: usize,

    /// Number of chunks retrieved per question
    #[arg(short = 'n', long, default_value = "3")]
    results: usize,

    /// Use the lower free tier model quotas
    #[arg(long)]
    free_tier: bool,
}

#[derive(Args, Debug)]
struct CrawlArgs {
    /// URL to start crawling from
    #[arg(required = true)]
    url: String,

    #[command(flatten)]
    crawl: CrawlOptions,

    /// Output format
    #[arg(short, long, default_value = "markdown", value_parser = ["markdown", "html", "json"])]
    format: String,

    /// Write the output to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Also index the crawled pages into a new collection
    #[arg(long)]
    index: bool,

    /// Maximum chunk size in characters when indexing
    #[arg(long, default_value = "1000")]
    chunk_size: usize,

    /// Use the lower free tier model quotas
    #[arg(long)]
    free_tier: bool,
}

#[derive(Args, Debug)]
struct QueryArgs {
    /// Collection to search
    #[arg(required = true)]
    collection: String,

    /// Question to answer
    #[arg(required = true)]
    question: String,

    /// Number of chunks retrieved
    #[arg(short = 'n', long, default_value = "3")]
    results: usize,

    /// Print the retrieved chunks after the answer
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Use the lower free tier model quotas
    #[arg(long)]
    free_tier: bool,
}

#[derive(Args, Debug)]
struct ListArgs {
    /// Output format
    #[arg(short, long, default_value = "text", value_parser = ["text", "json"])]
    format: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let _otel = telemetry::init_tracing_subscriber()?;

    match cli.command {
        Some(Commands::Serve(args)) => {
            serve_command(&cli.database, args).await?;
        }
        Some(Commands::Crawl(args)) => {
            crawl_command(&cli.database, args).await?;
        }
        Some(Commands::Query(args)) => {
            query_command(&cli.database, args).await?;
        }
        Some(Commands::List(args)) => {
            list_command(&cli.database, args).await?;
        }
        None => {
            Cli::command().print_help()?;
        }
    }

    Ok(())
}

async fn open_database(path: &Path) -> anyhow::Result<Database> {
    Database::new_from_path(&path.to_string_lossy())
        .await
        .with_context(|| format!("Failed to open index at {}", path.display()))
}

fn require_client(free_tier: bool) -> anyhow::Result<GeminiClient> {
    GeminiClient::gemini_from_env(free_tier)
        .ok_or_else(|| anyhow!("{} environment variable must be set", GEMINI_API_KEY_ENV))
}

#[instrument(skip(args))]
async fn serve_command(database: &Path, args: ServeArgs) -> anyhow::Result<()> {
    let db = open_database(database).await?;
    let client = GeminiClient::gemini_from_env(args.free_tier);
    let rag_options = RagOptions::builder()
        .chunk_size(args.chunk_size)
        .top_k(args.results)
        .build();

    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", args.host, args.port))?;

    let state = AppState::new(db, client, args.crawl.to_config(), rag_options)?;
    server::serve(state, addr).await?;

    Ok(())
}

#[instrument(skip(args), fields(url = %args.url))]
async fn crawl_command(database: &Path, args: CrawlArgs) -> anyhow::Result<()> {
    let start = Url::parse(&args.url).with_context(|| format!("Invalid URL {}", args.url))?;
    // Fail before crawling rather than after
    let client = if args.index {
        Some(require_client(args.free_tier)?)
    } else {
        None
    };

    let config = args.crawl.to_config();
    let fetcher = HttpFetcher::new(&config)?;
    eprintln!("Crawling {}...", start);
    let report = crawl_website(&fetcher, start.as_str(), &config).await?;
    eprintln!(
        "Crawled {} pages ({} with content, {} failed)",
        report.visited,
        report.records.len(),
        report.failed.len()
    );

    let rendered = match args.format.as_str() {
        "html" => report.to_html(),
        "json" => serde_json::to_string_pretty(&report)?,
        _ => report.to_markdown(),
    };

    match &args.output {
        Some(output_file) => {
            tokio::fs::write(output_file, rendered).await?;
            eprintln!("Saved crawled content to {}", output_file.display());
        }
        None => println!("{}", rendered),
    }

    if let Some(client) = client {
        let db = open_database(database).await?;
        let options = RagOptions::builder().chunk_size(args.chunk_size).build();

        let rag = RagSystem::create_fresh(
            db,
            client,
            &collection_name_for(&start, Utc::now()),
            options,
        )
        .await?;
        let chunks = rag.add_records_or_discard(&report.records).await?;
        info!("Indexed {} chunks", chunks);
        eprintln!("Indexed {} chunks into collection {}", chunks, rag.collection());
    }

    Ok(())
}

#[instrument(skip(args), fields(collection = %args.collection))]
async fn query_command(database: &Path, args: QueryArgs) -> anyhow::Result<()> {
    let client = require_client(args.free_tier)?;
    let db = open_database(database).await?;

    let rag = RagSystem::existing(db, client, &args.collection, RagOptions::default()).await?;
    let (answer, result) = rag.answer(&args.question, args.results).await;

    println!("{}", answer);

    if args.verbose {
        for (i, chunk) in result.matches.iter().enumerate() {
            println!("\n--- [{}] {} (distance {:.4})", i + 1, chunk.id, chunk.distance);
            if let Some(url) = &chunk.metadata.url {
                println!("Source: {}", url);
            }
            println!("{}", chunk.document);
        }
    }

    Ok(())
}

#[instrument(skip(args))]
async fn list_command(database: &Path, args: ListArgs) -> anyhow::Result<()> {
    let db = open_database(database).await?;
    let collections = db.collection_summaries().await?;

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&collections)?);
        return Ok(());
    }

    if collections.is_empty() {
        println!("No collections indexed yet.");
        return Ok(());
    }

    for collection in collections {
        println!(
            "{}  {}  {} chunks",
            collection.name,
            collection.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
            collection.chunks
        );
    }

    Ok(())
}
