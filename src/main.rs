//! Listing Harvest main entry point
//!
//! This is the command-line interface for the Listing Harvest crawler.

use anyhow::{bail, Context};
use clap::Parser;
use listing_harvest::config::{load_config_with_hash, validate, Config};
use listing_harvest::crawler::{Coordinator, SiteSettings};
use listing_harvest::output::{JsonLinesSink, MultiSink, SqliteSink};
use listing_harvest::storage::SqliteStorage;
use listing_harvest::SearchQuery;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Listing Harvest: a business-listing crawler
///
/// Listing Harvest walks the search results for a category and location,
/// then fetches each organic listing's review sample and website link,
/// writing one record per business.
#[derive(Parser, Debug)]
#[command(name = "listing-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A business-listing crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Override the search category from the config file
    #[arg(long)]
    category: Option<String>,

    /// Override the search location from the config file
    #[arg(long)]
    location: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show the first search request without crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics for the latest run in the database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.category.is_some() || cli.location.is_some() {
        if let Some(category) = cli.category {
            config.search.category = category;
        }
        if let Some(location) = cli.location {
            config.search.location = location;
        }
        validate(&config).context("invalid command-line override")?;
    }

    if cli.dry_run {
        handle_dry_run(&config)
    } else if cli.stats {
        handle_stats(&config)
    } else {
        handle_crawl(&config, &config_hash).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("listing_harvest=info,warn"),
            1 => EnvFilter::new("listing_harvest=debug,info"),
            2 => EnvFilter::new("listing_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows the first request
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    let site = SiteSettings::from_config(&config.site)?;
    let query = SearchQuery::new(&config.search.category, &config.search.location);
    let request = site.search_request(&query);
    let first_url = url::Url::parse_with_params(&request.url, &request.params)
        .context("failed to build search URL")?;

    println!("=== Listing Harvest Dry Run ===\n");

    println!("Search:");
    println!("  Category: {}", config.search.category);
    println!("  Location: {}", config.search.location);
    println!("  First request: {}", first_url);

    println!("\nSite:");
    println!("  Base URL: {}", site.base_url());
    println!("  Reviews per business: {}", site.comments_limit());
    println!(
        "  Review feed: {} / {}",
        config.site.review_language, config.site.review_order
    );

    println!("\nCrawler Configuration:");
    println!(
        "  Max concurrent requests: {}",
        config.crawler.max_concurrent_requests
    );
    println!(
        "  Minimum request interval: {}ms",
        config.crawler.minimum_request_interval
    );
    println!(
        "  Retries: {} ({}ms apart)",
        config.crawler.max_retries, config.crawler.retry_delay
    );
    println!("  Request timeout: {}s", config.crawler.request_timeout);
    match config.crawler.max_pages {
        0 => println!("  Max search pages: unlimited"),
        pages => println!("  Max search pages: {}", pages),
    }

    println!("\nUser Agent:");
    println!("  Name: {}", config.user_agent.crawler_name);
    println!("  Version: {}", config.user_agent.crawler_version);
    println!("  Contact URL: {}", config.user_agent.contact_url);
    println!("  Contact Email: {}", config.user_agent.contact_email);

    println!("\nOutput:");
    if let Some(path) = &config.output.jsonl_path {
        println!("  JSON Lines: {}", path);
    }
    if let Some(path) = &config.output.database_path {
        println!("  Database: {}", path);
    }

    println!("\n✓ Configuration is valid");

    Ok(())
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    use listing_harvest::output::{load_statistics, print_statistics};

    let Some(database_path) = &config.output.database_path else {
        bail!("--stats requires [output] database-path in the configuration");
    };

    println!("Database: {}\n", database_path);

    let storage = SqliteStorage::new(Path::new(database_path))
        .with_context(|| format!("failed to open database {}", database_path))?;

    match load_statistics(&storage)? {
        Some(stats) => print_statistics(&stats),
        None => println!("No runs recorded yet."),
    }

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: &Config, config_hash: &str) -> anyhow::Result<()> {
    let query = SearchQuery::new(&config.search.category, &config.search.location);
    let mut sink = MultiSink::new();

    if let Some(path) = &config.output.jsonl_path {
        let jsonl = JsonLinesSink::create(Path::new(path))
            .with_context(|| format!("failed to create {}", path))?;
        tracing::info!("Writing records to {}", path);
        sink.push(Box::new(jsonl));
    }

    if let Some(path) = &config.output.database_path {
        let storage = SqliteStorage::new(Path::new(path))
            .with_context(|| format!("failed to open database {}", path))?;
        sink.push(Box::new(SqliteSink::start(storage, config_hash, &query)?));
    }

    let coordinator = Coordinator::from_config(config)?;
    let report = match coordinator.run(query, &mut sink).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            return Err(e.into());
        }
    };

    println!(
        "Harvested {} records ({} with websites) from {} search pages in {}s",
        report.records_emitted,
        report.websites_found,
        report.pages_fetched,
        report.duration_seconds().unwrap_or(0)
    );
    if report.chains_failed() > 0 {
        println!("{} listings could not be completed:", report.chains_failed());
        for failure in &report.failures {
            println!("  - {}", failure);
        }
    }

    if let Some(failure) = &report.aborted_by {
        bail!("crawl aborted: {}", failure);
    }

    Ok(())
}
