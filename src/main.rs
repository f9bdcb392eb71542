//! jobscrape CLI entry point

use anyhow::{Context, Result};
use clap::Parser;
use jobscrape::{
    config::Config,
    scrape::{writer, ArtifactWriter, Dispatcher, FailurePolicy, JobClient},
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;
use url::Url;

#[derive(Parser)]
#[command(name = "jobscrape")]
#[command(about = "Concurrent scraper for paginated job listings")]
#[command(version)]
struct Cli {
    /// Job to search for, e.g. "Software Engineer"
    #[arg(short, long)]
    query: String,

    /// Location to search in, e.g. "Greater Manchester"
    #[arg(short, long)]
    location: String,

    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Number of listing pages to scrape (overrides config)
    #[arg(long)]
    pages: Option<u32>,

    /// Worker pool size (overrides config)
    #[arg(long)]
    workers: Option<usize>,

    /// Output directory (overrides config)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Skip failing jobs and pages instead of aborting the run
    #[arg(long)]
    keep_going: bool,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = match cli.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Load or create config, then apply CLI overrides
    let mut config = if cli.config.exists() {
        Config::load(&cli.config)?
    } else {
        Config::default()
    };

    if let Some(pages) = cli.pages {
        config.crawl.page_limit = pages;
    }
    if let Some(workers) = cli.workers {
        config.crawl.workers = workers;
    }
    if let Some(output) = cli.output {
        config.output.root = output;
    }
    if cli.keep_going {
        config.crawl.on_error = FailurePolicy::Skip;
    }
    config.validate()?;

    let base_url = Url::parse(&config.crawl.base_url).context("Invalid base URL")?;

    // Ensure the output root exists and is empty
    writer::reset_output_root(&config.output.root).with_context(|| {
        format!(
            "Failed to reset output directory '{}'",
            config.output.root.display()
        )
    })?;
    info!("Writing artifacts to {}", config.output.root.display());

    let client = Arc::new(JobClient::new(base_url, &config.fetch)?);
    let artifacts = Arc::new(ArtifactWriter::new(config.output.root.clone()));
    let dispatcher = Dispatcher::new(config.crawl.clone(), client, artifacts);

    let stats = dispatcher.run(&cli.query, &cli.location).await?;

    println!("\nCrawl Summary:");
    println!("  Pages crawled: {}", stats.pages_crawled);
    if stats.pages_failed > 0 {
        println!("  Pages failed: {}", stats.pages_failed);
    }
    println!("  Jobs found: {}", stats.jobs_found);
    println!("  Jobs written: {}", stats.jobs_written);
    if stats.jobs_skipped > 0 {
        println!("  Jobs skipped: {}", stats.jobs_skipped);
    }

    Ok(())
}
