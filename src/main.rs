//! Img-Harvest main entry point
//!
//! This is the command-line interface for the Img-Harvest image crawler.

use anyhow::Context;
use clap::Parser;
use img_harvest::config::{load_config_with_hash, Config};
use img_harvest::crawler::Coordinator;
use img_harvest::output::{
    generate_markdown_report, print_statistics, LoggingObserver, RunReport, RunStatistics,
};
use img_harvest::url::UrlSetGenerator;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Img-Harvest: a selector-driven image crawler
///
/// Img-Harvest expands a URL pattern into a set of pages, collects images
/// matching CSS selectors on each page, and downloads them into a local
/// directory tree.
#[derive(Parser, Debug)]
#[command(name = "img-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A selector-driven image crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and list the pages that would be fetched
    #[arg(long, conflicts_with = "report")]
    dry_run: bool,

    /// Write a markdown run report to this path
    #[arg(long, value_name = "PATH")]
    report: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        return handle_dry_run(&config);
    }

    handle_crawl(config, &config_hash, cli.report).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("img_harvest=info,warn"),
            1 => EnvFilter::new("img_harvest=debug,info"),
            2 => EnvFilter::new("img_harvest=trace,debug"),
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

/// Handles the --dry-run mode: shows the configuration and the URL set
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    let generator = UrlSetGenerator::new(config);
    let urls = generator.generate_urls()?;

    println!("=== Img-Harvest Dry Run ===\n");
    println!("{}\n", generator.validate_pattern()?);

    println!("Selectors ({}):", config.selectors.len());
    for selector in &config.selectors {
        println!("  - {}", selector);
    }

    println!("\nOutput:");
    println!("  Save path: {}", config.save_path.display());
    println!("  Subfolder per host: {}", config.create_subfolder);
    println!("  Overwrite: {}", config.overwrite);
    println!("  Filename pattern: {}", config.filename_pattern);
    println!(
        "  Concurrency: {} pages / {} downloads",
        config.page_concurrency(),
        config.download_concurrency()
    );

    println!("\nPages ({}):", urls.len());
    for url in &urls {
        println!("  {}", url);
    }

    println!("\n✓ Configuration is valid");
    Ok(())
}

/// Runs the crawl, printing statistics and optionally writing a report
async fn handle_crawl(
    config: Config,
    config_hash: &str,
    report: Option<PathBuf>,
) -> anyhow::Result<()> {
    let mut coordinator = Coordinator::new(config).with_observer(LoggingObserver);

    let handle = coordinator.handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing in-flight requests");
            handle.stop();
        }
    });

    let results = coordinator.crawl().await.context("Crawl failed")?;

    println!();
    print_statistics(&RunStatistics::from_results(&results));

    if let Some(path) = report {
        let run_report = RunReport::new(coordinator.config(), coordinator.state(), &results)
            .with_config_hash(config_hash);
        generate_markdown_report(&run_report, &path)
            .with_context(|| format!("Failed to write report {}", path.display()))?;
        tracing::info!("Report written to {}", path.display());
    }

    Ok(())
}
