//! doc-mirror main entry point
//!
//! This is the command-line interface for the doc-mirror site mirror.

use anyhow::{bail, Context};
use clap::Parser;
use doc_mirror::config::{load_config_with_hash, Config};
use doc_mirror::crawler::{build_http_client, Coordinator};
use doc_mirror::output::{PreflightReport, WriterCapabilities};
use doc_mirror::paths::PlatformPolicy;
use doc_mirror::render::{open_renderer, share};
use doc_mirror::url::site_url;
use doc_mirror::DocsError;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// doc-mirror: mirror a documentation site as PDFs
///
/// doc-mirror discovers every page of a documentation site (sitemap first,
/// navigation links as a last resort), extracts the main content of each
/// page and saves it as a PDF, or as HTML when no PDF writer is available,
/// under a directory tree that follows the site's URL structure.
#[derive(Parser, Debug)]
#[command(name = "doc-mirror")]
#[command(version = "1.0.0")]
#[command(about = "Mirror a documentation site as PDFs", long_about = None)]
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

    /// Validate config and show what would be crawled without crawling
    #[arg(long, conflicts_with = "check")]
    dry_run: bool,

    /// Check the PDF writer, output directory and free space, then exit
    #[arg(long, conflicts_with = "dry_run")]
    check: bool,

    /// Process at most this many pages (smoke test)
    #[arg(long, value_name = "N")]
    limit: Option<usize>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config, cli.limit)?;
    } else if cli.check {
        handle_check(&config).await?;
    } else {
        handle_crawl(config, cli.limit).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("doc_mirror=info,warn"),
            1 => EnvFilter::new("doc_mirror=debug,info"),
            2 => EnvFilter::new("doc_mirror=trace,debug"),
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

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config, limit: Option<usize>) -> anyhow::Result<()> {
    let policy = PlatformPolicy::current();
    let sitemap = site_url(&config.crawler.base_url, &config.discovery.sitemap_path)?;

    println!("=== doc-mirror Dry Run ===\n");

    println!("Site:");
    println!("  Base URL: {}", config.crawler.base_url);
    println!("  Docs path: {}", config.crawler.docs_path);
    println!("  Sitemap: {}", sitemap);
    println!(
        "  Max sitemap depth: {}",
        config.discovery.max_sitemap_depth
    );

    println!("\nCrawler:");
    println!(
        "  Politeness delay: {}ms",
        config.crawler.politeness_delay_ms
    );
    println!(
        "  Page load timeout: {}s",
        config.crawler.page_load_timeout_secs
    );
    match (config.crawler.max_pages, limit) {
        (None, None) => println!("  Page limit: none"),
        (max_pages, limit) => println!(
            "  Page limit: {}",
            max_pages.into_iter().chain(limit).min().unwrap_or_default()
        ),
    }
    println!(
        "  Retries: {} attempts, {}ms base delay, {}ms cap",
        config.retry.max_attempts, config.retry.base_delay_ms, config.retry.max_delay_ms
    );
    println!("  Renderer: {:?}", config.renderer.kind);
    println!("  User agent: {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Directory: {}", config.output.output_dir);
    println!("  Writer strategy: {:?}", config.writer.strategy);
    println!("  Min free space: {} MiB", config.output.min_free_space_mb);

    println!("\nPlatform Policy:");
    println!("  Max path length: {}", policy.max_path_len);
    println!("  Max directory segment: {}", policy.max_dir_segment_len);
    println!("  Max file name: {}", policy.max_filename_len);
    println!("  Preferred writer: {:?}", policy.preferred_writer);

    println!("\n✓ Configuration is valid");
    println!("✓ Would start discovery at {}", sitemap);

    Ok(())
}

/// Handles the --check mode: probes writers and the output directory
async fn handle_check(config: &Config) -> anyhow::Result<()> {
    let timeout = config.crawler.page_load_timeout();
    let client = build_http_client(&config.user_agent, timeout)?;
    let renderer = share(open_renderer(&config.renderer, client, timeout).await?);

    let policy = PlatformPolicy::current();
    let capabilities = WriterCapabilities::detect(&config.writer, &policy, &renderer).await;
    let report = PreflightReport::run(
        &capabilities,
        Path::new(&config.output.output_dir),
        config.output.min_free_space_bytes(),
    )
    .await;

    if let Err(e) = renderer.lock().await.close().await {
        tracing::warn!("Failed to close renderer: {}", e);
    }

    report.print();
    if !report.is_ready() {
        bail!("environment is not ready for a crawl");
    }
    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, limit: Option<usize>) -> anyhow::Result<()> {
    tracing::info!(
        "Mirroring {}{} into {}",
        config.crawler.base_url,
        config.crawler.docs_path,
        config.output.output_dir
    );

    let mut coordinator = Coordinator::new(config).await?.with_limit(limit);

    match coordinator.run().await {
        Ok(summary) => {
            summary.print();
            Ok(())
        }
        Err(DocsError::Interrupted) => {
            println!("\nScraping interrupted by user\n");
            if let Some(summary) = coordinator.summary() {
                summary.print();
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
