//! Robotgate main entry point
//!
//! This is the command-line interface for checking URLs against their
//! hosts' robots.txt rules.

use anyhow::Context;
use clap::Parser;
use robotgate::config::{load_config, Config};
use robotgate::{HttpFetcher, RobotsCache};
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Robotgate: robots.txt checks for crawlers
///
/// Fetches the robots.txt of every host named on the command line (once per
/// host) and reports whether the given agent may crawl each URL.
#[derive(Parser, Debug)]
#[command(name = "robotgate")]
#[command(version)]
#[command(about = "Check URLs against robots.txt rules", long_about = None)]
struct Cli {
    /// URLs to check
    #[arg(value_name = "URL", required = true)]
    urls: Vec<String>,

    /// User agent to check the rules for
    #[arg(short, long)]
    agent: String,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Also print the sitemaps of each host
    #[arg(long)]
    sitemaps: bool,

    /// Also print the crawl delay of each host
    #[arg(long)]
    delay: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?
        }
        None => Config::default(),
    };

    let fetcher =
        HttpFetcher::from_config(&config.fetcher).context("Failed to build HTTP client")?;
    let cache = RobotsCache::from_config(fetcher, &config.cache);

    for url in &cli.urls {
        let verdict = match cache.allowed(url, &cli.agent).await {
            Ok(true) => "allowed",
            Ok(false) => "disallowed",
            Err(e) => {
                tracing::error!("Could not check {}: {}", url, e);
                "error"
            }
        };
        println!("{}\t{}", verdict, url);
    }

    if cli.delay || cli.sitemaps {
        report_hosts(&cache, &cli).await;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("robotgate=warn,warn"),
            1 => EnvFilter::new("robotgate=info,warn"),
            2 => EnvFilter::new("robotgate=debug,info"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Prints the crawl delay and sitemaps of every distinct host
async fn report_hosts(cache: &RobotsCache, cli: &Cli) {
    let hosts: BTreeSet<String> = cli
        .urls
        .iter()
        .filter_map(|url| robotgate::robots_url(url).ok())
        .collect();

    for host in hosts {
        let rules = match cache.get(&host).await {
            Ok(rules) => rules,
            Err(e) => {
                tracing::error!("No rules for {}: {}", host, e);
                continue;
            }
        };

        println!("\n{}", host);
        if cli.delay {
            match rules.delay(&cli.agent) {
                Some(delay) => println!("  crawl-delay: {}s", delay),
                None => println!("  crawl-delay: none"),
            }
        }
        if cli.sitemaps {
            for sitemap in rules.sitemaps() {
                println!("  sitemap: {}", sitemap);
            }
        }
    }
}
