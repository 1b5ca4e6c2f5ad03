use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use marketplace_price_scraper::config::{ConfigManager, FileConfigManager};
use marketplace_price_scraper::scraper::{MarketLinks, ScraperManager, ScraperRegistry};

/// Looks up current product prices on Brazilian marketplaces.
#[derive(Parser, Debug)]
#[command(name = "marketplace-price-scraper")]
#[command(version)]
struct Cli {
    #[arg(short, long, default_value = "config.toml", help = "Path to the TOML configuration file")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scrape each URL and print the results as a JSON array, in input order
    Scrape {
        #[arg(required = true)]
        urls: Vec<String>,
    },
    /// Read `{"marketplace": [urls]}` JSON and print the lowest price per marketplace
    Markets {
        #[arg(help = "JSON file with the links, or '-' for stdin")]
        input: String,
    },
    /// List the registered scrapers in match order
    Scrapers,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries the JSON output
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = FileConfigManager::new(cli.config.clone())
        .load_config()
        .await
        .map_err(|e| anyhow!(e))
        .with_context(|| format!("loading {}", cli.config.display()))?;
    let registry = ScraperRegistry::from_config(&config).map_err(|e| anyhow!(e))?;

    match cli.command {
        Commands::Scrapers => {
            for name in registry.names() {
                println!("{}", name);
            }
        }
        Commands::Scrape { urls } => {
            let manager = ScraperManager::new(registry);
            let results = manager.scrape_multiple_prices(&urls).await;
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
        Commands::Markets { input } => {
            let links = read_links(&input)?;
            let manager = ScraperManager::new(registry);
            let prices = manager.scrape_all_markets(&links).await;
            println!("{}", serde_json::to_string_pretty(&prices)?);
        }
    }

    Ok(())
}

fn read_links(input: &str) -> anyhow::Result<MarketLinks> {
    let raw = if input == "-" {
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        std::fs::read_to_string(input).with_context(|| format!("reading {}", input))?
    };

    serde_json::from_str(&raw).context("expected a JSON object of marketplace -> list of URLs")
}
