pub mod commands;
pub mod config;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use config::ScraperConfig;

/// Download every wallpaper in the archive, newest date first
///
/// Settings are read from `config.yaml` in the user config directory when it
/// exists. Images are written to `images/bing-wallpapers`.
#[derive(Parser)]
#[command(author, version, about)]
pub struct Cli {}

/// Parse command line arguments
pub fn parse_args() -> Cli {
    Cli::parse()
}

/// Process the command
pub async fn process_command(_cli: Cli, config: ScraperConfig) -> Result<()> {
    info!("Scraping {} into {}", config.site.base_url, config::OUTPUT_DIR);
    commands::scrape(config).await
}
