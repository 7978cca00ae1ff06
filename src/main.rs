use anyhow::Result;
use tracing::{info, error};

mod cli;
mod crawler;
mod error;
mod identity;
mod net;
mod storage;
mod utils;

use cli::config::ScraperConfig;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = cli::parse_args();

    let (config, source) = ScraperConfig::load_default()?;

    // Initialize logging
    utils::init_logging(&config.logging)?;

    info!("Starting wallpaper scraper v{}", env!("CARGO_PKG_VERSION"));
    match source {
        Some(path) => info!("Loaded configuration from {}", path.display()),
        None => info!(
            "No configuration at {}, using defaults",
            ScraperConfig::default_path().display()
        ),
    }

    match cli::process_command(args, config).await {
        Ok(_) => {
            info!("All done");
            Ok(())
        }
        Err(e) => {
            error!("Scraping failed: {:#}", e);
            Err(e)
        }
    }
}
