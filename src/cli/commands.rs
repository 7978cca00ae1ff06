use anyhow::{Result, Context};
use tracing::{info, warn};

use crate::cli::config::{ScraperConfig, OUTPUT_DIR};
use crate::crawler::CrawlerController;

/// Scrape the whole archive into the output directory
pub async fn scrape(config: ScraperConfig) -> Result<()> {
    let controller = CrawlerController::new(config, OUTPUT_DIR)
        .context("Failed to initialize scraper")?;

    let summary = controller.run().await
        .context("Scraping run aborted")?;

    if summary.pages_skipped > 0 || summary.images_failed > 0 {
        warn!(
            "{} pages and {} images could not be fetched",
            summary.pages_skipped, summary.images_failed
        );
    }

    info!(
        "Saved {} images from {} pages to {}",
        summary.images_downloaded,
        summary.pages_processed,
        controller.output_dir().display()
    );

    Ok(())
}
