use std::time::{Duration, Instant};
use chrono::{DateTime, Utc};
use tracing::info;

use crate::crawler::PageReport;

/// Counters collected over one scraping run
#[derive(Debug)]
pub struct RunMetrics {
    /// Wall-clock start of the run
    started_at: DateTime<Utc>,

    /// Monotonic start used for the elapsed time
    start: Instant,

    summary: RunSummary,
}

/// Final numbers of a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Date pages found on the index page
    pub pages_found: usize,

    pub pages_processed: usize,

    /// Date pages whose fetch failed
    pub pages_skipped: usize,

    pub images_downloaded: usize,
    pub images_failed: usize,
    pub bytes_downloaded: u64,
}

impl RunMetrics {
    /// Start collecting metrics for a run
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            start: Instant::now(),
            summary: RunSummary::default(),
        }
    }

    pub fn record_pages_found(&mut self, count: usize) {
        self.summary.pages_found = count;
    }

    pub fn record_page_skipped(&mut self) {
        self.summary.pages_skipped += 1;
    }

    /// Fold a finished page into the totals
    pub fn record_page(&mut self, report: &PageReport) {
        self.summary.pages_processed += 1;
        self.summary.images_downloaded += report.downloaded;
        self.summary.images_failed += report.failed;
        self.summary.bytes_downloaded += report.bytes;
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Log the totals and hand back the summary
    pub fn finish(self) -> RunSummary {
        info!(
            started_at = %self.started_at.to_rfc3339(),
            elapsed_ms = self.elapsed().as_millis() as u64,
            pages_found = self.summary.pages_found,
            pages_processed = self.summary.pages_processed,
            pages_skipped = self.summary.pages_skipped,
            images_downloaded = self.summary.images_downloaded,
            images_failed = self.summary.images_failed,
            bytes_downloaded = self.summary.bytes_downloaded,
            "Run finished"
        );
        self.summary
    }
}

impl Default for RunMetrics {
    fn default() -> Self {
        Self::new()
    }
}
