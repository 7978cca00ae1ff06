use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::cli::config::ScraperConfig;
use crate::crawler::Scheduler;
use crate::crawler::task::plan_image_tasks;
use crate::crawler::{ImageTask, PageReport};
use crate::error::ScrapeError;
use crate::net::HttpSession;
use crate::storage::download_image;
use crate::utils::{RunMetrics, RunSummary};

/// Drives a scraping run: index page, then each date page in turn
pub struct CrawlerController {
    config: ScraperConfig,
    session: Arc<HttpSession>,
    scheduler: Scheduler,
    output_dir: PathBuf,
}

impl CrawlerController {
    /// Create a new crawler controller writing images to `output_dir`
    pub fn new(config: ScraperConfig, output_dir: impl Into<PathBuf>) -> Result<Self, ScrapeError> {
        let session = Arc::new(HttpSession::from_config(&config)?);
        let scheduler = Scheduler::new(&config.site);

        Ok(Self {
            config,
            session,
            scheduler,
            output_dir: output_dir.into(),
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Run the whole pipeline
    ///
    /// Only a failed index fetch aborts the run. Date pages are processed
    /// newest first, one at a time; all downloads of a page finish before
    /// the next page is fetched.
    pub async fn run(&self) -> Result<RunSummary, ScrapeError> {
        let mut metrics = RunMetrics::new();

        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|source| ScrapeError::OutputDir {
                path: self.output_dir.clone(),
                source,
            })?;

        let base_url = self.scheduler.base_url();
        let index = self.session
            .fetch(base_url)
            .await
            .ok_or_else(|| ScrapeError::IndexUnavailable {
                url: base_url.to_string(),
            })?;

        let page_links = self.scheduler.page_links(&index.body);
        metrics.record_pages_found(page_links.len());
        info!("Found {} date pages on {}", page_links.len(), base_url);

        for page_url in &page_links {
            match self.process_page(page_url).await {
                Some(report) => metrics.record_page(&report),
                None => metrics.record_page_skipped(),
            }
        }

        info!("All images downloaded");
        Ok(metrics.finish())
    }

    /// Fetch one date page and download its images
    ///
    /// Returns `None` when the page itself could not be fetched.
    pub async fn process_page(&self, page_url: &str) -> Option<PageReport> {
        let page_id = self.scheduler.page_id(page_url);
        info!("Downloading images for {}", page_id);

        let page = self.session.fetch(page_url).await?;
        debug!("Fetched {} ({})", page.url, page.status);
        let links = self.scheduler.image_links(&page.body);
        debug!("Found {} image links on {}", links.len(), page_id);

        let tasks = plan_image_tasks(&page_id, links, &self.output_dir);
        let report = self.dispatch_downloads(&page_id, tasks).await;

        info!(
            downloaded = report.downloaded,
            failed = report.failed,
            "Images for {} complete",
            page_id
        );
        Some(report)
    }

    /// Download every task with at most `workers` in flight, then return
    async fn dispatch_downloads(&self, page_id: &str, tasks: Vec<ImageTask>) -> PageReport {
        let mut report = PageReport {
            page_id: page_id.to_string(),
            dispatched: tasks.len(),
            ..Default::default()
        };

        let chunk_size = self.config.download.chunk_size;
        let mut downloads = stream::iter(tasks)
            .map(|task| {
                let session = Arc::clone(&self.session);
                tokio::spawn(async move {
                    let result = download_image(&session, &task.url, &task.path, chunk_size).await;
                    (task, result)
                })
            })
            .buffer_unordered(self.config.download.workers.max(1));

        while let Some(joined) = downloads.next().await {
            match joined {
                Ok((task, Ok(bytes))) => {
                    debug!("Downloaded {} to {}", task.url, task.path.display());
                    report.downloaded += 1;
                    report.bytes += bytes;
                }
                Ok((task, Err(e))) => {
                    error!("Failed to download image {}: {}", task.url, e);
                    report.failed += 1;
                }
                Err(e) => {
                    error!("Download worker for {} failed: {}", page_id, e);
                    report.failed += 1;
                }
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::config::SiteSettings;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn create_test_config(server: &MockServer) -> ScraperConfig {
        ScraperConfig {
            site: SiteSettings {
                base_url: format!("{}/", server.uri()),
                image_host: format!("{}/th", server.uri()),
            },
            ..ScraperConfig::default()
        }
    }

    fn anchors(hrefs: &[String]) -> String {
        let body: String = hrefs
            .iter()
            .map(|href| format!("<a href=\"{}\">link</a>\n", href))
            .collect();
        format!("<html><body>{}</body></html>", body)
    }

    async fn mount_html(server: &MockServer, page: &str, html: String) {
        Mock::given(method("GET"))
            .and(path(page))
            .respond_with(ResponseTemplate::new(200).set_body_string(html))
            .mount(server)
            .await;
    }

    async fn mount_image(server: &MockServer, id: &str, body: &[u8], delay_ms: u64) {
        Mock::given(method("GET"))
            .and(path("/th"))
            .and(query_param("id", id))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(body.to_vec())
                    .set_delay(Duration::from_millis(delay_ms)),
            )
            .mount(server)
            .await;
    }

    fn image_href(server: &MockServer, id: &str) -> String {
        format!("{}/th?id={}", server.uri(), id)
    }

    async fn requested_paths(server: &MockServer) -> Vec<String> {
        server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .map(|r| r.url.path().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_index_failure_is_fatal() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("images");
        let controller = CrawlerController::new(create_test_config(&server), &out).unwrap();

        let result = controller.run().await;
        assert!(matches!(result, Err(ScrapeError::IndexUnavailable { .. })));
        assert_eq!(requested_paths(&server).await, vec!["/"]);
        assert_eq!(std::fs::read_dir(&out).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_pages_processed_newest_first() {
        let server = MockServer::start().await;
        mount_html(
            &server,
            "/",
            anchors(&[
                "2024-01-01.html".to_string(),
                "about.html".to_string(),
                "2024-01-02.html".to_string(),
            ]),
        )
        .await;
        mount_html(&server, "/2024-01-01.html", anchors(&[])).await;
        mount_html(&server, "/2024-01-02.html", anchors(&[])).await;

        let dir = tempfile::tempdir().unwrap();
        let controller = CrawlerController::new(create_test_config(&server), dir.path()).unwrap();
        let summary = controller.run().await.unwrap();

        assert_eq!(summary.pages_found, 2);
        assert_eq!(summary.pages_processed, 2);
        assert_eq!(
            requested_paths(&server).await,
            vec!["/", "/2024-01-02.html", "/2024-01-01.html"]
        );
    }

    #[tokio::test]
    async fn test_images_numbered_in_link_order() {
        let server = MockServer::start().await;
        mount_html(&server, "/", anchors(&["2024-01-02.html".to_string()])).await;
        mount_html(
            &server,
            "/2024-01-02.html",
            anchors(&[
                image_href(&server, "first"),
                "https://elsewhere.example/th?id=skip".to_string(),
                image_href(&server, "second"),
                image_href(&server, "third"),
            ]),
        )
        .await;
        // The first image finishes last
        mount_image(&server, "first", b"one", 300).await;
        mount_image(&server, "second", b"two", 0).await;
        mount_image(&server, "third", b"three", 50).await;

        let dir = tempfile::tempdir().unwrap();
        let controller = CrawlerController::new(create_test_config(&server), dir.path()).unwrap();
        let summary = controller.run().await.unwrap();

        assert_eq!(summary.images_downloaded, 3);
        assert_eq!(summary.images_failed, 0);
        assert_eq!(summary.bytes_downloaded, 11);
        assert_eq!(std::fs::read(dir.path().join("2024-01-02-1.jpg")).unwrap(), b"one");
        assert_eq!(std::fs::read(dir.path().join("2024-01-02-2.jpg")).unwrap(), b"two");
        assert_eq!(std::fs::read(dir.path().join("2024-01-02-3.jpg")).unwrap(), b"three");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 3);
    }

    #[tokio::test]
    async fn test_failed_page_is_skipped() {
        let server = MockServer::start().await;
        mount_html(
            &server,
            "/",
            anchors(&[
                "2024-01-01.html".to_string(),
                "2024-01-02.html".to_string(),
                "2024-01-03.html".to_string(),
            ]),
        )
        .await;
        mount_html(&server, "/2024-01-01.html", anchors(&[image_href(&server, "a")])).await;
        Mock::given(method("GET"))
            .and(path("/2024-01-02.html"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        mount_html(&server, "/2024-01-03.html", anchors(&[image_href(&server, "c")])).await;
        mount_image(&server, "a", b"aaa", 0).await;
        mount_image(&server, "c", b"ccc", 0).await;

        let dir = tempfile::tempdir().unwrap();
        let controller = CrawlerController::new(create_test_config(&server), dir.path()).unwrap();
        let summary = controller.run().await.unwrap();

        assert_eq!(summary.pages_found, 3);
        assert_eq!(summary.pages_processed, 2);
        assert_eq!(summary.pages_skipped, 1);
        assert_eq!(summary.images_downloaded, 2);
        assert!(dir.path().join("2024-01-01-1.jpg").exists());
        assert!(dir.path().join("2024-01-03-1.jpg").exists());
        assert!(!dir.path().join("2024-01-02-1.jpg").exists());
    }

    #[tokio::test]
    async fn test_failed_image_does_not_affect_siblings() {
        let server = MockServer::start().await;
        mount_html(&server, "/", anchors(&["2024-02-01.html".to_string()])).await;
        mount_html(
            &server,
            "/2024-02-01.html",
            anchors(&[
                image_href(&server, "ok1"),
                image_href(&server, "broken"),
                image_href(&server, "ok2"),
            ]),
        )
        .await;
        mount_image(&server, "ok1", b"x", 0).await;
        mount_image(&server, "ok2", b"y", 0).await;
        Mock::given(method("GET"))
            .and(path("/th"))
            .and(query_param("id", "broken"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let controller = CrawlerController::new(create_test_config(&server), dir.path()).unwrap();

        let report = controller
            .process_page(&format!("{}/2024-02-01.html", server.uri()))
            .await
            .unwrap();

        assert_eq!(report.page_id, "2024-02-01");
        assert_eq!(report.dispatched, 3);
        assert_eq!(report.downloaded, 2);
        assert_eq!(report.failed, 1);
        assert!(dir.path().join("2024-02-01-1.jpg").exists());
        assert!(!dir.path().join("2024-02-01-2.jpg").exists());
        assert!(!dir.path().join("2024-02-01-2.jpg.part").exists());
        assert!(dir.path().join("2024-02-01-3.jpg").exists());
    }

    #[tokio::test]
    async fn test_concurrency_bounded_by_workers() {
        let server = MockServer::start().await;
        let ids: Vec<String> = (0..6).map(|i| format!("img{}", i)).collect();
        mount_html(&server, "/", anchors(&["2024-03-01.html".to_string()])).await;
        mount_html(
            &server,
            "/2024-03-01.html",
            anchors(&ids.iter().map(|id| image_href(&server, id)).collect::<Vec<_>>()),
        )
        .await;
        for id in &ids {
            mount_image(&server, id, b"z", 200).await;
        }

        let mut config = create_test_config(&server);
        config.download.workers = 1;

        let dir = tempfile::tempdir().unwrap();
        let controller = CrawlerController::new(config, dir.path()).unwrap();

        let started = std::time::Instant::now();
        let summary = controller.run().await.unwrap();

        assert_eq!(summary.images_downloaded, 6);
        // One worker serialises the six delayed downloads
        assert!(started.elapsed() >= Duration::from_millis(1200));
    }
}
