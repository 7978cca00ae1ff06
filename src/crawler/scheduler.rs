use std::collections::HashSet;
use std::sync::OnceLock;
use regex::Regex;
use tracing::debug;

use crate::cli::config::SiteSettings;
use crate::crawler::extract::extract_hrefs;

/// Anchors pointing at a dated archive page start with `YYYY-MM`
fn date_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\d{4}-\d{2}").expect("Invalid date pattern"))
}

/// Whether an href looks like a dated archive page
pub fn is_date_link(href: &str) -> bool {
    date_pattern().is_match(href)
}

/// Deduplicate links and order them newest first
pub fn unique_sorted_desc(links: Vec<String>) -> Vec<String> {
    let unique: HashSet<String> = links.into_iter().collect();
    let mut links: Vec<String> = unique.into_iter().collect();
    links.sort_by(|a, b| b.cmp(a));
    links
}

/// Decides which links on a page are worth following
pub struct Scheduler {
    /// Index page URL, also the prefix of every date page
    base_url: String,

    /// Substring identifying image links
    image_host: String,
}

impl Scheduler {
    /// Create a new scheduler for the given site
    pub fn new(site: &SiteSettings) -> Self {
        Self {
            base_url: site.base_url.clone(),
            image_host: site.image_host.clone(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Date page URLs found on the index page, newest first
    pub fn page_links(&self, html: &str) -> Vec<String> {
        let links: Vec<String> = extract_hrefs(html)
            .into_iter()
            .filter(|href| is_date_link(href))
            .map(|href| format!("{}{}", self.base_url, href))
            .collect();

        let links = unique_sorted_desc(links);
        debug!("Found {} date pages", links.len());
        links
    }

    /// Image URLs found on a date page, in document order
    pub fn image_links(&self, html: &str) -> Vec<String> {
        extract_hrefs(html)
            .into_iter()
            .filter(|href| href.contains(&self.image_host))
            .collect()
    }

    /// Identifier of a date page, e.g. `2024-01-02`
    ///
    /// Path separators become `_` so the id is always a single file name
    /// component.
    pub fn page_id(&self, page_url: &str) -> String {
        let id = page_url.strip_prefix(&self.base_url).unwrap_or(page_url);
        id.strip_suffix(".html").unwrap_or(id).replace(['/', '\\'], "_")
    }
}
