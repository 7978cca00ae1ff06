use std::path::{Path, PathBuf};

/// One pending image download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageTask {
    /// Image URL
    pub url: String,

    /// File the image is written to
    pub path: PathBuf,
}

/// Outcome of processing one date page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageReport {
    pub page_id: String,

    /// Downloads dispatched for the page
    pub dispatched: usize,

    pub downloaded: usize,
    pub failed: usize,

    /// Bytes written by successful downloads
    pub bytes: u64,
}

/// Turn a page's image links into download tasks
///
/// Files are named `{page_id}-{n}.jpg`, numbered from 1 in link order.
pub fn plan_image_tasks(page_id: &str, links: Vec<String>, output_dir: &Path) -> Vec<ImageTask> {
    links
        .into_iter()
        .enumerate()
        .map(|(i, url)| ImageTask {
            url,
            path: output_dir.join(format!("{}-{}.jpg", page_id, i + 1)),
        })
        .collect()
}
