use scraper::{Html, Selector};

/// Return the `href` of every anchor in document order
///
/// Anchors without an `href` are skipped.
pub fn extract_hrefs(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let link_selector = Selector::parse("a[href]").expect("Invalid selector");

    document
        .select(&link_selector)
        .filter_map(|element| element.value().attr("href"))
        .map(|href| href.to_string())
        .collect()
}
