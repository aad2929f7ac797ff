use crate::constants::BASE_HREF_SELECTOR;
use crate::downloader::link_filter::LinkFilter;
use crate::errors::{AppError, AppResult};
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Cached selector for the document `<base href>` element.
static BASE_HREF_SELECTOR_CACHED: OnceLock<Selector> = OnceLock::new();

/// Fetches a page and returns its final URL (after redirects) with the body.
///
/// `timeout` is a deadline for the whole request, body included.
///
/// # Errors
///
/// Returns `HttpStatus` for non-success responses and `NetworkError` when the
/// request cannot be completed in time.
pub async fn fetch_page(
    client: &reqwest::Client,
    page_url: &Url,
    timeout: Duration,
) -> AppResult<(Url, String)> {
    let response = client
        .get(page_url.as_str())
        .timeout(timeout)
        .send()
        .await?
        .error_for_status()?;
    let final_url = response.url().clone();
    let body = response.text().await?;
    debug!(
        url = %final_url,
        bytes = body.len(),
        "Fetched page"
    );
    Ok((final_url, body))
}

/// Compiles a user supplied CSS selector.
pub fn compile_selector(selector: &str) -> AppResult<Selector> {
    Selector::parse(selector)
        .map_err(|e| AppError::SelectorError(format!("'{selector}': {e:?}")))
}

/// Parses HTML content and extracts the links selected by `selector`.
///
/// Links come from the `href` attribute of every selected element. They are resolved
/// against the document's `<base href>` when present (itself resolved against
/// `page_url`), otherwise against `page_url`. Fragments are dropped, only `http` and
/// `https` links are kept, the filter is applied, and duplicates are removed while
/// preserving document order.
pub fn parse_links(
    html: &str,
    page_url: &Url,
    selector: &Selector,
    filter: &LinkFilter,
) -> Vec<Url> {
    let document = Html::parse_document(html);

    let base_selector = BASE_HREF_SELECTOR_CACHED.get_or_init(|| {
        Selector::parse(BASE_HREF_SELECTOR).expect("BASE_HREF_SELECTOR is a valid CSS selector")
    });
    let base_url = document
        .select(base_selector)
        .filter_map(|el| el.value().attr("href"))
        .find_map(|href| page_url.join(href.trim()).ok())
        .unwrap_or_else(|| page_url.clone());

    let mut seen: HashSet<Url> = HashSet::new();
    let mut links = Vec::new();

    for mut url in document
        .select(selector)
        .filter_map(|el| el.value().attr("href"))
        .filter_map(|href| base_url.join(href.trim()).ok())
    {
        if !matches!(url.scheme(), "http" | "https") {
            continue;
        }
        url.set_fragment(None);
        if !filter.matches(&url, page_url) {
            continue;
        }
        if seen.insert(url.clone()) {
            links.push(url);
        }
    }

    links
}

/// Fetches `page_url` and returns the links on it that pass `filter`.
pub async fn scrape_links(
    client: &reqwest::Client,
    page_url: &Url,
    selector: &Selector,
    filter: &LinkFilter,
    timeout: Duration,
) -> AppResult<Vec<Url>> {
    info!(url = %page_url, "Scraping links");
    let (final_url, body) = fetch_page(client, page_url, timeout).await?;
    let links = parse_links(&body, &final_url, selector, filter);
    if links.is_empty() {
        warn!(url = %final_url, "No matching links found");
    } else {
        info!(url = %final_url, links_found = links.len(), "Links scraped");
    }
    Ok(links)
}
