//! Link scraping and file downloads.
//!
//! Pages are fetched and their links extracted with [`scrape_links`], URLs are turned
//! into named [`DownloadTarget`]s with [`plan_targets`], and [`download_all`] fetches
//! them with bounded concurrency.

mod file_downloader;
mod link_fetcher;
mod link_filter;
mod target;

// Re-export public API
pub use file_downloader::download_all;
pub use link_fetcher::{compile_selector, fetch_page, parse_links, scrape_links};
pub use link_filter::{split_extensions, LinkFilter};
pub use target::{filename_from_url, plan_targets, DownloadTarget};
