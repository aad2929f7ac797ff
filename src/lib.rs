//! dl library
//!
//! This crate provides the core functionality for the `dl` binary, a command-line
//! downloader. Keep the crate root minimal, implementation and tests live in their modules.
//!
//! ## Overview
//!
//! - [`downloader`] - Scrapes links from HTML pages and downloads files concurrently
//! - [`cli`] - Command-line interface tying scraping, planning and downloading together
//! - [`config`] - Defaults and TOML configuration
//! - [`manifest`] - Package manifest and its release history
//! - [`models`] - Run mode and download outcomes
//! - [`errors`] - Error types used throughout the application
//!
//! ## Example Usage
//!
//! ```no_run
//! use dl::{config::ResolvedConfig, downloader, errors::AppResult};
//! use url::Url;
//!
//! # async fn example() -> AppResult<()> {
//! let config = ResolvedConfig::default();
//! let client = config.http_client()?;
//! let page = Url::parse("https://example.com/releases/")?;
//! let selector = downloader::compile_selector(&config.link_selector)?;
//! let filter = downloader::LinkFilter::new(None, &["zip"], true)?;
//!
//! let links = downloader::scrape_links(&client, &page, &selector, &filter, config.timeout()).await?;
//! let targets = downloader::plan_targets(links);
//! let report = downloader::download_all(&client, &targets, &config).await?;
//! println!("{} downloaded", report.downloaded());
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod constants;
pub mod downloader;
pub mod errors;
pub mod logging;
pub mod manifest;
pub mod models;
pub mod ui;
pub mod utils;
