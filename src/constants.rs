// CLI Metadata
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const APP_AUTHOR: &str = env!("CARGO_PKG_AUTHORS");
pub const APP_ABOUT: &str = env!("CARGO_PKG_DESCRIPTION");

// Selectors
pub const DEFAULT_LINK_SELECTOR: &str = "a[href]";
pub const BASE_HREF_SELECTOR: &str = "base[href]";

// Downloads
pub const PARTIAL_SUFFIX: &str = ".part";
pub const FALLBACK_FILENAME: &str = "index.html";
