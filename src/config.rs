use crate::constants::{APP_NAME, APP_VERSION, DEFAULT_LINK_SELECTOR};
use crate::errors::{AppError, AppResult};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Resolved configuration with all values filled in (no Options).
///
/// This struct carries the downloader defaults and can be deserialized from a TOML
/// file. Keys missing from the file keep their default, unknown keys are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResolvedConfig {
    /// Directory downloaded files are written to
    pub output_dir: PathBuf,
    /// Number of concurrent download tasks
    pub concurrent_downloads: usize,
    /// Maximum number of retry attempts for failed downloads
    pub max_retries: u32,
    /// Initial delay in milliseconds before the first retry
    pub retry_initial_delay_ms: u64,
    /// Maximum delay in milliseconds between retries
    pub retry_max_delay_ms: u64,
    /// Seconds allowed for connecting and between two received chunks of a transfer.
    /// A transfer that keeps receiving data is never cut off. Page fetches use it as
    /// a whole-request deadline.
    pub timeout_secs: u64,
    /// Value of the `User-Agent` header
    pub user_agent: String,
    /// Replace files that already exist instead of skipping them
    pub overwrite: bool,
    /// CSS selector used to find links when scraping a page
    pub link_selector: String,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            concurrent_downloads: 4,
            max_retries: 3,
            retry_initial_delay_ms: 1000,
            retry_max_delay_ms: 10000,
            timeout_secs: 60,
            user_agent: format!("{APP_NAME}/{APP_VERSION}"),
            overwrite: false,
            link_selector: DEFAULT_LINK_SELECTOR.to_string(),
        }
    }
}

impl ResolvedConfig {
    /// Loads and validates configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `IoError` if the file cannot be read and `InvalidInput` if the TOML is
    /// malformed, contains unknown keys, or fails [`ResolvedConfig::validate`].
    pub fn from_toml_file(path: &Path) -> AppResult<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            AppError::IoError(format!("Failed to read config {}: {e}", path.display()))
        })?;
        let config: ResolvedConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the cross-field constraints serde cannot express.
    pub fn validate(&self) -> AppResult<()> {
        if self.concurrent_downloads == 0 {
            return Err(AppError::InvalidInput(
                "Concurrent downloads must be greater than 0".into(),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(AppError::InvalidInput(
                "Timeout must be greater than 0".into(),
            ));
        }
        if self.retry_initial_delay_ms > self.retry_max_delay_ms {
            return Err(AppError::InvalidInput(format!(
                "Initial retry delay ({} ms) exceeds maximum retry delay ({} ms)",
                self.retry_initial_delay_ms, self.retry_max_delay_ms
            )));
        }
        if self.user_agent.trim().is_empty() {
            return Err(AppError::InvalidInput("User agent must not be empty".into()));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Builds the HTTP client shared by page fetches and downloads.
    ///
    /// Only the connect phase is bounded here. Idle transfers are bounded per chunk by
    /// the downloader, so large files are not cut off by a total deadline.
    pub fn http_client(&self) -> AppResult<reqwest::Client> {
        reqwest::Client::builder()
            .user_agent(self.user_agent.clone())
            .connect_timeout(self.timeout())
            .build()
            .map_err(|e| AppError::NetworkError(format!("Failed to build HTTP client: {e}")))
    }
}
