use crate::config::ResolvedConfig;
use crate::constants::PARTIAL_SUFFIX;
use crate::downloader::target::DownloadTarget;
use crate::errors::{AppError, AppResult};
use crate::models::{DownloadOutcome, DownloadReport};
use crate::ui;
use futures::stream::{self, StreamExt};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

/// Configuration for retry behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RetryConfig {
    pub(crate) max_retries: u32,
    pub(crate) initial_delay_ms: u64,
    pub(crate) max_delay_ms: u64,
}

impl From<&ResolvedConfig> for RetryConfig {
    fn from(config: &ResolvedConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            initial_delay_ms: config.retry_initial_delay_ms,
            max_delay_ms: config.retry_max_delay_ms,
        }
    }
}

/// Calculates exponential backoff delay in milliseconds.
///
/// Formula: `min(initial_delay * 2^attempt, max_delay)`
pub(crate) fn calculate_backoff(attempt: u32, config: &RetryConfig) -> u64 {
    let factor = 1_u64.checked_shl(attempt).unwrap_or(u64::MAX);
    config
        .initial_delay_ms
        .saturating_mul(factor)
        .min(config.max_delay_ms)
}

fn partial_path(file_path: &Path) -> PathBuf {
    let mut name = file_path.as_os_str().to_owned();
    name.push(PARTIAL_SUFFIX);
    PathBuf::from(name)
}

/// Awaits `fut`, failing with a retryable `NetworkError` if it does not resolve within
/// `idle`.
async fn with_idle_timeout<T, F>(idle: Duration, what: &str, fut: F) -> AppResult<T>
where
    F: Future<Output = Result<T, reqwest::Error>>,
{
    match tokio::time::timeout(idle, fut).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(AppError::NetworkError(format!(
            "{what} timed out after {}s without data",
            idle.as_secs_f64()
        ))),
    }
}

/// Downloads `url` with retries, returning the number of bytes written.
///
/// `idle_timeout` bounds the wait for the response headers and for each body chunk.
/// It never limits the total transfer time.
pub(crate) async fn download_with_retry(
    client: &reqwest::Client,
    target: &DownloadTarget,
    file_path: &Path,
    retry_config: &RetryConfig,
    idle_timeout: Duration,
) -> AppResult<u64> {
    let mut attempt = 0;
    loop {
        match download_single_file(client, target, file_path, idle_timeout).await {
            Ok(bytes) => return Ok(bytes),
            Err(e) if attempt < retry_config.max_retries && e.is_retryable() => {
                let delay_ms = calculate_backoff(attempt, retry_config);
                warn!(
                    filename = %target.filename,
                    attempt = attempt + 1,
                    max_attempts = retry_config.max_retries + 1,
                    delay_ms = delay_ms,
                    error = %e,
                    "Retrying download after error"
                );
                tokio::time::sleep(tokio::time::Duration::from_millis(delay_ms)).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Streams one response body into `<file>.part` and renames it into place.
///
/// The partial file is removed when the transfer fails.
async fn download_single_file(
    client: &reqwest::Client,
    target: &DownloadTarget,
    file_path: &Path,
    idle_timeout: Duration,
) -> AppResult<u64> {
    let tmp_path = partial_path(file_path);

    // Remove stale tmp file if present (best-effort)
    if fs::try_exists(&tmp_path).await.unwrap_or(false) {
        if let Err(e) = fs::remove_file(&tmp_path).await {
            warn!(
                file_path = %tmp_path.display(),
                error = %e,
                "Failed to remove stale temp file"
            );
        }
    }

    let result = stream_to_file(client, target, &tmp_path, idle_timeout).await;
    match result {
        Ok(bytes) => {
            fs::rename(&tmp_path, file_path).await.map_err(|e| {
                AppError::IoError(format!(
                    "Failed to rename temp file {} to {}: {e}",
                    tmp_path.display(),
                    file_path.display()
                ))
            })?;
            Ok(bytes)
        }
        Err(e) => {
            let _ = fs::remove_file(&tmp_path).await;
            Err(e)
        }
    }
}

async fn stream_to_file(
    client: &reqwest::Client,
    target: &DownloadTarget,
    tmp_path: &Path,
    idle_timeout: Duration,
) -> AppResult<u64> {
    let mut response = with_idle_timeout(
        idle_timeout,
        "Waiting for response",
        client.get(target.url.as_str()).send(),
    )
    .await?
    .error_for_status()?;

    let mut file = File::create(tmp_path).await.map_err(|e| {
        AppError::IoError(format!(
            "Failed to create temp file {}: {e}",
            tmp_path.display()
        ))
    })?;

    let mut bytes = 0_u64;
    while let Some(chunk) =
        with_idle_timeout(idle_timeout, "Reading response body", response.chunk()).await?
    {
        file.write_all(&chunk).await.map_err(|e| {
            AppError::IoError(format!(
                "Failed to write to temp file {}: {e}",
                tmp_path.display()
            ))
        })?;
        bytes += chunk.len() as u64;
    }
    file.flush().await?;

    Ok(bytes)
}

/// Downloads every target into the configured output directory.
///
/// # Behavior
///
/// - **Atomic downloads**: Files are downloaded to temporary `.part` files and
///   renamed when complete, so a destination file is never partial.
/// - **Skip existing**: Files that already exist are skipped unless `overwrite` is set.
/// - **Bounded concurrency**: At most `concurrent_downloads` transfers run at once.
/// - **Failure isolation**: A failed target is recorded in the report and never
///   cancels the others.
///
/// # Errors
///
/// Returns an error only when the output directory cannot be created or the progress
/// bar cannot be set up. Per-target failures are reported in [`DownloadReport`].
pub async fn download_all(
    client: &reqwest::Client,
    targets: &[DownloadTarget],
    config: &ResolvedConfig,
) -> AppResult<DownloadReport> {
    let output_dir = &config.output_dir;
    fs::create_dir_all(output_dir).await.map_err(|e| {
        AppError::IoError(format!(
            "Failed to create directory {}: {e}",
            output_dir.display()
        ))
    })?;

    let mut outcomes: Vec<Option<DownloadOutcome>> = vec![None; targets.len()];
    let mut pending: Vec<(usize, &DownloadTarget)> = Vec::with_capacity(targets.len());
    for (index, target) in targets.iter().enumerate() {
        let file_path = output_dir.join(&target.filename);
        if !config.overwrite && fs::try_exists(&file_path).await.unwrap_or(false) {
            debug!(filename = %target.filename, "Skipping existing file");
            outcomes[index] = Some(DownloadOutcome::Skipped);
        } else {
            pending.push((index, target));
        }
    }

    let skipped_count = targets.len() - pending.len();
    if pending.is_empty() {
        info!(
            count = targets.len(),
            "All files already exist, skipping downloads"
        );
    } else {
        info!(
            total = pending.len(),
            skipped = skipped_count,
            concurrency = config.concurrent_downloads,
            "Starting download"
        );

        let pb = ui::create_progress_bar(pending.len() as u64)?;
        let retry_config = RetryConfig::from(config);
        let idle_timeout = config.timeout();

        let finished: Vec<(usize, DownloadOutcome)> = stream::iter(pending)
            .map(|(index, target)| {
                let pb = &pb;
                let retry_config = &retry_config;
                async move {
                    let file_path = output_dir.join(&target.filename);
                    pb.set_message(format!("Downloading {}...", target.filename));
                    let result = download_with_retry(
                        client,
                        target,
                        &file_path,
                        retry_config,
                        idle_timeout,
                    )
                    .await;
                    let outcome = match result {
                        Ok(bytes) => {
                            debug!(filename = %target.filename, bytes, "Download completed");
                            DownloadOutcome::Downloaded { bytes }
                        }
                        Err(e) => {
                            warn!(
                                url = %target.url,
                                filename = %target.filename,
                                error = %e,
                                "Failed to download file"
                            );
                            DownloadOutcome::Failed(e.to_string())
                        }
                    };
                    pb.inc(1);
                    (index, outcome)
                }
            })
            .buffer_unordered(config.concurrent_downloads.max(1))
            .collect()
            .await;

        for (index, outcome) in finished {
            outcomes[index] = Some(outcome);
        }
        pb.finish_and_clear();
    }

    let report = DownloadReport {
        outcomes: targets
            .iter()
            .cloned()
            .zip(outcomes)
            .map(|(target, outcome)| {
                (
                    target,
                    outcome.unwrap_or_else(|| DownloadOutcome::Failed("not attempted".into())),
                )
            })
            .collect(),
    };

    if report.failed() == 0 {
        info!(
            downloaded = report.downloaded(),
            skipped = report.skipped(),
            bytes = report.total_bytes(),
            "Download completed"
        );
    } else {
        info!(
            downloaded = report.downloaded(),
            failed = report.failed(),
            skipped = report.skipped(),
            "Download completed with errors"
        );
    }

    Ok(report)
}
