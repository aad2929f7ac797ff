use crate::errors::{AppError, AppResult};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;

/// Creates the per-file progress bar shown while downloads run.
///
/// The bar draws to stderr and stays hidden when stderr is not a terminal, so piped
/// output (`--dry-run`) is never interleaved with it.
///
/// # Example
///
/// ```no_run
/// use dl::ui;
///
/// # fn main() -> Result<(), dl::errors::AppError> {
/// let pb = ui::create_progress_bar(3)?;
/// pb.inc(1);
/// pb.finish_with_message("Done");
/// # Ok(())
/// # }
/// ```
pub fn create_progress_bar(total: u64) -> AppResult<ProgressBar> {
    let pb = ProgressBar::with_draw_target(Some(total), ProgressDrawTarget::stderr());
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} files {msg}")
            .map_err(|e| AppError::IoError(format!("Failed to create progress bar template: {e}")))?
            .progress_chars("#>-"),
    );
    Ok(pb)
}

/// Creates a spinner for steps of unknown length, such as fetching a page.
pub fn create_spinner(message: impl Into<String>) -> AppResult<ProgressBar> {
    let pb = ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr());
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .map_err(|e| AppError::IoError(format!("Failed to create spinner template: {e}")))?,
    );
    pb.set_message(message.into());
    pb.enable_steady_tick(Duration::from_millis(120));
    Ok(pb)
}
