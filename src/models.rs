use crate::downloader::DownloadTarget;
use crate::errors::{AppError, AppResult};

/// How the command-line URLs are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Every URL is a file to download.
    Direct,
    /// Every URL is an HTML page whose links are downloaded.
    Links,
}

impl Mode {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Links => "links",
        }
    }
}

/// Result of one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    Downloaded { bytes: u64 },
    /// Destination already existed and overwriting was off.
    Skipped,
    Failed(String),
}

/// Every target of a run with its outcome, in planning order.
#[derive(Debug, Clone, Default)]
pub struct DownloadReport {
    pub outcomes: Vec<(DownloadTarget, DownloadOutcome)>,
}

impl DownloadReport {
    pub fn downloaded(&self) -> usize {
        self.count(|o| matches!(o, DownloadOutcome::Downloaded { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, DownloadOutcome::Skipped))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, DownloadOutcome::Failed(_)))
    }

    pub fn total_bytes(&self) -> u64 {
        self.outcomes
            .iter()
            .map(|(_, o)| match o {
                DownloadOutcome::Downloaded { bytes } => *bytes,
                _ => 0,
            })
            .sum()
    }

    fn count(&self, pred: impl Fn(&DownloadOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, o)| pred(o)).count()
    }

    /// Turns a report with failures into an error naming each failed target.
    pub fn into_result(self) -> AppResult<Self> {
        let failures: Vec<String> = self
            .outcomes
            .iter()
            .filter_map(|(target, outcome)| match outcome {
                DownloadOutcome::Failed(msg) => Some(format!("{}: {msg}", target.filename)),
                _ => None,
            })
            .collect();

        if failures.is_empty() {
            Ok(self)
        } else {
            Err(AppError::NetworkError(format!(
                "Failed to download {} file(s): {}",
                failures.len(),
                failures.join("; ")
            )))
        }
    }
}
