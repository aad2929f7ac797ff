use crate::errors::{AppError, AppResult};
use regex::Regex;
use url::Url;

/// Criteria a scraped link must satisfy to be downloaded.
///
/// Every active criterion must hold. A filter with no criteria accepts any link.
#[derive(Debug, Clone, Default)]
pub struct LinkFilter {
    pattern: Option<Regex>,
    extensions: Vec<String>,
    same_host: bool,
}

impl LinkFilter {
    /// Builds a filter from raw CLI/config values.
    ///
    /// # Arguments
    ///
    /// * `pattern` - Regex matched against the absolute link URL
    /// * `extensions` - Accepted file extensions, with or without a leading dot
    /// * `same_host` - Only accept links on the same host as the scraped page
    ///
    /// # Errors
    ///
    /// Returns `RegexError` for an invalid pattern and `InvalidInput` for an empty
    /// extension.
    pub fn new<S: AsRef<str>>(
        pattern: Option<&str>,
        extensions: &[S],
        same_host: bool,
    ) -> AppResult<Self> {
        let pattern = pattern.map(Regex::new).transpose()?;
        let extensions = extensions
            .iter()
            .map(|ext| normalize_extension(ext.as_ref()))
            .collect::<AppResult<Vec<_>>>()?;
        Ok(Self {
            pattern,
            extensions,
            same_host,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.pattern.is_none() && self.extensions.is_empty() && !self.same_host
    }

    pub fn matches(&self, link: &Url, base: &Url) -> bool {
        if let Some(pattern) = &self.pattern {
            if !pattern.is_match(link.as_str()) {
                return false;
            }
        }
        if !self.extensions.is_empty() && !self.has_accepted_extension(link) {
            return false;
        }
        if self.same_host && link.host_str() != base.host_str() {
            return false;
        }
        true
    }

    fn has_accepted_extension(&self, link: &Url) -> bool {
        let last = link
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .unwrap_or_default()
            .to_lowercase();
        self.extensions
            .iter()
            .any(|ext| last.len() > ext.len() + 1 && last.ends_with(&format!(".{ext}")))
    }
}

fn normalize_extension(raw: &str) -> AppResult<String> {
    let ext = raw.trim().trim_start_matches('.').to_lowercase();
    if ext.is_empty() {
        return Err(AppError::InvalidInput(format!(
            "Empty file extension in filter: '{raw}'"
        )));
    }
    Ok(ext)
}

/// Splits repeated and comma separated `--ext` values into single extensions.
pub fn split_extensions<S: AsRef<str>>(values: &[S]) -> Vec<String> {
    values
        .iter()
        .flat_map(|v| v.as_ref().split(','))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}
