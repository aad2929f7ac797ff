use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// Network request failed
    #[error("Network error: {0}")]
    NetworkError(String),
    /// Server answered with a non-success status
    #[error("HTTP {status}: {url}")]
    HttpStatus { status: u16, url: String },
    /// Failed to parse HTML or header content
    #[error("Parse error: {0}")]
    ParseError(String),
    /// Invalid URL format
    #[error("Invalid URL: {0}")]
    UrlError(String),
    /// Regex compilation failed
    #[error("Regex error: {0}")]
    RegexError(String),
    /// Selector parsing failed
    #[error("CSS selector error: {0}")]
    SelectorError(String),
    /// Invalid input format
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// IO operation failed
    #[error("IO error: {0}")]
    IoError(String),
    /// Package manifest is inconsistent
    #[error("Manifest error: {0}")]
    ManifestError(String),
}

impl AppError {
    /// Whether a failed transfer is worth another attempt.
    ///
    /// Connection problems, timeouts, 5xx responses, 408 and 429 are transient.
    /// Other 4xx statuses and local failures are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::NetworkError(_) => true,
            AppError::HttpStatus { status, .. } => {
                *status >= 500 || *status == 408 || *status == 429
            }
            AppError::ParseError(_)
            | AppError::UrlError(_)
            | AppError::RegexError(_)
            | AppError::SelectorError(_)
            | AppError::InvalidInput(_)
            | AppError::IoError(_)
            | AppError::ManifestError(_) => false,
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        match (err.status(), err.url()) {
            (Some(status), Some(url)) => AppError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            },
            _ => AppError::NetworkError(err.to_string()),
        }
    }
}

impl From<url::ParseError> for AppError {
    fn from(err: url::ParseError) -> Self {
        AppError::UrlError(err.to_string())
    }
}

impl From<regex::Error> for AppError {
    fn from(err: regex::Error) -> Self {
        AppError::RegexError(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IoError(err.to_string())
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::InvalidInput(format!("Failed to parse config: {err}"))
    }
}

// Custom type alias for Results in this application
pub type AppResult<T> = Result<T, AppError>;
