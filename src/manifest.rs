//! Package manifest as data.
//!
//! The manifest is the flat record an installer reads: identity fields, the
//! installable script entry points and the runtime requirements. Besides the
//! manifest of the running build, the two historical releases are kept as
//! snapshots so `dl --manifest` and the tests can compare them.

use crate::constants::{APP_ABOUT, APP_AUTHOR, APP_NAME, APP_VERSION};
use crate::errors::{AppError, AppResult};
use serde::Serialize;

const HISTORY_AUTHOR: &str = "Casey Dwyer";
const HISTORY_EMAIL: &str = "caseydwyer@gmail.com";
const HISTORY_URL: &str = "https://github.com/dwyer/dl";
const HISTORY_LICENSE: &str = "BSD";
const ENTRY_POINT: &str = "dl";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Manifest {
    pub name: String,
    pub version: String,
    pub description: String,
    pub author: String,
    pub author_email: String,
    pub url: String,
    pub license: String,
    pub scripts: Vec<String>,
    pub install_requires: Vec<String>,
}

/// Literal difference between the `install_requires` lists of two manifests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequiresDiff {
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

impl RequiresDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Splits the first `Name <email>` entry of a Cargo authors list.
///
/// Cargo joins several authors with `:`. A missing address yields an empty email.
fn split_author(authors: &str) -> (String, String) {
    let first = authors.split(':').next().unwrap_or_default().trim();
    match first.split_once('<') {
        Some((name, rest)) => (
            name.trim().to_string(),
            rest.trim_end().trim_end_matches('>').trim().to_string(),
        ),
        None => (first.to_string(), String::new()),
    }
}

impl Manifest {
    fn snapshot(version: &str, install_requires: &[&str]) -> Self {
        Self {
            name: ENTRY_POINT.to_string(),
            version: version.to_string(),
            description: "A command-line downloader.".to_string(),
            author: HISTORY_AUTHOR.to_string(),
            author_email: HISTORY_EMAIL.to_string(),
            url: HISTORY_URL.to_string(),
            license: HISTORY_LICENSE.to_string(),
            scripts: vec![ENTRY_POINT.to_string()],
            install_requires: install_requires.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Manifest of the running build.
    ///
    /// Identity comes from the package metadata. `install_requires` names the
    /// crates that fill the HTML-parsing and futures roles of the older releases.
    pub fn current() -> Self {
        let (author, author_email) = split_author(APP_AUTHOR);
        Self {
            name: APP_NAME.to_string(),
            version: APP_VERSION.to_string(),
            description: APP_ABOUT.to_string(),
            author,
            author_email,
            url: env!("CARGO_PKG_REPOSITORY").to_string(),
            license: env!("CARGO_PKG_LICENSE").to_string(),
            scripts: vec![ENTRY_POINT.to_string()],
            install_requires: vec!["scraper".to_string(), "futures".to_string()],
        }
    }

    /// The single installable script.
    ///
    /// # Errors
    ///
    /// Returns `ManifestError` when the manifest declares zero or several scripts.
    pub fn entry_point(&self) -> AppResult<&str> {
        match self.scripts.as_slice() {
            [script] => Ok(script.as_str()),
            [] => Err(AppError::ManifestError(format!(
                "{} {} declares no script entry point",
                self.name, self.version
            ))),
            many => Err(AppError::ManifestError(format!(
                "{} {} declares {} script entry points, expected one",
                self.name,
                self.version,
                many.len()
            ))),
        }
    }

    /// Requirements gained and lost going from `self` to `newer`.
    pub fn requires_diff(&self, newer: &Manifest) -> RequiresDiff {
        RequiresDiff {
            added: newer
                .install_requires
                .iter()
                .filter(|r| !self.install_requires.contains(r))
                .cloned()
                .collect(),
            removed: self
                .install_requires
                .iter()
                .filter(|r| !newer.install_requires.contains(r))
                .cloned()
                .collect(),
        }
    }

    pub fn to_toml(&self) -> AppResult<String> {
        toml::to_string(self)
            .map_err(|e| AppError::ManifestError(format!("Failed to render manifest: {e}")))
    }
}

/// Historical release manifests, oldest first.
pub fn history() -> Vec<Manifest> {
    vec![
        Manifest::snapshot("0.1", &["beautifulsoup4"]),
        Manifest::snapshot("0.2-dev", &["futures"]),
    ]
}
