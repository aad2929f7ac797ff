use crate::constants::{FALLBACK_FILENAME, PARTIAL_SUFFIX};
use percent_encoding::percent_decode_str;
use std::collections::HashSet;
use std::path::Path;
use url::Url;

/// A URL paired with the name it is saved under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTarget {
    pub url: Url,
    pub filename: String,
}

/// Makes a decoded name safe to use as a single path component.
fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let trimmed = cleaned.trim();
    if trimmed.is_empty() || trimmed == "." || trimmed == ".." {
        String::new()
    } else {
        trimmed.to_string()
    }
}

/// Derives a filename from the last non-empty path segment of `url`.
///
/// Falls back to `<host>.html` (or `index.html` without a host) for URLs that end in
/// a directory.
pub fn filename_from_url(url: &Url) -> String {
    let from_path = url
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .map(|segment| sanitize(&percent_decode_str(segment).decode_utf8_lossy()))
        .filter(|name| !name.is_empty());

    if let Some(name) = from_path {
        return name;
    }
    match url.host_str() {
        Some(host) if url.path() == "/" => format!("{host}.html"),
        _ => FALLBACK_FILENAME.to_string(),
    }
}

/// Inserts ` (n)` before the extension: `a.zip` -> `a (1).zip`.
///
/// Only the last extension counts, except that `.tar.<x>` archives keep both parts:
/// `a.tar.gz` -> `a (1).tar.gz`, `v1.2.zip` -> `v1.2 (1).zip`.
fn numbered(filename: &str, n: usize) -> String {
    let path = Path::new(filename);
    match (
        path.file_stem().and_then(|s| s.to_str()),
        path.extension().and_then(|s| s.to_str()),
    ) {
        (Some(stem), Some(ext)) => match stem.strip_suffix(".tar").filter(|s| !s.is_empty()) {
            Some(inner) => format!("{inner} ({n}).tar.{ext}"),
            None => format!("{stem} ({n}).{ext}"),
        },
        _ => format!("{filename} ({n})"),
    }
}

fn partial_name(filename: &str) -> String {
    format!("{filename}{PARTIAL_SUFFIX}")
}

/// Assigns a unique filename to every URL.
///
/// Later URLs whose derived name collides with an earlier one are numbered so no
/// download in the same run overwrites another. A name also collides when it, or its
/// `.part` temp name, equals another target's temp name or final name.
pub fn plan_targets<I>(urls: I) -> Vec<DownloadTarget>
where
    I: IntoIterator<Item = Url>,
{
    // Final names and their temp names reserved so far.
    let mut taken: HashSet<String> = HashSet::new();
    urls.into_iter()
        .map(|url| {
            let base = filename_from_url(&url);
            let mut filename = base.clone();
            let mut n = 1;
            while taken.contains(&filename) || taken.contains(&partial_name(&filename)) {
                filename = numbered(&base, n);
                n += 1;
            }
            taken.insert(partial_name(&filename));
            taken.insert(filename.clone());
            DownloadTarget { url, filename }
        })
        .collect()
}
