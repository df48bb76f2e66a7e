//! Bulk image downloading into a category directory.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};
use std::time::Duration;

use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use regex::Regex;
use serde::Serialize;

use super::http_client::HttpClient;

pub const DEFAULT_MAX_PICS: usize = 1000;
pub const DEFAULT_WORKERS: usize = 8;
pub const DEFAULT_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(4);

/// Suffix used when a URL does not carry one.
const FALLBACK_SUFFIX: &str = ".jpg";

/// Options for a download batch.
#[derive(Debug, Clone, Copy)]
pub struct DownloadOptions {
    /// Only the first `max_pics` URLs are fetched.
    pub max_pics: usize,
    /// Concurrent requests.
    pub n_workers: usize,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Name files after the URL's last path segment instead of a random UUID.
    pub preserve_filename: bool,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            max_pics: DEFAULT_MAX_PICS,
            n_workers: DEFAULT_WORKERS,
            timeout: DEFAULT_DOWNLOAD_TIMEOUT,
            preserve_filename: false,
        }
    }
}

/// A URL that could not be downloaded.
#[derive(Debug, Clone, Serialize)]
pub struct FailedDownload {
    pub url: String,
    pub reason: String,
}

/// Outcome of a download batch.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DownloadReport {
    pub saved: Vec<PathBuf>,
    pub failed: Vec<FailedDownload>,
}

/// File suffix taken from a URL: the first `.<word>` followed by `?` or the end.
///
/// Falls back to `.jpg`.
pub fn url_suffix(url: &str) -> String {
    static SUFFIX: OnceLock<Regex> = OnceLock::new();
    let re = SUFFIX.get_or_init(|| Regex::new(r"\.\w+(?:\?|$)").expect("suffix regex is valid"));
    re.find(url)
        .map(|m| m.as_str().trim_end_matches('?').to_string())
        .unwrap_or_else(|| FALLBACK_SUFFIX.to_string())
}

/// Destination file name for `url`.
///
/// With `preserve_filename` the URL's last path segment is used, plus the
/// URL suffix when the segment has no extension of its own.
pub fn file_name_for(url: &str, preserve_filename: bool) -> String {
    if preserve_filename {
        let path = url.split(['?', '#']).next().unwrap_or(url);
        if let Some(name) = path.rsplit('/').next().filter(|n| !n.is_empty()) {
            if Path::new(name).extension().is_some() {
                return name.to_string();
            }
            return format!("{name}{}", url_suffix(url));
        }
    }
    format!("{}{}", uuid::Uuid::new_v4(), url_suffix(url))
}

/// File names handed out during one download batch.
#[derive(Debug, Default)]
struct ClaimedNames(Mutex<HashSet<PathBuf>>);

impl ClaimedNames {
    /// Reserve a path in `dest` for `name` that neither exists on disk nor
    /// was handed out earlier in the batch: `photo.png`, `photo_1.png`, ...
    fn claim(&self, dest: &Path, name: &str) -> PathBuf {
        let mut claimed = self.0.lock().unwrap_or_else(|e| e.into_inner());
        let as_path = Path::new(name);
        let stem = as_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| name.to_string());
        let ext = as_path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();

        let mut candidate = dest.join(name);
        let mut n = 0u32;
        while claimed.contains(&candidate) || candidate.exists() {
            n += 1;
            candidate = dest.join(format!("{stem}_{n}{ext}"));
        }
        claimed.insert(candidate.clone());
        candidate
    }
}

async fn download_one(
    client: &HttpClient,
    dest: &Path,
    url: &str,
    opts: &DownloadOptions,
    names: &ClaimedNames,
) -> Result<PathBuf> {
    let bytes = client.get_bytes(url, opts.timeout).await?;
    let path = names.claim(dest, &file_name_for(url, opts.preserve_filename));
    tokio::fs::write(&path, &bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

/// Download `urls` into `dest` with bounded concurrency.
///
/// Duplicate URLs are fetched once and never overwrite an existing file.
/// Individual failures are logged and collected in the report; only failing
/// to create `dest` is an error.
pub async fn download_images(
    client: &HttpClient,
    dest: &Path,
    urls: &[String],
    opts: &DownloadOptions,
) -> Result<DownloadReport> {
    tokio::fs::create_dir_all(dest)
        .await
        .with_context(|| format!("Failed to create {}", dest.display()))?;

    let mut seen = HashSet::new();
    let batch: Vec<&String> = urls
        .iter()
        .take(opts.max_pics)
        .filter(|u| seen.insert(u.as_str()))
        .collect();

    let names = ClaimedNames::default();
    let names = &names;
    let results: Vec<(String, Result<PathBuf>)> = stream::iter(batch)
        .map(|url| async move {
            let result = download_one(client, dest, url, opts, names).await;
            (url.clone(), result)
        })
        .buffer_unordered(opts.n_workers.max(1))
        .collect()
        .await;

    let mut report = DownloadReport::default();
    for (url, result) in results {
        match result {
            Ok(path) => report.saved.push(path),
            Err(e) => {
                tracing::warn!("Couldn't download {url}: {e}");
                report.failed.push(FailedDownload {
                    url,
                    reason: e.to_string(),
                });
            }
        }
    }
    report.saved.sort();

    tracing::info!(
        "Downloaded {} images into {} ({} failed)",
        report.saved.len(),
        dest.display(),
        report.failed.len()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_suffix() {
        assert_eq!(url_suffix("https://example.com/image.png"), ".png");
        assert_eq!(url_suffix("https://example.com/a/b.jpeg?w=300&h=200"), ".jpeg");
        assert_eq!(url_suffix("https://cdn.example.com/a.b.gif"), ".gif");
        assert_eq!(url_suffix("https://example.com/images/12345"), ".jpg");
        assert_eq!(url_suffix("https://example.com/x.webp?"), ".webp");
    }

    #[test]
    fn test_file_name_for() {
        let random = file_name_for("https://example.com/photo.png", false);
        assert!(random.ends_with(".png"));
        assert_eq!(random.len(), 36 + ".png".len());

        assert_eq!(
            file_name_for("https://example.com/dir/photo.png?size=large", true),
            "photo.png"
        );
        let fallback = file_name_for("https://example.com/dir/", true);
        assert!(fallback.ends_with(".jpg"));
        assert_eq!(
            file_name_for("https://example.com/images/12345", true),
            "12345.jpg"
        );
        assert_eq!(
            file_name_for("https://example.com/images/12345?fmt=.webp", true),
            "12345.webp"
        );
    }

    #[test]
    fn test_claimed_names_never_repeat() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("photo.png"), b"").unwrap();

        let names = ClaimedNames::default();
        assert_eq!(names.claim(dir.path(), "photo.png"), dir.path().join("photo_1.png"));
        assert_eq!(names.claim(dir.path(), "photo.png"), dir.path().join("photo_2.png"));
        assert_eq!(names.claim(dir.path(), "12345.jpg"), dir.path().join("12345.jpg"));
        assert_eq!(names.claim(dir.path(), "12345.jpg"), dir.path().join("12345_1.jpg"));
    }

    #[test]
    fn test_default_options() {
        let opts = DownloadOptions::default();
        assert_eq!(opts.max_pics, 1000);
        assert_eq!(opts.n_workers, 8);
        assert_eq!(opts.timeout, Duration::from_secs(4));
        assert!(!opts.preserve_filename);
    }
}
