//! Core data types for category layouts and dataset maintenance reports.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// One category label and the directory holding its images.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDir {
    pub category: String,
    pub path: PathBuf,
}

/// Ordered mapping from category label to category directory.
///
/// Keeps the order categories were given in; inserting an existing label
/// replaces its path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryPaths {
    entries: Vec<CategoryDir>,
}

impl CategoryPaths {
    /// Create an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the directory for a category.
    pub fn insert(&mut self, category: impl Into<String>, path: impl Into<PathBuf>) {
        let category = category.into();
        let path = path.into();
        match self.entries.iter_mut().find(|e| e.category == category) {
            Some(entry) => entry.path = path,
            None => self.entries.push(CategoryDir { category, path }),
        }
    }

    /// Directory for a category, if present.
    pub fn get(&self, category: &str) -> Option<&Path> {
        self.entries
            .iter()
            .find(|e| e.category == category)
            .map(|e| e.path.as_path())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Category labels in insertion order.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.category.as_str())
    }

    /// Category directories in insertion order.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.entries.iter().map(|e| e.path.as_path())
    }

    pub fn iter(&self) -> impl Iterator<Item = &CategoryDir> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a CategoryPaths {
    type Item = &'a CategoryDir;
    type IntoIter = std::slice::Iter<'a, CategoryDir>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// What happened to a single file during a resize pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResizeOutcome {
    /// Re-encoded, either shrunk or converted to RGB.
    Resized,
    /// Already within bounds; copied to a different destination.
    Copied,
    /// Already within bounds and destination is the source itself.
    Unchanged,
    /// Unreadable, or destination already existed in resume mode.
    Skipped,
}

/// Aggregate counts from a resize pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResizeReport {
    pub resized: usize,
    pub copied: usize,
    pub unchanged: usize,
    pub skipped: usize,
}

impl ResizeReport {
    pub fn record(&mut self, outcome: ResizeOutcome) {
        match outcome {
            ResizeOutcome::Resized => self.resized += 1,
            ResizeOutcome::Copied => self.copied += 1,
            ResizeOutcome::Unchanged => self.unchanged += 1,
            ResizeOutcome::Skipped => self.skipped += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.resized + self.copied + self.unchanged + self.skipped
    }
}

/// Errors that can occur in the dataset library.
#[derive(thiserror::Error, Debug)]
pub enum HarvestError {
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Permission denied: {}", path.display())]
    PermissionDenied { path: PathBuf },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl HarvestError {
    /// Wrap an IO error raised while touching `path`.
    ///
    /// Permission failures become [`HarvestError::PermissionDenied`] so callers
    /// can tell them apart from other IO problems.
    pub fn io_at(err: std::io::Error, path: &Path) -> Self {
        if err.kind() == std::io::ErrorKind::PermissionDenied {
            HarvestError::PermissionDenied {
                path: path.to_path_buf(),
            }
        } else {
            HarvestError::Io(err)
        }
    }
}

/// Convenience result type.
pub type HarvestResult<T> = Result<T, HarvestError>;
