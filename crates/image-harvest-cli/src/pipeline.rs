//! Per-category acquisition pipeline: search, filter, download, resize, prune.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use serde::Serialize;

use image_harvest::{
    create_category_directories, delete_failed_images, is_images_setup, resize_images,
    CategoryPaths, ResizeReport,
};

use crate::acquisition::download::{download_images, DownloadOptions};
use crate::acquisition::filter::filter_image_urls;
use crate::acquisition::http_client::HttpClient;
use crate::acquisition::search::{search_images, ImageSearch};
use crate::config::{search_terms, Recipe};
use crate::progress::{ProgressEventKind, ProgressReporter};

/// Knobs for one acquisition run.
#[derive(Debug, Clone, Copy)]
pub struct AcquisitionOptions {
    /// Search results requested per term.
    pub max_images: usize,
    /// Longest side after resizing.
    pub max_size: u32,
    /// Fixed pause after each search.
    pub pause: Duration,
    pub check_content_type: bool,
    pub head_concurrency: usize,
    pub download: DownloadOptions,
}

/// Shared services the pipeline runs against.
#[derive(Clone)]
pub struct HarvestContext {
    pub client: HttpClient,
    pub search: Arc<dyn ImageSearch>,
    pub progress: ProgressReporter,
}

impl HarvestContext {
    pub fn new(client: HttpClient, search: Arc<dyn ImageSearch>) -> Self {
        Self {
            client,
            search,
            progress: ProgressReporter::disabled(),
        }
    }

    pub fn with_progress(mut self, progress: ProgressReporter) -> Self {
        self.progress = progress;
        self
    }
}

/// Result of one search term.
#[derive(Debug, Clone, Serialize)]
pub struct SubjectReport {
    pub term: String,
    pub found: usize,
    pub kept: usize,
    pub downloaded: usize,
    pub failed: usize,
}

/// Result of one category directory.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryReport {
    pub category: String,
    pub path: PathBuf,
    pub searches: Vec<SubjectReport>,
    pub resize: ResizeReport,
    pub pruned: usize,
}

impl CategoryReport {
    pub fn downloaded(&self) -> usize {
        self.searches.iter().map(|s| s.downloaded).sum()
    }
}

/// What `prepare_dataset` ended up doing.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PrepareOutcome {
    AlreadyDownloaded,
    Downloaded { categories: Vec<CategoryReport> },
}

#[derive(Debug, Clone, Serialize)]
pub struct PrepareReport {
    pub recipe: String,
    pub root: PathBuf,
    pub categories: CategoryPaths,
    pub outcome: PrepareOutcome,
}

async fn acquire_term(
    ctx: &HarvestContext,
    dest: &Path,
    term: &str,
    opts: &AcquisitionOptions,
) -> Result<SubjectReport> {
    let found_urls = search_images(ctx.search.as_ref(), term, opts.max_images).await?;
    ctx.progress.emit(ProgressEventKind::SearchCompleted {
        term: term.to_string(),
        found: found_urls.len(),
    });

    let urls = if opts.check_content_type {
        let kept = filter_image_urls(&ctx.client, &found_urls, opts.head_concurrency).await;
        ctx.progress.emit(ProgressEventKind::UrlsFiltered {
            term: term.to_string(),
            kept: kept.len(),
            dropped: found_urls.len() - kept.len(),
        });
        kept
    } else {
        found_urls.clone()
    };

    let report = download_images(&ctx.client, dest, &urls, &opts.download).await?;
    ctx.progress.emit(ProgressEventKind::DownloadCompleted {
        term: term.to_string(),
        saved: report.saved.len(),
        failed: report.failed.len(),
    });

    Ok(SubjectReport {
        term: term.to_string(),
        found: found_urls.len(),
        kept: urls.len(),
        downloaded: report.saved.len(),
        failed: report.failed.len(),
    })
}

/// Resize a category directory in place, then delete what fails to decode.
async fn tidy_category(dir: &Path, max_size: u32) -> Result<(ResizeReport, usize)> {
    let dir = dir.to_path_buf();
    let tidied = tokio::task::spawn_blocking(move || -> image_harvest::HarvestResult<_> {
        let resized = resize_images(&dir, max_size, &dir)?;
        let pruned = delete_failed_images(&dir)?;
        Ok((resized, pruned))
    })
    .await
    .context("Resize task panicked")??;
    Ok(tidied)
}

/// Search, download, resize, and prune images for every category.
///
/// Categories and search terms are processed one at a time with
/// `opts.pause` after each search. A failed search aborts the whole run:
/// later terms and categories are not attempted.
pub async fn download_images_for_categories(
    ctx: &HarvestContext,
    category_paths: &CategoryPaths,
    subjects: &[String],
    opts: &AcquisitionOptions,
) -> Result<Vec<CategoryReport>> {
    let mut reports = Vec::with_capacity(category_paths.len());

    for entry in category_paths {
        let started = Instant::now();
        let terms = search_terms(&entry.category, subjects);
        ctx.progress.emit(ProgressEventKind::CategoryStarted {
            category: entry.category.clone(),
            searches: terms.len(),
        });

        let mut searches = Vec::with_capacity(terms.len());
        for term in &terms {
            searches.push(acquire_term(ctx, &entry.path, term, opts).await?);
            if !opts.pause.is_zero() {
                ctx.progress.emit(ProgressEventKind::Waiting {
                    seconds: opts.pause.as_secs(),
                });
                tokio::time::sleep(opts.pause).await;
            }
        }

        let (resize, pruned) = tidy_category(&entry.path, opts.max_size).await?;
        ctx.progress.emit(ProgressEventKind::Resized {
            category: entry.category.clone(),
            resized: resize.resized,
            total: resize.total(),
        });
        ctx.progress.emit(ProgressEventKind::Pruned {
            category: entry.category.clone(),
            failed: pruned,
        });
        ctx.progress.emit(ProgressEventKind::CategoryCompleted {
            category: entry.category.clone(),
            elapsed_ms: started.elapsed().as_millis() as u64,
        });

        reports.push(CategoryReport {
            category: entry.category.clone(),
            path: entry.path.clone(),
            searches,
            resize,
            pruned,
        });
    }

    Ok(reports)
}

/// Make sure a recipe's images are on disk.
///
/// Creates the category directories; when all of them already hold images
/// (and `force` is off) nothing is downloaded. With `cleanup_on_failure`, a
/// failed download removes the recipe root before the error is returned.
pub async fn prepare_dataset(
    ctx: &HarvestContext,
    recipe: &Recipe,
    opts: &AcquisitionOptions,
    force: bool,
) -> Result<PrepareReport> {
    let categories = create_category_directories(&recipe.categories, &recipe.root)
        .with_context(|| format!("Failed to create directories under {}", recipe.root.display()))?;

    if !force && is_images_setup(categories.paths()) {
        tracing::info!("images already downloaded");
        return Ok(PrepareReport {
            recipe: recipe.name.clone(),
            root: recipe.root.clone(),
            categories,
            outcome: PrepareOutcome::AlreadyDownloaded,
        });
    }

    tracing::info!("downloading images for recipe '{}'", recipe.name);
    match download_images_for_categories(ctx, &categories, &recipe.subjects, opts).await {
        Ok(reports) => Ok(PrepareReport {
            recipe: recipe.name.clone(),
            root: recipe.root.clone(),
            categories,
            outcome: PrepareOutcome::Downloaded {
                categories: reports,
            },
        }),
        Err(e) => {
            if recipe.cleanup_on_failure {
                tracing::error!("Download failed, removing {}", recipe.root.display());
                if let Err(rm) = std::fs::remove_dir_all(&recipe.root) {
                    ctx.progress.emit(ProgressEventKind::Warning {
                        message: format!("Cleanup of {} failed: {rm}", recipe.root.display()),
                    });
                }
            }
            Err(e.context(format!("Preparing recipe '{}' failed", recipe.name)))
        }
    }
}
