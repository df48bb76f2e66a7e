//! Bounding-box resizing of dataset images.

use std::path::Path;

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat, ImageReader};
use rayon::prelude::*;

use crate::layout::get_image_files;
use crate::types::{HarvestError, HarvestResult, ResizeOutcome, ResizeReport};

/// Default longest side, in pixels, for downloaded images.
pub const DEFAULT_MAX_SIZE: u32 = 400;

/// Options for a resize pass.
#[derive(Debug, Clone, Copy)]
pub struct ResizeOptions {
    /// Longest allowed side. `None` only normalizes channels.
    pub max_size: Option<u32>,
    /// Expected channel count; images with a different count are re-encoded.
    pub n_channels: u8,
    /// Skip files whose destination already exists.
    pub resume: bool,
    pub filter: FilterType,
}

impl Default for ResizeOptions {
    fn default() -> Self {
        Self {
            max_size: Some(DEFAULT_MAX_SIZE),
            n_channels: 3,
            resume: false,
            filter: FilterType::Triangle,
        }
    }
}

impl ResizeOptions {
    pub fn with_max_size(max_size: u32) -> Self {
        Self {
            max_size: Some(max_size),
            ..Self::default()
        }
    }
}

/// Scale `(width, height)` so the longer side becomes `target`.
///
/// Each dimension is truncated, and never drops below one pixel.
pub fn resize_to(width: u32, height: u32, target: u32) -> (u32, u32) {
    let longest = width.max(height);
    if longest == 0 {
        return (width, height);
    }
    let ratio = f64::from(target) / f64::from(longest);
    let w = (f64::from(width) * ratio) as u32;
    let h = (f64::from(height) * ratio) as u32;
    (w.max(1), h.max(1))
}

fn open_image(path: &Path) -> HarvestResult<(DynamicImage, Option<ImageFormat>)> {
    let reader = ImageReader::open(path)
        .and_then(|r| r.with_guessed_format())
        .map_err(|e| HarvestError::io_at(e, path))?;
    let format = reader.format();
    Ok((reader.decode()?, format))
}

/// Resize `src_root/file` into `dest_root/file`.
///
/// Images larger than `max_size` are shrunk to fit; images with the wrong
/// channel count are converted. Anything else is copied when the destination
/// differs from the source, or left alone when they are the same file.
/// Unreadable files are skipped.
pub fn resize_image(
    src_root: &Path,
    file: &Path,
    dest_root: &Path,
    opts: &ResizeOptions,
) -> HarvestResult<ResizeOutcome> {
    let src = src_root.join(file);
    let dest = dest_root.join(file);

    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent).map_err(|e| HarvestError::io_at(e, parent))?;
    }

    if opts.resume && dest.exists() {
        return Ok(ResizeOutcome::Skipped);
    }
    let (mut img, source_format) = match open_image(&src) {
        Ok(opened) => opened,
        Err(e) => {
            tracing::debug!("Skipping {}: {e}", src.display());
            return Ok(ResizeOutcome::Skipped);
        }
    };
    let (width, height) = img.dimensions();
    let channels = img.color().channel_count();

    let too_large = opts
        .max_size
        .is_some_and(|max| width > max || height > max);

    if too_large || channels != opts.n_channels {
        if let Some(max) = opts.max_size.filter(|_| too_large) {
            let (w, h) = resize_to(width, height, max);
            img = img.resize_exact(w, h, opts.filter);
        }
        if opts.n_channels == 3 {
            img = DynamicImage::ImageRgb8(img.to_rgb8());
        }
        let format = ImageFormat::from_path(&dest)
            .ok()
            .or(source_format)
            .unwrap_or(ImageFormat::Jpeg);
        img.save_with_format(&dest, format)?;
        tracing::trace!(
            "Resized {} ({width}x{height} -> {}x{})",
            dest.display(),
            img.width(),
            img.height()
        );
        return Ok(ResizeOutcome::Resized);
    }

    if src != dest {
        std::fs::copy(&src, &dest).map_err(|e| HarvestError::io_at(e, &dest))?;
        return Ok(ResizeOutcome::Copied);
    }

    Ok(ResizeOutcome::Unchanged)
}

/// Resize every image under `src` into `dest`, which may be `src` itself.
pub fn resize_images(src: &Path, max_size: u32, dest: &Path) -> HarvestResult<ResizeReport> {
    resize_images_with(src, dest, &ResizeOptions::with_max_size(max_size))
}

/// Like [`resize_images`] with explicit options.
///
/// A file that fails to re-encode is logged and counted as skipped.
pub fn resize_images_with(
    src: &Path,
    dest: &Path,
    opts: &ResizeOptions,
) -> HarvestResult<ResizeReport> {
    std::fs::create_dir_all(dest).map_err(|e| HarvestError::io_at(e, dest))?;

    let files = get_image_files(src);
    let outcomes: Vec<ResizeOutcome> = files
        .par_iter()
        .map(|path| {
            let relative = path.strip_prefix(src).unwrap_or(path);
            resize_image(src, relative, dest, opts).unwrap_or_else(|e| {
                tracing::warn!("Failed to resize {}: {e}", path.display());
                ResizeOutcome::Skipped
            })
        })
        .collect();

    let mut report = ResizeReport::default();
    for outcome in outcomes {
        report.record(outcome);
    }
    tracing::info!(
        "Resized {} of {} images in {} (max {:?})",
        report.resized,
        report.total(),
        src.display(),
        opts.max_size
    );
    Ok(report)
}
