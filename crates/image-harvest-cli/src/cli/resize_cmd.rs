//! `image-harvest resize <dir>` — shrink images to a bounding box.

use std::path::Path;

use anyhow::{Context, Result};

use image_harvest::resize_images;

use crate::cli::output;

/// Run the resize command; `dest` defaults to resizing in place.
pub async fn run(dir: &Path, max_size: u32, dest: Option<&Path>) -> Result<()> {
    let src = dir.to_path_buf();
    let dest = dest.unwrap_or(dir).to_path_buf();

    let report = tokio::task::spawn_blocking(move || resize_images(&src, max_size, &dest))
        .await
        .context("Resize task panicked")?
        .with_context(|| format!("Failed to resize images in {}", dir.display()))?;

    if output::is_json() {
        return output::print_json(&report);
    }
    println!("Resized:   {}", report.resized);
    println!("Copied:    {}", report.copied);
    println!("Unchanged: {}", report.unchanged);
    println!("Skipped:   {}", report.skipped);
    Ok(())
}
