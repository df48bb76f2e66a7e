//! `image-harvest verify <dir>` — list, and optionally delete, unreadable images.

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::json;

use image_harvest::{delete_failed_images, get_image_files, verify_images};

use crate::cli::output;

/// Run the verify command.
pub async fn run(dir: &Path, delete: bool) -> Result<()> {
    let root = dir.to_path_buf();

    if delete {
        let failed = tokio::task::spawn_blocking(move || delete_failed_images(&root))
            .await
            .context("Verify task panicked")?
            .with_context(|| format!("Failed to prune {}", dir.display()))?;
        if output::is_json() {
            return output::print_json(&json!({ "deleted": failed }));
        }
        println!("Failed images: {failed}");
        return Ok(());
    }

    let (total, failed) = tokio::task::spawn_blocking(move || {
        let files = get_image_files(&root);
        let failed = verify_images(&files);
        (files.len(), failed)
    })
    .await
    .context("Verify task panicked")?;

    if output::is_json() {
        return output::print_json(&json!({ "checked": total, "failed": failed }));
    }
    for path in &failed {
        println!("{}", path.display());
    }
    println!("{} of {total} images failed to decode", failed.len());
    Ok(())
}
