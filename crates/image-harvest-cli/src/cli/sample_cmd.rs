//! `image-harvest sample <dir>` — pick a random image from a directory.

use std::path::Path;

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::json;

use image_harvest::random_image;

use crate::cli::output;

/// Run the sample command.
pub async fn run(dir: &Path, seed: Option<u64>) -> Result<()> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let Some(path) = random_image(dir, &mut rng) else {
        println!("No images found in the specified directory.");
        return Ok(());
    };

    let (width, height) = image::image_dimensions(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    if output::is_json() {
        return output::print_json(&json!({
            "path": path,
            "width": width,
            "height": height,
        }));
    }
    println!("File name: {}", path.display());
    println!("Size: {width}x{height}");
    Ok(())
}
