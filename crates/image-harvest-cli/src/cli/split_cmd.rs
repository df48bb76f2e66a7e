//! `image-harvest split <root>` — write a seeded train/valid manifest.

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::json;

use image_harvest::split_dataset;

use crate::cli::output;

/// Run the split command. The manifest defaults to `<root>/split.json`.
pub async fn run(root: &Path, valid_pct: f64, seed: u64, out: Option<&Path>) -> Result<()> {
    let split = split_dataset(root, valid_pct, seed)
        .with_context(|| format!("Failed to split {}", root.display()))?;
    let manifest = out
        .map(Path::to_path_buf)
        .unwrap_or_else(|| root.join("split.json"));
    split
        .write_manifest(&manifest)
        .with_context(|| format!("Failed to write {}", manifest.display()))?;

    let train = split.train().count();
    let valid = split.valid().count();
    if output::is_json() {
        return output::print_json(&json!({
            "manifest": manifest,
            "train": train,
            "valid": valid,
            "labels": split.labels,
        }));
    }

    println!("Manifest: {}", manifest.display());
    println!("Train:    {train}");
    println!("Valid:    {valid}");
    for label in &split.labels {
        println!("  {label:<20} {:>5}", split.count_label(label));
    }
    Ok(())
}
