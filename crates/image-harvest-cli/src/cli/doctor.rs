//! Environment readiness check.

use anyhow::Result;

use image_harvest::is_images_setup;

use crate::acquisition::HttpClient;
use crate::config::{resolve_config_path, HarvestConfig};

/// Check config resolution, dataset roots, and search endpoint reachability.
pub async fn run(cfg: &HarvestConfig, explicit_config: Option<&str>) -> Result<()> {
    println!("Image Harvest Doctor");
    println!("====================");
    println!();

    println!("OS:   {}", std::env::consts::OS);
    println!("Arch: {}", std::env::consts::ARCH);
    println!();

    match resolve_config_path(explicit_config) {
        Some(path) if path.exists() => println!("[OK] Config: {}", path.display()),
        Some(path) => println!("[!!] Config file missing: {}", path.display()),
        None => println!("[OK] Config: built-in defaults"),
    }

    if cfg.models_dir.is_dir() {
        println!("[OK] Models dir: {}", cfg.models_dir.display());
    } else {
        println!(
            "[..] Models dir does not exist yet: {}",
            cfg.models_dir.display()
        );
    }

    for recipe in cfg.all_recipes() {
        let dirs: Vec<_> = recipe
            .categories
            .iter()
            .map(|c| recipe.root.join(c))
            .collect();
        if is_images_setup(&dirs) {
            println!("[OK] {}: images present in {}", recipe.name, recipe.root.display());
        } else {
            println!(
                "[..] {}: not downloaded (run `image-harvest prepare {}`)",
                recipe.name, recipe.name
            );
        }
    }

    let client = HttpClient::new(cfg.timeout());
    let reachable = match client.head(&cfg.search.base_url).await {
        Ok(resp) => {
            println!(
                "[OK] Search endpoint {} answered {}",
                cfg.search.base_url, resp.status
            );
            true
        }
        Err(e) => {
            println!("[!!] Search endpoint {} unreachable: {e}", cfg.search.base_url);
            false
        }
    };

    println!();
    if reachable {
        println!("Status: READY");
    } else {
        println!("Status: NOT READY");
        println!("  Check network access to {}.", cfg.search.base_url);
    }

    Ok(())
}
