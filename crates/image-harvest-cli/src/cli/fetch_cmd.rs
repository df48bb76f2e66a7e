//! `image-harvest fetch --category ...` — ad hoc harvest without a recipe.

use std::path::Path;

use anyhow::{bail, Context, Result};

use image_harvest::{create_category_directories, is_images_setup};

use crate::cli::prepare_cmd::print_categories;
use crate::cli::{build_context, output, progress_bar};
use crate::config::HarvestConfig;
use crate::pipeline::{download_images_for_categories, AcquisitionOptions};
use crate::progress::{self, ProgressReporter};

/// Arguments for the fetch command.
pub struct FetchArgs<'a> {
    pub root: &'a Path,
    pub categories: &'a [String],
    pub subjects: &'a [String],
    pub max_images: Option<usize>,
    pub max_size: Option<u32>,
    pub skip_content_check: bool,
    pub force: bool,
}

impl FetchArgs<'_> {
    fn options(&self, cfg: &HarvestConfig) -> AcquisitionOptions {
        let mut opts = cfg.acquisition_options();
        if let Some(max_images) = self.max_images {
            opts.max_images = max_images;
        }
        if let Some(max_size) = self.max_size {
            opts.max_size = max_size;
        }
        if self.skip_content_check {
            opts.check_content_type = false;
        }
        opts
    }
}

/// Run the fetch command.
pub async fn run(cfg: &HarvestConfig, args: FetchArgs<'_>) -> Result<()> {
    if args.categories.is_empty() {
        bail!("At least one --category is required");
    }

    let categories = create_category_directories(args.categories, args.root)
        .with_context(|| format!("Failed to create directories under {}", args.root.display()))?;

    if !args.force && is_images_setup(categories.paths()) {
        if output::is_json() {
            return output::print_json(&serde_json::json!({
                "status": "already_downloaded",
                "root": args.root,
            }));
        }
        println!(
            "Images already downloaded under {} (use --force to fetch more)",
            args.root.display()
        );
        return Ok(());
    }

    let opts = args.options(cfg);
    let (tx, rx) = progress::channel();
    let bar = (!output::is_json() && !output::is_quiet()).then(|| progress_bar::spawn(rx));

    let result = {
        let ctx = build_context(cfg)?.with_progress(ProgressReporter::new(tx));
        download_images_for_categories(&ctx, &categories, args.subjects, &opts).await
    };
    if let Some(bar) = bar {
        let _ = bar.await;
    }

    let reports = result?;
    if output::is_json() {
        return output::print_json(&reports);
    }
    println!("Root: {}", args.root.display());
    print_categories(&reports);
    Ok(())
}
