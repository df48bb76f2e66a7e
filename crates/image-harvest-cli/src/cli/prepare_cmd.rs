//! `image-harvest prepare <recipe>` — make sure a recipe's images are on disk.

use anyhow::{anyhow, Result};

use crate::cli::{build_context, output, progress_bar};
use crate::config::HarvestConfig;
use crate::pipeline::{prepare_dataset, CategoryReport, PrepareOutcome, PrepareReport};
use crate::progress::{self, ProgressReporter};

/// Run the prepare command.
pub async fn run(cfg: &HarvestConfig, recipe_name: &str, force: bool) -> Result<()> {
    let recipe = cfg.recipe(recipe_name).ok_or_else(|| {
        anyhow!("Unknown recipe '{recipe_name}'. Run `image-harvest recipes` to list them.")
    })?;
    let opts = cfg.options_for(&recipe);

    let (tx, rx) = progress::channel();
    let bar = (!output::is_json() && !output::is_quiet()).then(|| progress_bar::spawn(rx));

    let result = {
        let ctx = build_context(cfg)?.with_progress(ProgressReporter::new(tx));
        prepare_dataset(&ctx, &recipe, &opts, force).await
    };
    if let Some(bar) = bar {
        let _ = bar.await;
    }

    let report = result?;
    if output::is_json() {
        return output::print_json(&report);
    }
    print_report(&report);
    Ok(())
}

pub(crate) fn print_categories(categories: &[CategoryReport]) {
    for c in categories {
        println!("  {} ({})", c.category, c.path.display());
        for s in &c.searches {
            println!(
                "    '{}': found {}, kept {}, downloaded {}, failed {}",
                s.term, s.found, s.kept, s.downloaded, s.failed
            );
        }
        println!(
            "    resized {} of {}, removed {} unreadable",
            c.resize.resized,
            c.resize.total(),
            c.pruned
        );
    }
}

fn print_report(report: &PrepareReport) {
    println!("Recipe: {}", report.recipe);
    println!("Root:   {}", report.root.display());
    match &report.outcome {
        PrepareOutcome::AlreadyDownloaded => {
            println!("Images already downloaded for:");
            for category in report.categories.categories() {
                println!("  {category}");
            }
        }
        PrepareOutcome::Downloaded { categories } => {
            let total: usize = categories.iter().map(|c| c.downloaded()).sum();
            println!("Downloaded {total} images:");
            print_categories(categories);
        }
    }
}
