//! `image-harvest recipes` — list known dataset recipes.

use anyhow::Result;

use crate::cli::output;
use crate::config::HarvestConfig;

pub async fn run(cfg: &HarvestConfig) -> Result<()> {
    let recipes = cfg.all_recipes();
    if output::is_json() {
        return output::print_json(&recipes);
    }

    for recipe in &recipes {
        println!("{}", recipe.name);
        println!("  root:       {}", recipe.root.display());
        println!("  categories: {}", recipe.categories.join(", "));
        if !recipe.subjects.is_empty() {
            println!("  subjects:   {}", recipe.subjects.join(", "));
        }
        if let Some(model) = &recipe.model {
            println!("  model:      {model}");
        }
    }
    Ok(())
}
