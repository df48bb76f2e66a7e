//! `image-harvest status` — show what each recipe has on disk.

use anyhow::{anyhow, Result};
use serde::Serialize;

use image_harvest::{get_image_files, path_contains_images};

use crate::cli::output;
use crate::config::{HarvestConfig, Recipe};

#[derive(Debug, Serialize)]
struct CategoryStatus {
    category: String,
    images: usize,
    ready: bool,
}

#[derive(Debug, Serialize)]
struct RecipeStatus {
    recipe: String,
    root: String,
    ready: bool,
    categories: Vec<CategoryStatus>,
    model: Option<String>,
    model_exported: bool,
}

fn recipe_status(cfg: &HarvestConfig, recipe: &Recipe) -> RecipeStatus {
    let categories: Vec<CategoryStatus> = recipe
        .categories
        .iter()
        .map(|category| {
            let dir = recipe.root.join(category);
            CategoryStatus {
                category: category.clone(),
                images: get_image_files(&dir).len(),
                ready: path_contains_images(&dir),
            }
        })
        .collect();

    let artifact = cfg.model_artifact_path(recipe);
    RecipeStatus {
        recipe: recipe.name.clone(),
        root: recipe.root.display().to_string(),
        ready: categories.iter().all(|c| c.ready),
        categories,
        model: artifact.as_ref().map(|p| p.display().to_string()),
        model_exported: artifact.is_some_and(|p| p.is_file()),
    }
}

/// Run the status command for one recipe, or all of them.
pub async fn run(cfg: &HarvestConfig, recipe: Option<&str>) -> Result<()> {
    let recipes = match recipe {
        Some(name) => vec![cfg
            .recipe(name)
            .ok_or_else(|| anyhow!("Unknown recipe '{name}'"))?],
        None => cfg.all_recipes(),
    };

    let statuses: Vec<RecipeStatus> = recipes.iter().map(|r| recipe_status(cfg, r)).collect();

    if output::is_json() {
        return output::print_json(&statuses);
    }

    for status in &statuses {
        let mark = if status.ready { "[OK]" } else { "[!!]" };
        println!("{mark} {} ({})", status.recipe, status.root);
        for c in &status.categories {
            println!("     {:<20} {:>5} images", c.category, c.images);
        }
        if let Some(model) = &status.model {
            let state = if status.model_exported {
                "exported"
            } else {
                "not exported"
            };
            println!("     model: {model} ({state})");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_recipe_status() {
        let dir = tempfile::tempdir().unwrap();
        let recipe = Recipe {
            name: "pets".to_string(),
            root: dir.path().join("images"),
            categories: vec!["cat".to_string(), "dog".to_string()],
            subjects: Vec::new(),
            model: Some("pets1".to_string()),
            cleanup_on_failure: false,
            max_images: None,
            max_size: None,
        };
        let cat_dir = recipe.root.join("cat");
        std::fs::create_dir_all(&cat_dir).unwrap();
        std::fs::write(cat_dir.join("a.jpg"), b"").unwrap();

        let cfg = HarvestConfig {
            models_dir: dir.path().join("models"),
            ..HarvestConfig::default()
        };
        std::fs::create_dir_all(&cfg.models_dir).unwrap();
        std::fs::write(cfg.models_dir.join("pets1.pkl"), b"").unwrap();

        let status = recipe_status(&cfg, &recipe);
        assert!(!status.ready);
        assert_eq!(status.categories[0].images, 1);
        assert!(status.categories[0].ready);
        assert!(!status.categories[1].ready);
        assert!(status.model_exported);
        assert_eq!(
            status.model.map(PathBuf::from),
            Some(dir.path().join("models").join("pets1.pkl"))
        );
    }
}
