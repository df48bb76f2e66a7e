//! Named dataset recipes.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A named dataset: where it lives, what to search for, and its model artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub name: String,
    /// Directory holding one sub-directory per category.
    pub root: PathBuf,
    pub categories: Vec<String>,
    /// Appended to each category to form search terms. Empty means the
    /// category name is searched on its own.
    #[serde(default)]
    pub subjects: Vec<String>,
    /// Model artifact name, stored as `<models_dir>/<model>.pkl`.
    #[serde(default)]
    pub model: Option<String>,
    /// Remove `root` when downloading fails.
    #[serde(default)]
    pub cleanup_on_failure: bool,
    #[serde(default)]
    pub max_images: Option<usize>,
    #[serde(default)]
    pub max_size: Option<u32>,
}

impl Recipe {
    /// Search terms for one category, in subject order.
    pub fn search_terms(&self, category: &str) -> Vec<String> {
        search_terms(category, &self.subjects)
    }
}

/// Build `"<category> <subject>"` terms, or just the category without subjects.
pub fn search_terms(category: &str, subjects: &[String]) -> Vec<String> {
    if subjects.is_empty() {
        return vec![category.to_string()];
    }
    subjects
        .iter()
        .map(|subject| {
            let subject = subject.trim();
            if subject.is_empty() {
                category.to_string()
            } else {
                format!("{category} {subject}")
            }
        })
        .collect()
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Recipes available without a config file.
pub fn builtin_recipes() -> Vec<Recipe> {
    vec![
        Recipe {
            name: "bird-vs-forest".to_string(),
            root: PathBuf::from("images"),
            categories: strings(&["bird", "forest"]),
            subjects: strings(&["photo", "sun photo", "shade photo"]),
            model: Some("bird_vs_forest1".to_string()),
            cleanup_on_failure: false,
            max_images: None,
            max_size: None,
        },
        Recipe {
            name: "bears".to_string(),
            root: PathBuf::from("images/bear"),
            categories: strings(&["grizzly bear", "black bear", "teddy bear"]),
            subjects: Vec::new(),
            model: Some("bear1".to_string()),
            cleanup_on_failure: true,
            max_images: None,
            max_size: None,
        },
    ]
}
