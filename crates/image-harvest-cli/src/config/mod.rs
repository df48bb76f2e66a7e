//! Configuration loading and resolution.

pub mod recipes;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::acquisition::download::{DownloadOptions, DEFAULT_MAX_PICS, DEFAULT_WORKERS};
use crate::acquisition::search::{SafeSearch, DEFAULT_MAX_IMAGES, DEFAULT_REGION, DEFAULT_SEARCH_URL};
use crate::pipeline::AcquisitionOptions;

pub use recipes::{builtin_recipes, search_terms, Recipe};

/// Environment variable naming a config file.
pub const CONFIG_ENV: &str = "IMAGE_HARVEST_CONFIG";

/// Config file picked up from the working directory.
const LOCAL_CONFIG: &str = "harvest.json";

/// Search backend settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub base_url: String,
    pub region: String,
    pub safe_search: SafeSearch,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SEARCH_URL.to_string(),
            region: DEFAULT_REGION.to_string(),
            safe_search: SafeSearch::default(),
        }
    }
}

/// Harvest settings. Every field has a default, so a config file may set any subset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
    /// Where exported model artifacts live.
    pub models_dir: PathBuf,
    /// Search results requested per term.
    pub max_images: usize,
    /// Longest side after resizing.
    pub max_size: u32,
    /// Pause after each search, in seconds.
    pub pause_secs: u64,
    /// Per-request timeout for downloads and probes, in seconds.
    pub timeout_secs: u64,
    /// Concurrent downloads.
    pub workers: usize,
    /// Concurrent HEAD probes.
    pub head_concurrency: usize,
    /// HEAD every URL and keep only image content types.
    pub check_content_type: bool,
    pub max_pics: usize,
    pub search: SearchConfig,
    /// Extra recipes; a recipe with a built-in name replaces it.
    pub recipes: Vec<Recipe>,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            models_dir: PathBuf::from("models"),
            max_images: DEFAULT_MAX_IMAGES,
            max_size: image_harvest::DEFAULT_MAX_SIZE,
            pause_secs: 10,
            timeout_secs: 4,
            workers: DEFAULT_WORKERS,
            head_concurrency: DEFAULT_WORKERS,
            check_content_type: true,
            max_pics: DEFAULT_MAX_PICS,
            search: SearchConfig::default(),
            recipes: Vec::new(),
        }
    }
}

impl HarvestConfig {
    /// Read a JSON config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Built-in recipes overlaid with configured ones, built-ins first.
    pub fn all_recipes(&self) -> Vec<Recipe> {
        let mut all = builtin_recipes();
        for recipe in &self.recipes {
            match all.iter_mut().find(|r| r.name == recipe.name) {
                Some(existing) => *existing = recipe.clone(),
                None => all.push(recipe.clone()),
            }
        }
        all
    }

    pub fn recipe(&self, name: &str) -> Option<Recipe> {
        self.all_recipes().into_iter().find(|r| r.name == name)
    }

    /// `<models_dir>/<model>.pkl` for recipes that name a model.
    pub fn model_artifact_path(&self, recipe: &Recipe) -> Option<PathBuf> {
        recipe
            .model
            .as_ref()
            .map(|m| self.models_dir.join(format!("{m}.pkl")))
    }

    /// Acquisition options from the global settings.
    pub fn acquisition_options(&self) -> AcquisitionOptions {
        AcquisitionOptions {
            max_images: self.max_images,
            max_size: self.max_size,
            pause: Duration::from_secs(self.pause_secs),
            check_content_type: self.check_content_type,
            head_concurrency: self.head_concurrency,
            download: DownloadOptions {
                max_pics: self.max_pics,
                n_workers: self.workers,
                timeout: self.timeout(),
                preserve_filename: false,
            },
        }
    }

    /// Acquisition options with a recipe's own limits applied.
    pub fn options_for(&self, recipe: &Recipe) -> AcquisitionOptions {
        let mut opts = self.acquisition_options();
        if let Some(max_images) = recipe.max_images {
            opts.max_images = max_images;
        }
        if let Some(max_size) = recipe.max_size {
            opts.max_size = max_size;
        }
        opts
    }
}

/// Resolve the config file path.
///
/// Order: explicit flag, `IMAGE_HARVEST_CONFIG`, `./harvest.json`, then
/// `~/.image-harvest/config.json`. `None` means built-in defaults.
pub fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf> {
    resolve_in(
        explicit,
        std::env::var(CONFIG_ENV).ok(),
        Path::new("."),
        dirs::home_dir().as_deref(),
    )
}

fn resolve_in(
    explicit: Option<&str>,
    env_path: Option<String>,
    cwd: &Path,
    home: Option<&Path>,
) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(PathBuf::from(path));
    }

    if let Some(env_path) = env_path.filter(|p| !p.is_empty()) {
        return Some(PathBuf::from(env_path));
    }

    let local = cwd.join(LOCAL_CONFIG);
    if local.exists() {
        return Some(local);
    }

    home.map(|home| home.join(".image-harvest").join("config.json"))
        .filter(|p| p.exists())
}

/// Load the effective configuration.
pub fn load_config(explicit: Option<&str>) -> Result<HarvestConfig> {
    match resolve_config_path(explicit) {
        Some(path) => {
            tracing::debug!("Loading config from {}", path.display());
            HarvestConfig::from_file(&path)
        }
        None => Ok(HarvestConfig::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = HarvestConfig::default();
        assert_eq!(cfg.max_images, 30);
        assert_eq!(cfg.max_size, 400);
        assert_eq!(cfg.pause_secs, 10);
        assert!(cfg.check_content_type);
        assert_eq!(cfg.search.base_url, "https://duckduckgo.com");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("harvest.json");
        std::fs::write(
            &path,
            r#"{
                "max_images": 12,
                "search": { "safe_search": "off" },
                "recipes": [
                    { "name": "bears", "root": "data/bears", "categories": ["polar bear"] },
                    { "name": "cats", "root": "data/cats", "categories": ["tabby", "siamese"],
                      "subjects": ["photo"], "max_size": 224 }
                ]
            }"#,
        )
        .unwrap();

        let cfg = HarvestConfig::from_file(&path).unwrap();
        assert_eq!(cfg.max_images, 12);
        assert_eq!(cfg.max_size, 400);
        assert_eq!(cfg.search.safe_search, SafeSearch::Off);
        assert_eq!(cfg.search.region, "wt-wt");

        let bears = cfg.recipe("bears").unwrap();
        assert_eq!(bears.categories, vec!["polar bear"]);
        assert!(!bears.cleanup_on_failure);

        let cats = cfg.recipe("cats").unwrap();
        assert_eq!(cfg.options_for(&cats).max_size, 224);
        assert_eq!(cfg.all_recipes().len(), 3);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(HarvestConfig::from_file(&path).is_err());
    }

    #[test]
    fn test_model_artifact_path() {
        let cfg = HarvestConfig::default();
        let recipe = cfg.recipe("bird-vs-forest").unwrap();
        assert_eq!(
            cfg.model_artifact_path(&recipe),
            Some(PathBuf::from("models/bird_vs_forest1.pkl"))
        );
    }

    #[test]
    fn test_explicit_path_wins() {
        assert_eq!(
            resolve_config_path(Some("custom.json")),
            Some(PathBuf::from("custom.json"))
        );
    }

    #[test]
    fn test_resolution_order() {
        let cwd = tempfile::tempdir().unwrap();
        let home = tempfile::tempdir().unwrap();
        let env = Some("from-env.json".to_string());

        // Nothing on disk: defaults.
        assert_eq!(resolve_in(None, None, cwd.path(), Some(home.path())), None);
        assert_eq!(resolve_in(None, Some(String::new()), cwd.path(), None), None);

        let home_config = home.path().join(".image-harvest").join("config.json");
        std::fs::create_dir_all(home_config.parent().unwrap()).unwrap();
        std::fs::write(&home_config, "{}").unwrap();
        assert_eq!(
            resolve_in(None, None, cwd.path(), Some(home.path())),
            Some(home_config.clone())
        );

        let local = cwd.path().join("harvest.json");
        std::fs::write(&local, "{}").unwrap();
        assert_eq!(
            resolve_in(None, None, cwd.path(), Some(home.path())),
            Some(local.clone())
        );
        assert_eq!(
            resolve_in(None, Some(String::new()), cwd.path(), Some(home.path())),
            Some(local)
        );

        assert_eq!(
            resolve_in(None, env.clone(), cwd.path(), Some(home.path())),
            Some(PathBuf::from("from-env.json"))
        );
        assert_eq!(
            resolve_in(Some("flag.json"), env, cwd.path(), Some(home.path())),
            Some(PathBuf::from("flag.json"))
        );
    }

    #[test]
    fn test_env_var_names_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("env.json");
        std::fs::write(&path, r#"{ "max_images": 7 }"#).unwrap();

        let previous = std::env::var_os(CONFIG_ENV);
        std::env::set_var(CONFIG_ENV, &path);
        let resolved = resolve_config_path(None);
        let loaded = load_config(None).map(|cfg| cfg.max_images);
        match previous {
            Some(value) => std::env::set_var(CONFIG_ENV, value),
            None => std::env::remove_var(CONFIG_ENV),
        }

        assert_eq!(resolved, Some(path));
        assert_eq!(loaded.unwrap(), 7);
    }
}
