//! image-harvest CLI — search the web for training images and shape them into a dataset.

pub mod acquisition;
pub mod cli;
pub mod config;
pub mod pipeline;
pub mod progress;

pub use acquisition::{DuckDuckGoImages, HttpClient, ImageSearch};
pub use config::{load_config, resolve_config_path, HarvestConfig, Recipe};
pub use pipeline::{download_images_for_categories, prepare_dataset, HarvestContext};
