//! CLI subcommand implementations for the image-harvest binary.

pub mod check_url_cmd;
pub mod doctor;
pub mod fetch_cmd;
pub mod output;
pub mod prepare_cmd;
pub mod progress_bar;
pub mod recipes_cmd;
pub mod resize_cmd;
pub mod sample_cmd;
pub mod search_cmd;
pub mod split_cmd;
pub mod status;
pub mod verify_cmd;

use std::sync::Arc;

use anyhow::Result;

use crate::acquisition::{DuckDuckGoImages, HttpClient};
use crate::config::HarvestConfig;
use crate::pipeline::HarvestContext;

/// Build the HTTP client and search backend described by `cfg`.
pub fn build_context(cfg: &HarvestConfig) -> Result<HarvestContext> {
    let client = HttpClient::new(cfg.timeout());
    let search = DuckDuckGoImages::new(client.clone())
        .with_base_url(&cfg.search.base_url)?
        .with_region(cfg.search.region.clone())
        .with_safe_search(cfg.search.safe_search);
    Ok(HarvestContext::new(client, Arc::new(search)))
}
