//! `image-harvest search <term>` — print image URLs for a term.

use anyhow::Result;

use crate::cli::{build_context, output};
use crate::config::HarvestConfig;

/// Run the search command.
pub async fn run(cfg: &HarvestConfig, term: &str, max: Option<usize>) -> Result<()> {
    let ctx = build_context(cfg)?;
    let max_images = max.unwrap_or(cfg.max_images);
    let hits = ctx.search.search(term, max_images).await?;

    if output::is_json() {
        return output::print_json(&hits);
    }

    for hit in &hits {
        match (hit.width, hit.height) {
            (Some(w), Some(h)) => println!("{}  ({w}x{h})", hit.image),
            _ => println!("{}", hit.image),
        }
    }
    if !output::is_quiet() {
        eprintln!("{} results for '{term}'", hits.len());
    }
    Ok(())
}
